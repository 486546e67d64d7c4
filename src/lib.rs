//! subalign - media pipeline orchestration for subtitle synchronization
//!
//! Turns a media stream (subtitle track or audio track) into a sequence of
//! time-stamped word events by composing demux, decode, resample, and speech
//! recognition stages into callback graphs. The heavy lifting happens inside
//! an external engine consumed through the `engine` trait surface; this
//! crate wires the graphs, manages their lifecycle, and partitions long
//! streams into parallel time-windowed jobs.

// Enforce error handling discipline in library code
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod stream;

// Stream descriptors
pub use stream::{ChannelSelection, StreamDescriptor, StreamKind};

// Engine trait surface (implemented by the external engine, mocked in tests)
pub use engine::{
    AudioDecoder, AudioFormat, ChannelMap, Demux, Extractor, MediaEngine, Resampler, SpeechEngine,
    SpeechModel, SpeechRecognizer, StreamDecoder, SubtitleDecoder,
};
pub use engine::{SubtitleEvent, WordEvent};

// Pipelines
pub use pipeline::{
    Pipeline, PipelineCore, PipelineFactory, ProducerPipeline, SpeechPipeline, SubtitlePipeline,
};

// Error handling
pub use error::{Result, SubalignError};

// Config
pub use config::Settings;
