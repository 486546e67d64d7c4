//! Interfaces of the external media engine.
//!
//! The demux/decode/resample/recognition implementations are an external
//! capability provider; this module defines the narrow trait surface the
//! orchestration layer consumes, the data types exchanged across it, and
//! mock implementations used by the test suite.

pub mod decoder;
pub mod demux;
pub mod events;
pub mod format;
pub mod media;
pub mod resampler;
pub mod speech;

pub use decoder::{
    AudioDecoder, MockAudioDecoder, MockSubtitleDecoder, StreamDecoder, SubtitleDecoder,
};
pub use demux::{Demux, Extractor, MockDemux, MockExtractor};
pub use events::{
    EosCallback, ErrorCallback, FormatChangeCallback, SubsCallback, SubtitleEvent, WordEvent,
    WordsCallback,
};
pub use format::{AudioFormat, ChannelMap};
pub use media::{MediaEngine, MockMediaEngine};
pub use resampler::{MockResampler, Resampler};
pub use speech::{
    MockSpeechEngine, MockSpeechModel, MockSpeechRecognizer, SpeechEngine, SpeechModel,
    SpeechRecognizer,
};
