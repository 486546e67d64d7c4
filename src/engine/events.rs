//! Events emitted by decode and recognition stages, and the single-slot
//! callback types used to deliver them.
//!
//! Each event has exactly one consumer in this design, so registration is
//! replace-or-clear: installing a callback replaces any prior one, and
//! installing `None` detaches cleanly. Callbacks are invoked from the
//! engine's own execution context and must be `Send`.

use crate::engine::format::AudioFormat;
use crate::error::SubalignError;

/// A recognized or decoded word with its time span, in stream seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct WordEvent {
    pub text: String,
    pub begin: f64,
    pub end: f64,
}

impl WordEvent {
    pub fn new(text: &str, begin: f64, end: f64) -> Self {
        Self {
            text: text.to_string(),
            begin,
            end,
        }
    }
}

/// A decoded subtitle cue with its time span, in stream seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEvent {
    pub text: String,
    pub begin: f64,
    pub end: f64,
}

impl SubtitleEvent {
    pub fn new(text: &str, begin: f64, end: f64) -> Self {
        Self {
            text: text.to_string(),
            begin,
            end,
        }
    }
}

/// Per-word delivery from a subtitle decoder or speech recognizer.
pub type WordsCallback = Box<dyn FnMut(WordEvent) + Send>;

/// Per-cue delivery from a subtitle decoder.
pub type SubsCallback = Box<dyn FnMut(SubtitleEvent) + Send>;

/// End-of-stream notification from an extractor.
pub type EosCallback = Box<dyn FnMut() + Send>;

/// Fatal error notification from an extractor.
pub type ErrorCallback = Box<dyn FnMut(SubalignError) + Send>;

/// Input/output format notification from a resampler.
pub type FormatChangeCallback = Box<dyn FnMut(&AudioFormat, &AudioFormat) + Send>;
