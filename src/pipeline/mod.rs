//! Media pipelines turning a stream into time-stamped word events.
//!
//! A pipeline owns one demux, one extractor, and a decode chain wired into a
//! callback graph. The orchestration layer is single-threaded and
//! non-blocking: `start`/`stop` return immediately and all events arrive via
//! callbacks from the engine's own execution context.

pub mod base;
pub mod channels;
pub mod factory;
pub mod speech;
pub mod subtitle;

pub use base::PipelineCore;
pub use channels::remap_for_format;
pub use factory::{PipelineFactory, ProducerPipeline};
pub use speech::SpeechPipeline;
pub use subtitle::SubtitlePipeline;

use crate::engine::events::{EosCallback, ErrorCallback, WordsCallback};
use crate::error::Result;

/// Common capability interface of the pipeline variants.
///
/// Every variant produces word events; registering the subtitle-cue
/// callback stays on `SubtitlePipeline` (reachable through
/// `ProducerPipeline::as_subtitle_mut`).
pub trait Pipeline: Send {
    /// Begin asynchronous extraction. No-op while already running.
    fn start(&mut self) -> Result<()>;

    /// Halt extraction. No-op while stopped.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Total stream duration in seconds; 0.0 when unknown.
    fn duration(&self) -> f64;

    /// Currently selected time window.
    fn time_window(&self) -> (f64, f64);

    /// Restrict extraction to `[begin, end]`. Only valid before `start()`.
    fn select_time_window(&mut self, begin: f64, end: f64) -> Result<()>;

    /// Fraction of the window already processed; `None` when unavailable.
    fn progress(&self) -> Option<f64>;

    /// Register the end-of-stream callback; `None` detaches.
    fn connect_eos_callback(&mut self, cb: Option<EosCallback>);

    /// Register the fatal-error callback; `None` detaches.
    fn connect_error_callback(&mut self, cb: Option<ErrorCallback>);

    /// Register the word-event callback; `None` detaches.
    fn connect_words_callback(&mut self, cb: Option<WordsCallback>);

    /// Detach every callback, stop extraction, release owned stages.
    /// Idempotent; no callback fires after this returns.
    fn destroy(&mut self);
}
