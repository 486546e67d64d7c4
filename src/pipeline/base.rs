//! Shared demux/extractor unit composed into the pipeline variants.

use crate::engine::demux::{Demux, Extractor};
use crate::engine::events::{EosCallback, ErrorCallback};
use crate::engine::media::MediaEngine;
use crate::error::{Result, SubalignError};
use crate::stream::StreamDescriptor;
use std::sync::Arc;

/// One demux plus the extractor driving it, with time windowing, progress
/// computation, and lifecycle state.
///
/// Both pipeline variants embed a core and delegate the common operations
/// to it; the variants only add their decode chains on top.
pub struct PipelineCore {
    demux: Arc<dyn Demux>,
    extractor: Box<dyn Extractor>,
    duration: f64,
    window: (f64, f64),
    started: bool,
    destroyed: bool,
}

impl std::fmt::Debug for PipelineCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineCore")
            .field("duration", &self.duration)
            .field("window", &self.window)
            .field("started", &self.started)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl PipelineCore {
    /// Open the stream's container and bind an extractor to it.
    ///
    /// # Errors
    /// Returns `SubalignError::MediaOpen` if the path is unreadable or the
    /// container is unsupported.
    pub fn new(engine: &dyn MediaEngine, stream: &StreamDescriptor) -> Result<Self> {
        let demux = engine.open_demux(&stream.path)?;
        let extractor = engine.create_extractor(demux.clone())?;

        let duration = demux.duration();
        tracing::debug!(
            "opened {} with duration {:.2}s",
            stream.path.display(),
            duration
        );

        Ok(Self {
            demux,
            extractor,
            duration,
            window: (0.0, duration),
            started: false,
            destroyed: false,
        })
    }

    pub fn demux(&self) -> &Arc<dyn Demux> {
        &self.demux
    }

    /// Total stream duration in seconds; 0.0 when unknown.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Currently selected time window.
    pub fn time_window(&self) -> (f64, f64) {
        self.window
    }

    /// Restrict extraction to `[begin, end]`. Only valid before `start()`.
    ///
    /// # Errors
    /// `SubalignError::InvalidState` if the pipeline was already started,
    /// `SubalignError::InvalidTimeWindow` for out-of-range bounds.
    pub fn select_time_window(&mut self, begin: f64, end: f64) -> Result<()> {
        if self.started {
            return Err(SubalignError::InvalidState {
                message: "time window selected after start".to_string(),
            });
        }
        if begin < 0.0 || begin > end || (self.duration > 0.0 && end > self.duration) {
            return Err(SubalignError::InvalidTimeWindow { begin, end });
        }

        self.window = (begin, end);
        self.extractor.select_time_window(begin, end)
    }

    /// Begin asynchronous extraction. No-op while already running.
    pub fn start(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(SubalignError::InvalidState {
                message: "start on destroyed pipeline".to_string(),
            });
        }
        if self.extractor.is_running() {
            return Ok(());
        }
        self.started = true;
        self.extractor.start()
    }

    /// Halt extraction. No-op while stopped.
    pub fn stop(&mut self) {
        if self.extractor.is_running() {
            self.extractor.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.extractor.is_running()
    }

    /// Fraction of the time window already processed, in [0, 1].
    ///
    /// `None` when the duration is unknown or the window is degenerate.
    /// A position still at 0 (extraction not yet begun) is normalized to
    /// the window begin, so fresh pipelines report 0.0 rather than a
    /// negative fraction.
    pub fn progress(&self) -> Option<f64> {
        if self.duration <= 0.0 {
            return None;
        }
        let (begin, end) = self.window;
        if end <= begin {
            return None;
        }

        let mut position = self.demux.position();
        if position == 0.0 {
            position = begin;
        }
        Some(((position - begin) / (end - begin)).clamp(0.0, 1.0))
    }

    /// Register the end-of-stream callback; `None` detaches.
    pub fn connect_eos_callback(&self, cb: Option<EosCallback>) {
        self.extractor.connect_eos_callback(cb);
    }

    /// Register the fatal-error callback; `None` detaches.
    pub fn connect_error_callback(&self, cb: Option<ErrorCallback>) {
        self.extractor.connect_error_callback(cb);
    }

    /// Detach the terminal callbacks and stop the extractor.
    ///
    /// Safe to call on a pipeline that never started; idempotent. After
    /// this returns, the engine can no longer deliver through this core.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.extractor.connect_eos_callback(None);
        self.extractor.connect_error_callback(None);
        self.extractor.stop();
    }
}
