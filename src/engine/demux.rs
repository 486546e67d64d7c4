//! Demultiplexer and extractor interfaces of the media engine.
//!
//! A `Demux` reads a container and exposes decodable tracks; an `Extractor`
//! drives the demux asynchronously and reports end-of-stream or fatal errors
//! through single-slot callbacks. Each pipeline owns exactly one of each.

use crate::engine::decoder::StreamDecoder;
use crate::engine::events::{EosCallback, ErrorCallback};
use crate::error::{Result, SubalignError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Container demultiplexer opened for one media path.
pub trait Demux: Send + Sync {
    /// Total stream duration in seconds; 0.0 when unknown.
    fn duration(&self) -> f64;

    /// Current read position in seconds. 0.0 until extraction moves it.
    fn position(&self) -> f64;

    /// Attach a decoder stage to the track at `stream_index`.
    fn connect_decoder(&self, decoder: Arc<dyn StreamDecoder>, stream_index: u32) -> Result<()>;
}

impl std::fmt::Debug for dyn Demux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Demux")
    }
}

/// Asynchronous driver of a demux.
///
/// `start`/`stop` return immediately; extraction runs in the engine's own
/// execution context and completion is observed only via callbacks. Exactly
/// one terminal callback (EOS or error) fires per run.
pub trait Extractor: Send + Sync {
    /// Restrict extraction to the `[begin, end]` window, in seconds.
    fn select_time_window(&self, begin: f64, end: f64) -> Result<()>;

    fn start(&self) -> Result<()>;

    fn stop(&self);

    fn is_running(&self) -> bool;

    /// Register the end-of-stream callback; `None` detaches.
    fn connect_eos_callback(&self, cb: Option<EosCallback>);

    /// Register the fatal-error callback; `None` detaches.
    fn connect_error_callback(&self, cb: Option<ErrorCallback>);
}

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockDemuxInner {
    path: PathBuf,
    duration: f64,
    position: Mutex<f64>,
    connected: Mutex<Vec<u32>>,
}

/// Mock demux for testing.
///
/// Clones share state, so a clone kept by a test keeps observing (and
/// driving) the instance handed to a pipeline.
#[derive(Clone, Default)]
pub struct MockDemux {
    inner: Arc<MockDemuxInner>,
}

impl MockDemux {
    /// Create a mock demux reporting the given duration (0.0 = unknown).
    pub fn new(path: &Path, duration: f64) -> Self {
        Self {
            inner: Arc::new(MockDemuxInner {
                path: path.to_path_buf(),
                duration,
                position: Mutex::new(0.0),
                connected: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Move the reported read position, as extraction would.
    pub fn set_position(&self, position: f64) {
        *self.inner.position.lock().unwrap() = position;
    }

    /// Stream indices decoders were attached to, in connection order.
    pub fn connected_stream_indices(&self) -> Vec<u32> {
        self.inner.connected.lock().unwrap().clone()
    }
}

impl Demux for MockDemux {
    fn duration(&self) -> f64 {
        self.inner.duration
    }

    fn position(&self) -> f64 {
        *self.inner.position.lock().unwrap()
    }

    fn connect_decoder(&self, _decoder: Arc<dyn StreamDecoder>, stream_index: u32) -> Result<()> {
        self.inner.connected.lock().unwrap().push(stream_index);
        Ok(())
    }
}

#[derive(Default)]
struct MockExtractorInner {
    running: AtomicBool,
    start_count: AtomicUsize,
    stop_count: AtomicUsize,
    windows: Mutex<Vec<(f64, f64)>>,
    eos_cb: Mutex<Option<EosCallback>>,
    error_cb: Mutex<Option<ErrorCallback>>,
}

/// Mock extractor for testing.
///
/// Tests keep a clone and fire terminal events through it; delivery goes
/// through whatever callback slot is currently installed, so a detached
/// slot silently drops the event just like a stopped engine would.
#[derive(Clone, Default)]
pub struct MockExtractor {
    inner: Arc<MockExtractorInner>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time windows selected on this extractor, in call order.
    pub fn selected_windows(&self) -> Vec<(f64, f64)> {
        self.inner.windows.lock().unwrap().clone()
    }

    pub fn start_count(&self) -> usize {
        self.inner.start_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.inner.stop_count.load(Ordering::SeqCst)
    }

    pub fn has_eos_callback(&self) -> bool {
        self.inner.eos_cb.lock().unwrap().is_some()
    }

    pub fn has_error_callback(&self) -> bool {
        self.inner.error_cb.lock().unwrap().is_some()
    }

    /// Deliver end-of-stream, as the engine would at the end of a run.
    ///
    /// Returns true if a callback was installed and invoked.
    pub fn fire_eos(&self) -> bool {
        self.inner.running.store(false, Ordering::SeqCst);
        match self.inner.eos_cb.lock().unwrap().as_mut() {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }

    /// Deliver a fatal error, as the engine would on a failed run.
    ///
    /// Returns true if a callback was installed and invoked.
    pub fn fire_error(&self, error: SubalignError) -> bool {
        self.inner.running.store(false, Ordering::SeqCst);
        match self.inner.error_cb.lock().unwrap().as_mut() {
            Some(cb) => {
                cb(error);
                true
            }
            None => false,
        }
    }
}

impl Extractor for MockExtractor {
    fn select_time_window(&self, begin: f64, end: f64) -> Result<()> {
        self.inner.windows.lock().unwrap().push((begin, end));
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.inner.start_count.fetch_add(1, Ordering::SeqCst);
        self.inner.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.inner.stop_count.fetch_add(1, Ordering::SeqCst);
        self.inner.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    fn connect_eos_callback(&self, cb: Option<EosCallback>) {
        *self.inner.eos_cb.lock().unwrap() = cb;
    }

    fn connect_error_callback(&self, cb: Option<ErrorCallback>) {
        *self.inner.error_cb.lock().unwrap() = cb;
    }
}
