//! Stage factory interface of the media engine.

use crate::engine::decoder::{AudioDecoder, MockAudioDecoder, MockSubtitleDecoder, SubtitleDecoder};
use crate::engine::demux::{Demux, Extractor, MockDemux, MockExtractor};
use crate::engine::resampler::{MockResampler, Resampler};
use crate::error::{Result, SubalignError};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Factory for demux and decode-chain stages.
///
/// Every stage handed out is owned by exactly one pipeline; the engine
/// never shares stage instances between calls.
pub trait MediaEngine: Send + Sync {
    /// Open a demux for a media path.
    ///
    /// # Errors
    /// Returns `SubalignError::MediaOpen` if the path is unreadable or the
    /// container is unsupported.
    fn open_demux(&self, path: &Path) -> Result<Arc<dyn Demux>>;

    /// Create an extractor driving the given demux.
    fn create_extractor(&self, demux: Arc<dyn Demux>) -> Result<Box<dyn Extractor>>;

    fn create_subtitle_decoder(&self) -> Result<Arc<dyn SubtitleDecoder>>;

    fn create_audio_decoder(&self) -> Result<Arc<dyn AudioDecoder>>;

    fn create_resampler(&self) -> Result<Arc<dyn Resampler>>;
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

struct MockMediaEngineInner {
    duration: Mutex<f64>,
    fail_open: AtomicBool,
    demuxes: Mutex<Vec<MockDemux>>,
    extractors: Mutex<Vec<MockExtractor>>,
    subtitle_decoders: Mutex<Vec<MockSubtitleDecoder>>,
    audio_decoders: Mutex<Vec<MockAudioDecoder>>,
    resamplers: Mutex<Vec<MockResampler>>,
}

impl Default for MockMediaEngineInner {
    fn default() -> Self {
        Self {
            duration: Mutex::new(0.0),
            fail_open: AtomicBool::new(false),
            demuxes: Mutex::new(Vec::new()),
            extractors: Mutex::new(Vec::new()),
            subtitle_decoders: Mutex::new(Vec::new()),
            audio_decoders: Mutex::new(Vec::new()),
            resamplers: Mutex::new(Vec::new()),
        }
    }
}

/// Mock media engine for testing.
///
/// Hands out fresh mock stages on every call and keeps a clone of each, so
/// tests can drive and inspect the stages a pipeline received. Clones share
/// state.
#[derive(Clone, Default)]
pub struct MockMediaEngine {
    inner: Arc<MockMediaEngineInner>,
}

impl MockMediaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the duration reported by opened demuxes (0.0 = unknown).
    pub fn with_duration(self, duration: f64) -> Self {
        *self.inner.duration.lock().unwrap() = duration;
        self
    }

    /// Configure `open_demux` to fail.
    pub fn with_open_failure(self) -> Self {
        self.inner.fail_open.store(true, Ordering::SeqCst);
        self
    }

    pub fn demuxes(&self) -> Vec<MockDemux> {
        self.inner.demuxes.lock().unwrap().clone()
    }

    pub fn extractors(&self) -> Vec<MockExtractor> {
        self.inner.extractors.lock().unwrap().clone()
    }

    pub fn subtitle_decoders(&self) -> Vec<MockSubtitleDecoder> {
        self.inner.subtitle_decoders.lock().unwrap().clone()
    }

    pub fn audio_decoders(&self) -> Vec<MockAudioDecoder> {
        self.inner.audio_decoders.lock().unwrap().clone()
    }

    pub fn resamplers(&self) -> Vec<MockResampler> {
        self.inner.resamplers.lock().unwrap().clone()
    }

    pub fn last_demux(&self) -> Option<MockDemux> {
        self.inner.demuxes.lock().unwrap().last().cloned()
    }

    pub fn last_extractor(&self) -> Option<MockExtractor> {
        self.inner.extractors.lock().unwrap().last().cloned()
    }

    pub fn last_subtitle_decoder(&self) -> Option<MockSubtitleDecoder> {
        self.inner.subtitle_decoders.lock().unwrap().last().cloned()
    }

    pub fn last_resampler(&self) -> Option<MockResampler> {
        self.inner.resamplers.lock().unwrap().last().cloned()
    }
}

impl MediaEngine for MockMediaEngine {
    fn open_demux(&self, path: &Path) -> Result<Arc<dyn Demux>> {
        if self.inner.fail_open.load(Ordering::SeqCst) {
            return Err(SubalignError::MediaOpen {
                path: path.display().to_string(),
                message: "cannot open container".to_string(),
            });
        }
        let demux = MockDemux::new(path, *self.inner.duration.lock().unwrap());
        self.inner.demuxes.lock().unwrap().push(demux.clone());
        Ok(Arc::new(demux))
    }

    fn create_extractor(&self, _demux: Arc<dyn Demux>) -> Result<Box<dyn Extractor>> {
        let extractor = MockExtractor::new();
        self.inner
            .extractors
            .lock()
            .unwrap()
            .push(extractor.clone());
        Ok(Box::new(extractor))
    }

    fn create_subtitle_decoder(&self) -> Result<Arc<dyn SubtitleDecoder>> {
        let decoder = MockSubtitleDecoder::new();
        self.inner
            .subtitle_decoders
            .lock()
            .unwrap()
            .push(decoder.clone());
        Ok(Arc::new(decoder))
    }

    fn create_audio_decoder(&self) -> Result<Arc<dyn AudioDecoder>> {
        let decoder = MockAudioDecoder::new();
        self.inner
            .audio_decoders
            .lock()
            .unwrap()
            .push(decoder.clone());
        Ok(Arc::new(decoder))
    }

    fn create_resampler(&self) -> Result<Arc<dyn Resampler>> {
        let resampler = MockResampler::new();
        self.inner
            .resamplers
            .lock()
            .unwrap()
            .push(resampler.clone());
        Ok(Arc::new(resampler))
    }
}
