//! Decoder stage interfaces of the media engine.

use crate::engine::events::{SubsCallback, SubtitleEvent, WordEvent, WordsCallback};
use crate::engine::resampler::Resampler;
use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Marker for stages a demux can feed packets into.
pub trait StreamDecoder: Send + Sync {}

/// Subtitle track decoder emitting words and cues.
pub trait SubtitleDecoder: StreamDecoder {
    /// Drop decoded words shorter than `len` characters.
    fn set_min_word_len(&self, len: usize);

    /// Force a text encoding instead of the decoder's autodetection.
    fn set_encoding(&self, encoding: &str);

    /// Register the per-word callback; `None` detaches.
    fn connect_words_callback(&self, cb: Option<WordsCallback>);

    /// Register the per-cue callback; `None` detaches.
    fn connect_subs_callback(&self, cb: Option<SubsCallback>);
}

/// Audio track decoder feeding raw audio into a resampler.
pub trait AudioDecoder: StreamDecoder {
    /// Attach the downstream resampler.
    fn connect_output(&self, resampler: Arc<dyn Resampler>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockSubtitleDecoderInner {
    min_word_len: Mutex<Option<usize>>,
    encoding: Mutex<Option<String>>,
    words_cb: Mutex<Option<WordsCallback>>,
    subs_cb: Mutex<Option<SubsCallback>>,
}

/// Mock subtitle decoder for testing. Clones share state.
#[derive(Clone, Default)]
pub struct MockSubtitleDecoder {
    inner: Arc<MockSubtitleDecoderInner>,
}

impl MockSubtitleDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_word_len(&self) -> Option<usize> {
        *self.inner.min_word_len.lock().unwrap()
    }

    pub fn encoding(&self) -> Option<String> {
        self.inner.encoding.lock().unwrap().clone()
    }

    pub fn has_words_callback(&self) -> bool {
        self.inner.words_cb.lock().unwrap().is_some()
    }

    pub fn has_subs_callback(&self) -> bool {
        self.inner.subs_cb.lock().unwrap().is_some()
    }

    /// Deliver a decoded word; returns true if a callback consumed it.
    pub fn fire_word(&self, word: WordEvent) -> bool {
        match self.inner.words_cb.lock().unwrap().as_mut() {
            Some(cb) => {
                cb(word);
                true
            }
            None => false,
        }
    }

    /// Deliver a decoded cue; returns true if a callback consumed it.
    pub fn fire_sub(&self, sub: SubtitleEvent) -> bool {
        match self.inner.subs_cb.lock().unwrap().as_mut() {
            Some(cb) => {
                cb(sub);
                true
            }
            None => false,
        }
    }
}

impl StreamDecoder for MockSubtitleDecoder {}

impl SubtitleDecoder for MockSubtitleDecoder {
    fn set_min_word_len(&self, len: usize) {
        *self.inner.min_word_len.lock().unwrap() = Some(len);
    }

    fn set_encoding(&self, encoding: &str) {
        *self.inner.encoding.lock().unwrap() = Some(encoding.to_string());
    }

    fn connect_words_callback(&self, cb: Option<WordsCallback>) {
        *self.inner.words_cb.lock().unwrap() = cb;
    }

    fn connect_subs_callback(&self, cb: Option<SubsCallback>) {
        *self.inner.subs_cb.lock().unwrap() = cb;
    }
}

#[derive(Default)]
struct MockAudioDecoderInner {
    output_connected: Mutex<bool>,
}

/// Mock audio decoder for testing. Clones share state.
#[derive(Clone, Default)]
pub struct MockAudioDecoder {
    inner: Arc<MockAudioDecoderInner>,
}

impl MockAudioDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_connected(&self) -> bool {
        *self.inner.output_connected.lock().unwrap()
    }
}

impl StreamDecoder for MockAudioDecoder {}

impl AudioDecoder for MockAudioDecoder {
    fn connect_output(&self, _resampler: Arc<dyn Resampler>) -> Result<()> {
        *self.inner.output_connected.lock().unwrap() = true;
        Ok(())
    }
}
