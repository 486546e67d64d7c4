//! Speech model provider and recognizer interfaces.
//!
//! Model loading and channel-mapping heuristics live behind `SpeechEngine`;
//! the orchestration layer only decides *when* to ask for a map, never how
//! one is computed.

use crate::engine::events::{WordEvent, WordsCallback};
use crate::engine::format::{AudioFormat, ChannelMap};
use crate::error::{Result, SubalignError};
use std::sync::{Arc, Mutex};

/// Loaded speech model handle.
pub trait SpeechModel: Send + Sync {
    /// Audio format the model's recognizer consumes.
    fn required_audio_format(&self) -> AudioFormat;
}

impl std::fmt::Debug for dyn SpeechModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SpeechModel")
    }
}

/// Speech recognition stage emitting word events.
pub trait SpeechRecognizer: Send + Sync {
    /// Drop words recognized with a score below `prob`.
    fn set_min_word_prob(&self, prob: f32);

    /// Drop recognized words shorter than `len` characters.
    fn set_min_word_len(&self, len: usize);

    /// Register the per-word callback; `None` detaches.
    fn connect_words_callback(&self, cb: Option<WordsCallback>);
}

/// Provider of speech models and channel-mapping heuristics.
pub trait SpeechEngine: Send + Sync {
    /// Load a model for `language` (`None` = unspecified).
    fn load_model(&self, language: Option<&str>) -> Result<Arc<dyn SpeechModel>>;

    /// Create a recognizer bound to a loaded model.
    fn create_recognizer(&self, model: Arc<dyn SpeechModel>) -> Result<Arc<dyn SpeechRecognizer>>;

    /// Default mix-down map for an observed input format, when one exists.
    fn default_channel_map(&self, format: &AudioFormat) -> Option<ChannelMap>;

    /// Pass-through map keeping all channels of an input format.
    fn all_channels_map(&self, format: &AudioFormat) -> Option<ChannelMap>;

    /// Map mixing an explicitly selected set of input channels.
    fn channel_map_for(&self, channels: &[u32]) -> Option<ChannelMap>;
}

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

/// Mock speech model reporting a fixed required format.
#[derive(Debug, Clone)]
pub struct MockSpeechModel {
    format: AudioFormat,
}

impl MockSpeechModel {
    pub fn new(format: AudioFormat) -> Self {
        Self { format }
    }
}

impl SpeechModel for MockSpeechModel {
    fn required_audio_format(&self) -> AudioFormat {
        self.format
    }
}

#[derive(Default)]
struct MockSpeechRecognizerInner {
    min_word_prob: Mutex<Option<f32>>,
    min_word_len: Mutex<Option<usize>>,
    words_cb: Mutex<Option<WordsCallback>>,
}

/// Mock speech recognizer for testing. Clones share state.
#[derive(Clone, Default)]
pub struct MockSpeechRecognizer {
    inner: Arc<MockSpeechRecognizerInner>,
}

impl MockSpeechRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_word_prob(&self) -> Option<f32> {
        *self.inner.min_word_prob.lock().unwrap()
    }

    pub fn min_word_len(&self) -> Option<usize> {
        *self.inner.min_word_len.lock().unwrap()
    }

    pub fn has_words_callback(&self) -> bool {
        self.inner.words_cb.lock().unwrap().is_some()
    }

    /// Deliver a recognized word; returns true if a callback consumed it.
    pub fn fire_word(&self, word: WordEvent) -> bool {
        match self.inner.words_cb.lock().unwrap().as_mut() {
            Some(cb) => {
                cb(word);
                true
            }
            None => false,
        }
    }
}

impl SpeechRecognizer for MockSpeechRecognizer {
    fn set_min_word_prob(&self, prob: f32) {
        *self.inner.min_word_prob.lock().unwrap() = Some(prob);
    }

    fn set_min_word_len(&self, len: usize) {
        *self.inner.min_word_len.lock().unwrap() = Some(len);
    }

    fn connect_words_callback(&self, cb: Option<WordsCallback>) {
        *self.inner.words_cb.lock().unwrap() = cb;
    }
}

struct MockSpeechEngineInner {
    required_format: Mutex<AudioFormat>,
    missing_languages: Mutex<Vec<String>>,
    no_heuristic_maps: Mutex<bool>,
    loaded_languages: Mutex<Vec<Option<String>>>,
    recognizers: Mutex<Vec<MockSpeechRecognizer>>,
}

impl Default for MockSpeechEngineInner {
    fn default() -> Self {
        Self {
            // 16kHz mono, the usual speech recognition input format.
            required_format: Mutex::new(AudioFormat::new(16000, 1)),
            missing_languages: Mutex::new(Vec::new()),
            no_heuristic_maps: Mutex::new(false),
            loaded_languages: Mutex::new(Vec::new()),
            recognizers: Mutex::new(Vec::new()),
        }
    }
}

/// Mock speech engine for testing. Clones share state.
///
/// The built-in heuristics are deterministic: the default map mixes every
/// input channel into output 0 with equal weights, the all-channels map is
/// the identity, and an explicit selection is mixed into output 0.
#[derive(Clone, Default)]
pub struct MockSpeechEngine {
    inner: Arc<MockSpeechEngineInner>,
}

impl MockSpeechEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the format reported by loaded models.
    pub fn with_required_format(self, format: AudioFormat) -> Self {
        *self.inner.required_format.lock().unwrap() = format;
        self
    }

    /// Configure `load_model` to fail for a language.
    pub fn with_missing_language(self, language: &str) -> Self {
        self.inner
            .missing_languages
            .lock()
            .unwrap()
            .push(language.to_string());
        self
    }

    /// Configure the map heuristics to find no mapping, so dynamic
    /// recomputation falls back to the explicit-silence empty map.
    pub fn with_no_heuristic_maps(self) -> Self {
        *self.inner.no_heuristic_maps.lock().unwrap() = true;
        self
    }

    /// Languages `load_model` was called with, in call order.
    pub fn loaded_languages(&self) -> Vec<Option<String>> {
        self.inner.loaded_languages.lock().unwrap().clone()
    }

    /// Recognizers created so far, in creation order.
    pub fn recognizers(&self) -> Vec<MockSpeechRecognizer> {
        self.inner.recognizers.lock().unwrap().clone()
    }

    pub fn last_recognizer(&self) -> Option<MockSpeechRecognizer> {
        self.inner.recognizers.lock().unwrap().last().cloned()
    }
}

impl SpeechEngine for MockSpeechEngine {
    fn load_model(&self, language: Option<&str>) -> Result<Arc<dyn SpeechModel>> {
        self.inner
            .loaded_languages
            .lock()
            .unwrap()
            .push(language.map(str::to_string));

        if let Some(lang) = language
            && self
                .inner
                .missing_languages
                .lock()
                .unwrap()
                .iter()
                .any(|missing| missing == lang)
        {
            return Err(SubalignError::ModelLoad {
                language: lang.to_string(),
                message: "model not installed".to_string(),
            });
        }

        let format = *self.inner.required_format.lock().unwrap();
        Ok(Arc::new(MockSpeechModel::new(format)))
    }

    fn create_recognizer(&self, _model: Arc<dyn SpeechModel>) -> Result<Arc<dyn SpeechRecognizer>> {
        let recognizer = MockSpeechRecognizer::new();
        self.inner
            .recognizers
            .lock()
            .unwrap()
            .push(recognizer.clone());
        Ok(Arc::new(recognizer))
    }

    fn default_channel_map(&self, format: &AudioFormat) -> Option<ChannelMap> {
        if *self.inner.no_heuristic_maps.lock().unwrap() || format.channels == 0 {
            return None;
        }
        let weight = 1.0 / format.channels as f32;
        let mut map = ChannelMap::new();
        map.set(0, (0..format.channels).map(|ch| (ch, weight)).collect());
        Some(map)
    }

    fn all_channels_map(&self, format: &AudioFormat) -> Option<ChannelMap> {
        if *self.inner.no_heuristic_maps.lock().unwrap() || format.channels == 0 {
            return None;
        }
        let mut map = ChannelMap::new();
        for ch in 0..format.channels {
            map.set(ch, vec![(ch, 1.0)]);
        }
        Some(map)
    }

    fn channel_map_for(&self, channels: &[u32]) -> Option<ChannelMap> {
        if channels.is_empty() {
            return None;
        }
        let weight = 1.0 / channels.len() as f32;
        let mut map = ChannelMap::new();
        map.set(0, channels.iter().map(|&ch| (ch, weight)).collect());
        Some(map)
    }
}
