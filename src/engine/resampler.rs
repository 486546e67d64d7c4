//! Resampler stage interface of the media engine.

use crate::engine::events::FormatChangeCallback;
use crate::engine::format::{AudioFormat, ChannelMap};
use crate::engine::speech::SpeechRecognizer;
use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Audio resampler converting decoded audio to a recognizer's format.
///
/// The resampler observes the actual input format as packets arrive and
/// reports it through the format-change callback; channel mixing is
/// reconfigured at any time via `set_channel_map`.
pub trait Resampler: Send + Sync {
    /// Attach the downstream recognizer and the format to convert into.
    fn connect_output(
        &self,
        recognizer: Arc<dyn SpeechRecognizer>,
        target_format: AudioFormat,
    ) -> Result<()>;

    /// Reconfigure channel mixing. An empty map produces silence.
    fn set_channel_map(&self, map: ChannelMap);

    /// Register the format-change callback; `None` detaches.
    fn connect_format_change_callback(&self, cb: Option<FormatChangeCallback>);
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockResamplerInner {
    target_format: Mutex<Option<AudioFormat>>,
    applied_maps: Mutex<Vec<ChannelMap>>,
    format_cb: Mutex<Option<FormatChangeCallback>>,
}

/// Mock resampler for testing. Clones share state.
#[derive(Clone, Default)]
pub struct MockResampler {
    inner: Arc<MockResamplerInner>,
}

impl MockResampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target format recorded by `connect_output`, if any.
    pub fn target_format(&self) -> Option<AudioFormat> {
        *self.inner.target_format.lock().unwrap()
    }

    /// Every channel map applied so far, in application order.
    pub fn applied_maps(&self) -> Vec<ChannelMap> {
        self.inner.applied_maps.lock().unwrap().clone()
    }

    pub fn has_format_change_callback(&self) -> bool {
        self.inner.format_cb.lock().unwrap().is_some()
    }

    /// Report an observed input format, as the engine would when the
    /// decoded audio format becomes known or changes.
    ///
    /// Returns true if a callback was installed and invoked.
    pub fn fire_format_change(&self, input: AudioFormat) -> bool {
        let output = self
            .target_format()
            .unwrap_or_else(|| AudioFormat::new(input.sample_rate, 1));
        match self.inner.format_cb.lock().unwrap().as_mut() {
            Some(cb) => {
                cb(&input, &output);
                true
            }
            None => false,
        }
    }
}

impl Resampler for MockResampler {
    fn connect_output(
        &self,
        _recognizer: Arc<dyn SpeechRecognizer>,
        target_format: AudioFormat,
    ) -> Result<()> {
        *self.inner.target_format.lock().unwrap() = Some(target_format);
        Ok(())
    }

    fn set_channel_map(&self, map: ChannelMap) {
        self.inner.applied_maps.lock().unwrap().push(map);
    }

    fn connect_format_change_callback(&self, cb: Option<FormatChangeCallback>) {
        *self.inner.format_cb.lock().unwrap() = cb;
    }
}
