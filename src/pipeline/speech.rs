//! Speech recognition pipeline.
//!
//! Demux --> AudioDecoder --> Resampler --> SpeechRecognizer --[words]--> ...

use crate::config::Settings;
use crate::engine::decoder::AudioDecoder;
use crate::engine::demux::Demux;
use crate::engine::events::{EosCallback, ErrorCallback, FormatChangeCallback, WordsCallback};
use crate::engine::media::MediaEngine;
use crate::engine::resampler::Resampler;
use crate::engine::speech::{SpeechEngine, SpeechRecognizer};
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::pipeline::base::PipelineCore;
use crate::pipeline::channels::remap_for_format;
use crate::stream::{ChannelSelection, StreamDescriptor};
use std::sync::Arc;

/// Pipeline recognizing speech in an audio track.
///
/// Channel mixing follows the descriptor's selection: an explicit set is
/// mapped once at construction, while the dynamic selections recompute the
/// map whenever the resampler reports the actual input format.
pub struct SpeechPipeline {
    core: PipelineCore,
    // Wired into the graph at construction; owned here for its lifetime.
    _decoder: Arc<dyn AudioDecoder>,
    resampler: Arc<dyn Resampler>,
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl std::fmt::Debug for SpeechPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechPipeline").finish_non_exhaustive()
    }
}

impl SpeechPipeline {
    /// Build the recognition graph for an audio stream.
    ///
    /// # Errors
    /// `SubalignError::MediaOpen` if the container cannot be opened,
    /// `SubalignError::ModelLoad` if no model exists for the stream's
    /// language.
    pub fn new(
        engine: &dyn MediaEngine,
        speech: &Arc<dyn SpeechEngine>,
        settings: &Settings,
        stream: &StreamDescriptor,
    ) -> Result<Self> {
        let core = PipelineCore::new(engine, stream)?;

        let model = speech.load_model(stream.language.as_deref())?;
        let target_format = model.required_audio_format();
        tracing::info!("speech recognition audio format {}", target_format);

        let recognizer = speech.create_recognizer(model)?;
        recognizer.set_min_word_prob(settings.min_word_prob);
        recognizer.set_min_word_len(settings.min_word_len);

        let decoder = engine.create_audio_decoder()?;
        let resampler = engine.create_resampler()?;

        resampler.connect_format_change_callback(Some(Self::format_change_handler(
            stream.channels.clone(),
            speech.clone(),
            resampler.clone(),
        )));

        if let ChannelSelection::Explicit(channels) = &stream.channels {
            let map = speech.channel_map_for(channels).unwrap_or_default();
            tracing::debug!("audio channels mixer map {}", map);
            resampler.set_channel_map(map);
        }

        core.demux()
            .connect_decoder(decoder.clone(), stream.stream_index)?;
        decoder.connect_output(resampler.clone())?;
        resampler.connect_output(recognizer.clone(), target_format)?;

        Ok(Self {
            core,
            _decoder: decoder,
            resampler,
            recognizer,
        })
    }

    fn format_change_handler(
        selection: ChannelSelection,
        speech: Arc<dyn SpeechEngine>,
        resampler: Arc<dyn Resampler>,
    ) -> FormatChangeCallback {
        Box::new(move |input, _output| {
            tracing::debug!("input audio format {}", input);
            if let Some(map) = remap_for_format(&selection, speech.as_ref(), input) {
                tracing::debug!("audio channels map {}", map);
                resampler.set_channel_map(map);
            }
        })
    }
}

impl Pipeline for SpeechPipeline {
    fn start(&mut self) -> Result<()> {
        self.core.start()
    }

    fn stop(&mut self) {
        self.core.stop();
    }

    fn is_running(&self) -> bool {
        self.core.is_running()
    }

    fn duration(&self) -> f64 {
        self.core.duration()
    }

    fn time_window(&self) -> (f64, f64) {
        self.core.time_window()
    }

    fn select_time_window(&mut self, begin: f64, end: f64) -> Result<()> {
        self.core.select_time_window(begin, end)
    }

    fn progress(&self) -> Option<f64> {
        self.core.progress()
    }

    fn connect_eos_callback(&mut self, cb: Option<EosCallback>) {
        self.core.connect_eos_callback(cb);
    }

    fn connect_error_callback(&mut self, cb: Option<ErrorCallback>) {
        self.core.connect_error_callback(cb);
    }

    fn connect_words_callback(&mut self, cb: Option<WordsCallback>) {
        self.recognizer.connect_words_callback(cb);
    }

    fn destroy(&mut self) {
        self.recognizer.connect_words_callback(None);
        self.resampler.connect_format_change_callback(None);
        self.core.destroy();
    }
}

impl Drop for SpeechPipeline {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::WordEvent;
    use crate::engine::format::AudioFormat;
    use crate::engine::media::MockMediaEngine;
    use crate::engine::speech::MockSpeechEngine;
    use crate::error::SubalignError;
    use crate::stream::StreamKind;
    use std::sync::Mutex;

    fn audio_stream() -> StreamDescriptor {
        StreamDescriptor::new("/media/film.mkv", 1, StreamKind::Audio).with_language("en")
    }

    fn speech_engine(mock: &MockSpeechEngine) -> Arc<dyn SpeechEngine> {
        Arc::new(mock.clone())
    }

    #[test]
    fn test_construction_wires_the_recognition_graph() {
        let engine = MockMediaEngine::new().with_duration(60.0);
        let mock_speech = MockSpeechEngine::new().with_required_format(AudioFormat::new(16000, 1));
        let speech = speech_engine(&mock_speech);

        let _pipeline =
            SpeechPipeline::new(&engine, &speech, &Settings::default(), &audio_stream()).unwrap();

        assert_eq!(
            engine.last_demux().unwrap().connected_stream_indices(),
            vec![1]
        );
        assert!(engine.audio_decoders()[0].output_connected());
        assert_eq!(
            engine.last_resampler().unwrap().target_format(),
            Some(AudioFormat::new(16000, 1))
        );
        assert_eq!(mock_speech.loaded_languages(), vec![Some("en".to_string())]);
    }

    #[test]
    fn test_construction_fails_without_model() {
        let engine = MockMediaEngine::new().with_duration(60.0);
        let mock_speech = MockSpeechEngine::new().with_missing_language("en");
        let speech = speech_engine(&mock_speech);

        let err = SpeechPipeline::new(&engine, &speech, &Settings::default(), &audio_stream())
            .unwrap_err();
        assert!(matches!(err, SubalignError::ModelLoad { .. }));
    }

    #[test]
    fn test_recognizer_gets_settings_snapshot() {
        let engine = MockMediaEngine::new().with_duration(60.0);
        let mock_speech = MockSpeechEngine::new();
        let speech = speech_engine(&mock_speech);
        let settings = Settings {
            min_word_len: 2,
            min_word_prob: 0.7,
        };

        let _pipeline = SpeechPipeline::new(&engine, &speech, &settings, &audio_stream()).unwrap();

        let recognizer = mock_speech.last_recognizer().unwrap();
        assert_eq!(recognizer.min_word_len(), Some(2));
        assert_eq!(recognizer.min_word_prob(), Some(0.7));
    }

    #[test]
    fn test_words_come_from_the_recognizer() {
        let engine = MockMediaEngine::new().with_duration(60.0);
        let mock_speech = MockSpeechEngine::new();
        let speech = speech_engine(&mock_speech);

        let mut pipeline =
            SpeechPipeline::new(&engine, &speech, &Settings::default(), &audio_stream()).unwrap();

        let words = Arc::new(Mutex::new(Vec::new()));
        let sink = words.clone();
        pipeline.connect_words_callback(Some(Box::new(move |word: WordEvent| {
            sink.lock().unwrap().push(word.text);
        })));

        mock_speech
            .last_recognizer()
            .unwrap()
            .fire_word(WordEvent::new("hello", 3.0, 3.5));
        assert_eq!(words.lock().unwrap().as_slice(), ["hello"]);
    }

    #[test]
    fn test_mixdown_remaps_on_every_format_change() {
        let engine = MockMediaEngine::new().with_duration(60.0);
        let mock_speech = MockSpeechEngine::new();
        let speech = speech_engine(&mock_speech);

        let _pipeline =
            SpeechPipeline::new(&engine, &speech, &Settings::default(), &audio_stream()).unwrap();

        let resampler = engine.last_resampler().unwrap();
        assert!(resampler.applied_maps().is_empty());

        let stereo = AudioFormat::new(48000, 2);
        resampler.fire_format_change(stereo);
        assert_eq!(
            resampler.applied_maps(),
            vec![mock_speech.default_channel_map(&stereo).unwrap()]
        );

        let surround = AudioFormat::new(48000, 6);
        resampler.fire_format_change(surround);
        assert_eq!(resampler.applied_maps().len(), 2);
        assert_eq!(
            resampler.applied_maps()[1],
            mock_speech.default_channel_map(&surround).unwrap()
        );
    }

    #[test]
    fn test_all_channels_remaps_with_identity_map() {
        let engine = MockMediaEngine::new().with_duration(60.0);
        let mock_speech = MockSpeechEngine::new();
        let speech = speech_engine(&mock_speech);
        let stream = audio_stream().with_channels(ChannelSelection::All);

        let _pipeline =
            SpeechPipeline::new(&engine, &speech, &Settings::default(), &stream).unwrap();

        let resampler = engine.last_resampler().unwrap();
        let stereo = AudioFormat::new(48000, 2);
        resampler.fire_format_change(stereo);
        assert_eq!(
            resampler.applied_maps(),
            vec![mock_speech.all_channels_map(&stereo).unwrap()]
        );
    }

    #[test]
    fn test_explicit_channels_map_once_at_construction() {
        let engine = MockMediaEngine::new().with_duration(60.0);
        let mock_speech = MockSpeechEngine::new();
        let speech = speech_engine(&mock_speech);
        let stream = audio_stream().with_channels(ChannelSelection::Explicit(vec![0, 1]));

        let _pipeline =
            SpeechPipeline::new(&engine, &speech, &Settings::default(), &stream).unwrap();

        let resampler = engine.last_resampler().unwrap();
        let fixed = mock_speech.channel_map_for(&[0, 1]).unwrap();
        assert_eq!(resampler.applied_maps(), vec![fixed.clone()]);

        // Format changes must not disturb the fixed map.
        resampler.fire_format_change(AudioFormat::new(48000, 6));
        assert_eq!(resampler.applied_maps(), vec![fixed]);
    }

    #[test]
    fn test_missing_heuristic_map_applies_silence() {
        let engine = MockMediaEngine::new().with_duration(60.0);
        let mock_speech = MockSpeechEngine::new().with_no_heuristic_maps();
        let speech = speech_engine(&mock_speech);

        let _pipeline =
            SpeechPipeline::new(&engine, &speech, &Settings::default(), &audio_stream()).unwrap();

        let resampler = engine.last_resampler().unwrap();
        resampler.fire_format_change(AudioFormat::new(48000, 2));

        let applied = resampler.applied_maps();
        assert_eq!(applied.len(), 1);
        assert!(applied[0].is_empty());
    }

    #[test]
    fn test_destroy_detaches_recognizer_and_resampler_callbacks() {
        let engine = MockMediaEngine::new().with_duration(60.0);
        let mock_speech = MockSpeechEngine::new();
        let speech = speech_engine(&mock_speech);

        let mut pipeline =
            SpeechPipeline::new(&engine, &speech, &Settings::default(), &audio_stream()).unwrap();
        pipeline.connect_words_callback(Some(Box::new(|_| {})));

        pipeline.destroy();

        let recognizer = mock_speech.last_recognizer().unwrap();
        assert!(!recognizer.fire_word(WordEvent::new("late", 9.0, 9.5)));

        let resampler = engine.last_resampler().unwrap();
        assert!(!resampler.fire_format_change(AudioFormat::new(48000, 2)));
    }
}
