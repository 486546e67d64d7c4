//! Pipeline construction and stream partitioning.

use crate::config::Settings;
use crate::engine::events::{EosCallback, ErrorCallback, WordsCallback};
use crate::engine::media::MediaEngine;
use crate::engine::speech::SpeechEngine;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::pipeline::speech::SpeechPipeline;
use crate::pipeline::subtitle::SubtitlePipeline;
use crate::stream::{StreamDescriptor, StreamKind};
use std::sync::Arc;

/// Pipeline variant built by the factory, dispatched on the stream kind.
pub enum ProducerPipeline {
    Subtitle(SubtitlePipeline),
    Speech(SpeechPipeline),
}

impl std::fmt::Debug for ProducerPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProducerPipeline::Subtitle(_) => f.write_str("ProducerPipeline::Subtitle"),
            ProducerPipeline::Speech(_) => f.write_str("ProducerPipeline::Speech"),
        }
    }
}

impl ProducerPipeline {
    /// The subtitle variant, for registering the per-cue callback.
    pub fn as_subtitle_mut(&mut self) -> Option<&mut SubtitlePipeline> {
        match self {
            ProducerPipeline::Subtitle(pipeline) => Some(pipeline),
            ProducerPipeline::Speech(_) => None,
        }
    }

    fn inner(&self) -> &dyn Pipeline {
        match self {
            ProducerPipeline::Subtitle(pipeline) => pipeline,
            ProducerPipeline::Speech(pipeline) => pipeline,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Pipeline {
        match self {
            ProducerPipeline::Subtitle(pipeline) => pipeline,
            ProducerPipeline::Speech(pipeline) => pipeline,
        }
    }
}

impl Pipeline for ProducerPipeline {
    fn start(&mut self) -> Result<()> {
        self.inner_mut().start()
    }

    fn stop(&mut self) {
        self.inner_mut().stop();
    }

    fn is_running(&self) -> bool {
        self.inner().is_running()
    }

    fn duration(&self) -> f64 {
        self.inner().duration()
    }

    fn time_window(&self) -> (f64, f64) {
        self.inner().time_window()
    }

    fn select_time_window(&mut self, begin: f64, end: f64) -> Result<()> {
        self.inner_mut().select_time_window(begin, end)
    }

    fn progress(&self) -> Option<f64> {
        self.inner().progress()
    }

    fn connect_eos_callback(&mut self, cb: Option<EosCallback>) {
        self.inner_mut().connect_eos_callback(cb);
    }

    fn connect_error_callback(&mut self, cb: Option<ErrorCallback>) {
        self.inner_mut().connect_error_callback(cb);
    }

    fn connect_words_callback(&mut self, cb: Option<WordsCallback>) {
        self.inner_mut().connect_words_callback(cb);
    }

    fn destroy(&mut self) {
        self.inner_mut().destroy();
    }
}

/// Builds pipelines for stream descriptors.
///
/// Holds the engine handles and a settings snapshot taken at factory
/// construction; settings changes after that never affect pipelines built
/// here.
pub struct PipelineFactory {
    media: Arc<dyn MediaEngine>,
    speech: Arc<dyn SpeechEngine>,
    settings: Settings,
}

impl PipelineFactory {
    pub fn new(
        media: Arc<dyn MediaEngine>,
        speech: Arc<dyn SpeechEngine>,
        settings: Settings,
    ) -> Self {
        Self {
            media,
            speech,
            settings,
        }
    }

    /// Build one pipeline for the descriptor, dispatched on its kind.
    pub fn create_producer_pipeline(&self, stream: &StreamDescriptor) -> Result<ProducerPipeline> {
        match stream.kind {
            StreamKind::SubtitleText => Ok(ProducerPipeline::Subtitle(SubtitlePipeline::new(
                self.media.as_ref(),
                &self.settings,
                stream,
            )?)),
            StreamKind::Audio => Ok(ProducerPipeline::Speech(SpeechPipeline::new(
                self.media.as_ref(),
                &self.speech,
                &self.settings,
                stream,
            )?)),
        }
    }

    /// Build up to `count` pipelines over equal disjoint windows of the
    /// stream, for parallel processing.
    ///
    /// When a pipeline reports no usable duration, partitioning stops:
    /// the pipelines built so far are returned as-is, the last of them
    /// covering the whole remaining stream. The caller owns the lifecycle
    /// of every returned pipeline; no ordering holds between their event
    /// streams, so events must be merged by timestamp downstream.
    pub fn create_producer_pipelines(
        &self,
        stream: &StreamDescriptor,
        count: usize,
    ) -> Result<Vec<ProducerPipeline>> {
        let mut pipelines = Vec::with_capacity(count);

        for job in 0..count {
            let mut pipeline = self.create_producer_pipeline(stream)?;
            let duration = pipeline.duration();

            if duration > 0.0 {
                let part = duration / count as f64;
                let begin = job as f64 * part;
                // The last window takes the exact duration so the windows
                // cover [0, duration] without a float-rounding gap.
                let end = if job == count - 1 {
                    duration
                } else {
                    (job + 1) as f64 * part
                };
                tracing::info!(
                    "job {}/{} time window set to {:.2} - {:.2}",
                    job + 1,
                    count,
                    begin,
                    end
                );
                pipeline.select_time_window(begin, end)?;
                pipelines.push(pipeline);
            } else {
                tracing::warn!("cannot get duration - using single pipeline");
                pipelines.push(pipeline);
                break;
            }
        }

        Ok(pipelines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::media::MockMediaEngine;
    use crate::engine::speech::MockSpeechEngine;
    use crate::error::SubalignError;

    fn factory(media: &MockMediaEngine, speech: &MockSpeechEngine) -> PipelineFactory {
        PipelineFactory::new(
            Arc::new(media.clone()),
            Arc::new(speech.clone()),
            Settings::default(),
        )
    }

    fn subtitle_stream() -> StreamDescriptor {
        StreamDescriptor::new("/media/film.mkv", 2, StreamKind::SubtitleText)
    }

    fn audio_stream() -> StreamDescriptor {
        StreamDescriptor::new("/media/film.mkv", 1, StreamKind::Audio).with_language("en")
    }

    #[test]
    fn test_dispatch_on_stream_kind() {
        let media = MockMediaEngine::new().with_duration(100.0);
        let speech = MockSpeechEngine::new();
        let factory = factory(&media, &speech);

        let mut subtitle = factory.create_producer_pipeline(&subtitle_stream()).unwrap();
        assert!(subtitle.as_subtitle_mut().is_some());

        let mut audio = factory.create_producer_pipeline(&audio_stream()).unwrap();
        assert!(audio.as_subtitle_mut().is_none());
        assert!(matches!(audio, ProducerPipeline::Speech(_)));
    }

    #[test]
    fn test_construction_error_propagates() {
        let media = MockMediaEngine::new().with_open_failure();
        let speech = MockSpeechEngine::new();
        let factory = factory(&media, &speech);

        let err = factory.create_producer_pipeline(&subtitle_stream()).unwrap_err();
        assert!(matches!(err, SubalignError::MediaOpen { .. }));
    }

    #[test]
    fn test_partitioning_covers_the_stream_with_equal_windows() {
        let media = MockMediaEngine::new().with_duration(100.0);
        let speech = MockSpeechEngine::new();
        let factory = factory(&media, &speech);

        let pipelines = factory
            .create_producer_pipelines(&subtitle_stream(), 4)
            .unwrap();
        assert_eq!(pipelines.len(), 4);

        let windows: Vec<(f64, f64)> = pipelines.iter().map(|p| p.time_window()).collect();
        assert_eq!(
            windows,
            vec![(0.0, 25.0), (25.0, 50.0), (50.0, 75.0), (75.0, 100.0)]
        );

        // Contiguous and covering [0, duration].
        for pair in windows.windows(2) {
            assert!((pair[0].1 - pair[1].0).abs() < 1e-9);
        }
        assert!((windows[0].0 - 0.0).abs() < 1e-9);
        assert!((windows[3].1 - 100.0).abs() < 1e-9);

        // Each window was forwarded to its own extractor.
        let extractors = media.extractors();
        assert_eq!(extractors.len(), 4);
        assert_eq!(extractors[0].selected_windows(), vec![(0.0, 25.0)]);
        assert_eq!(extractors[3].selected_windows(), vec![(75.0, 100.0)]);
    }

    #[test]
    fn test_partitioning_single_pipeline_keeps_whole_stream() {
        let media = MockMediaEngine::new().with_duration(100.0);
        let speech = MockSpeechEngine::new();
        let factory = factory(&media, &speech);

        let pipelines = factory
            .create_producer_pipelines(&subtitle_stream(), 1)
            .unwrap();
        assert_eq!(pipelines.len(), 1);
        assert_eq!(pipelines[0].time_window(), (0.0, 100.0));
    }

    #[test]
    fn test_partitioning_falls_back_on_unknown_duration() {
        let media = MockMediaEngine::new();
        let speech = MockSpeechEngine::new();
        let factory = factory(&media, &speech);

        let pipelines = factory
            .create_producer_pipelines(&subtitle_stream(), 3)
            .unwrap();

        // Degraded but successful: one pipeline covering the whole stream.
        assert_eq!(pipelines.len(), 1);
        assert!(media.extractors()[0].selected_windows().is_empty());
    }

    #[test]
    fn test_partitioned_speech_pipelines_share_nothing() {
        let media = MockMediaEngine::new().with_duration(60.0);
        let speech = MockSpeechEngine::new();
        let factory = factory(&media, &speech);

        let pipelines = factory
            .create_producer_pipelines(&audio_stream(), 2)
            .unwrap();
        assert_eq!(pipelines.len(), 2);

        // Two full decode chains: one per pipeline instance.
        assert_eq!(media.demuxes().len(), 2);
        assert_eq!(media.audio_decoders().len(), 2);
        assert_eq!(media.resamplers().len(), 2);
        assert_eq!(speech.recognizers().len(), 2);
    }
}
