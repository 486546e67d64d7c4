//! Subtitle decoding pipeline.
//!
//! Demux --> SubtitleDecoder --[words, subs]--> ...

use crate::config::Settings;
use crate::engine::decoder::SubtitleDecoder;
use crate::engine::demux::Demux;
use crate::engine::events::{EosCallback, ErrorCallback, SubsCallback, WordsCallback};
use crate::engine::media::MediaEngine;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::pipeline::base::PipelineCore;
use crate::stream::StreamDescriptor;
use std::sync::Arc;

/// Pipeline decoding a text subtitle track into words and cues.
pub struct SubtitlePipeline {
    core: PipelineCore,
    decoder: Arc<dyn SubtitleDecoder>,
}

impl SubtitlePipeline {
    /// Build the decode graph for a subtitle stream.
    ///
    /// The minimum word length comes from the settings snapshot; an explicit
    /// text encoding in the descriptor overrides the decoder's
    /// autodetection.
    pub fn new(
        engine: &dyn MediaEngine,
        settings: &Settings,
        stream: &StreamDescriptor,
    ) -> Result<Self> {
        let core = PipelineCore::new(engine, stream)?;

        let decoder = engine.create_subtitle_decoder()?;
        decoder.set_min_word_len(settings.min_word_len);
        if let Some(encoding) = &stream.encoding {
            decoder.set_encoding(encoding);
        }

        core.demux()
            .connect_decoder(decoder.clone(), stream.stream_index)?;

        Ok(Self { core, decoder })
    }

    /// Register the per-cue callback; `None` detaches.
    pub fn connect_subs_callback(&mut self, cb: Option<SubsCallback>) {
        self.decoder.connect_subs_callback(cb);
    }
}

impl Pipeline for SubtitlePipeline {
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
        self.decoder.connect_words_callback(cb);
    }

    fn destroy(&mut self) {
        self.decoder.connect_words_callback(None);
        self.decoder.connect_subs_callback(None);
        self.core.destroy();
    }
}

impl Drop for SubtitlePipeline {
    fn drop(&mut self) {
        self.destroy();
    }
}
