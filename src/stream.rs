//! Stream descriptors handed to pipeline construction.

use crate::error::{Result, SubalignError};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kind of media stream a pipeline is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Text subtitle track, decoded directly into words and cues.
    SubtitleText,
    /// Audio track, run through speech recognition.
    Audio,
}

impl FromStr for StreamKind {
    type Err = SubalignError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "subtitle/text" => Ok(StreamKind::SubtitleText),
            "audio" => Ok(StreamKind::Audio),
            other => Err(SubalignError::UnsupportedStreamType {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::SubtitleText => write!(f, "subtitle/text"),
            StreamKind::Audio => write!(f, "audio"),
        }
    }
}

/// How audio channels are combined before recognition.
///
/// `Mixdown` leaves the choice to the engine's default heuristic for the
/// observed input format. `All` passes every input channel through without
/// mixing. `Explicit` selects a fixed set of input channels up front.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelSelection {
    #[default]
    Mixdown,
    All,
    Explicit(Vec<u32>),
}

/// Descriptor of a single stream within a media container.
///
/// Immutable once handed to pipeline construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Path to the media container.
    pub path: PathBuf,
    /// Index of the stream within the container.
    pub stream_index: u32,
    /// Stream kind, selecting the pipeline variant.
    pub kind: StreamKind,
    /// Language code (e.g. "en", "pl"), when known.
    pub language: Option<String>,
    /// Explicit text encoding, subtitle streams only.
    pub encoding: Option<String>,
    /// Audio channel selection, audio streams only.
    pub channels: ChannelSelection,
}

impl StreamDescriptor {
    /// Create a descriptor with no language, default encoding, and the
    /// default channel mix-down.
    pub fn new(path: impl Into<PathBuf>, stream_index: u32, kind: StreamKind) -> Self {
        Self {
            path: path.into(),
            stream_index,
            kind,
            language: None,
            encoding: None,
            channels: ChannelSelection::Mixdown,
        }
    }

    /// Set the stream language.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    /// Set an explicit subtitle text encoding.
    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.encoding = Some(encoding.to_string());
        self
    }

    /// Set the audio channel selection.
    pub fn with_channels(mut self, channels: ChannelSelection) -> Self {
        self.channels = channels;
        self
    }
}
