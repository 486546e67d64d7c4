//! Channel-map recomputation policy.
//!
//! The decision of which map to apply on a format change is a pure function
//! of the stream's channel selection and the observed input format, kept
//! separate from the resampler callback plumbing so it can be tested
//! directly.

use crate::engine::format::{AudioFormat, ChannelMap};
use crate::engine::speech::SpeechEngine;
use crate::stream::ChannelSelection;

/// Map to apply for an observed input format, or `None` for "do not change".
///
/// An explicit selection is configured once at construction and never
/// recomputed. The dynamic selections always produce a map: when the
/// engine's heuristic finds none, the empty map is applied as explicit
/// silence rather than leaving a stale mapping in place.
pub fn remap_for_format(
    selection: &ChannelSelection,
    speech: &dyn SpeechEngine,
    format: &AudioFormat,
) -> Option<ChannelMap> {
    match selection {
        ChannelSelection::Mixdown => {
            Some(speech.default_channel_map(format).unwrap_or_default())
        }
        ChannelSelection::All => Some(speech.all_channels_map(format).unwrap_or_default()),
        ChannelSelection::Explicit(_) => None,
    }
}
