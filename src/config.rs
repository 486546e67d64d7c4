//! Read-only settings consumed at pipeline construction time.
//!
//! Pipelines copy the values they need when they are built; later changes to
//! a settings file or environment never affect already-constructed pipelines.

use crate::defaults;
use crate::error::{Result, SubalignError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Word filtering settings applied to decode and recognition stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Minimum accepted word length, in characters.
    pub min_word_len: usize,
    /// Minimum accepted word recognition probability.
    pub min_word_prob: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_word_len: defaults::MIN_WORD_LEN,
            min_word_prob: defaults::MIN_WORD_PROB,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Load settings from a file or return defaults if the file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SUBALIGN_MIN_WORD_LEN → min_word_len
    /// - SUBALIGN_MIN_WORD_PROB → min_word_prob
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(len) = std::env::var(format!("{}_MIN_WORD_LEN", defaults::ENV_PREFIX))
            && let Ok(len) = len.parse::<usize>()
        {
            self.min_word_len = len;
        }
        if let Ok(prob) = std::env::var(format!("{}_MIN_WORD_PROB", defaults::ENV_PREFIX))
            && let Ok(prob) = prob.parse::<f32>()
        {
            self.min_word_prob = prob;
        }
        self
    }

    /// Validate settings values
    ///
    /// # Errors
    /// Returns `SubalignError::ConfigInvalidValue` for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_word_prob) {
            return Err(SubalignError::ConfigInvalidValue {
                key: "min_word_prob".to_string(),
                message: format!("must be within 0.0 - 1.0, got {}", self.min_word_prob),
            });
        }
        Ok(())
    }
}
