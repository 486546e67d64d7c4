//! Error types for subalign.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubalignError {
    // Pipeline construction errors
    #[error("Failed to open media at {path}: {message}")]
    MediaOpen { path: String, message: String },

    #[error("No speech model available for language {language}: {message}")]
    ModelLoad { language: String, message: String },

    #[error("Not supported stream type: {kind}")]
    UnsupportedStreamType { kind: String },

    // Lifecycle errors
    #[error("Invalid pipeline state: {message}")]
    InvalidState { message: String },

    #[error("Invalid time window: {begin} - {end}")]
    InvalidTimeWindow { begin: f64, end: f64 },

    // Stage creation/wiring failures surfaced by the engine
    #[error("Engine error: {message}")]
    Engine { message: String },

    // Settings errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SubalignError>;
