//! Error types for the wishlist kiosk

use thiserror::Error;

/// Result type alias for kiosk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the kiosk
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A recognizer could not prepare its vocabulary constraints
    #[error("{recognizer} recognizer unavailable: {reason}")]
    ConstraintCompilation {
        /// Which recognizer failed ("name" or "item")
        recognizer: &'static str,
        /// Why the constraints were rejected
        reason: String,
    },

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Wake source error
    #[error("wake source error: {0}")]
    Wake(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
