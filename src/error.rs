//! Error types for scene-echo

use thiserror::Error;

/// Result type alias for scene-echo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the scene-echo pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing or invalid credential)
    #[error("configuration error: {0}")]
    Config(String),

    /// Request body is not a well-formed multipart upload
    #[error("bad request format: {0}")]
    RequestFormat(String),

    /// Uploaded image exceeds the per-request size cap
    #[error("image exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    /// Inference credential rejected by the upstream service
    #[error("auth error: {0}")]
    Auth(String),

    /// Inference or other upstream service failure
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Client-side transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio decode or playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
