//! Error types for the emotion client.

use thiserror::Error;

/// Errors surfaced by [`EmotionClient`](crate::EmotionClient).
#[derive(Error, Debug)]
pub enum EmotionError {
    /// No API key was configured at call time. No network I/O is attempted.
    #[error("no API key configured")]
    MissingCredential,

    /// Connection failure, DNS failure, timeout, or TLS failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EmotionError {
    /// Check if this error is retryable by the caller.
    ///
    /// Only transport failures are; a missing credential or bad
    /// configuration will fail the same way every time.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result type for emotion client operations.
pub type EmotionResult<T> = Result<T, EmotionError>;
