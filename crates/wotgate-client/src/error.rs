//! Error types for Thing client operations

use thiserror::Error;

/// Result type alias for Thing client operations
pub type Result<T> = std::result::Result<T, ThingClientError>;

/// Errors that can occur while talking to a Thing
#[derive(Error, Debug)]
pub enum ThingClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// IO error (UDP socket, name resolution)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Thing answered with a non-success status
    #[error("Thing returned status {status}: {message}")]
    StatusError { status: String, message: String },

    /// CoAP message could not be encoded or decoded
    #[error("CoAP error: {0}")]
    CoapError(String),

    /// URL cannot be used for this protocol
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl ThingClientError {
    /// Create a status error from a status and message
    pub fn status_error(status: impl ToString, message: impl Into<String>) -> Self {
        Self::StatusError {
            status: status.to_string(),
            message: message.into(),
        }
    }
}
