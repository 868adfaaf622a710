//! Error types for the FFF provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// FFF provider errors
#[derive(Error, Debug)]
pub enum FffError {
    /// API answered with a non-success status
    #[error("FFF API error (status {status_code}) for {url}: {message}")]
    ApiError {
        status_code: u16,
        url: String,
        message: String,
    },

    /// Body was not valid JSON or an item did not match the record shape
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// JSON was valid but not a shape we know how to read
    #[error("Unexpected payload shape from {url}: {detail}")]
    UnexpectedShape { url: String, detail: String },

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for FFF operations
pub type Result<T> = std::result::Result<T, FffError>;

impl From<FffError> for BridgeError {
    fn from(error: FffError) -> Self {
        match error {
            FffError::ApiError {
                status_code,
                url,
                message,
            } => BridgeError::SourceUnavailable(format!(
                "API error (status {}) for {}: {}",
                status_code, url, message
            )),
            FffError::ParseError(msg) => BridgeError::MalformedPayload(msg),
            FffError::UnexpectedShape { url, detail } => {
                BridgeError::MalformedPayload(format!("{}: {}", url, detail))
            }
            FffError::BridgeError(e) => e,
        }
    }
}
