//! Error types for the tracks REST provider

use bridge_traits::error::BridgeError;
use core_library::TransportError;
use thiserror::Error;

/// Tracks API provider errors
#[derive(Error, Debug)]
pub enum TracksApiError {
    /// The server answered with a non-2xx status
    #[error("Tracks API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// The request could not be encoded
    #[error("Failed to encode request: {0}")]
    EncodeError(String),

    /// The response body is not JSON
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for tracks API operations
pub type Result<T> = std::result::Result<T, TracksApiError>;

impl From<TracksApiError> for TransportError {
    fn from(error: TracksApiError) -> Self {
        match error {
            TracksApiError::ApiError {
                status_code,
                message,
            } => TransportError::Status {
                status: status_code,
                message,
            },
            TracksApiError::EncodeError(msg) => TransportError::Network(msg),
            TracksApiError::ParseError(msg) => TransportError::Decode(msg),
            TracksApiError::BridgeError(BridgeError::Timeout(_)) => TransportError::Timeout,
            TracksApiError::BridgeError(e) => TransportError::Network(e.to_string()),
        }
    }
}
