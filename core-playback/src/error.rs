//! # Playback Error Types

use thiserror::Error;

/// Errors that can occur during playback coordination.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The id cannot name a track (blank).
    #[error("Invalid track id: {0:?}")]
    InvalidTrackId(String),
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
