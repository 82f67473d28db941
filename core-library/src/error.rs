//! Error taxonomy of the track store.
//!
//! Gateway failures arrive as [`TransportError`], rejected payloads as
//! [`ValidationError`]. Everything a store operation can return is folded into
//! [`StoreError`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A gateway call that produced no usable response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Malformed response body: {0}")]
    Decode(String),
}

/// One malformed field of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// JSON path of the field, e.g. `data[2].genres[0]`
    pub path: String,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A payload that parsed as JSON but does not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{shape} failed validation: {}", format_issues(.issues))]
pub struct ValidationError {
    /// Name of the expected shape (`Track`, `TracksResponse`, ...)
    pub shape: String,
    pub issues: Vec<FieldIssue>,
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An optimistic assumption about the local list did not hold.
    #[error("State conflict on track {id}: {reason}")]
    StateConflict { id: String, reason: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Gave up enumerating tracks after {pages} pages ({accumulated} of {total} collected)")]
    PagingLimitExceeded {
        pages: u32,
        accumulated: usize,
        total: u64,
    },

    #[error("Bulk delete partially failed: {} deleted, {} failed", .deleted.len(), .failed.len())]
    PartialDelete {
        deleted: Vec<String>,
        failed: Vec<String>,
    },
}

impl StoreError {
    /// True for failures raised by the remote side rather than local checks.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            StoreError::Transport(_) | StoreError::Validation(_) | StoreError::PartialDelete { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
