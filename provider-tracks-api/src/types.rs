//! Tracks API request and error body types

use serde::{Deserialize, Serialize};

/// Body of `POST /api/tracks/delete`
#[derive(Debug, Serialize)]
pub struct DeleteTracksRequest<'a> {
    pub ids: &'a [String],
}

/// Error body returned with non-2xx statuses
///
/// The backend answers either `{ "error": "..." }` or `{ "message": "..." }`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Best human-readable message for a failed response body.
    pub fn message_from(body: &[u8]) -> String {
        let parsed: ApiErrorBody = serde_json::from_slice(body).unwrap_or_default();
        parsed
            .error
            .or(parsed.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if text.is_empty() {
                    "no response body".to_string()
                } else {
                    text
                }
            })
    }
}
