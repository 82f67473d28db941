//! Domain models for the track list
//!
//! Field names serialize in `camelCase` to match the tracks API.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix of locally generated ids for tracks the server has not confirmed yet
pub const PLACEHOLDER_PREFIX: &str = "temp-";

static PLACEHOLDER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a placeholder id of the form `temp-<unix-millis>-<counter>`.
///
/// The counter keeps two placeholders created in the same millisecond apart.
pub fn placeholder_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = PLACEHOLDER_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}{}-{}", PLACEHOLDER_PREFIX, millis, seq)
}

/// Whether `id` was produced by [`placeholder_id`].
pub fn is_placeholder_id(id: &str) -> bool {
    let Some(rest) = id.strip_prefix(PLACEHOLDER_PREFIX) else {
        return false;
    };
    let mut parts = rest.splitn(2, '-');
    matches!(
        (parts.next(), parts.next()),
        (Some(millis), Some(seq))
            if !millis.is_empty()
                && !seq.is_empty()
                && millis.bytes().all(|b| b.is_ascii_digit())
                && seq.bytes().all(|b| b.is_ascii_digit())
    )
}

// =============================================================================
// Track
// =============================================================================

/// A track record as confirmed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Stored file name on the server, set by an upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    /// `Some("")` after the file was removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Track {
    /// Build the local stand-in shown while a create request is in flight.
    pub fn placeholder(id: String, draft: &TrackDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: draft.title.clone(),
            artist: draft.artist.clone(),
            album: draft.album.clone(),
            cover_image: draft.cover_image.clone(),
            genres: draft.genres.clone(),
            audio_file: None,
            file_url: None,
            slug: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        is_placeholder_id(&self.id)
    }

    pub fn has_audio_file(&self) -> bool {
        self.audio_file.as_deref().is_some_and(|f| !f.is_empty())
    }

    /// URL the audio file is streamed from, if one is attached.
    ///
    /// ```
    /// # use core_library::models::Track;
    /// # let mut track: Track = serde_json::from_value(serde_json::json!({
    /// #     "id": "t1", "title": "A", "artist": "B", "genres": [], "slug": "a",
    /// #     "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"
    /// # })).unwrap();
    /// track.audio_file = Some("a.mp3".to_string());
    /// assert_eq!(
    ///     track.audio_url("http://localhost:8000/").as_deref(),
    ///     Some("http://localhost:8000/api/files/a.mp3")
    /// );
    /// ```
    pub fn audio_url(&self, base_url: &str) -> Option<String> {
        let file = self.audio_file.as_deref().filter(|f| !f.is_empty())?;
        Some(format!(
            "{}/api/files/{}",
            base_url.trim_end_matches('/'),
            file
        ))
    }

    /// Case-insensitive substring match on title, artist or album.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.artist.to_lowercase().contains(&needle)
            || self
                .album
                .as_deref()
                .is_some_and(|album| album.to_lowercase().contains(&needle))
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.artist, self.title, self.id)
    }
}

// =============================================================================
// Create payload
// =============================================================================

/// Fields a client supplies when creating a track.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDraft {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl TrackDraft {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            ..Default::default()
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_cover_image(mut self, url: impl Into<String>) -> Self {
        self.cover_image = Some(url.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the draft before it is sent anywhere.
    ///
    /// Returns the offending field name and a message.
    pub fn validate(&self) -> Result<(), (&'static str, String)> {
        if self.title.trim().is_empty() {
            return Err(("title", "Track title cannot be empty".to_string()));
        }

        if self.artist.trim().is_empty() {
            return Err(("artist", "Track artist cannot be empty".to_string()));
        }

        if self.genres.iter().any(|g| g.trim().is_empty()) {
            return Err(("genres", "Genre names cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl From<&Track> for TrackDraft {
    fn from(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            cover_image: track.cover_image.clone(),
            genres: track.genres.clone(),
        }
    }
}

// =============================================================================
// Upload payload
// =============================================================================

/// An audio file picked by the user, ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl AudioUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn validate(&self) -> Result<(), (&'static str, String)> {
        if self.file_name.trim().is_empty() {
            return Err(("file_name", "File name cannot be empty".to_string()));
        }
        if self.is_empty() {
            return Err(("bytes", "Audio file is empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for AudioUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// =============================================================================
// Bulk delete
// =============================================================================

/// Per-id outcome of a bulk delete, when the server reports one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkDeleteReport {
    #[serde(default)]
    pub success: Vec<String>,
    #[serde(default)]
    pub failed: Vec<String>,
}

impl BulkDeleteReport {
    /// Report for a request the server accepted without detail.
    pub fn all_succeeded(ids: &[String]) -> Self {
        Self {
            success: ids.to_vec(),
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
