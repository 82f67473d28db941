//! Structural validation of raw gateway payloads.
//!
//! Gateways hand back untrusted `serde_json::Value`s. Nothing reaches the
//! store's state until it has passed one of the functions here. Every
//! malformed field is reported, not only the first one.

use crate::error::{FieldIssue, ValidationError};
use crate::models::{BulkDeleteReport, Track};
use crate::pagination::{PageMeta, TrackPage};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Collects issues under a JSON path prefix.
struct Checker {
    issues: Vec<FieldIssue>,
}

impl Checker {
    fn new() -> Self {
        Self { issues: Vec::new() }
    }

    fn push(&mut self, path: String, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            path,
            message: message.into(),
        });
    }

    fn finish<T>(self, shape: &str, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) if self.issues.is_empty() => Ok(value),
            _ => Err(ValidationError {
                shape: shape.to_string(),
                issues: self.issues,
            }),
        }
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                self.push(path.to_string(), format!("expected object, got {}", kind(value)));
                None
            }
        }
    }

    fn string(&mut self, map: &Map<String, Value>, base: &str, key: &str) -> Option<String> {
        let path = join(base, key);
        match map.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.push(path, format!("expected string, got {}", kind(other)));
                None
            }
            None => {
                self.push(path, "required");
                None
            }
        }
    }

    fn non_empty_string(
        &mut self,
        map: &Map<String, Value>,
        base: &str,
        key: &str,
    ) -> Option<String> {
        let value = self.string(map, base, key)?;
        if value.trim().is_empty() {
            self.push(join(base, key), "must not be empty");
            return None;
        }
        Some(value)
    }

    /// Absent and `null` both read as `None`.
    fn optional_string(
        &mut self,
        map: &Map<String, Value>,
        base: &str,
        key: &str,
    ) -> Option<Option<String>> {
        match map.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(other) => {
                self.push(
                    join(base, key),
                    format!("expected string, got {}", kind(other)),
                );
                None
            }
        }
    }

    fn optional_url(
        &mut self,
        map: &Map<String, Value>,
        base: &str,
        key: &str,
    ) -> Option<Option<String>> {
        let value = self.optional_string(map, base, key)?;
        if let Some(url) = value.as_deref() {
            if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
                self.push(join(base, key), "expected an http(s) URL");
                return None;
            }
        }
        Some(value)
    }

    fn string_array(&mut self, value: &Value, path: &str) -> Option<Vec<String>> {
        let Some(items) = value.as_array() else {
            self.push(path.to_string(), format!("expected array, got {}", kind(value)));
            return None;
        };

        let before = self.issues.len();
        let strings: Vec<String> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match item {
                Value::String(s) => Some(s.clone()),
                other => {
                    self.push(
                        format!("{}[{}]", path, i),
                        format!("expected string, got {}", kind(other)),
                    );
                    None
                }
            })
            .collect();

        (self.issues.len() == before).then_some(strings)
    }

    fn timestamp(
        &mut self,
        map: &Map<String, Value>,
        base: &str,
        key: &str,
    ) -> Option<DateTime<Utc>> {
        let raw = self.string(map, base, key)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                self.push(join(base, key), format!("invalid timestamp: {}", e));
                None
            }
        }
    }

    fn count(&mut self, map: &Map<String, Value>, base: &str, key: &str) -> Option<u64> {
        let path = join(base, key);
        match map.get(key) {
            Some(value) => match value.as_u64() {
                Some(n) => Some(n),
                None => {
                    self.push(
                        path,
                        format!("expected non-negative integer, got {}", kind(value)),
                    );
                    None
                }
            },
            None => {
                self.push(path, "required");
                None
            }
        }
    }

    /// A count that must also fit the `u32` page cursor.
    fn page_number(&mut self, map: &Map<String, Value>, base: &str, key: &str) -> Option<u32> {
        let n = self.count(map, base, key)?;
        match u32::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                self.push(join(base, key), "out of range for u32");
                None
            }
        }
    }

    fn track(&mut self, value: &Value, base: &str) -> Option<Track> {
        let map = self.object(value, base)?;

        let id = self.non_empty_string(map, base, "id");
        let title = self.string(map, base, "title");
        let artist = self.string(map, base, "artist");
        let album = self.optional_string(map, base, "album");
        let cover_image = self.optional_url(map, base, "coverImage");
        let genres = match map.get("genres") {
            Some(value) => self.string_array(value, &join(base, "genres")),
            None => {
                self.push(join(base, "genres"), "required");
                None
            }
        };
        let audio_file = self.optional_string(map, base, "audioFile");
        let file_url = self.optional_string(map, base, "fileUrl");
        let slug = self.string(map, base, "slug");
        let created_at = self.timestamp(map, base, "createdAt");
        let updated_at = self.timestamp(map, base, "updatedAt");

        Some(Track {
            id: id?,
            title: title?,
            artist: artist?,
            album: album?,
            cover_image: cover_image?,
            genres: genres?,
            audio_file: audio_file?,
            file_url: file_url?,
            slug: slug?,
            created_at: created_at?,
            updated_at: updated_at?,
        })
    }
}

fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", base, key)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a single track payload.
pub fn validate_track(raw: &Value) -> Result<Track, ValidationError> {
    let mut checker = Checker::new();
    let track = checker.track(raw, "");
    checker.finish("Track", track)
}

/// Validate a list response: `{ data: Track[], meta: { total, page, limit, totalPages } }`.
pub fn validate_track_page(raw: &Value) -> Result<TrackPage, ValidationError> {
    let mut checker = Checker::new();

    let page = checker.object(raw, "").and_then(|map| {
        let data = match map.get("data") {
            Some(Value::Array(items)) => {
                let tracks: Vec<Option<Track>> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| checker.track(item, &format!("data[{}]", i)))
                    .collect();
                tracks.into_iter().collect::<Option<Vec<_>>>()
            }
            Some(other) => {
                checker.push("data".to_string(), format!("expected array, got {}", kind(other)));
                None
            }
            None => {
                checker.push("data".to_string(), "required");
                None
            }
        };

        let meta = match map.get("meta") {
            Some(value) => checker.object(value, "meta").and_then(|meta| {
                let total = checker.count(meta, "meta", "total");
                let page = checker.page_number(meta, "meta", "page");
                let limit = checker.page_number(meta, "meta", "limit");
                let total_pages = checker.page_number(meta, "meta", "totalPages");
                Some(PageMeta {
                    total: total?,
                    page: page?,
                    limit: limit?,
                    total_pages: total_pages?,
                })
            }),
            None => {
                checker.push("meta".to_string(), "required");
                None
            }
        };

        Some(TrackPage {
            data: data?,
            meta: meta?,
        })
    });

    if let Some(page) = &page {
        let mut seen = std::collections::HashSet::new();
        for (i, track) in page.data.iter().enumerate() {
            if !seen.insert(track.id.as_str()) {
                checker.push(format!("data[{}].id", i), "duplicate id in page");
            }
        }
    }

    checker.finish("TracksResponse", page)
}

/// Validate the genre list.
pub fn validate_genres(raw: &Value) -> Result<Vec<String>, ValidationError> {
    let mut checker = Checker::new();
    let genres = checker.string_array(raw, "");
    checker.finish("Genres", genres)
}

/// Interpret a bulk delete response.
///
/// Bodies without a `success`/`failed` report (empty, `null`, other shapes)
/// mean every requested id was deleted.
pub fn validate_bulk_delete(
    raw: &Value,
    requested: &[String],
) -> Result<BulkDeleteReport, ValidationError> {
    let Some(map) = raw.as_object() else {
        return Ok(BulkDeleteReport::all_succeeded(requested));
    };
    if !map.contains_key("success") && !map.contains_key("failed") {
        return Ok(BulkDeleteReport::all_succeeded(requested));
    }

    let mut checker = Checker::new();
    let success = match map.get("success") {
        Some(value) => checker.string_array(value, "success"),
        None => Some(Vec::new()),
    };
    let failed = match map.get("failed") {
        Some(value) => checker.string_array(value, "failed"),
        None => Some(Vec::new()),
    };

    let report = success
        .zip(failed)
        .map(|(success, failed)| BulkDeleteReport { success, failed });
    checker.finish("BulkDeleteResponse", report)
}
