//! Client-side filtering and sorting over the cached track window.

use crate::models::Track;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Column a track list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Title,
    Artist,
    Album,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Filter options for querying the cached tracks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackQuery {
    /// Case-insensitive substring of title, artist or album
    pub search: Option<String>,
    /// Exact genre name
    pub genre: Option<String>,
    /// Exact artist name
    pub artist: Option<String>,
    pub sort: Option<(SortField, SortOrder)>,
}

impl TrackQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn sort_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = Some((field, order));
        self
    }

    pub fn matches(&self, track: &Track) -> bool {
        if let Some(needle) = &self.search {
            if !track.matches_search(needle) {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            if !track.genres.iter().any(|g| g == genre) {
                return false;
            }
        }
        if let Some(artist) = &self.artist {
            if &track.artist != artist {
                return false;
            }
        }
        true
    }

    /// Apply the filter and sort to `tracks`. Sorting is stable.
    pub fn apply<'a, I>(&self, tracks: I) -> Vec<Track>
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let mut result: Vec<Track> = tracks
            .into_iter()
            .filter(|track| self.matches(track))
            .cloned()
            .collect();

        if let Some((field, order)) = self.sort {
            result.sort_by(|a, b| {
                let ordering = compare(a, b, field);
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        result
    }
}

fn compare(a: &Track, b: &Track, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::Artist => a.artist.to_lowercase().cmp(&b.artist.to_lowercase()),
        // Tracks without an album sort last in ascending order
        SortField::Album => match (&a.album, &b.album) {
            (Some(x), Some(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Distinct artists in first-seen order.
pub fn distinct_artists<'a, I>(tracks: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Track>,
{
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|track| seen.insert(track.artist.as_str()))
        .map(|track| track.artist.clone())
        .collect()
}
