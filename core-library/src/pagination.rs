//! Pagination types for the track listing
//!
//! Pages are 1-based, matching the tracks API.

use crate::models::Track;
use serde::{Deserialize, Serialize};

/// Page count for `total` items at `limit` per page; 0 when `limit` is 0.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        0
    } else {
        ((total as f64) / (limit as f64)).ceil() as u32
    }
}

/// The pagination cursor of the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    /// Current page number (1-based)
    pub page: u32,
    /// Number of tracks per page
    pub limit: u32,
    /// Server-reported total across all pages
    pub total_tracks: u64,
}

impl PageState {
    /// Create a cursor with an unknown total
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::pagination::PageState;
    ///
    /// let state = PageState::new(1, 10);
    /// assert_eq!(state.total_tracks, 0);
    /// assert_eq!(state.total_pages(), 0);
    /// ```
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            total_tracks: 0,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_tracks, self.limit)
    }

    /// Check if there are more pages after the current one
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there are pages before the current one
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// `meta` block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// A validated list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPage {
    pub data: Vec<Track>,
    pub meta: PageMeta,
}

impl TrackPage {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
