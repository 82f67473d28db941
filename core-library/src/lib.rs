//! # Track Library Module
//!
//! Owns the client-side view of the remote track collection.
//!
//! ## Overview
//!
//! This module provides:
//! - Domain models (`Track`, `TrackDraft`, `AudioUpload`)
//! - Pagination types for the 1-based track listing
//! - Structural validation of untrusted gateway payloads
//! - The `TrackGateway` contract implemented by providers
//! - `TrackStore`, the optimistic store the UI renders from
//! - Client-side search, filtering and sorting of the cached window

pub mod error;
pub mod gateway;
pub mod models;
pub mod pagination;
pub mod query;
pub mod store;
pub mod validation;

pub use error::{FieldIssue, Result, StoreError, TransportError, ValidationError};
pub use gateway::{GatewayResult, TrackGateway};
pub use models::{is_placeholder_id, AudioUpload, BulkDeleteReport, Track, TrackDraft};
pub use pagination::{PageMeta, PageState, TrackPage};
pub use query::{SortField, SortOrder, TrackQuery};
pub use store::{FetchOutcome, StoreSettings, TrackListState, TrackStore};
