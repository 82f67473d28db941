//! # Tracks REST Provider
//!
//! Implements `TrackGateway` for the tracks backend's REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Endpoint mapping for listing, lookup, CRUD, bulk delete and file operations
//! - Multipart audio uploads
//! - Mapping of HTTP statuses and bridge failures to `TransportError`
//!
//! Every call is a single attempt; responses are returned as raw JSON for the
//! store to validate.

pub mod error;
pub mod gateway;
pub mod types;

pub use error::{Result, TracksApiError};
pub use gateway::RestTrackGateway;
