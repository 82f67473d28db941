//! # Playback Coordination Module
//!
//! Guarantees that at most one track is playing across every row player of
//! a session.
//!
//! ## Overview
//!
//! - `PlaybackCoordinator` owns the single active-track slot
//! - `RowPlayback` is the per-row view used by list players
//! - Transitions are published as `PlaybackEvent`s when an event bus is attached

pub mod coordinator;
pub mod error;

pub use coordinator::{PlaybackCoordinator, PlaybackState, RowPlayback};
pub use error::{PlaybackError, Result};
