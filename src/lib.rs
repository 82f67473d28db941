//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-library`, `core-playback`). Host
//! applications can depend on `tracklist-workspace` and enable the documented
//! features without needing to wire each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "store-only")]
pub use core_library as library;

#[cfg(feature = "playback-only")]
pub use core_playback as playback;
