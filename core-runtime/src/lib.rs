//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the track manager core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the store, the playback
//! coordinator and the session façade depend on. It establishes the logging
//! conventions and the event broadcasting used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
