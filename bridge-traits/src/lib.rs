//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the track manager core and the
//! host-specific transport. The core never opens sockets itself: every remote
//! call goes through an injected [`HttpClient`](http::HttpClient).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations (JSON and multipart bodies)
//!
//! ## Platform Requirements
//!
//! Desktop hosts use `bridge-desktop`. Any other host injects its own
//! `HttpClient` through `CoreConfig`.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Keep HTTP error statuses in the response (they are not transport failures)
//! - Include error context (e.g., URL, timeout)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so a single client can be
//! shared by every gateway of a session.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{FilePart, HttpBody, HttpClient, HttpMethod, HttpRequest, HttpResponse};
