//! # Core Configuration Module
//!
//! Provides configuration management for the track manager core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the HTTP transport and the paging settings used by the
//! track store. It enforces fail-fast validation so a session never starts
//! without a usable transport.
//!
//! ## Required Settings
//!
//! - `api_base_url` - Root of the tracks REST API (e.g. `http://localhost:8000`)
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("http://localhost:8000")
//!     .page_size(20)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing base URL
//! let config = CoreConfig::builder()
//!     .page_size(20)
//!     .build()
//!     .expect("Should fail - missing api_base_url");
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_INITIAL_PAGE: u32 = 1;
pub const DEFAULT_BULK_FETCH_LIMIT: u32 = 100;
pub const DEFAULT_MAX_BULK_PAGES: u32 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Core configuration for the track manager.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Root URL of the tracks API, without trailing slash
    pub api_base_url: String,

    /// Tracks per page for the visible listing
    pub page_size: u32,

    /// Page the listing starts on
    pub initial_page: u32,

    /// Page size used when enumerating every track for "remove all"
    pub bulk_fetch_limit: u32,

    /// Upper bound on pages walked by "remove all"
    pub max_bulk_pages: u32,

    /// Per-request timeout handed to the gateway
    pub request_timeout: Duration,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,

    /// HTTP transport
    pub http_client: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("page_size", &self.page_size)
            .field("initial_page", &self.initial_page)
            .field("bulk_fetch_limit", &self.bulk_fetch_limit)
            .field("max_bulk_pages", &self.max_bulk_pages)
            .field("request_timeout", &self.request_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The base URL is an http(s) URL
    /// - Page sizes and bounds are non-zero
    /// - The request timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }

        if self.page_size == 0 {
            return Err(Error::Config("Page size must be greater than 0".to_string()));
        }

        if self.initial_page == 0 {
            return Err(Error::Config(
                "Initial page must be 1 or greater (pages are 1-based)".to_string(),
            ));
        }

        if self.bulk_fetch_limit == 0 {
            return Err(Error::Config(
                "Bulk fetch limit must be greater than 0".to_string(),
            ));
        }

        if self.max_bulk_pages == 0 {
            return Err(Error::Config(
                "Max bulk pages must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the tracks API. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Other hosts: inject a platform HTTP client with .http_client()."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    page_size: Option<u32>,
    initial_page: Option<u32>,
    bulk_fetch_limit: Option<u32>,
    max_bulk_pages: Option<u32>,
    request_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl CoreConfigBuilder {
    /// Sets the API base URL. A trailing `/` is stripped.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .api_base_url("http://localhost:8000/");
    /// ```
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Sets the listing page size.
    ///
    /// Default: 10
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Sets the starting page.
    ///
    /// Default: 1
    pub fn initial_page(mut self, page: u32) -> Self {
        self.initial_page = Some(page);
        self
    }

    /// Sets the page size used while enumerating ids for "remove all".
    ///
    /// Default: 100
    pub fn bulk_fetch_limit(mut self, limit: u32) -> Self {
        self.bulk_fetch_limit = Some(limit);
        self
    }

    /// Sets the page bound for "remove all" enumeration.
    ///
    /// Default: 1000
    pub fn max_bulk_pages(mut self, pages: u32) -> Self {
        self.max_bulk_pages = Some(pages);
        self
    }

    /// Sets the per-request timeout.
    ///
    /// Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the event bus capacity.
    ///
    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default is used when the `desktop-shims`
    /// feature is enabled; otherwise [`build()`](Self::build) fails.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - `api_base_url` is missing or malformed
    /// - No `HttpClient` is available
    /// - Numeric settings are zero
    pub fn build(self) -> Result<CoreConfig> {
        let api_base_url = self.api_base_url.ok_or_else(|| {
            Error::Config(
                "API base URL is required. Use .api_base_url() to set it.".to_string(),
            )
        })?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let config = CoreConfig {
            api_base_url,
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            initial_page: self.initial_page.unwrap_or(DEFAULT_INITIAL_PAGE),
            bulk_fetch_limit: self.bulk_fetch_limit.unwrap_or(DEFAULT_BULK_FETCH_LIMIT),
            max_bulk_pages: self.max_bulk_pages.unwrap_or(DEFAULT_MAX_BULK_PAGES),
            request_timeout,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
        };

        config.validate()?;

        Ok(config)
    }
}
