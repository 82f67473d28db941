//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{FilePart, HttpBody, HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::{multipart, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - JSON and multipart request bodies
/// - TLS support by default
///
/// Each request is attempted exactly once.
pub struct ReqwestHttpClient {
    client: Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("track-manager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, timeout })
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    fn file_form(part: FilePart) -> Result<multipart::Form> {
        let field = multipart::Part::bytes(part.bytes.to_vec())
            .file_name(part.file_name)
            .mime_str(&part.content_type)
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Invalid content type: {}", e))
            })?;

        Ok(multipart::Form::new().part(part.field_name, field))
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> Result<reqwest::RequestBuilder> {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        match request.body {
            Some(HttpBody::Bytes(bytes)) => req = req.body(bytes),
            Some(HttpBody::Multipart(part)) => req = req.multipart(Self::file_form(part)?),
            None => {}
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        Ok(req)
    }

    fn map_send_error(&self, error: reqwest::Error, timeout: Option<Duration>) -> BridgeError {
        if error.is_timeout() {
            BridgeError::Timeout(timeout.unwrap_or(self.timeout))
        } else if error.is_connect() {
            BridgeError::Connection(error.to_string())
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = ?request.method, url = %request.url, "Executing HTTP request");

        let timeout = request.timeout;
        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "HTTP request failed");
                self.map_send_error(e, timeout)
            })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        debug!(status, bytes = body.len(), "HTTP response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = ReqwestHttpClient::new().unwrap();
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Post),
            reqwest::Method::POST
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Delete),
            reqwest::Method::DELETE
        );
    }

    #[test]
    fn test_build_request_applies_query_and_headers() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = HttpRequest::new(HttpMethod::Get, "http://localhost:8000/api/tracks")
            .query_param("page", 3)
            .query_param("limit", 25)
            .header("Accept", "application/json");

        let built = client.build_request(request).unwrap().build().unwrap();

        assert_eq!(built.method(), reqwest::Method::GET);
        assert_eq!(built.url().query(), Some("page=3&limit=25"));
        assert_eq!(built.headers()["accept"], "application/json");
    }

    #[test]
    fn test_build_request_rejects_bad_content_type() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = HttpRequest::new(HttpMethod::Post, "http://localhost:8000/api/tracks/t1/upload")
            .multipart(FilePart {
                field_name: "file".to_string(),
                file_name: "song.mp3".to_string(),
                content_type: "not a mime".to_string(),
                bytes: Bytes::from_static(b"ID3"),
            });

        assert!(client.build_request(request).is_err());
    }
}
