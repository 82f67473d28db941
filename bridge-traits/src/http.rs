//! HTTP Client Abstraction
//!
//! Provides async HTTP operations with JSON and multipart bodies.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// A single file field of a `multipart/form-data` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Request payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpBody {
    /// Raw bytes; the `Content-Type` header describes them
    Bytes(Bytes),
    /// Multipart form with one file field; the client sets the boundary header
    Multipart(FilePart),
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
    pub body: Option<HttpBody>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Append a query parameter; the client is responsible for encoding
    pub fn query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_vec(body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON serialization failed: {}", e))
        })?;
        self.body = Some(HttpBody::Bytes(Bytes::from(json)));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn multipart(mut self, part: FilePart) -> Self {
        self.body = Some(HttpBody::Multipart(part));
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Async HTTP client trait
///
/// This trait abstracts HTTP operations to allow platform-specific implementations.
/// Implementations should:
/// - Return `Ok` for every response that arrived, whatever its status
/// - Return `Err` only when no response could be obtained (DNS, TLS, timeout)
/// - Perform a single attempt; retry policy belongs to the caller
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest, HttpMethod};
///
/// async fn fetch_genres(client: &dyn HttpClient) -> Result<String> {
///     let request = HttpRequest::new(HttpMethod::Get, "http://localhost:8000/api/genres");
///     let response = client.execute(request).await?;
///     response.text()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - Request times out
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(HttpMethod::Get, "http://localhost/api/tracks")
            .header("Accept", "application/json")
            .query_param("page", 2)
            .query_param("limit", 10)
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "http://localhost/api/tracks");
        assert_eq!(
            request.headers.get("Accept"),
            Some(&"application/json".to_string())
        );
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "10".to_string())
            ]
        );
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = HttpRequest::new(HttpMethod::Post, "http://localhost/api/tracks/delete")
            .json(&serde_json::json!({ "ids": ["a", "b"] }))
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
        match request.body {
            Some(HttpBody::Bytes(bytes)) => {
                let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(value["ids"][1], "b");
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_multipart_body() {
        let part = FilePart {
            field_name: "file".to_string(),
            file_name: "song.mp3".to_string(),
            content_type: "audio/mpeg".to_string(),
            bytes: Bytes::from_static(b"ID3"),
        };
        let request =
            HttpRequest::new(HttpMethod::Post, "http://localhost/api/tracks/t1/upload")
                .multipart(part.clone());

        assert_eq!(request.body, Some(HttpBody::Multipart(part)));
        assert!(!request.headers.contains_key("Content-Type"));
    }

    #[test]
    fn test_http_response_status_checks() {
        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from("test"),
        };

        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());

        let response = HttpResponse {
            status: 404,
            headers: HashMap::new(),
            body: Bytes::new(),
        };
        assert!(response.is_client_error());
    }

    #[test]
    fn test_http_response_json() {
        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(r#"["rock","pop"]"#),
        };

        let genres: Vec<String> = response.json().unwrap();
        assert_eq!(genres, vec!["rock", "pop"]);
        assert!(response.text().unwrap().contains("rock"));
    }
}
