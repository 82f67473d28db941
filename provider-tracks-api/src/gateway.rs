//! Tracks REST API gateway implementation
//!
//! Implements `TrackGateway` over an injected `HttpClient`.

use async_trait::async_trait;
use bridge_traits::http::{FilePart, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_library::{AudioUpload, GatewayResult, Track, TrackDraft, TrackGateway};
use core_runtime::config::CoreConfig;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{Result, TracksApiError};
use crate::types::{ApiErrorBody, DeleteTracksRequest};

/// Path prefix of every track endpoint
const TRACKS_PATH: &str = "/api/tracks";

/// Path of the genre list endpoint
const GENRES_PATH: &str = "/api/genres";

/// Multipart field the upload endpoint reads the audio file from
const UPLOAD_FIELD: &str = "file";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tracks REST API gateway
///
/// # Endpoints
///
/// | Operation | Request |
/// |---|---|
/// | list | `GET /api/tracks?page=&limit=` |
/// | list_genres | `GET /api/genres` |
/// | get_by_slug | `GET /api/tracks/{slug}` |
/// | get_by_id | `GET /api/tracks/id/{id}` |
/// | create | `POST /api/tracks` |
/// | update | `PUT /api/tracks/{id}` |
/// | delete_one | `DELETE /api/tracks/{id}` |
/// | delete_many | `POST /api/tracks/delete` with `{ ids }` |
/// | upload_file | `POST /api/tracks/{id}/upload` (multipart field `file`) |
/// | delete_file | `DELETE /api/tracks/{id}/file` |
///
/// # Example
///
/// ```ignore
/// use provider_tracks_api::RestTrackGateway;
///
/// let gateway = RestTrackGateway::new(http_client, "http://localhost:8000");
/// let page = gateway.list(1, 10).await?;
/// ```
pub struct RestTrackGateway {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl RestTrackGateway {
    /// Create a gateway for the API served at `base_url`
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(Arc::clone(&config.http_client), config.api_base_url.clone())
            .with_timeout(config.request_timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn track_path(id: &str) -> String {
        format!("{}/{}", TRACKS_PATH, urlencoding::encode(id))
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }

    fn json_request<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &T,
    ) -> Result<HttpRequest> {
        self.request(method, path)
            .json(body)
            .map_err(|e| TracksApiError::EncodeError(e.to_string()))
    }

    /// Execute a request, turning non-2xx statuses into errors
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(error = %e, "Tracks API request failed");
            TracksApiError::from(e)
        })?;

        if !response.is_success() {
            let message = ApiErrorBody::message_from(&response.body);
            warn!(status = response.status, %message, "Tracks API returned an error");
            return Err(TracksApiError::ApiError {
                status_code: response.status,
                message,
            });
        }

        debug!(status = response.status, bytes = response.body.len(), "Tracks API request succeeded");
        Ok(response)
    }

    /// Execute a request and parse its body. An empty body reads as `null`.
    async fn send_json(&self, request: HttpRequest) -> Result<Value> {
        let response = self.send(request).await?;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        response
            .json()
            .map_err(|e| TracksApiError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl TrackGateway for RestTrackGateway {
    #[instrument(skip(self))]
    async fn list(&self, page: u32, limit: u32) -> GatewayResult<Value> {
        let request = self
            .request(HttpMethod::Get, TRACKS_PATH)
            .query_param("page", page)
            .query_param("limit", limit);
        Ok(self.send_json(request).await?)
    }

    #[instrument(skip(self))]
    async fn list_genres(&self) -> GatewayResult<Value> {
        Ok(self
            .send_json(self.request(HttpMethod::Get, GENRES_PATH))
            .await?)
    }

    #[instrument(skip(self))]
    async fn get_by_slug(&self, slug: &str) -> GatewayResult<Value> {
        let request = self.request(HttpMethod::Get, &Self::track_path(slug));
        Ok(self.send_json(request).await?)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> GatewayResult<Value> {
        let path = format!("{}/id/{}", TRACKS_PATH, urlencoding::encode(id));
        Ok(self.send_json(self.request(HttpMethod::Get, &path)).await?)
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create(&self, draft: &TrackDraft) -> GatewayResult<Value> {
        let request = self.json_request(HttpMethod::Post, TRACKS_PATH, draft)?;
        Ok(self.send_json(request).await?)
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn update(&self, track: &Track) -> GatewayResult<Value> {
        let request = self.json_request(HttpMethod::Put, &Self::track_path(&track.id), track)?;
        Ok(self.send_json(request).await?)
    }

    #[instrument(skip(self))]
    async fn delete_one(&self, id: &str) -> GatewayResult<()> {
        self.send(self.request(HttpMethod::Delete, &Self::track_path(id)))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_many(&self, ids: &[String]) -> GatewayResult<Value> {
        let path = format!("{}/delete", TRACKS_PATH);
        let request = self.json_request(HttpMethod::Post, &path, &DeleteTracksRequest { ids })?;
        Ok(self.send_json(request).await?)
    }

    #[instrument(skip(self, file), fields(bytes = file.len()))]
    async fn upload_file(&self, id: &str, file: AudioUpload) -> GatewayResult<Value> {
        let path = format!("{}/upload", Self::track_path(id));
        let request = self.request(HttpMethod::Post, &path).multipart(FilePart {
            field_name: UPLOAD_FIELD.to_string(),
            file_name: file.file_name,
            content_type: file.content_type,
            bytes: file.bytes,
        });
        Ok(self.send_json(request).await?)
    }

    #[instrument(skip(self))]
    async fn delete_file(&self, id: &str) -> GatewayResult<()> {
        let path = format!("{}/file", Self::track_path(id));
        self.send(self.request(HttpMethod::Delete, &path)).await?;
        Ok(())
    }
}
