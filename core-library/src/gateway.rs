//! Remote entity gateway contract
//!
//! The store reaches the tracks backend only through [`TrackGateway`].
//! Implementations return raw JSON; the store validates it before use.

use crate::error::TransportError;
use crate::models::{AudioUpload, Track, TrackDraft};
use async_trait::async_trait;
use serde_json::Value;

pub type GatewayResult<T> = std::result::Result<T, TransportError>;

/// Remote operations on the track collection
///
/// Every call is a single attempt. `Err` means no usable response arrived;
/// an `Ok` payload is still untrusted.
#[async_trait]
pub trait TrackGateway: Send + Sync {
    /// Fetch one page of tracks
    ///
    /// # Returns
    /// `{ data: Track[], meta: { total, page, limit, totalPages } }`
    async fn list(&self, page: u32, limit: u32) -> GatewayResult<Value>;

    /// Fetch every known genre name
    async fn list_genres(&self) -> GatewayResult<Value>;

    /// Fetch a track by slug
    async fn get_by_slug(&self, slug: &str) -> GatewayResult<Value>;

    /// Fetch a track by id
    async fn get_by_id(&self, id: &str) -> GatewayResult<Value>;

    /// Create a track; the response carries the server-assigned id
    async fn create(&self, draft: &TrackDraft) -> GatewayResult<Value>;

    /// Replace a track's metadata
    async fn update(&self, track: &Track) -> GatewayResult<Value>;

    /// Delete a single track
    async fn delete_one(&self, id: &str) -> GatewayResult<()>;

    /// Delete several tracks
    ///
    /// # Returns
    /// Either an empty body (`Value::Null`) or `{ success: id[], failed: id[] }`
    async fn delete_many(&self, ids: &[String]) -> GatewayResult<Value>;

    /// Attach an audio file; the response is the updated track
    async fn upload_file(&self, id: &str, file: AudioUpload) -> GatewayResult<Value>;

    /// Remove a track's audio file
    async fn delete_file(&self, id: &str) -> GatewayResult<()>;
}
