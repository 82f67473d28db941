//! Scripted in-memory gateway shared by the store test suites.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_library::{
    AudioUpload, GatewayResult, StoreSettings, Track, TrackDraft, TrackGateway, TrackStore,
    TransportError,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

// ============================================================================
// Fixtures
// ============================================================================

pub fn timestamp() -> DateTime<Utc> {
    "2024-01-01T00:00:00Z".parse().unwrap()
}

pub fn track(id: &str, title: &str) -> Track {
    Track {
        id: id.to_string(),
        title: title.to_string(),
        artist: "Artist".to_string(),
        album: None,
        cover_image: None,
        genres: vec!["rock".to_string()],
        audio_file: None,
        file_url: None,
        slug: title.to_lowercase().replace(' ', "-"),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn tracks(n: usize) -> Vec<Track> {
    (1..=n)
        .map(|i| track(&format!("id{}", i), &format!("Track {}", i)))
        .collect()
}

pub fn ids(tracks: &[Track]) -> Vec<String> {
    tracks.iter().map(|t| t.id.clone()).collect()
}

pub fn assert_unique_ids(tracks: &[Track]) {
    let mut seen = HashSet::new();
    for track in tracks {
        assert!(seen.insert(track.id.as_str()), "duplicate id {}", track.id);
    }
}

pub fn settings(page_size: u32) -> StoreSettings {
    StoreSettings {
        page_size,
        ..StoreSettings::default()
    }
}

pub fn store_over(gateway: &ScriptedGateway, settings: StoreSettings) -> TrackStore {
    TrackStore::new(Arc::new(gateway.clone()), settings)
}

/// Poll `operation` until its gated gateway call has started.
pub async fn run_until_reached<F: Future>(operation: Pin<&mut F>, gate: &mut Gate) {
    tokio::select! {
        _ = operation => panic!("operation settled before reaching the gateway"),
        _ = gate.reached() => {}
    }
}

// ============================================================================
// Scripted gateway
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Genres,
    BySlug,
    ById,
    Create,
    Update,
    DeleteOne,
    DeleteMany,
    Upload,
    DeleteFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { page: u32, limit: u32 },
    Genres,
    BySlug(String),
    ById(String),
    Create(String),
    Update(String),
    DeleteOne(String),
    DeleteMany(Vec<String>),
    Upload { id: String, file_name: String },
    DeleteFile(String),
}

/// Holds a gateway call until released.
pub struct Gate {
    reached: Option<oneshot::Receiver<()>>,
    release: oneshot::Sender<()>,
}

impl Gate {
    /// Resolves once the gated call has started.
    pub async fn reached(&mut self) {
        if let Some(reached) = self.reached.take() {
            reached.await.expect("gated call never started");
        }
    }

    pub fn release(self) {
        let _ = self.release.send(());
    }
}

#[derive(Default)]
struct ServerState {
    tracks: Vec<Track>,
    genres: Vec<String>,
    calls: Vec<Call>,
    failing: HashSet<Op>,
    malformed: HashSet<Op>,
    gates: HashMap<Op, VecDeque<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
    bulk_failures: Vec<String>,
    report_bulk: bool,
    total_override: Option<u64>,
    next_id: u32,
}

/// In-memory tracks backend with failure injection and call gating.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    state: Arc<Mutex<ServerState>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(tracks: Vec<Track>) -> Self {
        let gateway = Self::new();
        gateway.lock().tracks = tracks;
        gateway
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    pub fn set_genres(&self, genres: &[&str]) {
        self.lock().genres = genres.iter().map(|g| g.to_string()).collect();
    }

    /// Make every later call of `op` fail with HTTP 500.
    pub fn fail(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.lock().failing.remove(&op);
    }

    /// Make every later call of `op` return a payload of the wrong shape.
    pub fn malformed(&self, op: Op) {
        self.lock().malformed.insert(op);
    }

    /// Hold the next call of `op` until the returned gate is released.
    pub fn gate(&self, op: Op) -> Gate {
        let (reached_tx, reached_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.lock()
            .gates
            .entry(op)
            .or_default()
            .push_back((reached_tx, release_rx));
        Gate {
            reached: Some(reached_rx),
            release: release_tx,
        }
    }

    /// `delete_many` answers with a `{success, failed}` report and refuses `ids`.
    pub fn refuse_bulk_delete_of(&self, ids: &[&str]) {
        let mut state = self.lock();
        state.report_bulk = true;
        state.bulk_failures = ids.iter().map(|id| id.to_string()).collect();
    }

    /// Report `total` in list metadata regardless of the real count.
    pub fn override_total(&self, total: u64) {
        self.lock().total_override = Some(total);
    }

    pub fn insert_remote(&self, track: Track) {
        self.lock().tracks.push(track);
    }

    pub fn replace_remote(&self, track: Track) {
        let mut state = self.lock();
        if let Some(entry) = state.tracks.iter_mut().find(|t| t.id == track.id) {
            *entry = track;
        }
    }

    pub fn remove_remote(&self, id: &str) {
        self.lock().tracks.retain(|t| t.id != id);
    }

    pub fn remote_tracks(&self) -> Vec<Track> {
        self.lock().tracks.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    async fn enter(&self, op: Op, call: Call) -> GatewayResult<()> {
        let gate = {
            let mut state = self.lock();
            state.calls.push(call);
            state.gates.get_mut(&op).and_then(VecDeque::pop_front)
        };

        if let Some((reached, release)) = gate {
            let _ = reached.send(());
            let _ = release.await;
        }

        if self.lock().failing.contains(&op) {
            return Err(TransportError::Status {
                status: 500,
                message: format!("{:?} failed", op),
            });
        }
        Ok(())
    }

    fn is_malformed(&self, op: Op) -> bool {
        self.lock().malformed.contains(&op)
    }

    fn not_found(id: &str) -> TransportError {
        TransportError::Status {
            status: 404,
            message: format!("Track {} not found", id),
        }
    }
}

fn to_json(track: &Track) -> Value {
    serde_json::to_value(track).unwrap()
}

#[async_trait]
impl TrackGateway for ScriptedGateway {
    async fn list(&self, page: u32, limit: u32) -> GatewayResult<Value> {
        self.enter(Op::List, Call::List { page, limit }).await?;
        if self.is_malformed(Op::List) {
            return Ok(json!({ "data": "nope" }));
        }

        let state = self.lock();
        let start = ((page.saturating_sub(1)) * limit) as usize;
        let data: Vec<Value> = state
            .tracks
            .iter()
            .skip(start)
            .take(limit as usize)
            .map(to_json)
            .collect();
        let total = state.total_override.unwrap_or(state.tracks.len() as u64);
        let total_pages = if limit == 0 {
            0
        } else {
            (total + limit as u64 - 1) / limit as u64
        };

        Ok(json!({
            "data": data,
            "meta": { "total": total, "page": page, "limit": limit, "totalPages": total_pages }
        }))
    }

    async fn list_genres(&self) -> GatewayResult<Value> {
        self.enter(Op::Genres, Call::Genres).await?;
        if self.is_malformed(Op::Genres) {
            return Ok(json!([1, 2]));
        }
        Ok(json!(self.lock().genres))
    }

    async fn get_by_slug(&self, slug: &str) -> GatewayResult<Value> {
        self.enter(Op::BySlug, Call::BySlug(slug.to_string())).await?;
        let state = self.lock();
        state
            .tracks
            .iter()
            .find(|t| t.slug == slug)
            .map(to_json)
            .ok_or_else(|| Self::not_found(slug))
    }

    async fn get_by_id(&self, id: &str) -> GatewayResult<Value> {
        self.enter(Op::ById, Call::ById(id.to_string())).await?;
        let state = self.lock();
        state
            .tracks
            .iter()
            .find(|t| t.id == id)
            .map(to_json)
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, draft: &TrackDraft) -> GatewayResult<Value> {
        self.enter(Op::Create, Call::Create(draft.title.clone()))
            .await?;
        if self.is_malformed(Op::Create) {
            return Ok(json!({ "id": 7, "title": draft.title }));
        }

        let mut state = self.lock();
        state.next_id += 1;
        let mut created = track(&format!("real-{}", state.next_id), &draft.title);
        created.artist = draft.artist.clone();
        created.album = draft.album.clone();
        created.genres = draft.genres.clone();
        created.cover_image = draft.cover_image.clone();
        state.tracks.insert(0, created.clone());
        Ok(to_json(&created))
    }

    async fn update(&self, track: &Track) -> GatewayResult<Value> {
        self.enter(Op::Update, Call::Update(track.id.clone())).await?;
        if self.is_malformed(Op::Update) {
            return Ok(json!({ "id": track.id }));
        }

        let mut state = self.lock();
        let entry = state
            .tracks
            .iter_mut()
            .find(|t| t.id == track.id)
            .ok_or_else(|| Self::not_found(&track.id))?;
        *entry = track.clone();
        entry.slug = track.title.to_lowercase().replace(' ', "-");
        Ok(to_json(entry))
    }

    async fn delete_one(&self, id: &str) -> GatewayResult<()> {
        self.enter(Op::DeleteOne, Call::DeleteOne(id.to_string()))
            .await?;
        let mut state = self.lock();
        let before = state.tracks.len();
        state.tracks.retain(|t| t.id != id);
        if state.tracks.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> GatewayResult<Value> {
        self.enter(Op::DeleteMany, Call::DeleteMany(ids.to_vec()))
            .await?;
        let mut state = self.lock();
        let refused = state.bulk_failures.clone();
        state
            .tracks
            .retain(|t| !ids.contains(&t.id) || refused.contains(&t.id));

        if !state.report_bulk {
            return Ok(Value::Null);
        }
        let (failed, success): (Vec<String>, Vec<String>) =
            ids.iter().cloned().partition(|id| refused.contains(id));
        Ok(json!({ "success": success, "failed": failed }))
    }

    async fn upload_file(&self, id: &str, file: AudioUpload) -> GatewayResult<Value> {
        self.enter(
            Op::Upload,
            Call::Upload {
                id: id.to_string(),
                file_name: file.file_name.clone(),
            },
        )
        .await?;
        let mut state = self.lock();
        let entry = state
            .tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        entry.audio_file = Some(file.file_name.clone());
        entry.file_url = Some(format!("/api/files/{}", file.file_name));
        Ok(to_json(entry))
    }

    async fn delete_file(&self, id: &str) -> GatewayResult<()> {
        self.enter(Op::DeleteFile, Call::DeleteFile(id.to_string()))
            .await?;
        let mut state = self.lock();
        let entry = state
            .tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        entry.audio_file = None;
        entry.file_url = None;
        Ok(())
    }
}
