//! # Optimistic Track Store
//!
//! Keeps the visible page of tracks consistent with the server while making
//! single-track mutations appear immediately.
//!
//! ## Consistency rules
//!
//! - Reads (`fetch_tracks`, `fetch_genres`) log failures and keep the last
//!   good state. Every fetch takes a ticket from a per-store sequence and only
//!   the newest ticket may commit.
//! - `add_track`, `update_track`, `remove_track` and `remove_tracks` write to
//!   the list first, then call the gateway. On failure the whole list is put
//!   back to its pre-call snapshot. Dropping the future before it settles
//!   restores the snapshot as well.
//! - File operations are not optimistic: the list changes only after the
//!   gateway confirms.
//! - `loading` is true while at least one `fetch_tracks` is in flight.
//!
//! State is published through a `tokio::sync::watch` channel; call
//! [`TrackStore::subscribe`] to observe it.

use crate::error::{Result, StoreError};
use crate::gateway::TrackGateway;
use crate::models::{
    is_placeholder_id, placeholder_id, AudioUpload, BulkDeleteReport, Track, TrackDraft,
};
use crate::pagination::{total_pages, PageState, TrackPage};
use crate::query::{distinct_artists, TrackQuery};
use crate::validation::{validate_bulk_delete, validate_genres, validate_track, validate_track_page};
use core_runtime::config::{
    CoreConfig, DEFAULT_BULK_FETCH_LIMIT, DEFAULT_INITIAL_PAGE, DEFAULT_MAX_BULK_PAGES,
    DEFAULT_PAGE_SIZE,
};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use core_runtime::logging::strip_path;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

// =============================================================================
// Observable state
// =============================================================================

/// Snapshot of everything the UI renders from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackListState {
    pub tracks: Vec<Track>,
    pub genres: Vec<String>,
    pub loading: bool,
    pub total_tracks: u64,
    pub page: u32,
    pub limit: u32,
}

impl TrackListState {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            tracks: Vec::new(),
            genres: Vec::new(),
            loading: false,
            total_tracks: 0,
            page,
            limit,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_tracks, self.limit)
    }

    pub fn page_state(&self) -> PageState {
        PageState {
            page: self.page,
            limit: self.limit,
            total_tracks: self.total_tracks,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

/// Result of a read operation. Failures are already logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was committed to the state.
    Applied,
    /// A newer fetch was issued meanwhile; the response was discarded.
    Superseded,
    /// The call or its validation failed; the previous state is kept.
    Failed(StoreError),
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied)
    }
}

/// Tunables of a store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    pub initial_page: u32,
    pub page_size: u32,
    /// Page size used while enumerating ids for `remove_all_tracks`
    pub bulk_fetch_limit: u32,
    /// Page bound for `remove_all_tracks`
    pub max_bulk_pages: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            initial_page: DEFAULT_INITIAL_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            bulk_fetch_limit: DEFAULT_BULK_FETCH_LIMIT,
            max_bulk_pages: DEFAULT_MAX_BULK_PAGES,
        }
    }
}

impl From<&CoreConfig> for StoreSettings {
    fn from(config: &CoreConfig) -> Self {
        Self {
            initial_page: config.initial_page,
            page_size: config.page_size,
            bulk_fetch_limit: config.bulk_fetch_limit,
            max_bulk_pages: config.max_bulk_pages,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

pub struct TrackStore {
    gateway: Arc<dyn TrackGateway>,
    state: watch::Sender<TrackListState>,
    settings: StoreSettings,
    events: Option<Arc<EventBus>>,
    fetch_seq: AtomicU64,
    genre_seq: AtomicU64,
    /// Only touched inside `state` modifications
    in_flight: AtomicUsize,
}

impl TrackStore {
    pub fn new(gateway: Arc<dyn TrackGateway>, settings: StoreSettings) -> Self {
        let (state, _) = watch::channel(TrackListState::new(
            settings.initial_page,
            settings.page_size,
        ));
        Self {
            gateway,
            state,
            settings,
            events: None,
            fetch_seq: AtomicU64::new(0),
            genre_seq: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Publish [`LibraryEvent`]s on `bus` after confirmed changes.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn settings(&self) -> StoreSettings {
        self.settings
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    pub fn subscribe(&self) -> watch::Receiver<TrackListState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> TrackListState {
        self.state.borrow().clone()
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.state.borrow().tracks.clone()
    }

    pub fn genres(&self) -> Vec<String> {
        self.state.borrow().genres.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn total_tracks(&self) -> u64 {
        self.state.borrow().total_tracks
    }

    pub fn page(&self) -> u32 {
        self.state.borrow().page
    }

    pub fn limit(&self) -> u32 {
        self.state.borrow().limit
    }

    pub fn total_pages(&self) -> u32 {
        self.state.borrow().total_pages()
    }

    pub fn get(&self, id: &str) -> Option<Track> {
        self.state.borrow().get(id).cloned()
    }

    /// Tracks of the current window matching `needle` in title, artist or album.
    pub fn search(&self, needle: &str) -> Vec<Track> {
        TrackQuery::new().search(needle).apply(&self.state.borrow().tracks)
    }

    pub fn query(&self, query: &TrackQuery) -> Vec<Track> {
        query.apply(&self.state.borrow().tracks)
    }

    /// Distinct artists of the current window, in list order.
    pub fn artists(&self) -> Vec<String> {
        distinct_artists(&self.state.borrow().tracks)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Load a page (the current one when `page` is `None`) at the current limit.
    ///
    /// On success the track list and total are replaced and the cursor moves
    /// to the fetched window. On failure nothing but `loading` changes.
    #[instrument(skip(self))]
    pub async fn fetch_tracks(&self, page: Option<u32>) -> FetchOutcome {
        let (page, limit) = {
            let state = self.state.borrow();
            (page.unwrap_or(state.page), state.limit)
        };

        if page == 0 {
            let error = invalid_input("page", "Pages start at 1");
            warn!(error = %error, "Rejected track fetch");
            return FetchOutcome::Failed(error);
        }

        let ticket = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = LoadingGuard::enter(self);

        let result = self.list_remote(page, limit).await;
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(error) => {
                warn!(error = %error, page, limit, "Failed to fetch tracks");
                return FetchOutcome::Failed(error);
            }
        };

        let count = fetched.data.len();
        let total = fetched.meta.total;
        let applied = self.state.send_if_modified(|state| {
            if self.fetch_seq.load(Ordering::SeqCst) != ticket {
                return false;
            }
            state.tracks = fetched.data;
            state.total_tracks = total;
            state.page = page;
            state.limit = limit;
            true
        });

        if !applied {
            debug!(ticket, page, "Discarding superseded track page");
            return FetchOutcome::Superseded;
        }

        debug!(page, limit, count, total, "Tracks page loaded");
        self.emit(LibraryEvent::TracksLoaded {
            page,
            limit,
            total_tracks: total,
            count,
        });
        FetchOutcome::Applied
    }

    /// Replace the genre cache.
    #[instrument(skip(self))]
    pub async fn fetch_genres(&self) -> FetchOutcome {
        let ticket = self.genre_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let genres = match self.genres_remote().await {
            Ok(genres) => genres,
            Err(error) => {
                warn!(error = %error, "Failed to fetch genres");
                return FetchOutcome::Failed(error);
            }
        };

        let count = genres.len();
        let applied = self.state.send_if_modified(|state| {
            if self.genre_seq.load(Ordering::SeqCst) != ticket {
                return false;
            }
            state.genres = genres;
            true
        });

        if applied {
            debug!(count, "Genres loaded");
            FetchOutcome::Applied
        } else {
            FetchOutcome::Superseded
        }
    }

    /// Look a track up by slug. A matching entry of the current window is
    /// refreshed in place; nothing is inserted.
    #[instrument(skip(self))]
    pub async fn fetch_track_by_slug(&self, slug: &str) -> Result<Track> {
        if slug.trim().is_empty() {
            return Err(invalid_input("slug", "Slug cannot be empty"));
        }
        let raw = self.gateway.get_by_slug(slug).await?;
        let track = validate_track(&raw)?;
        self.refresh_entry(&track);
        Ok(track)
    }

    /// Look a track up by id. Same in-place refresh as
    /// [`fetch_track_by_slug`](Self::fetch_track_by_slug).
    #[instrument(skip(self))]
    pub async fn fetch_track_by_id(&self, id: &str) -> Result<Track> {
        if id.trim().is_empty() {
            return Err(invalid_input("id", "Track id cannot be empty"));
        }
        let raw = self.gateway.get_by_id(id).await?;
        let track = validate_track(&raw)?;
        self.refresh_entry(&track);
        Ok(track)
    }

    // -------------------------------------------------------------------------
    // Cursor
    // -------------------------------------------------------------------------

    /// Move to `page` and re-fetch. The cursor changes as soon as this is
    /// called; the fetch runs when the returned future is awaited.
    pub fn set_page(&self, page: u32) -> impl Future<Output = FetchOutcome> + '_ {
        let accepted = page > 0;
        if accepted {
            self.state.send_modify(|state| state.page = page);
        }
        async move {
            if !accepted {
                return FetchOutcome::Failed(invalid_input("page", "Pages start at 1"));
            }
            self.fetch_tracks(Some(page)).await
        }
    }

    /// Change the page size and re-fetch the current page.
    pub fn set_limit(&self, limit: u32) -> impl Future<Output = FetchOutcome> + '_ {
        let accepted = limit > 0;
        if accepted {
            self.state.send_modify(|state| state.limit = limit);
        }
        async move {
            if !accepted {
                return FetchOutcome::Failed(invalid_input(
                    "limit",
                    "Page size must be greater than 0",
                ));
            }
            self.fetch_tracks(None).await
        }
    }

    // -------------------------------------------------------------------------
    // Optimistic mutations
    // -------------------------------------------------------------------------

    /// Create a track. A placeholder is shown at the head of the list until
    /// the server answers, then replaced in place by the created track.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn add_track(&self, draft: TrackDraft) -> Result<Track> {
        draft
            .validate()
            .map_err(|(field, message)| invalid_input(field, message))?;

        let temp_id = placeholder_id();
        let placeholder = Track::placeholder(temp_id.clone(), &draft);
        let guard = self.apply_optimistic("add_track", |tracks| tracks.insert(0, placeholder));

        let created = match self.create_remote(&draft).await {
            Ok(track) => track,
            Err(error) => {
                guard.rollback(&error);
                return Err(error);
            }
        };

        let reconciled = self.state.send_if_modified(|state| {
            let Some(idx) = state.tracks.iter().position(|t| t.id == temp_id) else {
                return false;
            };
            match state.tracks.iter().position(|t| t.id == created.id) {
                Some(existing) => {
                    state.tracks[existing] = created.clone();
                    state.tracks.remove(idx);
                }
                None => state.tracks[idx] = created.clone(),
            }
            true
        });
        guard.commit();

        self.emit(LibraryEvent::TrackAdded {
            track_id: created.id.clone(),
            title: created.title.clone(),
            artist: created.artist.clone(),
        });

        if !reconciled {
            warn!(placeholder = %temp_id, track_id = %created.id, "Placeholder vanished before reconciliation");
            return Err(StoreError::StateConflict {
                id: created.id,
                reason: format!(
                    "placeholder {} was no longer in the list when the server confirmed",
                    temp_id
                ),
            });
        }

        info!(track_id = %created.id, "Track added");
        Ok(created)
    }

    /// Replace a track's metadata, showing the new values immediately.
    #[instrument(skip(self, track), fields(track_id = %track.id))]
    pub async fn update_track(&self, track: Track) -> Result<Track> {
        ensure_confirmed(&track.id)?;
        TrackDraft::from(&track)
            .validate()
            .map_err(|(field, message)| invalid_input(field, message))?;

        let requested_id = track.id.clone();
        let optimistic = track.clone();
        let guard = self.apply_optimistic("update_track", |tracks| {
            if let Some(entry) = tracks.iter_mut().find(|t| t.id == optimistic.id) {
                *entry = optimistic;
            }
        });

        let updated = match self.update_remote(&track).await {
            Ok(updated) => updated,
            Err(error) => {
                guard.rollback(&error);
                return Err(error);
            }
        };

        let previous = guard.snapshot_of(&requested_id);
        self.state.send_modify(|state| {
            replace_entry(&mut state.tracks, &requested_id, updated.clone());
            // Server moved the track to another id that was already listed
            if updated.id != requested_id {
                if let (Some(entry), Some(previous)) = (
                    state.tracks.iter_mut().find(|t| t.id == requested_id),
                    previous,
                ) {
                    *entry = previous;
                }
            }
        });
        guard.commit();

        info!(track_id = %updated.id, "Track updated");
        self.emit(LibraryEvent::TrackUpdated {
            track_id: updated.id.clone(),
        });
        Ok(updated)
    }

    /// Delete one track.
    #[instrument(skip(self))]
    pub async fn remove_track(&self, id: &str) -> Result<()> {
        ensure_confirmed(id)?;

        let guard = self.apply_optimistic("remove_track", |tracks| tracks.retain(|t| t.id != id));

        if let Err(error) = self.gateway.delete_one(id).await {
            let error = StoreError::from(error);
            guard.rollback(&error);
            return Err(error);
        }
        guard.commit();

        info!("Track removed");
        self.emit(LibraryEvent::TracksDeleted {
            track_ids: vec![id.to_string()],
        });
        Ok(())
    }

    /// Delete several tracks in one request.
    ///
    /// When the server reports per-id failures, the failed tracks are
    /// restored to their snapshot positions and
    /// [`StoreError::PartialDelete`] is returned.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn remove_tracks(&self, ids: &[String]) -> Result<BulkDeleteReport> {
        let ids = dedupe(ids);
        if ids.is_empty() {
            return Ok(BulkDeleteReport::default());
        }
        for id in &ids {
            ensure_confirmed(id)?;
        }

        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let guard = self.apply_optimistic("remove_tracks", |tracks| {
            tracks.retain(|t| !doomed.contains(t.id.as_str()))
        });

        let report = match self.delete_many_remote(&ids).await {
            Ok(report) => report,
            Err(error) => {
                guard.rollback(&error);
                return Err(error);
            }
        };

        let deleted: Vec<String> = ids
            .iter()
            .filter(|id| !report.failed.contains(*id))
            .cloned()
            .collect();

        if !report.failed.is_empty() {
            let failed: HashSet<&str> = report.failed.iter().map(String::as_str).collect();
            let snapshot = guard.snapshot().to_vec();
            self.state.send_modify(|state| {
                state.tracks = restore_entries(&state.tracks, &snapshot, &failed);
            });
        }
        guard.commit();

        if !deleted.is_empty() {
            self.emit(LibraryEvent::TracksDeleted {
                track_ids: deleted.clone(),
            });
        }

        if !report.failed.is_empty() {
            warn!(
                deleted = deleted.len(),
                failed = report.failed.len(),
                "Bulk delete partially failed"
            );
            self.emit(LibraryEvent::MutationRolledBack {
                operation: "remove_tracks".to_string(),
                reason: format!("{} tracks could not be deleted", report.failed.len()),
            });
            return Err(StoreError::PartialDelete {
                deleted,
                failed: report.failed,
            });
        }

        info!(count = deleted.len(), "Tracks removed");
        Ok(BulkDeleteReport {
            success: deleted,
            failed: Vec::new(),
        })
    }

    /// Delete every track on the server, not only the visible page.
    ///
    /// Ids are collected page by page at `bulk_fetch_limit` until the
    /// reported total is reached or a page comes back empty. After
    /// `max_bulk_pages` pages the operation gives up without deleting
    /// anything. On success the list is emptied and the cursor reset to page 1.
    ///
    /// Returns the number of tracks deleted.
    #[instrument(skip(self))]
    pub async fn remove_all_tracks(&self) -> Result<usize> {
        let limit = self.settings.bulk_fetch_limit;
        let max_pages = self.settings.max_bulk_pages;

        let mut ids: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut total = 0u64;
        let mut complete = false;

        for page in 1..=max_pages {
            let fetched = self.list_remote(page, limit).await?;
            total = fetched.meta.total;

            if fetched.is_empty() {
                complete = true;
                break;
            }

            for track in fetched.data {
                if seen.insert(track.id.clone()) {
                    ids.push(track.id);
                }
            }
            debug!(page, collected = ids.len(), total, "Collected track ids");

            if ids.len() as u64 >= total {
                complete = true;
                break;
            }
        }

        if !complete {
            warn!(pages = max_pages, collected = ids.len(), total, "Track enumeration did not converge");
            return Err(StoreError::PagingLimitExceeded {
                pages: max_pages,
                accumulated: ids.len(),
                total,
            });
        }

        if !ids.is_empty() {
            self.remove_tracks(&ids).await?;
        }

        // Outstanding fetches describe the collection before the wipe
        self.fetch_seq.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            state.tracks.clear();
            state.total_tracks = 0;
            state.page = 1;
        });

        info!(deleted = ids.len(), "All tracks removed");
        self.emit(LibraryEvent::LibraryCleared { deleted: ids.len() });
        Ok(ids.len())
    }

    // -------------------------------------------------------------------------
    // File mutations (confirmed first)
    // -------------------------------------------------------------------------

    /// Upload an audio file; the listed track is replaced by the server's copy.
    #[instrument(skip(self, file), fields(file = %strip_path(&file.file_name), bytes = file.len()))]
    pub async fn upload_track_file(&self, id: &str, file: AudioUpload) -> Result<Track> {
        ensure_confirmed(id)?;
        file.validate()
            .map_err(|(field, message)| invalid_input(field, message))?;

        let raw = self.gateway.upload_file(id, file).await?;
        let track = validate_track(&raw)?;

        self.state
            .send_if_modified(|state| replace_entry(&mut state.tracks, id, track.clone()));

        info!(audio_file = ?track.audio_file, "Track file uploaded");
        self.emit(LibraryEvent::TrackFileUploaded {
            track_id: track.id.clone(),
            audio_file: track.audio_file.clone(),
        });
        Ok(track)
    }

    /// Remove a track's audio file. The listed track keeps its other fields
    /// and gets `file_url == Some("")`.
    #[instrument(skip(self))]
    pub async fn remove_track_file(&self, id: &str) -> Result<()> {
        ensure_confirmed(id)?;

        self.gateway.delete_file(id).await?;

        self.state.send_if_modified(|state| {
            match state.tracks.iter_mut().find(|t| t.id == id) {
                Some(track) => {
                    track.file_url = Some(String::new());
                    true
                }
                None => false,
            }
        });

        info!("Track file removed");
        self.emit(LibraryEvent::TrackFileRemoved {
            track_id: id.to_string(),
        });
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn list_remote(&self, page: u32, limit: u32) -> Result<TrackPage> {
        let raw = self.gateway.list(page, limit).await?;
        Ok(validate_track_page(&raw)?)
    }

    async fn genres_remote(&self) -> Result<Vec<String>> {
        let raw = self.gateway.list_genres().await?;
        Ok(validate_genres(&raw)?)
    }

    async fn create_remote(&self, draft: &TrackDraft) -> Result<Track> {
        let raw = self.gateway.create(draft).await?;
        Ok(validate_track(&raw)?)
    }

    async fn update_remote(&self, track: &Track) -> Result<Track> {
        let raw = self.gateway.update(track).await?;
        Ok(validate_track(&raw)?)
    }

    async fn delete_many_remote(&self, ids: &[String]) -> Result<BulkDeleteReport> {
        let raw = self.gateway.delete_many(ids).await?;
        Ok(validate_bulk_delete(&raw, ids)?)
    }

    fn refresh_entry(&self, track: &Track) {
        let refreshed = self
            .state
            .send_if_modified(|state| replace_entry(&mut state.tracks, &track.id, track.clone()));
        if refreshed {
            debug!(track_id = %track.id, "Refreshed listed track");
        }
    }

    /// Snapshot the list and apply `change` under the same lock.
    fn apply_optimistic<F>(&self, operation: &'static str, change: F) -> RollbackGuard<'_>
    where
        F: FnOnce(&mut Vec<Track>),
    {
        let mut snapshot = Vec::new();
        self.state.send_modify(|state| {
            snapshot = state.tracks.clone();
            change(&mut state.tracks);
        });
        RollbackGuard {
            store: self,
            operation,
            snapshot: Some(snapshot),
        }
    }

    fn restore(&self, snapshot: Vec<Track>) {
        self.state.send_modify(|state| state.tracks = snapshot);
    }

    fn emit(&self, event: LibraryEvent) {
        if let Some(bus) = &self.events {
            // No subscribers is fine
            let _ = bus.emit(CoreEvent::Library(event));
        }
    }
}

impl std::fmt::Debug for TrackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TrackStore")
            .field("tracks", &state.tracks.len())
            .field("page", &state.page)
            .field("limit", &state.limit)
            .field("loading", &state.loading)
            .field("settings", &self.settings)
            .finish()
    }
}

// =============================================================================
// Guards
// =============================================================================

/// Holds `loading` up while a fetch is in flight.
struct LoadingGuard<'a> {
    store: &'a TrackStore,
}

impl<'a> LoadingGuard<'a> {
    fn enter(store: &'a TrackStore) -> Self {
        store.state.send_modify(|state| {
            store.in_flight.fetch_add(1, Ordering::SeqCst);
            state.loading = true;
        });
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let store = self.store;
        store.state.send_modify(|state| {
            let remaining = store.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            state.loading = remaining > 0;
        });
    }
}

/// Restores the pre-mutation list unless committed.
struct RollbackGuard<'a> {
    store: &'a TrackStore,
    operation: &'static str,
    snapshot: Option<Vec<Track>>,
}

impl RollbackGuard<'_> {
    fn snapshot(&self) -> &[Track] {
        self.snapshot.as_deref().unwrap_or_default()
    }

    fn snapshot_of(&self, id: &str) -> Option<Track> {
        self.snapshot().iter().find(|t| t.id == id).cloned()
    }

    fn commit(mut self) {
        self.snapshot = None;
    }

    fn rollback(mut self, error: &StoreError) {
        if let Some(snapshot) = self.snapshot.take() {
            self.store.restore(snapshot);
        }
        warn!(operation = self.operation, error = %error, "Rolled back optimistic change");
        self.store.emit(LibraryEvent::MutationRolledBack {
            operation: self.operation.to_string(),
            reason: error.to_string(),
        });
    }
}

impl Drop for RollbackGuard<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            warn!(operation = self.operation, "Mutation cancelled; restoring snapshot");
            self.store.restore(snapshot);
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn invalid_input(field: &str, message: impl Into<String>) -> StoreError {
    StoreError::InvalidInput {
        field: field.to_string(),
        message: message.into(),
    }
}

fn ensure_confirmed(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(invalid_input("id", "Track id cannot be empty"));
    }
    if is_placeholder_id(id) {
        return Err(StoreError::StateConflict {
            id: id.to_string(),
            reason: "track has not been confirmed by the server yet".to_string(),
        });
    }
    Ok(())
}

fn dedupe(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Put `track` where `target_id` is listed, keeping ids unique.
///
/// If the track's own id is already listed elsewhere, that entry is updated
/// instead. Returns false when neither id is listed.
fn replace_entry(tracks: &mut [Track], target_id: &str, track: Track) -> bool {
    let existing = tracks.iter().position(|t| t.id == track.id);
    let target = tracks.iter().position(|t| t.id == target_id);
    match existing.or(target) {
        Some(idx) => {
            tracks[idx] = track;
            true
        }
        None => false,
    }
}

/// Rebuild the list with the `ids` entries of `snapshot` put back in
/// snapshot order. Entries added since the snapshot stay at the head.
fn restore_entries(current: &[Track], snapshot: &[Track], ids: &HashSet<&str>) -> Vec<Track> {
    let in_snapshot: HashSet<&str> = snapshot.iter().map(|t| t.id.as_str()).collect();

    let mut restored: Vec<Track> = current
        .iter()
        .filter(|t| !in_snapshot.contains(t.id.as_str()))
        .cloned()
        .collect();

    for track in snapshot {
        if let Some(live) = current.iter().find(|t| t.id == track.id) {
            restored.push(live.clone());
        } else if ids.contains(track.id.as_str()) {
            restored.push(track.clone());
        }
    }
    restored
}
