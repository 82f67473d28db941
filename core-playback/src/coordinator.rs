//! # Playback Coordinator
//!
//! Single-slot state machine deciding which track, if any, is playing.
//!
//! ```text
//!            play(id) / toggle(id)
//!   none ──────────────────────────▶ active(id)
//!     ▲                                 │  play(other) / toggle(other)
//!     │      pause() / toggle(id)       ▼
//!     └──────────────────────────── active(other)
//! ```
//!
//! Every row player shares one coordinator and observes it through
//! [`PlaybackCoordinator::subscribe`] or a [`RowPlayback`] handle. Since the
//! state is one slot, two rows can never be active at the same time.

use crate::error::{PlaybackError, Result};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Observable playback state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub active_id: Option<String>,
}

impl PlaybackState {
    pub fn is_active(&self, id: &str) -> bool {
        self.active_id.as_deref() == Some(id)
    }
}

pub struct PlaybackCoordinator {
    state: watch::Sender<PlaybackState>,
    events: Option<Arc<EventBus>>,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        let (state, _) = watch::channel(PlaybackState::default());
        Self {
            state,
            events: None,
        }
    }

    /// Publish [`PlaybackEvent`]s on `bus` for every transition.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    pub fn active_id(&self) -> Option<String> {
        self.state.borrow().active_id.clone()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.state.borrow().is_active(id)
    }

    /// Make `id` the active track. Whatever was active before stops.
    pub fn play(&self, id: &str) -> Result<()> {
        let id = checked(id)?;
        self.transition(|_| Some(id.to_string()));
        Ok(())
    }

    /// Stop whatever is playing.
    pub fn pause(&self) {
        self.transition(|_| None);
    }

    /// Stop `id` if it is the active track, otherwise make it active.
    ///
    /// Returns whether `id` is active afterwards.
    pub fn toggle(&self, id: &str) -> Result<bool> {
        let id = checked(id)?;
        let now = self.transition(|current| {
            if current.as_deref() == Some(id) {
                None
            } else {
                Some(id.to_string())
            }
        });
        Ok(now.as_deref() == Some(id))
    }

    /// Handle for one row player bound to `id`.
    pub fn row(self: &Arc<Self>, id: impl Into<String>) -> RowPlayback {
        RowPlayback {
            id: id.into(),
            rx: self.subscribe(),
            coordinator: Arc::clone(self),
        }
    }

    /// Apply `decide` to the active slot under the channel lock.
    ///
    /// Returns the active id after the transition.
    fn transition<F>(&self, decide: F) -> Option<String>
    where
        F: FnOnce(&Option<String>) -> Option<String>,
    {
        let mut previous = None;
        let mut next = None;
        let changed = self.state.send_if_modified(|state| {
            next = decide(&state.active_id);
            if state.active_id == next {
                return false;
            }
            previous = std::mem::replace(&mut state.active_id, next.clone());
            true
        });
        if !changed {
            return next;
        }

        debug!(from = ?previous, to = ?next, "Playback transition");
        if let Some(track_id) = previous {
            self.emit(PlaybackEvent::Stopped { track_id });
        }
        if let Some(track_id) = next.clone() {
            self.emit(PlaybackEvent::Started { track_id });
        }
        next
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.events {
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("active_id", &self.state.borrow().active_id)
            .finish()
    }
}

fn checked(id: &str) -> Result<&str> {
    if id.trim().is_empty() {
        return Err(PlaybackError::InvalidTrackId(id.to_string()));
    }
    Ok(id)
}

/// A row player's view of the coordinator.
#[derive(Debug)]
pub struct RowPlayback {
    id: String,
    rx: watch::Receiver<PlaybackState>,
    coordinator: Arc<PlaybackCoordinator>,
}

impl RowPlayback {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_playing(&self) -> bool {
        self.rx.borrow().is_active(&self.id)
    }

    /// The row's play/pause button.
    pub fn toggle(&self) -> Result<bool> {
        self.coordinator.toggle(&self.id)
    }

    /// Wait until this row starts or stops playing and return the new value.
    ///
    /// Transitions between other rows are skipped.
    pub async fn changed(&mut self) -> Option<bool> {
        let was_playing = self.rx.borrow_and_update().is_active(&self.id);
        loop {
            self.rx.changed().await.ok()?;
            let playing = self.rx.borrow_and_update().is_active(&self.id);
            if playing != was_playing {
                return Some(playing);
            }
        }
    }
}
