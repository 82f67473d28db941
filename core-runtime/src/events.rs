//! # Event Bus System
//!
//! Provides an event-driven architecture for the track manager core using
//! `tokio::sync::broadcast`. The store and the playback coordinator publish
//! discrete notifications here; the observable list state itself lives in a
//! `watch` channel owned by the store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐
//! │ TrackStore  ├──────────────>│           │     subscribe    ┌────────────┐
//! └─────────────┘               │ EventBus  ├─────────────────>│ Subscriber │
//!                               │ (broadcast│                  └────────────┘
//! ┌─────────────┐     emit      │  channel) │     subscribe    ┌────────────┐
//! │ Playback    ├──────────────>│           ├─────────────────>│ Subscriber │
//! └─────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Library(LibraryEvent::TrackUpdated {
//!         track_id: "t1".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Track updated");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting with no subscribers returns `Err`; publishers in this workspace
//! ignore that case.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use crate::config::DEFAULT_EVENT_BUFFER_SIZE;
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Track list events
    Library(LibraryEvent),
    /// Playback coordination events
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Library(LibraryEvent::MutationRolledBack { .. }) => EventSeverity::Warning,
            CoreEvent::Library(LibraryEvent::LibraryCleared { .. }) => EventSeverity::Info,
            CoreEvent::Library(LibraryEvent::TracksDeleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Library Events
// ============================================================================

/// Events published by the track store after a server-confirmed change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// A page of tracks replaced the visible list.
    TracksLoaded {
        page: u32,
        limit: u32,
        total_tracks: u64,
        count: usize,
    },
    /// A new track was created on the server.
    TrackAdded {
        track_id: String,
        title: String,
        artist: String,
    },
    /// A track's metadata was updated.
    TrackUpdated { track_id: String },
    /// One or more tracks were deleted.
    TracksDeleted { track_ids: Vec<String> },
    /// Every track was deleted and the listing reset.
    LibraryCleared { deleted: usize },
    /// An audio file was attached to a track.
    TrackFileUploaded {
        track_id: String,
        audio_file: Option<String>,
    },
    /// A track's audio file was removed.
    TrackFileRemoved { track_id: String },
    /// An optimistic change was reverted after the server refused it.
    MutationRolledBack { operation: String, reason: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::TracksLoaded { .. } => "Tracks page loaded",
            LibraryEvent::TrackAdded { .. } => "Track added",
            LibraryEvent::TrackUpdated { .. } => "Track updated",
            LibraryEvent::TracksDeleted { .. } => "Tracks deleted",
            LibraryEvent::LibraryCleared { .. } => "All tracks deleted",
            LibraryEvent::TrackFileUploaded { .. } => "Track file uploaded",
            LibraryEvent::TrackFileRemoved { .. } => "Track file removed",
            LibraryEvent::MutationRolledBack { .. } => "Optimistic change rolled back",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events published when the active track changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The track became the active one.
    Started { track_id: String },
    /// The track stopped being active (paused or replaced).
    Stopped { track_id: String },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to core events.
///
/// Share it between publishers with `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let playback_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
