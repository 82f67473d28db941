//! Core service façade and bootstrap helpers.
//!
//! A [`TrackSession`] is the per-UI-session object: it owns one track store,
//! one playback coordinator and the event bus both publish on. Hosts create
//! one per session, hand it to the UI layer and drop it when the session
//! ends. Desktop apps typically enable the `desktop-shims` feature and call
//! [`bootstrap_desktop`]; other hosts build a `CoreConfig` with their own
//! `HttpClient` and use [`TrackSession::from_config`].

pub mod error;

pub use error::{CoreError, Result};

use core_library::{FetchOutcome, StoreSettings, Track, TrackGateway, TrackStore};
use core_playback::PlaybackCoordinator;
use core_runtime::config::{CoreConfig, DEFAULT_EVENT_BUFFER_SIZE};
use core_runtime::events::{EventBus, EventStream};
use provider_tracks_api::RestTrackGateway;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Everything a session is built from.
pub struct CoreDependencies {
    pub gateway: Arc<dyn TrackGateway>,
    pub settings: StoreSettings,
    /// Root of the API, used to resolve audio file URLs
    pub api_base_url: String,
    pub event_buffer_size: usize,
}

impl CoreDependencies {
    /// Construct a dependency bundle around an explicit gateway.
    pub fn new(gateway: Arc<dyn TrackGateway>, api_base_url: impl Into<String>) -> Self {
        Self {
            gateway,
            settings: StoreSettings::default(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }

    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Wire the REST gateway and store settings described by `config`.
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gateway: Arc::new(RestTrackGateway::from_config(config)),
            settings: StoreSettings::from(config),
            api_base_url: config.api_base_url.clone(),
            event_buffer_size: config.event_buffer_size,
        })
    }
}

/// Outcome of the initial loads run by [`TrackSession::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStart {
    pub tracks: FetchOutcome,
    pub genres: FetchOutcome,
}

impl SessionStart {
    /// True when the first page of tracks is on screen.
    pub fn is_ready(&self) -> bool {
        self.tracks.is_applied()
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct TrackSession {
    session_id: Uuid,
    store: Arc<TrackStore>,
    player: Arc<PlaybackCoordinator>,
    events: Arc<EventBus>,
    api_base_url: Arc<str>,
}

impl TrackSession {
    /// Create a new session from the provided dependencies.
    pub fn new(deps: CoreDependencies) -> Self {
        let events = Arc::new(EventBus::new(deps.event_buffer_size));
        let store = TrackStore::new(deps.gateway, deps.settings).with_event_bus(Arc::clone(&events));
        let player = PlaybackCoordinator::new().with_event_bus(Arc::clone(&events));

        let session_id = Uuid::new_v4();
        info!(%session_id, api_base_url = %deps.api_base_url, "Track session created");

        Self {
            session_id,
            store: Arc::new(store),
            player: Arc::new(player),
            events,
            api_base_url: Arc::from(deps.api_base_url),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        Ok(Self::new(CoreDependencies::from_config(config)?))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn store(&self) -> &Arc<TrackStore> {
        &self.store
    }

    pub fn player(&self) -> &Arc<PlaybackCoordinator> {
        &self.player
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Stream of every library and playback event of this session.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Load the initial page and the genre list.
    ///
    /// Both loads run concurrently; failures are reported in the returned
    /// [`SessionStart`] and leave the store empty but usable.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn start(&self) -> SessionStart {
        let page = self.store.settings().initial_page;
        let (tracks, genres) = tokio::join!(
            self.store.fetch_tracks(Some(page)),
            self.store.fetch_genres()
        );

        let start = SessionStart { tracks, genres };
        if start.is_ready() {
            info!(page, total = self.store.total_tracks(), "Session started");
        } else {
            warn!(outcome = ?start.tracks, "Session started without tracks");
        }
        start
    }

    /// Playable URL of a track's audio file, if it has one.
    pub fn audio_url(&self, track: &Track) -> Option<String> {
        track.audio_url(&self.api_base_url)
    }
}

impl std::fmt::Debug for TrackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackSession")
            .field("session_id", &self.session_id)
            .field("api_base_url", &self.api_base_url)
            .field("store", &self.store)
            .field("player", &self.player)
            .finish()
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Builds a config with the default reqwest client, creates the session and
/// runs the initial loads.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// let session = core_service::bootstrap_desktop("http://localhost:8000").await?;
/// let tracks = session.store().tracks();
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(api_base_url: &str) -> Result<TrackSession> {
    let config = CoreConfig::builder().api_base_url(api_base_url).build()?;
    let session = TrackSession::from_config(&config)?;
    session.start().await;
    Ok(session)
}
