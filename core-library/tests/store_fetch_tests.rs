//! Read-side behaviour of `TrackStore`: paging, genres, lookups, the loading
//! flag and stale-response handling.

mod common;

use common::*;
use core_library::{FetchOutcome, SortField, SortOrder, StoreError, TrackQuery};

// ============================================================================
// fetch_tracks
// ============================================================================

#[tokio::test]
async fn test_fetch_tracks_loads_current_page() {
    let gateway = ScriptedGateway::with_tracks(tracks(25));
    let store = store_over(&gateway, settings(10));

    assert_eq!(store.fetch_tracks(None).await, FetchOutcome::Applied);

    let state = store.snapshot();
    assert_eq!(state.tracks.len(), 10);
    assert_eq!(state.tracks[0].id, "id1");
    assert_eq!(state.total_tracks, 25);
    assert_eq!(state.page, 1);
    assert_eq!(store.total_pages(), 3);
    assert!(!state.loading);
    assert_eq!(gateway.calls(), vec![Call::List { page: 1, limit: 10 }]);
}

#[tokio::test]
async fn test_fetch_tracks_explicit_page_moves_cursor() {
    let gateway = ScriptedGateway::with_tracks(tracks(25));
    let store = store_over(&gateway, settings(10));

    assert!(store.fetch_tracks(Some(3)).await.is_applied());

    assert_eq!(store.page(), 3);
    assert_eq!(ids(&store.tracks()), vec!["id21", "id22", "id23", "id24", "id25"]);
}

#[tokio::test]
async fn test_fetch_tracks_rejects_page_zero() {
    let gateway = ScriptedGateway::with_tracks(tracks(3));
    let store = store_over(&gateway, settings(10));

    let outcome = store.fetch_tracks(Some(0)).await;

    assert!(matches!(
        outcome,
        FetchOutcome::Failed(StoreError::InvalidInput { .. })
    ));
    assert_eq!(gateway.call_count(), 0);
    assert!(!store.loading());
}

#[tokio::test]
async fn test_fetch_failure_keeps_last_good_state() {
    let gateway = ScriptedGateway::with_tracks(tracks(5));
    let store = store_over(&gateway, settings(10));
    store.fetch_tracks(None).await;
    let before = store.snapshot();

    gateway.fail(Op::List);
    let outcome = store.fetch_tracks(Some(2)).await;

    assert!(matches!(
        outcome,
        FetchOutcome::Failed(StoreError::Transport(_))
    ));
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn test_fetch_malformed_payload_keeps_last_good_state() {
    let gateway = ScriptedGateway::with_tracks(tracks(5));
    let store = store_over(&gateway, settings(10));
    store.fetch_tracks(None).await;
    let before = store.snapshot();

    gateway.malformed(Op::List);
    let outcome = store.fetch_tracks(None).await;

    match outcome {
        FetchOutcome::Failed(StoreError::Validation(error)) => {
            assert_eq!(error.shape, "TracksResponse");
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert_eq!(store.snapshot(), before);
}

// ============================================================================
// Loading flag
// ============================================================================

#[tokio::test]
async fn test_loading_true_only_while_fetch_in_flight() {
    let gateway = ScriptedGateway::with_tracks(tracks(3));
    let store = store_over(&gateway, settings(10));
    assert!(!store.loading());

    let mut gate = gateway.gate(Op::List);
    let fetch = store.fetch_tracks(None);
    tokio::pin!(fetch);
    run_until_reached(fetch.as_mut(), &mut gate).await;

    assert!(store.loading());

    gate.release();
    assert!(fetch.await.is_applied());
    assert!(!store.loading());
}

#[tokio::test]
async fn test_loading_cleared_after_failure() {
    let gateway = ScriptedGateway::with_tracks(tracks(3));
    gateway.fail(Op::List);
    let store = store_over(&gateway, settings(10));

    let outcome = store.fetch_tracks(None).await;

    assert!(!outcome.is_applied());
    assert!(!store.loading());
}

#[tokio::test]
async fn test_loading_cleared_when_fetch_dropped() {
    let gateway = ScriptedGateway::with_tracks(tracks(3));
    let store = store_over(&gateway, settings(10));

    let mut gate = gateway.gate(Op::List);
    {
        let fetch = store.fetch_tracks(None);
        tokio::pin!(fetch);
        run_until_reached(fetch.as_mut(), &mut gate).await;
        assert!(store.loading());
    }

    assert!(!store.loading());
    assert!(store.tracks().is_empty());
}

#[tokio::test]
async fn test_loading_observed_through_subscription() {
    let gateway = ScriptedGateway::with_tracks(tracks(3));
    let store = store_over(&gateway, settings(10));
    let mut rx = store.subscribe();

    let mut gate = gateway.gate(Op::List);
    let fetch = store.fetch_tracks(None);
    tokio::pin!(fetch);
    run_until_reached(fetch.as_mut(), &mut gate).await;

    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().loading);

    gate.release();
    fetch.await;
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert_eq!(state.tracks.len(), 3);
}

// ============================================================================
// Stale responses
// ============================================================================

#[tokio::test]
async fn test_older_fetch_cannot_overwrite_newer() {
    let gateway = ScriptedGateway::with_tracks(tracks(25));
    let store = store_over(&gateway, settings(10));

    let mut slow = gateway.gate(Op::List);
    let first = store.fetch_tracks(Some(1));
    tokio::pin!(first);
    run_until_reached(first.as_mut(), &mut slow).await;

    assert_eq!(store.fetch_tracks(Some(2)).await, FetchOutcome::Applied);
    // The first fetch is still pending
    assert!(store.loading());

    slow.release();
    assert_eq!(first.await, FetchOutcome::Superseded);

    assert_eq!(store.page(), 2);
    assert_eq!(store.tracks()[0].id, "id11");
    assert!(!store.loading());
}

#[tokio::test]
async fn test_genre_fetch_superseded_by_newer() {
    let gateway = ScriptedGateway::new();
    gateway.set_genres(&["rock"]);
    let store = store_over(&gateway, settings(10));

    let mut slow = gateway.gate(Op::Genres);
    let first = store.fetch_genres();
    tokio::pin!(first);
    run_until_reached(first.as_mut(), &mut slow).await;

    gateway.set_genres(&["rock", "jazz"]);
    assert!(store.fetch_genres().await.is_applied());

    slow.release();
    assert_eq!(first.await, FetchOutcome::Superseded);
    assert_eq!(store.genres(), vec!["rock", "jazz"]);
}

// ============================================================================
// Genres
// ============================================================================

#[tokio::test]
async fn test_fetch_genres_replaces_cache() {
    let gateway = ScriptedGateway::new();
    gateway.set_genres(&["rock", "pop"]);
    let store = store_over(&gateway, settings(10));

    assert!(store.fetch_genres().await.is_applied());
    assert_eq!(store.genres(), vec!["rock", "pop"]);

    gateway.set_genres(&["jazz"]);
    store.fetch_genres().await;
    assert_eq!(store.genres(), vec!["jazz"]);
}

#[tokio::test]
async fn test_fetch_genres_failure_keeps_cache() {
    let gateway = ScriptedGateway::new();
    gateway.set_genres(&["rock"]);
    let store = store_over(&gateway, settings(10));
    store.fetch_genres().await;

    gateway.fail(Op::Genres);
    assert!(!store.fetch_genres().await.is_applied());
    gateway.recover(Op::Genres);
    gateway.malformed(Op::Genres);
    assert!(matches!(
        store.fetch_genres().await,
        FetchOutcome::Failed(StoreError::Validation(_))
    ));

    assert_eq!(store.genres(), vec!["rock"]);
}

// ============================================================================
// Cursor
// ============================================================================

#[tokio::test]
async fn test_set_page_updates_cursor_before_fetch() {
    let gateway = ScriptedGateway::with_tracks(tracks(25));
    let store = store_over(&gateway, settings(10));

    let refetch = store.set_page(2);
    assert_eq!(store.page(), 2);
    assert_eq!(gateway.call_count(), 0);

    assert!(refetch.await.is_applied());
    assert_eq!(store.tracks()[0].id, "id11");
    assert_eq!(gateway.calls(), vec![Call::List { page: 2, limit: 10 }]);
}

#[tokio::test]
async fn test_set_page_zero_is_rejected() {
    let gateway = ScriptedGateway::with_tracks(tracks(3));
    let store = store_over(&gateway, settings(10));

    let outcome = store.set_page(0).await;

    assert!(matches!(
        outcome,
        FetchOutcome::Failed(StoreError::InvalidInput { .. })
    ));
    assert_eq!(store.page(), 1);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_set_limit_refetches_current_page() {
    let gateway = ScriptedGateway::with_tracks(tracks(25));
    let store = store_over(&gateway, settings(10));
    store.fetch_tracks(None).await;

    assert!(store.set_limit(5).await.is_applied());

    assert_eq!(store.limit(), 5);
    assert_eq!(store.tracks().len(), 5);
    assert_eq!(store.total_pages(), 5);
    assert_eq!(
        gateway.calls().last(),
        Some(&Call::List { page: 1, limit: 5 })
    );
}

#[tokio::test]
async fn test_cursor_kept_when_page_fetch_fails() {
    let gateway = ScriptedGateway::with_tracks(tracks(25));
    let store = store_over(&gateway, settings(10));
    store.fetch_tracks(None).await;

    gateway.fail(Op::List);
    store.set_page(2).await;

    // Cursor moved, data did not
    assert_eq!(store.page(), 2);
    assert_eq!(store.tracks()[0].id, "id1");
}

// ============================================================================
// Lookups
// ============================================================================

#[tokio::test]
async fn test_fetch_by_slug_refreshes_listed_entry() {
    let gateway = ScriptedGateway::with_tracks(tracks(3));
    let store = store_over(&gateway, settings(10));
    store.fetch_tracks(None).await;

    let mut changed = track("id2", "Track 2");
    changed.artist = "Someone Else".to_string();
    gateway.replace_remote(changed);

    let fetched = store.fetch_track_by_slug("track-2").await.unwrap();

    assert_eq!(fetched.artist, "Someone Else");
    assert_eq!(store.get("id2").unwrap().artist, "Someone Else");
    assert_eq!(ids(&store.tracks()), vec!["id1", "id2", "id3"]);
}

#[tokio::test]
async fn test_fetch_by_id_never_inserts() {
    let gateway = ScriptedGateway::with_tracks(tracks(25));
    let store = store_over(&gateway, settings(10));
    store.fetch_tracks(None).await;

    let fetched = store.fetch_track_by_id("id20").await.unwrap();

    assert_eq!(fetched.id, "id20");
    assert!(!store.snapshot().contains("id20"));
    assert_eq!(store.tracks().len(), 10);
}

#[tokio::test]
async fn test_fetch_by_id_errors() {
    let gateway = ScriptedGateway::with_tracks(tracks(1));
    let store = store_over(&gateway, settings(10));

    assert!(matches!(
        store.fetch_track_by_id("").await,
        Err(StoreError::InvalidInput { .. })
    ));
    assert!(matches!(
        store.fetch_track_by_id("missing").await,
        Err(StoreError::Transport(_))
    ));
    assert!(matches!(
        store.fetch_track_by_slug(" ").await,
        Err(StoreError::InvalidInput { .. })
    ));
}

// ============================================================================
// Client-side queries
// ============================================================================

#[tokio::test]
async fn test_search_and_query_over_window() {
    let mut seeded = tracks(3);
    seeded[0].artist = "Zed".to_string();
    seeded[1].title = "Another Song".to_string();
    seeded[2].album = Some("Songbook".to_string());
    let gateway = ScriptedGateway::with_tracks(seeded);
    let store = store_over(&gateway, settings(10));
    store.fetch_tracks(None).await;

    let found = store.search("song");
    assert_eq!(ids(&found), vec!["id2", "id3"]);

    let sorted = store.query(&TrackQuery::new().sort_by(SortField::Artist, SortOrder::Desc));
    assert_eq!(sorted[0].id, "id1");

    assert_eq!(store.artists(), vec!["Zed", "Artist"]);
}
