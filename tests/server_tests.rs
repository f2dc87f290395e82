//! Handler-level tests for the HTTP surface.
//!
//! Handlers are invoked directly with constructed extractors; the sync
//! path runs against a scripted fetcher so no network is involved.

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use std::sync::Arc;

use lotto_archive::fetch::{DrawFetch, FetchTarget};
use lotto_archive::generate::GeneratorConfig;
use lotto_archive::server::{
    generate_handler, stats_handler, sync_handler, AppState, GenerateParams, ADMIN_KEY_HEADER,
};
use lotto_archive::store::{HistoryStore, SnapshotStore};
use lotto_archive::sync::{SyncConfig, SyncService};
use lotto_archive::types::{DrawRecord, FetchFailure};

/// Source with a fixed set of three rounds.
struct ThreeRoundSource;

#[async_trait]
impl DrawFetch for ThreeRoundSource {
    async fn fetch_draw(&self, target: FetchTarget) -> Result<DrawRecord, FetchFailure> {
        let round = match target {
            FetchTarget::Latest => 3,
            FetchTarget::Round(n) => n,
        };
        if !(1..=3).contains(&round) {
            return Err(FetchFailure::NotFound);
        }
        let base = round as u8;
        Ok(DrawRecord {
            round,
            date: String::new(),
            numbers: [base, base + 5, base + 10, base + 20, base + 30, base + 39],
        })
    }
}

fn test_state(admin_key: &str) -> (tempfile::TempDir, Arc<AppState>) {
    let dir = tempfile::tempdir().unwrap();
    let history = Arc::new(HistoryStore::open(dir.path().join("history.json")).unwrap());
    let snapshots = Arc::new(SnapshotStore::open(dir.path().join("stats.json")).unwrap());
    let sync = Arc::new(SyncService::new(
        Arc::new(ThreeRoundSource),
        Arc::clone(&history),
        Arc::clone(&snapshots),
        SyncConfig {
            inter_request_delay: std::time::Duration::from_millis(0),
            ..SyncConfig::default()
        },
    ));

    let state = Arc::new(AppState {
        history,
        snapshots,
        sync,
        generator: GeneratorConfig::default(),
        admin_key: admin_key.to_string(),
    });
    (dir, state)
}

#[tokio::test]
async fn test_stats_served_with_cache_header() {
    let (_dir, state) = test_state("");

    let response = stats_handler(State(state)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok()),
        Some("public, max-age=300, stale-while-revalidate=3600")
    );
}

#[tokio::test]
async fn test_sync_requires_admin_key_when_configured() {
    let (_dir, state) = test_state("secret");

    // Missing header
    let response = sync_handler(State(Arc::clone(&state)), HeaderMap::new()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong key
    let mut headers = HeaderMap::new();
    headers.insert(ADMIN_KEY_HEADER, HeaderValue::from_static("guess"));
    let response = sync_handler(State(Arc::clone(&state)), headers).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct key
    let mut headers = HeaderMap::new();
    headers.insert(ADMIN_KEY_HEADER, HeaderValue::from_static("secret"));
    let response = sync_handler(State(Arc::clone(&state)), headers).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.history.len(), 3);
}

#[tokio::test]
async fn test_sync_open_when_no_admin_key_configured() {
    let (_dir, state) = test_state("");

    let response = sync_handler(State(Arc::clone(&state)), HeaderMap::new()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.history.known_max(), 3);
}

#[tokio::test]
async fn test_generate_is_never_cached_and_clamps_count() {
    let (_dir, state) = test_state("");

    let response = generate_handler(
        State(Arc::clone(&state)),
        Query(GenerateParams { count: Some(500) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
}

#[tokio::test]
async fn test_generate_works_on_empty_archive() {
    let (_dir, state) = test_state("");

    // No sync has run; the generator still answers from the empty snapshot.
    let response = generate_handler(State(state), Query(GenerateParams { count: None })).await;
    assert_eq!(response.status(), StatusCode::OK);
}
