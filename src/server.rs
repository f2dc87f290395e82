//! HTTP surface of the draw archive service.
//!
//! Three endpoints plus a liveness probe:
//! - `GET /lotto/stats` - current frequency snapshot, cacheable
//! - `POST /lotto/sync` - operator-triggered sync, `X-ADMIN-KEY` guarded
//! - `GET /lotto/generate?count=N` - weighted duplicate-free tickets,
//!   never cached
//! - `GET /health` - liveness

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::generate::{self, GeneratorConfig, Ticket};
use crate::store::{HistoryStore, SnapshotStore};
use crate::sync::SyncService;
use log::{error, warn};

/// Operator credential header for the sync endpoint.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

const STATS_CACHE_CONTROL: &str = "public, max-age=300, stale-while-revalidate=3600";

/// Default ticket count for the generate endpoint.
pub const DEFAULT_TICKET_COUNT: usize = 10;
/// Upper bound on tickets per request.
pub const MAX_TICKET_COUNT: usize = 20;

/// Shared handler state.
pub struct AppState {
    pub history: Arc<HistoryStore>,
    pub snapshots: Arc<SnapshotStore>,
    pub sync: Arc<SyncService>,
    pub generator: GeneratorConfig,
    /// Empty string disables the credential check
    pub admin_key: String,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lotto/stats", get(stats_handler))
        .route("/lotto/sync", post(sync_handler))
        .route("/lotto/generate", get(generate_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, port: u16) -> Result<(), String> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Bind {} failed: {}", addr, e))?;

    axum::serve(listener, router(state))
        .await
        .map_err(|e| format!("Server error: {}", e))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub ok: bool,
    pub added: usize,
    pub updated_at: u64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// What the caller asked for; `tickets` may be shorter when the
    /// duplicate-free search budget runs out
    pub requested: usize,
    pub tickets: Vec<Ticket>,
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// Current frequency snapshot. Changes only on sync, so short-lived
/// shared caching is allowed.
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.snapshots.current();
    if snapshot.source_size == 0 {
        warn!("Stats requested before first sync populated the archive");
    }

    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, STATS_CACHE_CONTROL)],
        Json(snapshot),
    )
        .into_response()
}

/// Operator-triggered sync.
pub async fn sync_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !state.admin_key.is_empty() {
        let supplied = headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if supplied != state.admin_key {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "unauthorized",
                }),
            )
                .into_response();
        }
    }

    match state.sync.sync().await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(SyncResponse {
                ok: true,
                added: outcome.added,
                updated_at: outcome.snapshot.computed_at,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Sync failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: "sync_error" }),
            )
                .into_response()
        }
    }
}

/// Weighted ticket generation against the current snapshot and history.
///
/// Operates purely on already-persisted local data; upstream problems can
/// never fail this endpoint.
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GenerateParams>,
) -> Response {
    let requested = params
        .count
        .unwrap_or(DEFAULT_TICKET_COUNT)
        .clamp(1, MAX_TICKET_COUNT);

    let snapshot = state.snapshots.current();
    let historical = state.history.combo_keys();
    let tickets = generate::generate(&snapshot, &historical, requested, &state.generator);

    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store")],
        Json(GenerateResponse { requested, tickets }),
    )
        .into_response()
}
