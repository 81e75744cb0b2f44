//! Health check endpoints.
//!
//! - `/health` — liveness + version (for load balancers)
//! - `/health/detailed` — storage backend status, live session count and TTL

use agentpad_core::{BackendKind, SessionStore};
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::sync::Arc;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health response
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: StorageHealth,
}

/// Storage backend status
#[derive(Debug, Serialize)]
pub struct StorageHealth {
    pub backend: BackendKind,
    pub is_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_count: Option<usize>,
    pub ttl_hours: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State shared by the health handlers
#[derive(Clone)]
pub struct HealthState {
    pub store: Arc<SessionStore>,
    pub ttl_hours: u64,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn detailed_health_check(State(state): State<HealthState>) -> Json<DetailedHealthResponse> {
    let is_connected = state.store.is_connected().await;

    let (session_count, error) = if is_connected {
        match state.store.session_count().await {
            Ok(count) => (Some(count), None),
            Err(e) => (None, Some(e.to_string())),
        }
    } else {
        (None, Some("backend not connected".to_string()))
    };

    let status = if is_connected && error.is_none() {
        "healthy"
    } else {
        "degraded"
    };

    Json(DetailedHealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        storage: StorageHealth {
            backend: state.store.backend_kind(),
            is_connected,
            session_count,
            ttl_hours: state.ttl_hours,
            error,
        },
    })
}

/// Create health routes
pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
        .with_state(state)
}
