//! HTTP API for Agentpad
//!
//! Provides REST endpoints for:
//! - Session lifecycle (create, get, delete)
//! - Scratchpad read, replace and append
//! - Todo add, list, status update and delete
//! - Health checks

pub mod health;
pub mod response;
pub mod sessions;

use agentpad_core::Workspace;
use axum::Router;

pub use health::{health_routes, HealthState};
pub use sessions::sessions_routes;

/// Create the API router with all endpoints
pub fn api_router(workspace: Workspace, ttl_hours: u64) -> Router {
    let health = HealthState {
        store: workspace.store().clone(),
        ttl_hours,
    };

    Router::new()
        .merge(health_routes(health))
        .merge(sessions_routes(workspace))
}
