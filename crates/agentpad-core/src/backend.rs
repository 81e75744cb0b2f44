//! Storage backends
//!
//! Provides both in-process and Redis-backed session storage behind one
//! trait. The backend is picked once at startup by [`create_backend`].
//!
//! - `MemoryBackend` keeps records in a map with per-record deadlines and
//!   relies on a periodic sweep to reclaim expired entries.
//! - `RedisBackend` stores one key per session and lets Redis expire it.

mod memory_store;
mod redis_store;

pub use memory_store::MemoryBackend;
pub use redis_store::RedisBackend;

use crate::config::{BackendKind, StoreConfig};
use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Key/value storage of session records with TTL semantics
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which implementation this is
    fn kind(&self) -> BackendKind;

    /// Whether the backend expires records on its own.
    ///
    /// Backends returning `false` need `sweep_expired` called periodically.
    fn has_native_expiry(&self) -> bool;

    /// Store a new record under its id with the configured TTL.
    ///
    /// Fails with `DuplicateId` if the id is already live.
    async fn create(&self, session: &Session) -> Result<()>;

    /// Current snapshot, or `None` if missing or expired
    async fn get(&self, session_id: &str) -> Result<Option<Session>>;

    /// Overwrite an existing record, keeping its remaining TTL.
    ///
    /// Fails with `SessionNotFound` if the id is not live.
    async fn put(&self, session_id: &str, session: &Session) -> Result<()>;

    /// Delete a record. Fails with `SessionNotFound` if the id is not live.
    async fn remove(&self, session_id: &str) -> Result<()>;

    /// Whether a live record exists
    async fn exists(&self, session_id: &str) -> Result<bool>;

    /// Number of live records
    async fn count(&self) -> Result<usize>;

    /// Evict records past their deadline; returns how many were removed.
    ///
    /// A no-op returning 0 for backends with native expiry.
    async fn sweep_expired(&self) -> Result<usize>;

    /// Remove every record in this backend's namespace
    async fn clear(&self) -> Result<()>;

    /// Establish the backend connection
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    /// Drop the backend connection
    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    /// Whether the backend can currently serve requests
    async fn is_connected(&self) -> bool {
        true
    }
}

/// Build and connect the configured backend
///
/// # Errors
///
/// Returns `Configuration` for invalid settings and `BackendUnavailable` if
/// Redis cannot be reached.
pub async fn create_backend(config: &StoreConfig) -> Result<Arc<dyn StorageBackend>> {
    config.validate()?;

    let backend: Arc<dyn StorageBackend> = match config.backend {
        BackendKind::Memory => Arc::new(MemoryBackend::new(config.ttl())?),
        BackendKind::Redis => Arc::new(RedisBackend::from_config(&config.redis, config.ttl())?),
    };
    backend.connect().await?;

    info!(
        backend = %config.backend,
        ttl_hours = config.ttl_hours,
        "Session storage backend ready"
    );
    Ok(backend)
}
