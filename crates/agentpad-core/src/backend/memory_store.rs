use super::StorageBackend;
use crate::config::BackendKind;
use crate::error::{Error, Result};
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Check if running in production environment
fn is_production() -> bool {
    std::env::var("AGENTPAD_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false)
}

struct Entry {
    session: Session,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// In-process session storage
///
/// Each record carries an absolute deadline set at creation (creation time +
/// TTL). Reads past the deadline report the record as absent even before the
/// sweep has evicted it; the sweep is the only thing that frees the memory.
///
/// Data is lost on restart and is not shared between processes.
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: chrono::Duration,
}

impl MemoryBackend {
    /// Create an empty backend whose records live for `ttl`
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for a zero or out-of-range TTL.
    pub fn new(ttl: Duration) -> Result<Self> {
        if ttl.is_zero() {
            return Err(Error::Configuration(
                "session TTL must be positive".to_string(),
            ));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| Error::Configuration(format!("session TTL out of range: {}", e)))?;

        if is_production() {
            warn!(
                "In-process session storage in production: sessions are lost on restart \
                 and not shared between instances. Consider the redis backend."
            );
        }
        info!(ttl_secs = ttl.num_seconds(), "Initializing in-process session storage");

        Ok(Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        })
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn has_native_expiry(&self) -> bool {
        false
    }

    async fn create(&self, session: &Session) -> Result<()> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        if entries.get(&session.id).is_some_and(|e| e.is_live(now)) {
            return Err(Error::DuplicateId(session.id.clone()));
        }
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            Error::Configuration("session TTL overflows the session deadline".to_string())
        })?;
        entries.insert(
            session.id.clone(),
            Entry {
                session: session.clone(),
                expires_at,
            },
        );
        debug!(session_id = %session.id, "Session stored in memory");
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let entries = self.entries.read().await;
        let now = Utc::now();
        Ok(entries
            .get(session_id)
            .filter(|e| e.is_live(now))
            .map(|e| e.session.clone()))
    }

    async fn put(&self, session_id: &str, session: &Session) -> Result<()> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        match entries.get_mut(session_id) {
            // Deadline is left untouched so updates never extend a session's life
            Some(entry) if entry.is_live(now) => {
                entry.session = session.clone();
                Ok(())
            }
            _ => Err(Error::SessionNotFound(session_id.to_string())),
        }
    }

    async fn remove(&self, session_id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        match entries.remove(session_id) {
            Some(entry) if entry.is_live(Utc::now()) => {
                debug!(session_id = %session_id, "Session removed from memory");
                Ok(())
            }
            _ => Err(Error::SessionNotFound(session_id.to_string())),
        }
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(session_id)
            .is_some_and(|e| e.is_live(Utc::now())))
    }

    async fn count(&self) -> Result<usize> {
        let entries = self.entries.read().await;
        let now = Utc::now();
        Ok(entries.values().filter(|e| e.is_live(now)).count())
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let initial_count = entries.len();

        entries.retain(|_, entry| entry.is_live(now));

        let removed_count = initial_count - entries.len();
        if removed_count > 0 {
            debug!(
                removed = removed_count,
                remaining = entries.len(),
                "Swept expired sessions"
            );
        }
        Ok(removed_count)
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
