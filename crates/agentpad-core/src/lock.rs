//! Per-session lock table
//!
//! Serializes read-modify-write sequences on a single session id within this
//! process. Entries are created lazily on first use and dropped when the
//! session is deleted or found idle during cleanup, so the table tracks the
//! set of live sessions rather than growing forever.
//!
//! This is same-process mutual exclusion only. Two server instances sharing a
//! Redis backend can still race on the same session id.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Exclusive access to one session id, released on drop
#[must_use = "the session lock is released as soon as the guard is dropped"]
pub struct SessionGuard {
    session_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl SessionGuard {
    /// The locked session id
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("session_id", &self.session_id)
            .finish()
    }
}

/// Table of per-session mutexes keyed by session id
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    /// Create an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other task holds `session_id`, then take it.
    ///
    /// Waiters are served in arrival order. Distinct ids never contend.
    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        // Clone the Arc out so the DashMap shard lock is not held across the await
        let mutex = self
            .locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        SessionGuard {
            session_id: session_id.to_string(),
            _guard: guard,
        }
    }

    /// Drop the lock entry for a deleted session
    pub fn release(&self, session_id: &str) {
        if self.locks.remove(session_id).is_some() {
            debug!(session_id = %session_id, "Session lock released");
        }
    }

    /// Remove entries nobody holds or waits on. Returns the number removed.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks
            .retain(|_, mutex| Arc::strong_count(mutex) > 1 || mutex.try_lock().is_err());
        before - self.locks.len()
    }

    /// Number of tracked session ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
