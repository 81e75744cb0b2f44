//! Session store façade
//!
//! Combines a storage backend, the per-session lock table and the id
//! generator into the operations request handlers call:
//!
//! - create/get/update/delete of session records
//! - owner binding checks on every read and write
//! - `modify`, the locked read-compute-write unit used by every mutation
//! - TTL cleanup delegation

use crate::backend::StorageBackend;
use crate::config::{BackendKind, StoreConfig};
use crate::error::{Error, Result};
use crate::ids::{IdGenerator, RandomIds, DEFAULT_SESSION_ID_LENGTH, DEFAULT_TODO_ID_LENGTH};
use crate::lock::SessionLocks;
use crate::session::{Session, SessionUpdate};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Candidate ids tried before giving up on session creation
pub const MAX_ID_ATTEMPTS: usize = 10;

/// Session store
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
    locks: SessionLocks,
    ids: Box<dyn IdGenerator>,
    session_id_length: usize,
    todo_id_length: usize,
}

impl SessionStore {
    /// Create a store over `backend` with default handle lengths
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            locks: SessionLocks::new(),
            ids: Box::new(RandomIds),
            session_id_length: DEFAULT_SESSION_ID_LENGTH,
            todo_id_length: DEFAULT_TODO_ID_LENGTH,
        }
    }

    /// Create a store using the handle lengths from `config`
    #[must_use]
    pub fn from_config(backend: Arc<dyn StorageBackend>, config: &StoreConfig) -> Self {
        Self::new(backend).with_id_lengths(config.session_id_length, config.todo_id_length)
    }

    /// Override the session and todo handle lengths
    #[must_use]
    pub fn with_id_lengths(mut self, session_id_length: usize, todo_id_length: usize) -> Self {
        self.session_id_length = session_id_length;
        self.todo_id_length = todo_id_length;
        self
    }

    /// Replace the id source
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Which backend is active
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Whether the active backend needs the periodic sweep
    #[must_use]
    pub fn needs_sweep(&self) -> bool {
        !self.backend.has_native_expiry()
    }

    /// Backend liveness, for health reporting
    pub async fn is_connected(&self) -> bool {
        self.backend.is_connected().await
    }

    /// Connect the backend
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the backend cannot be reached.
    pub async fn connect(&self) -> Result<()> {
        self.backend.connect().await
    }

    /// Disconnect the backend
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    pub async fn disconnect(&self) -> Result<()> {
        self.backend.disconnect().await
    }

    /// Generate a todo handle of the configured length
    #[must_use]
    pub fn generate_todo_id(&self) -> String {
        self.ids.generate(self.todo_id_length)
    }

    /// Create an empty session, optionally bound to `owner_id`
    ///
    /// # Errors
    ///
    /// Returns `GenerationExhausted` if no unused id was found within
    /// [`MAX_ID_ATTEMPTS`] candidates, or any backend error.
    pub async fn create_session(&self, owner_id: Option<&str>) -> Result<Session> {
        let id = self.generate_session_id().await?;
        let session = Session::new(id, owner_id.map(str::to_string));

        self.backend.create(&session).await?;

        info!(
            session_id = %session.id,
            bound = session.owner_id.is_some(),
            "Session created"
        );
        Ok(session)
    }

    async fn generate_session_id(&self) -> Result<String> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let candidate = self.ids.generate(self.session_id_length);
            if !self.backend.exists(&candidate).await? {
                return Ok(candidate);
            }
            warn!(attempt, "Session id collision, retrying");
        }
        Err(Error::GenerationExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    /// Fetch a session snapshot
    ///
    /// # Errors
    ///
    /// Returns `OwnerMismatch` if the session is bound to a different caller
    /// (or to anyone, when `caller_id` is `None`).
    pub async fn get_session(
        &self,
        session_id: &str,
        caller_id: Option<&str>,
    ) -> Result<Option<Session>> {
        match self.backend.get(session_id).await? {
            Some(session) => {
                check_owner(&session, caller_id)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Fetch a session, treating absence as an error
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` or `OwnerMismatch`.
    pub async fn require_session(&self, session_id: &str, caller_id: Option<&str>) -> Result<Session> {
        self.get_session(session_id, caller_id)
            .await?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Merge `update` into the stored session under the session lock
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `OwnerMismatch` or a backend error.
    pub async fn update_session(
        &self,
        session_id: &str,
        update: SessionUpdate,
        caller_id: Option<&str>,
    ) -> Result<()> {
        self.modify(session_id, caller_id, |session| {
            update.apply_to(session);
            Ok(())
        })
        .await
    }

    /// Run one atomic read-compute-write sequence on a session.
    ///
    /// Takes the session lock, loads the record (with the owner check),
    /// hands a working copy to `f`, and writes it back if `f` succeeds. The
    /// lock is released when this returns, on success and error alike, and
    /// nothing is written when `f` fails.
    ///
    /// `f` is responsible for stamping `last_modified` (via
    /// [`Session::touch`] or [`SessionUpdate::apply_to`]) when it changes
    /// the scratchpad or todos.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `OwnerMismatch`, the error from `f`, or a
    /// backend error.
    pub async fn modify<T, F>(&self, session_id: &str, caller_id: Option<&str>, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T> + Send,
        T: Send,
    {
        let _guard = self.locks.acquire(session_id).await;

        let mut session = self.require_session(session_id, caller_id).await?;
        let output = f(&mut session)?;
        self.backend.put(session_id, &session).await?;

        debug!(session_id = %session_id, "Session updated");
        Ok(output)
    }

    /// Delete a session and drop its lock entry
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `OwnerMismatch` or a backend error.
    pub async fn delete_session(&self, session_id: &str, caller_id: Option<&str>) -> Result<()> {
        {
            let _guard = self.locks.acquire(session_id).await;
            self.require_session(session_id, caller_id).await?;
            self.backend.remove(session_id).await?;
        }
        self.locks.release(session_id);

        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }

    /// Whether a live session exists. No owner check.
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    pub async fn session_exists(&self, session_id: &str) -> Result<bool> {
        self.backend.exists(session_id).await
    }

    /// Number of live sessions
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    pub async fn session_count(&self) -> Result<usize> {
        self.backend.count().await
    }

    /// Sweep expired sessions and prune idle lock entries.
    /// Returns the number of sessions removed.
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    pub async fn cleanup(&self) -> Result<usize> {
        let removed = self.backend.sweep_expired().await?;
        let pruned = self.locks.prune_idle();
        if removed > 0 || pruned > 0 {
            debug!(removed, pruned_locks = pruned, "Session cleanup finished");
        }
        Ok(removed)
    }

    /// Remove every session (administrative/test use)
    ///
    /// # Errors
    ///
    /// Propagates backend errors.
    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await?;
        self.locks.prune_idle();
        Ok(())
    }

    /// Number of per-session lock entries currently tracked
    #[must_use]
    pub fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}

fn check_owner(session: &Session, caller_id: Option<&str>) -> Result<()> {
    if session.accepts(caller_id) {
        Ok(())
    } else {
        warn!(session_id = %session.id, "Session access rejected: owner mismatch");
        Err(Error::OwnerMismatch(session.id.clone()))
    }
}
