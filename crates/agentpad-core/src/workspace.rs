//! Workspace operations
//!
//! Scratchpad and todo operations as request handlers call them. Every
//! mutation goes through [`SessionStore::modify`], so a todo change is one
//! locked read-compute-write unit and concurrent calls on the same session
//! never lose updates.

use crate::error::{Error, Result};
use crate::session::{Todo, TodoStatus};
use crate::store::SessionStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Attempts at a todo id that does not clash within its session
const MAX_TODO_ID_ATTEMPTS: usize = 10;

/// Input for a new todo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTodo {
    /// Title, must not be blank
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional tags; duplicates are dropped
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewTodo {
    /// A todo with just a title
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the tags
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Filter for listing todos; empty matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoFilter {
    /// Only todos in this state
    #[serde(default)]
    pub status: Option<TodoStatus>,
    /// Only todos carrying this tag
    #[serde(default)]
    pub tag: Option<String>,
}

impl TodoFilter {
    /// Match todos in `status`
    #[must_use]
    pub fn status(status: TodoStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn matches(&self, todo: &Todo) -> bool {
        self.status.map_or(true, |s| todo.status == s)
            && self.tag.as_deref().map_or(true, |t| todo.has_tag(t))
    }
}

/// Scratchpad and todo operations over a shared [`SessionStore`]
#[derive(Clone)]
pub struct Workspace {
    store: Arc<SessionStore>,
}

impl Workspace {
    /// Wrap a store
    #[must_use]
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Current scratchpad content
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `OwnerMismatch` or a backend error.
    pub async fn read_scratchpad(&self, session_id: &str, caller_id: Option<&str>) -> Result<String> {
        let session = self.store.require_session(session_id, caller_id).await?;
        Ok(session.scratchpad)
    }

    /// Replace the scratchpad
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `OwnerMismatch` or a backend error.
    pub async fn write_scratchpad(
        &self,
        session_id: &str,
        content: impl Into<String>,
        caller_id: Option<&str>,
    ) -> Result<()> {
        let content = content.into();
        self.store
            .modify(session_id, caller_id, move |session| {
                session.scratchpad = content;
                session.touch();
                Ok(())
            })
            .await
    }

    /// Append to the scratchpad; returns the new content
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `OwnerMismatch` or a backend error.
    pub async fn append_scratchpad(
        &self,
        session_id: &str,
        content: &str,
        caller_id: Option<&str>,
    ) -> Result<String> {
        let content = content.to_string();
        self.store
            .modify(session_id, caller_id, move |session| {
                session.scratchpad.push_str(&content);
                session.touch();
                Ok(session.scratchpad.clone())
            })
            .await
    }

    /// Append a todo to the session's list
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank title, `SessionNotFound`,
    /// `OwnerMismatch` or a backend error.
    pub async fn add_todo(
        &self,
        session_id: &str,
        new_todo: NewTodo,
        caller_id: Option<&str>,
    ) -> Result<Todo> {
        let title = new_todo.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidInput("todo title must not be empty".to_string()));
        }
        let tags = dedup_tags(new_todo.tags);
        let description = new_todo.description.unwrap_or_default();

        // Candidates are drawn up front; the closure runs under the lock and must not await
        let candidates: Vec<String> = (0..MAX_TODO_ID_ATTEMPTS)
            .map(|_| self.store.generate_todo_id())
            .collect();

        let todo = self
            .store
            .modify(session_id, caller_id, move |session| {
                let id = candidates
                    .into_iter()
                    .find(|c| session.todo(c).is_none())
                    .ok_or(Error::GenerationExhausted {
                        attempts: MAX_TODO_ID_ATTEMPTS,
                    })?;
                let todo = Todo {
                    id,
                    title,
                    description,
                    tags,
                    status: TodoStatus::Pending,
                    created_at: Utc::now(),
                };
                session.todos.push(todo.clone());
                session.touch();
                Ok(todo)
            })
            .await?;

        debug!(session_id = %session_id, todo_id = %todo.id, "Todo added");
        Ok(todo)
    }

    /// Todos matching `filter`, in insertion order
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `OwnerMismatch` or a backend error.
    pub async fn list_todos(
        &self,
        session_id: &str,
        filter: &TodoFilter,
        caller_id: Option<&str>,
    ) -> Result<Vec<Todo>> {
        let session = self.store.require_session(session_id, caller_id).await?;
        Ok(session
            .todos
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect())
    }

    /// Set a todo's status; returns the updated todo
    ///
    /// # Errors
    ///
    /// Returns `TodoNotFound`, `SessionNotFound`, `OwnerMismatch` or a
    /// backend error.
    pub async fn update_todo_status(
        &self,
        session_id: &str,
        todo_id: &str,
        status: TodoStatus,
        caller_id: Option<&str>,
    ) -> Result<Todo> {
        self.store
            .modify(session_id, caller_id, |session| {
                let todo = session
                    .todos
                    .iter_mut()
                    .find(|t| t.id == todo_id)
                    .ok_or_else(|| todo_not_found(session_id, todo_id))?;
                todo.status = status;
                let updated = todo.clone();
                session.touch();
                Ok(updated)
            })
            .await
    }

    /// Remove a todo
    ///
    /// # Errors
    ///
    /// Returns `TodoNotFound`, `SessionNotFound`, `OwnerMismatch` or a
    /// backend error.
    pub async fn delete_todo(
        &self,
        session_id: &str,
        todo_id: &str,
        caller_id: Option<&str>,
    ) -> Result<()> {
        self.store
            .modify(session_id, caller_id, |session| {
                let index = session
                    .todos
                    .iter()
                    .position(|t| t.id == todo_id)
                    .ok_or_else(|| todo_not_found(session_id, todo_id))?;
                session.todos.remove(index);
                session.touch();
                Ok(())
            })
            .await
    }
}

fn todo_not_found(session_id: &str, todo_id: &str) -> Error {
    Error::TodoNotFound {
        session_id: session_id.to_string(),
        todo_id: todo_id.to_string(),
    }
}

/// Trim tags, drop empties and repeats, keep first-seen order
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
