//! Session and todo records
//!
//! A session is a short-lived workspace holding a free-form scratchpad and an
//! ordered todo list. Records are plain values: every read hands out a clone,
//! so callers can never mutate stored state through a returned record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Completion state of a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    /// Not yet done
    #[default]
    Pending,
    /// Completed
    Done,
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Done => write!(f, "done"),
        }
    }
}

impl FromStr for TodoStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown todo status '{}', expected 'pending' or 'done'",
                other
            ))),
        }
    }
}

/// A single task inside a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Handle, unique within the owning session
    pub id: String,
    /// Non-empty title
    pub title: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Tags in first-seen order, without duplicates
    #[serde(default)]
    pub tags: Vec<String>,
    /// Completion state
    #[serde(default)]
    pub status: TodoStatus,
    /// Creation timestamp (immutable)
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Whether the todo carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A session workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session handle (immutable)
    pub id: String,
    /// Bound caller identity; `None` means any caller may access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Note buffer, replaced as a whole on write
    #[serde(default)]
    pub scratchpad: String,
    /// Todos in insertion order
    #[serde(default)]
    pub todos: Vec<Todo>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last successful scratchpad or todo mutation
    pub last_modified: DateTime<Utc>,
}

impl Session {
    /// Create an empty session.
    ///
    /// An empty owner string is treated as "no owner" so a blank identity
    /// header never produces a session nobody can open.
    #[must_use]
    pub fn new(id: impl Into<String>, owner_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner_id: owner_id.filter(|o| !o.is_empty()),
            scratchpad: String::new(),
            todos: Vec::new(),
            created_at: now,
            last_modified: now,
        }
    }

    /// Whether `caller_id` may access this session.
    ///
    /// Unbound sessions accept everyone. Bound sessions require an exact
    /// match, so an absent caller is rejected.
    #[must_use]
    pub fn accepts(&self, caller_id: Option<&str>) -> bool {
        match self.owner_id.as_deref() {
            None => true,
            Some(owner) => caller_id == Some(owner),
        }
    }

    /// Look up a todo by id
    #[must_use]
    pub fn todo(&self, todo_id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == todo_id)
    }

    /// Stamp `last_modified`, never moving it before `created_at`
    pub fn touch(&mut self) {
        self.last_modified = Utc::now().max(self.created_at);
    }
}

/// Partial update merged into a stored session.
///
/// Fields left as `None` keep their stored value. `id`, `owner_id` and
/// `created_at` are not updatable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    /// Replacement scratchpad
    pub scratchpad: Option<String>,
    /// Replacement todo list
    pub todos: Option<Vec<Todo>>,
}

impl SessionUpdate {
    /// Replace the scratchpad
    #[must_use]
    pub fn scratchpad(content: impl Into<String>) -> Self {
        Self {
            scratchpad: Some(content.into()),
            ..Self::default()
        }
    }

    /// Replace the todo list
    #[must_use]
    pub fn todos(todos: Vec<Todo>) -> Self {
        Self {
            todos: Some(todos),
            ..Self::default()
        }
    }

    /// Whether the update carries no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scratchpad.is_none() && self.todos.is_none()
    }

    /// Merge into `session`, stamping `last_modified` when anything changed
    pub fn apply_to(self, session: &mut Session) {
        if self.is_empty() {
            return;
        }
        if let Some(scratchpad) = self.scratchpad {
            session.scratchpad = scratchpad;
        }
        if let Some(todos) = self.todos {
            session.todos = todos;
        }
        session.touch();
    }
}

#[cfg(test)]
mod tests;
