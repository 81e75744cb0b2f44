//! Result rendering
//!
//! Turns store results into caller-visible text, either as JSON or as a
//! compact pipe-separated table that is cheaper for agents to read.

use crate::error::{Error, Result};
use crate::session::{Session, Todo};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Pipe-separated text
    Compact,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "compact" | "text" => Ok(Self::Compact),
            other => Err(Error::InvalidInput(format!(
                "unknown output format '{}', expected 'json' or 'compact'",
                other
            ))),
        }
    }
}

/// Values that have a compact text form
pub trait CompactRender {
    /// Write the compact form into `out`
    fn render_compact(&self, out: &mut String);
}

/// Render `value` in `format`
///
/// # Errors
///
/// Returns `Serialization` if JSON encoding fails.
pub fn render<T>(value: &T, format: OutputFormat) -> Result<String>
where
    T: Serialize + CompactRender + ?Sized,
{
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Compact => {
            let mut out = String::new();
            value.render_compact(&mut out);
            Ok(out)
        }
    }
}

/// Escape a table cell so it cannot break the row layout
fn cell(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

impl CompactRender for [Todo] {
    fn render_compact(&self, out: &mut String) {
        out.push_str("id|status|title|tags\n");
        for todo in self {
            let tags: Vec<String> = todo.tags.iter().map(|t| cell(t)).collect();
            let _ = writeln!(
                out,
                "{}|{}|{}|{}",
                cell(&todo.id),
                todo.status,
                cell(&todo.title),
                tags.join(",")
            );
        }
    }
}

impl CompactRender for Vec<Todo> {
    fn render_compact(&self, out: &mut String) {
        self.as_slice().render_compact(out);
    }
}

impl CompactRender for Todo {
    fn render_compact(&self, out: &mut String) {
        std::slice::from_ref(self).render_compact(out);
    }
}

impl CompactRender for Session {
    fn render_compact(&self, out: &mut String) {
        let _ = writeln!(out, "id: {}", self.id);
        if let Some(owner) = &self.owner_id {
            let _ = writeln!(out, "owner: {}", cell(owner));
        }
        let _ = writeln!(out, "created: {}", self.created_at.to_rfc3339());
        let _ = writeln!(out, "modified: {}", self.last_modified.to_rfc3339());
        let _ = writeln!(out, "scratchpad: {}", cell(&self.scratchpad));
        let _ = writeln!(out, "todos: {}", self.todos.len());
        self.todos.render_compact(out);
    }
}

impl CompactRender for String {
    fn render_compact(&self, out: &mut String) {
        out.push_str(self);
    }
}
