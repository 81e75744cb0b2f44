//! Agentpad Core - Ephemeral per-agent workspaces
//!
//! Each workspace is a session identified by an opaque, hard-to-guess handle
//! and holds a free-form scratchpad plus an ordered todo list. Sessions live
//! for a bounded TTL and may be bound to a caller identity.
//!
//! ## Architecture
//!
//! ```text
//! request handler
//!       │
//!       ▼
//!  Workspace ──► SessionStore ──► SessionLocks (per-session mutex)
//!                    │      └───► IdGenerator (on creation)
//!                    ▼
//!             StorageBackend
//!              ├─ MemoryBackend (active sweep)
//!              └─ RedisBackend  (native expiry)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod error;
pub mod ids;
pub mod lock;
pub mod render;
pub mod session;
pub mod store;
pub mod sweeper;
pub mod workspace;

pub use backend::{create_backend, MemoryBackend, RedisBackend, StorageBackend};
pub use config::{BackendKind, RedisConfig, StoreConfig};
pub use error::{Error, Result};
pub use ids::{generate_id, IdGenerator, RandomIds};
pub use lock::{SessionGuard, SessionLocks};
pub use render::{render, CompactRender, OutputFormat};
pub use session::{Session, SessionUpdate, Todo, TodoStatus};
pub use store::{SessionStore, MAX_ID_ATTEMPTS};
pub use sweeper::spawn_sweeper;
pub use workspace::{NewTodo, TodoFilter, Workspace};
