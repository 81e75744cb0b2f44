//! Integration tests for Agentpad
//!
//! These tests drive the public `agentpad-core` API end to end over the
//! in-memory backend:
//! - Session lifecycle and scratchpad edits
//! - Todo management and filtering
//! - Owner binding
//! - Concurrent writers on one session
//! - TTL expiry and sweeping

use std::sync::Arc;
use std::time::Duration;

use agentpad_core::{
    render, Error, MemoryBackend, NewTodo, OutputFormat, Session, SessionStore, SessionUpdate,
    Todo, TodoFilter, TodoStatus, Workspace,
};

fn workspace_with_ttl(ttl: Duration) -> Workspace {
    let backend = MemoryBackend::new(ttl).unwrap();
    Workspace::new(Arc::new(SessionStore::new(Arc::new(backend))))
}

fn workspace() -> Workspace {
    workspace_with_ttl(Duration::from_secs(3600))
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[tokio::test]
async fn test_scratchpad_and_todo_lifecycle() {
    let ws = workspace();
    let store = ws.store();

    let session = store.create_session(None).await.unwrap();
    assert_eq!(session.scratchpad, "");
    assert!(session.todos.is_empty());

    ws.write_scratchpad(&session.id, "note A", None).await.unwrap();
    assert_eq!(ws.read_scratchpad(&session.id, None).await.unwrap(), "note A");

    let t1 = ws
        .add_todo(&session.id, NewTodo::titled("task 1"), None)
        .await
        .unwrap();
    let t2 = ws
        .add_todo(&session.id, NewTodo::titled("task 2"), None)
        .await
        .unwrap();
    assert_ne!(t1.id, t2.id);

    ws.update_todo_status(&session.id, &t1.id, TodoStatus::Done, None)
        .await
        .unwrap();

    let pending = ws
        .list_todos(&session.id, &TodoFilter::status(TodoStatus::Pending), None)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, t2.id);

    let all = ws
        .list_todos(&session.id, &TodoFilter::default(), None)
        .await
        .unwrap();
    let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![t1.id.as_str(), t2.id.as_str()]);

    store.delete_session(&session.id, None).await.unwrap();
    assert!(store.get_session(&session.id, None).await.unwrap().is_none());
    assert!(!store.session_exists(&session.id).await.unwrap());
}

#[tokio::test]
async fn test_update_session_preserves_created_at() {
    let ws = workspace();
    let store = ws.store();
    let session = store.create_session(None).await.unwrap();

    store
        .update_session(&session.id, SessionUpdate::scratchpad("x"), None)
        .await
        .unwrap();

    let stored = store.require_session(&session.id, None).await.unwrap();
    assert_eq!(stored.scratchpad, "x");
    assert_eq!(stored.created_at, session.created_at);
    assert!(stored.last_modified >= stored.created_at);
}

#[tokio::test]
async fn test_exists_is_idempotent() {
    let ws = workspace();
    let store = ws.store();
    let session = store.create_session(None).await.unwrap();

    for _ in 0..3 {
        assert!(store.session_exists(&session.id).await.unwrap());
    }
    for _ in 0..3 {
        assert!(!store.session_exists("missing").await.unwrap());
    }
    assert_eq!(store.session_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_operations_on_missing_session() {
    let ws = workspace();

    let err = ws.read_scratchpad("missing", None).await.unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(_)));

    let err = ws
        .add_todo("missing", NewTodo::titled("x"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(_)));

    let err = ws.store().delete_session("missing", None).await.unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(_)));
}

// ============================================================================
// Owner binding
// ============================================================================

#[tokio::test]
async fn test_owner_binding() {
    let ws = workspace();
    let store = ws.store();
    let session = store.create_session(Some("alice")).await.unwrap();
    assert_eq!(session.owner_id.as_deref(), Some("alice"));

    let err = ws
        .write_scratchpad(&session.id, "y", Some("bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::OwnerMismatch(_)));

    let err = store.get_session(&session.id, None).await.unwrap_err();
    assert!(matches!(err, Error::OwnerMismatch(_)));

    // Rejected writes leave the record untouched
    assert_eq!(
        ws.read_scratchpad(&session.id, Some("alice")).await.unwrap(),
        ""
    );

    ws.write_scratchpad(&session.id, "y", Some("alice"))
        .await
        .unwrap();
    assert_eq!(
        ws.read_scratchpad(&session.id, Some("alice")).await.unwrap(),
        "y"
    );
}

#[tokio::test]
async fn test_unbound_session_accepts_any_caller() {
    let ws = workspace();
    let session = ws.store().create_session(None).await.unwrap();

    ws.write_scratchpad(&session.id, "a", Some("alice"))
        .await
        .unwrap();
    ws.append_scratchpad(&session.id, "b", Some("bob"))
        .await
        .unwrap();
    assert_eq!(ws.read_scratchpad(&session.id, None).await.unwrap(), "ab");
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_todo_loses_nothing() {
    const WRITERS: usize = 40;

    let ws = workspace();
    let session = ws.store().create_session(None).await.unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let ws = ws.clone();
            let id = session.id.clone();
            tokio::spawn(async move {
                ws.add_todo(&id, NewTodo::titled(format!("task {}", i)), None)
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let todos = ws
        .list_todos(&session.id, &TodoFilter::default(), None)
        .await
        .unwrap();
    assert_eq!(todos.len(), WRITERS);

    let mut ids: Vec<&str> = todos.iter().map(|t| t.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_serialize() {
    let ws = workspace();
    let session = ws.store().create_session(None).await.unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let ws = ws.clone();
            let id = session.id.clone();
            tokio::spawn(async move { ws.append_scratchpad(&id, "x", None).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let content = ws.read_scratchpad(&session.id, None).await.unwrap();
    assert_eq!(content, "x".repeat(20));
}

// ============================================================================
// Expiry
// ============================================================================

#[tokio::test]
async fn test_expired_sessions_are_swept() {
    let ws = workspace_with_ttl(Duration::from_millis(50));
    let store = ws.store();

    for _ in 0..3 {
        store.create_session(None).await.unwrap();
    }
    assert_eq!(store.session_count().await.unwrap(), 3);

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(store.session_count().await.unwrap(), 0);
    assert_eq!(store.cleanup().await.unwrap(), 3);
    assert_eq!(store.cleanup().await.unwrap(), 0);
}

#[tokio::test]
async fn test_expired_session_reads_as_absent() {
    let ws = workspace_with_ttl(Duration::from_millis(50));
    let session = ws.store().create_session(None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(ws.store().get_session(&session.id, None).await.unwrap().is_none());
    let err = ws
        .write_scratchpad(&session.id, "late", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(_)));
}

// ============================================================================
// Serialization and rendering
// ============================================================================

#[tokio::test]
async fn test_session_round_trip() {
    let ws = workspace();
    let session = ws.store().create_session(Some("alice")).await.unwrap();
    ws.write_scratchpad(&session.id, "notes\nline two", Some("alice"))
        .await
        .unwrap();
    ws.add_todo(
        &session.id,
        NewTodo::titled("tagged")
            .with_description("desc")
            .with_tags(["b", "a"]),
        Some("alice"),
    )
    .await
    .unwrap();

    let stored = ws
        .store()
        .require_session(&session.id, Some("alice"))
        .await
        .unwrap();
    let json = serde_json::to_string(&stored).unwrap();
    let decoded: Session = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, stored);
    assert_eq!(decoded.todos[0].tags, vec!["b", "a"]);
}

#[tokio::test]
async fn test_compact_rendering_of_todos() {
    let ws = workspace();
    let session = ws.store().create_session(None).await.unwrap();
    let todo = ws
        .add_todo(
            &session.id,
            NewTodo::titled("ship").with_tags(["release"]),
            None,
        )
        .await
        .unwrap();

    let todos: Vec<Todo> = ws
        .list_todos(&session.id, &TodoFilter::default(), None)
        .await
        .unwrap();
    let text = render(&todos, OutputFormat::Compact).unwrap();
    assert_eq!(
        text,
        format!("id|status|title|tags\n{}|pending|ship|release\n", todo.id)
    );
}
