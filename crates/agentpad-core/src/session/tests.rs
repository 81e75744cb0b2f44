use super::*;
use chrono::TimeZone;

fn sample_todo(id: &str, title: &str) -> Todo {
    Todo {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        tags: Vec::new(),
        status: TodoStatus::Pending,
        created_at: Utc::now(),
    }
}

#[test]
fn test_new_session_is_empty() {
    let session = Session::new("abc", None);
    assert_eq!(session.id, "abc");
    assert!(session.owner_id.is_none());
    assert!(session.scratchpad.is_empty());
    assert!(session.todos.is_empty());
    assert_eq!(session.created_at, session.last_modified);
}

#[test]
fn test_blank_owner_is_unbound() {
    let session = Session::new("abc", Some(String::new()));
    assert!(session.owner_id.is_none());
    assert!(session.accepts(None));
}

#[test]
fn test_owner_binding() {
    let session = Session::new("abc", Some("u1".to_string()));
    assert!(session.accepts(Some("u1")));
    assert!(!session.accepts(Some("u2")));
    assert!(!session.accepts(None));

    let open = Session::new("def", None);
    assert!(open.accepts(None));
    assert!(open.accepts(Some("anyone")));
}

#[test]
fn test_round_trip_is_lossless() {
    let mut session = Session::new("abc", Some("alice".to_string()));
    session.created_at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    session.last_modified = Utc.timestamp_opt(1_700_000_100, 987_654_321).unwrap();
    session.scratchpad = "line one\nline two ✓".to_string();
    session.todos = vec![
        Todo {
            tags: vec!["zeta".into(), "alpha".into(), "mid".into()],
            description: "first".into(),
            status: TodoStatus::Done,
            ..sample_todo("t2", "second in id order, first in list")
        },
        sample_todo("t1", "another"),
    ];

    let json = serde_json::to_string(&session).unwrap();
    let restored: Session = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, session);
    assert_eq!(restored.todos[0].tags, vec!["zeta", "alpha", "mid"]);
    assert_eq!(restored.created_at.timestamp_subsec_nanos(), 123_456_789);
}

#[test]
fn test_todo_defaults_when_fields_missing() {
    let json = r#"{"id":"t1","title":"x","created_at":"2024-01-01T00:00:00Z"}"#;
    let todo: Todo = serde_json::from_str(json).unwrap();
    assert_eq!(todo.status, TodoStatus::Pending);
    assert!(todo.description.is_empty());
    assert!(todo.tags.is_empty());
}

#[test]
fn test_status_parsing() {
    assert_eq!("done".parse::<TodoStatus>().unwrap(), TodoStatus::Done);
    assert_eq!(" Pending ".parse::<TodoStatus>().unwrap(), TodoStatus::Pending);
    assert!("finished".parse::<TodoStatus>().is_err());
    assert_eq!(TodoStatus::Done.to_string(), "done");
}

#[test]
fn test_update_merges_only_given_fields() {
    let mut session = Session::new("abc", None);
    session.scratchpad = "keep".to_string();
    let before = session.last_modified;

    SessionUpdate::todos(vec![sample_todo("t1", "a")]).apply_to(&mut session);

    assert_eq!(session.scratchpad, "keep");
    assert_eq!(session.todos.len(), 1);
    assert!(session.last_modified >= before);
    assert!(session.last_modified >= session.created_at);
}

#[test]
fn test_empty_update_does_not_touch() {
    let mut session = Session::new("abc", None);
    let before = session.last_modified;
    SessionUpdate::default().apply_to(&mut session);
    assert_eq!(session.last_modified, before);
}

#[test]
fn test_todo_lookup() {
    let mut session = Session::new("abc", None);
    session.todos.push(sample_todo("t1", "a"));
    assert_eq!(session.todo("t1").map(|t| t.title.as_str()), Some("a"));
    assert!(session.todo("missing").is_none());
}
