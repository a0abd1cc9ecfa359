use chrono::{DateTime, TimeZone, Timelike, Utc};
use rusqlite::Connection;
use todo_core::db::migrations::latest_version;
use todo_core::db::open_db_in_memory;
use todo_core::{
    RepoError, SqliteTodoRepository, Todo, TodoOrdering, TodoRepository, TodoValidationError,
};
use uuid::Uuid;

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let due = Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap();
    let todo = Todo::new("Buy milk")
        .with_description("2 liters")
        .with_location("Corner shop")
        .with_due_date(due);
    let id = repo.insert_todo(&todo).unwrap();
    assert_eq!(id, todo.id);

    let loaded = repo.get_todo(id).unwrap().unwrap();
    assert_eq!(loaded, todo);
}

#[test]
fn sub_millisecond_timestamps_are_stored_truncated() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let precise = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .unwrap()
        .with_nanosecond(123_456_789)
        .unwrap();
    let mut todo = Todo::new("Precise");
    todo.created_at = precise;
    todo.updated_at = precise;
    todo.due_date = Some(precise);
    repo.insert_todo(&todo).unwrap();

    let loaded = repo.get_todo(todo.id).unwrap().unwrap();
    assert_eq!(loaded, todo.clone().normalized());
    assert_eq!(loaded.created_at.nanosecond(), 123_000_000);
    assert_eq!(loaded.due_date.map(|at| at.nanosecond()), Some(123_000_000));
    assert_eq!(repo.get_todo(todo.id).unwrap().unwrap(), loaded);
}

#[test]
fn get_unknown_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    assert!(repo.get_todo(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn blank_title_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let err = repo.insert_todo(&Todo::new("   ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TodoValidationError::EmptyTitle)
    ));
    assert_eq!(repo.count_todos().unwrap(), 0);

    let mut stored = Todo::new("valid");
    repo.insert_todo(&stored).unwrap();
    stored.title = String::new();
    let err = repo.update_todo(&stored).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TodoValidationError::EmptyTitle)
    ));
    assert_eq!(repo.get_todo(stored.id).unwrap().unwrap().title, "valid");
}

#[test]
fn inserting_same_id_twice_replaces_the_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let first = todo_with_fixed_id("00000000-0000-4000-8000-000000000001", "first");
    repo.insert_todo(&first).unwrap();

    let mut second = first.clone();
    second.title = "second".to_string();
    second.location = Some("Office".to_string());
    repo.insert_todo(&second).unwrap();

    assert_eq!(repo.count_todos().unwrap(), 1);
    let loaded = repo.get_todo(first.id).unwrap().unwrap();
    assert_eq!(loaded.title, "second");
    assert_eq!(loaded.location.as_deref(), Some("Office"));
}

#[test]
fn update_keeps_created_at_and_advances_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let created = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
    let mut todo = Todo::new("draft").with_created_at(created);
    todo.updated_at = created;
    repo.insert_todo(&todo).unwrap();

    todo.title = "final".to_string();
    todo.is_completed = true;
    todo.created_at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let first = repo.update_todo(&todo).unwrap();

    assert_eq!(first.title, "final");
    assert!(first.is_completed);
    assert_eq!(first.created_at, created);
    assert!(first.updated_at > created);

    let second = repo.update_todo(&first).unwrap();
    assert!(second.updated_at > first.updated_at);
    assert_eq!(repo.get_todo(todo.id).unwrap().unwrap(), second);
}

#[test]
fn update_unknown_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let ghost = Todo::new("ghost");
    let err = repo.update_todo(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost.id));
    assert_eq!(repo.count_todos().unwrap(), 0);
}

#[test]
fn delete_removes_only_the_target_and_ignores_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let keep = Todo::new("keep");
    let drop_me = Todo::new("drop");
    repo.insert_todo(&keep).unwrap();
    repo.insert_todo(&drop_me).unwrap();

    assert!(repo.delete_todo(drop_me.id).unwrap());
    assert!(!repo.delete_todo(drop_me.id).unwrap());
    assert!(!repo.delete_todo(Uuid::new_v4()).unwrap());

    assert!(repo.get_todo(drop_me.id).unwrap().is_none());
    assert_eq!(repo.get_todo(keep.id).unwrap().unwrap(), keep);
}

#[test]
fn toggle_flips_only_the_target() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let target = Todo::new("target");
    let other = Todo::new("other");
    repo.insert_todo(&target).unwrap();
    repo.insert_todo(&other).unwrap();

    let toggled = repo.toggle_completion(target.id).unwrap().unwrap();
    assert!(toggled.is_completed);
    assert!(toggled.updated_at > target.updated_at);
    assert_eq!(toggled.created_at, target.created_at);
    assert_eq!(repo.get_todo(other.id).unwrap().unwrap(), other);

    let back = repo.toggle_completion(target.id).unwrap().unwrap();
    assert!(!back.is_completed);
    assert!(back.updated_at > toggled.updated_at);

    assert!(repo.toggle_completion(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn newest_first_orders_by_descending_creation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let a = todo_created_at("A", at_minute(0));
    let b = todo_created_at("B", at_minute(1));
    let c = todo_created_at("C", at_minute(2));
    repo.insert_todo(&b).unwrap();
    repo.insert_todo(&a).unwrap();
    repo.insert_todo(&c).unwrap();

    assert_eq!(
        titles(&repo, TodoOrdering::NewestFirst),
        vec!["C", "B", "A"]
    );
}

#[test]
fn equal_creation_times_fall_back_to_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let second = todo_with_fixed_id("00000000-0000-4000-8000-000000000002", "second");
    let first = todo_with_fixed_id("00000000-0000-4000-8000-000000000001", "first");
    repo.insert_todo(&second).unwrap();
    repo.insert_todo(&first).unwrap();
    conn.execute("UPDATE todos SET created_at = 1000, updated_at = 1000;", [])
        .unwrap();

    assert_eq!(
        titles(&repo, TodoOrdering::NewestFirst),
        vec!["first", "second"]
    );
}

#[test]
fn completion_then_due_lists_open_undated_items_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let done = todo_created_at("done", at_minute(0)).with_due_date(at_minute(10));
    let undated = todo_created_at("undated", at_minute(1));
    let later = todo_created_at("later", at_minute(2)).with_due_date(at_minute(59));
    let sooner = todo_created_at("sooner", at_minute(3)).with_due_date(at_minute(30));
    for todo in [&done, &undated, &later, &sooner] {
        repo.insert_todo(todo).unwrap();
    }
    repo.toggle_completion(done.id).unwrap();

    assert_eq!(
        titles(&repo, TodoOrdering::CompletionThenDue),
        vec!["undated", "sooner", "later", "done"]
    );
}

#[test]
fn delete_completed_removes_only_completed_items() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    let open = Todo::new("open");
    let mut done_one = Todo::new("done one");
    done_one.is_completed = true;
    let mut done_two = Todo::new("done two");
    done_two.is_completed = true;
    for todo in [&open, &done_one, &done_two] {
        repo.insert_todo(todo).unwrap();
    }

    assert_eq!(repo.delete_completed().unwrap(), 2);
    assert_eq!(repo.delete_completed().unwrap(), 0);
    assert_eq!(repo.count_todos().unwrap(), 1);
    assert!(repo.get_todo(open.id).unwrap().is_some());
}

#[test]
fn malformed_row_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTodoRepository::try_new(&conn).unwrap();

    conn.execute(
        "INSERT INTO todos (id, title, is_completed, created_at, updated_at)
         VALUES ('not-a-uuid', 'broken', 0, 1, 1);",
        [],
    )
    .unwrap();

    let err = repo.list_todos(TodoOrdering::NewestFirst).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("not-a-uuid")));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteTodoRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_todos_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTodoRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("todos"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_todos_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE todos (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            due_date INTEGER,
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTodoRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "todos",
            column: "location"
        })
    ));
}

fn titles(repo: &SqliteTodoRepository<'_>, ordering: TodoOrdering) -> Vec<String> {
    repo.list_todos(ordering)
        .unwrap()
        .into_iter()
        .map(|todo| todo.title)
        .collect()
}

fn at_minute(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 10, minute, 0).unwrap()
}

fn todo_created_at(title: &str, created_at: DateTime<Utc>) -> Todo {
    let mut todo = Todo::new(title).with_created_at(created_at);
    todo.updated_at = created_at;
    todo
}

fn todo_with_fixed_id(id: &str, title: &str) -> Todo {
    Todo::with_id(Uuid::parse_str(id).unwrap(), title).unwrap()
}
