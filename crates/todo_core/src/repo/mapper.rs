//! Conversion between `TodoRecord` and the `Todo` domain object.
//!
//! Both directions are pure and total. Epoch values outside the range chrono
//! can represent saturate to its minimum or maximum instant.

use crate::model::todo::Todo;
use crate::repo::record::TodoRecord;
use chrono::{DateTime, Utc};

/// Converts a stored row into the domain value.
pub fn to_domain(record: TodoRecord) -> Todo {
    Todo {
        id: record.id,
        title: record.title,
        description: record.description,
        due_date: record.due_date.map(millis_to_datetime),
        location: record.location,
        is_completed: record.is_completed,
        created_at: millis_to_datetime(record.created_at),
        updated_at: millis_to_datetime(record.updated_at),
    }
}

/// Converts a domain value into its storage row.
pub fn to_record(todo: &Todo) -> TodoRecord {
    TodoRecord {
        id: todo.id,
        title: todo.title.clone(),
        description: todo.description.clone(),
        due_date: todo.due_date.map(|at| at.timestamp_millis()),
        location: todo.location.clone(),
        is_completed: todo.is_completed,
        created_at: todo.created_at.timestamp_millis(),
        updated_at: todo.updated_at.timestamp_millis(),
    }
}

impl From<TodoRecord> for Todo {
    fn from(value: TodoRecord) -> Self {
        to_domain(value)
    }
}

impl From<&Todo> for TodoRecord {
    fn from(value: &Todo) -> Self {
        to_record(value)
    }
}

pub(crate) fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(if millis < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}
