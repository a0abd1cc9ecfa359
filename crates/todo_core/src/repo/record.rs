//! Persisted row shape for the `todos` table.

use crate::model::todo::TodoId;

/// One row of the `todos` table, in storage encoding.
///
/// Timestamps are Unix epoch milliseconds; the completion flag is stored as
/// an integer and decoded before it reaches this struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRecord {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<i64>,
    pub location: Option<String>,
    pub is_completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
