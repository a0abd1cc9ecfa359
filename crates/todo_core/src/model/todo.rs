//! Todo domain model.
//!
//! # Responsibility
//! - Define the in-memory `Todo` value object and its creation helpers.
//! - Normalize optional text so empty input is stored as absent.
//!
//! # Invariants
//! - `id` is generated client-side at creation and never changes.
//! - `title` is never empty or whitespace-only once validated.
//! - `created_at <= updated_at`.
//! - Timestamps carry millisecond precision, matching the storage encoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of one todo record.
pub type TodoId = Uuid;

/// Field-level validation failures for `Todo` writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoValidationError {
    #[error("todo title must not be empty")]
    EmptyTitle,
    #[error("todo id must not be nil")]
    NilId,
    #[error("updated_at ({updated_at}) must be >= created_at ({created_at})")]
    TimestampOrder {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

/// One personal todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Primary identity used for lookup, update and delete.
    pub id: TodoId,
    pub title: String,
    /// Free-form details. `None` when the user left the field empty.
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub is_completed: bool,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed by every mutation.
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Creates an open todo with a generated id and both timestamps set to now.
    pub fn new(title: impl Into<String>) -> Self {
        Self::new_at(Uuid::new_v4(), title, now_millis())
    }

    /// Creates an open todo with a caller-provided id.
    ///
    /// # Errors
    /// - `TodoValidationError::NilId` when `id` is the nil UUID.
    pub fn with_id(id: TodoId, title: impl Into<String>) -> Result<Self, TodoValidationError> {
        if id.is_nil() {
            return Err(TodoValidationError::NilId);
        }
        Ok(Self::new_at(id, title, now_millis()))
    }

    fn new_at(id: TodoId, title: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            due_date: None,
            location: None,
            is_completed: false,
            created_at: at,
            updated_at: at,
        }
    }

    /// Sets the description, treating empty or whitespace-only text as absent.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = normalize_optional_text(Some(description.into()));
        self
    }

    /// Sets the location, treating empty or whitespace-only text as absent.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = normalize_optional_text(Some(location.into()));
        self
    }

    /// Sets the due date, truncated to millisecond precision.
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(truncate_to_millis(due_date));
        self
    }

    /// Overrides the creation timestamp. `updated_at` follows when it would
    /// otherwise fall behind.
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        let at = truncate_to_millis(at);
        self.created_at = at;
        if self.updated_at < at {
            self.updated_at = at;
        }
        self
    }

    /// Returns a copy in storage shape: blank optional text becomes `None`
    /// and every timestamp is truncated to milliseconds.
    pub fn normalized(mut self) -> Self {
        self.description = normalize_optional_text(self.description.take());
        self.location = normalize_optional_text(self.location.take());
        self.due_date = self.due_date.map(truncate_to_millis);
        self.created_at = truncate_to_millis(self.created_at);
        self.updated_at = truncate_to_millis(self.updated_at);
        self
    }

    /// Validates the fields a caller controls on every write.
    pub fn validate_content(&self) -> Result<(), TodoValidationError> {
        if self.id.is_nil() {
            return Err(TodoValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(TodoValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Validates the full record, including timestamp ordering.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        self.validate_content()?;
        if self.updated_at < self.created_at {
            return Err(TodoValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

/// User input for creating a todo from an "add" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Turns the draft into a fresh todo with a new id and equal timestamps.
    ///
    /// The title is kept verbatim; validation happens on write.
    pub fn into_todo(self) -> Todo {
        let mut todo = Todo::new(self.title);
        todo.description = normalize_optional_text(self.description);
        todo.location = normalize_optional_text(self.location);
        todo.due_date = self.due_date.map(truncate_to_millis);
        todo
    }
}

/// Current time truncated to the millisecond precision used by storage.
pub fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

/// Drops sub-millisecond precision from `value`.
pub fn truncate_to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}

fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{normalize_optional_text, truncate_to_millis};
    use chrono::{TimeZone, Timelike, Utc};

    #[test]
    fn normalize_optional_text_drops_blank_values() {
        assert_eq!(normalize_optional_text(Some(String::new())), None);
        assert_eq!(normalize_optional_text(Some("  \t".to_string())), None);
        assert_eq!(
            normalize_optional_text(Some(" kitchen ".to_string())).as_deref(),
            Some(" kitchen ")
        );
        assert_eq!(normalize_optional_text(None), None);
    }

    #[test]
    fn truncate_to_millis_drops_sub_millisecond_part() {
        let precise = Utc
            .with_ymd_and_hms(2026, 3, 1, 8, 30, 0)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        let truncated = truncate_to_millis(precise);
        assert_eq!(truncated.nanosecond(), 123_000_000);
        assert_eq!(truncated.timestamp_millis(), precise.timestamp_millis());
    }
}
