//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persisted record shape and its mapping to the domain model.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Todo::validate_content()` before
//!   persistence.
//! - "Not found" on read, toggle and delete is an empty result, never an
//!   error.

pub mod mapper;
pub mod record;
pub mod todo_repo;
