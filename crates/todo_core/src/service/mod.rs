//! Core use-case services.
//!
//! # Responsibility
//! - Expose the todo store to asynchronous callers.
//! - Keep view-state layers decoupled from SQLite and blocking I/O.

pub mod todo_service;
