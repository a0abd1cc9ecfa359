//! Domain model for the personal todo list.
//!
//! # Responsibility
//! - Define the canonical `Todo` value object shared by store, service and
//!   view-state layers.
//! - Own field-level validation and text normalization rules.
//!
//! # Invariants
//! - Every todo is identified by a stable, non-nil `TodoId`.
//! - Deletion is permanent; there is no tombstone state.

pub mod todo;
