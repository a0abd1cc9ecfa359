//! View-state holders consumed by the platform UI layer.
//!
//! Screens render the observables exposed here and dispatch user intents as
//! method calls; they own no persisted state.

pub mod todo_view_model;
