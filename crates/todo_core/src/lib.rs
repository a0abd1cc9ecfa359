//! Core domain logic for the personal todo app.
//! This crate owns persistence, ordering and view-state; platform UI layers
//! only render the observables it exposes.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod observable;
pub mod repo;
pub mod service;
pub mod view_model;

pub use bootstrap::{bootstrap, BootstrapError};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::todo::{Todo, TodoDraft, TodoId, TodoValidationError};
pub use observable::{Observable, Subscription};
pub use repo::record::TodoRecord;
pub use repo::todo_repo::{
    RepoError, RepoResult, SqliteTodoRepository, TodoOrdering, TodoRepository,
};
pub use service::todo_service::{ServiceError, ServiceResult, TodoService};
pub use view_model::todo_view_model::TodoViewModel;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
