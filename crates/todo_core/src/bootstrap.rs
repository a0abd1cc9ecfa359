//! Explicit wiring from configuration to a ready todo service.
//!
//! # Responsibility
//! - Start logging, open the store and construct the service in order.
//! - Hand collaborators to each component through its constructor.
//!
//! # Invariants
//! - The returned service exclusively owns the store connection; callers
//!   release it with `TodoService::shutdown`.

use crate::config::CoreConfig;
use crate::db::{open_db, DbError};
use crate::logging::{init_logging, LoggingError};
use crate::service::todo_service::{ServiceError, TodoService};
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),
    #[error("todo store open failed: {0}")]
    Db(#[from] DbError),
    #[error("todo service start failed: {0}")]
    Service(#[from] ServiceError),
}

/// Builds the todo service described by `config`.
///
/// View-models are created per screen from clones of the returned service:
/// `TodoViewModel::new(service.clone())`.
pub async fn bootstrap(config: &CoreConfig) -> Result<TodoService, BootstrapError> {
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let db_path = config.db_path.clone();
    let conn = tokio::task::spawn_blocking(move || open_db(db_path))
        .await
        .map_err(|err| ServiceError::Background(err.to_string()))??;

    let service = TodoService::open(conn, config.ordering).await?;
    info!(
        "event=bootstrap module=core status=ok ordering={}",
        config.ordering.as_str()
    );
    Ok(service)
}
