//! Asynchronous todo store facade.
//!
//! # Responsibility
//! - Run every store operation on the Tokio blocking pool so callers only
//!   suspend, never block.
//! - Publish the ordered todo list as a live, restartable subscription.
//! - Own the SQLite connection for the application's lifetime and close it
//!   on shutdown.
//!
//! # Invariants
//! - All access to the connection is serialized through one mutex.
//! - The live list is republished under that same lock after every
//!   successful mutation, so subscribers observe writes in issue order.
//! - Validation errors reach the caller unchanged.

use crate::model::todo::{Todo, TodoId};
use crate::observable::{Observable, Subscription};
use crate::repo::todo_repo::{
    RepoError, RepoResult, SqliteTodoRepository, TodoOrdering, TodoRepository,
};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Repo(#[from] RepoError),
    #[error("todo store is closed")]
    Closed,
    #[error("background store task failed: {0}")]
    Background(String),
}

impl ServiceError {
    /// Returns whether the failure is a rejected write (e.g. empty title).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Repo(RepoError::Validation(_)))
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Repo(RepoError::Validation(_)) => "validation_failed",
            Self::Repo(RepoError::NotFound(_)) => "not_found",
            Self::Repo(RepoError::InvalidData(_)) => "invalid_data",
            Self::Repo(_) => "store_failed",
            Self::Closed => "store_closed",
            Self::Background(_) => "background_failed",
        }
    }
}

struct ServiceInner {
    conn: Mutex<Option<Connection>>,
    ordering: TodoOrdering,
    live: Observable<Vec<Todo>>,
}

impl ServiceInner {
    fn publish(&self, repo: &SqliteTodoRepository<'_>) {
        match repo.list_todos(self.ordering) {
            Ok(todos) => self.live.set_if_changed(todos),
            Err(err) => error!(
                "event=todo_live_refresh module=service status=error error={}",
                err
            ),
        }
    }
}

/// Async todo store shared by every view-state holder.
///
/// Cloning is cheap; clones share the connection and the live list.
#[derive(Clone)]
pub struct TodoService {
    inner: Arc<ServiceInner>,
}

impl TodoService {
    /// Takes ownership of a migrated connection and loads the initial list.
    ///
    /// # Errors
    /// - Repository readiness errors when `conn` was not opened through
    ///   `db::open_db*`.
    pub async fn open(conn: Connection, ordering: TodoOrdering) -> ServiceResult<Self> {
        let conn = tokio::task::spawn_blocking(move || -> ServiceResult<Connection> {
            SqliteTodoRepository::try_new(&conn)?;
            Ok(conn)
        })
        .await
        .unwrap_or_else(|err| Err(ServiceError::Background(err.to_string())))?;

        let service = Self {
            inner: Arc::new(ServiceInner {
                conn: Mutex::new(Some(conn)),
                ordering,
                live: Observable::new(Vec::new()),
            }),
        };
        service.refresh().await?;
        info!(
            "event=todo_service_open module=service status=ok ordering={} todo_count={}",
            ordering.as_str(),
            service.inner.live.get().len()
        );
        Ok(service)
    }

    pub fn ordering(&self) -> TodoOrdering {
        self.inner.ordering
    }

    /// Subscribes to the ordered list of all todos.
    ///
    /// Does not suspend. The subscription starts at the latest list and
    /// yields a new one after every store change.
    pub fn get_all(&self) -> Subscription<Vec<Todo>> {
        self.inner.live.subscribe()
    }

    /// Returns the latest published list without subscribing.
    pub fn snapshot(&self) -> Vec<Todo> {
        self.inner.live.get()
    }

    /// Re-reads the list from the store and republishes it.
    pub async fn refresh(&self) -> ServiceResult<()> {
        self.with_store("todo_refresh", |repo, inner| {
            let todos = repo.list_todos(inner.ordering)?;
            inner.live.set_if_changed(todos);
            Ok(())
        })
        .await
    }

    pub async fn get_by_id(&self, id: TodoId) -> ServiceResult<Option<Todo>> {
        self.with_store("todo_get", move |repo, _| repo.get_todo(id))
            .await
    }

    /// Persists a new todo (insert-or-replace on `todo.id`).
    pub async fn insert(&self, todo: Todo) -> ServiceResult<TodoId> {
        self.mutate("todo_insert", move |repo| repo.insert_todo(&todo))
            .await
    }

    /// Overwrites an existing todo and returns the stored value with a
    /// refreshed `updated_at`.
    pub async fn update(&self, todo: Todo) -> ServiceResult<Todo> {
        self.mutate("todo_update", move |repo| repo.update_todo(&todo))
            .await
    }

    /// Deletes one todo. Returns `false` when nothing matched.
    pub async fn delete_by_id(&self, id: TodoId) -> ServiceResult<bool> {
        self.mutate("todo_delete", move |repo| repo.delete_todo(id))
            .await
    }

    /// Flips completion. Returns `None` when the id is unknown.
    pub async fn toggle_completion(&self, id: TodoId) -> ServiceResult<Option<Todo>> {
        self.mutate("todo_toggle", move |repo| repo.toggle_completion(id))
            .await
    }

    /// Deletes every completed todo and returns how many were removed.
    pub async fn delete_completed(&self) -> ServiceResult<usize> {
        self.mutate("todo_delete_completed", |repo| repo.delete_completed())
            .await
    }

    pub async fn count(&self) -> ServiceResult<u64> {
        self.with_store("todo_count", |repo, _| repo.count_todos())
            .await
    }

    /// Closes the underlying connection. Later operations fail with
    /// `ServiceError::Closed`; calling this twice is a no-op.
    pub async fn shutdown(&self) -> ServiceResult<()> {
        let inner = Arc::clone(&self.inner);
        let result = tokio::task::spawn_blocking(move || -> ServiceResult<bool> {
            let mut guard = inner
                .conn
                .lock()
                .map_err(|_| ServiceError::Background("store lock poisoned".to_string()))?;
            let Some(conn) = guard.take() else {
                return Ok(false);
            };
            if let Err(err) = conn.execute_batch("PRAGMA optimize;") {
                warn!(
                    "event=db_close module=service status=warn error_code=optimize_failed error={}",
                    err
                );
            }
            match conn.close() {
                Ok(()) => Ok(true),
                Err((conn, err)) => {
                    *guard = Some(conn);
                    Err(RepoError::from(err).into())
                }
            }
        })
        .await
        .unwrap_or_else(|err| Err(ServiceError::Background(err.to_string())));

        match &result {
            Ok(true) => info!("event=db_close module=service status=ok"),
            Ok(false) => debug!("event=db_close module=service status=noop"),
            Err(err) => error!(
                "event=db_close module=service status=error error_code={} error={}",
                err.code(),
                err
            ),
        }
        result.map(|_| ())
    }

    async fn mutate<T, F>(&self, op: &'static str, work: F) -> ServiceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteTodoRepository<'_>) -> RepoResult<T> + Send + 'static,
    {
        self.with_store(op, move |repo, inner| {
            let value = work(repo)?;
            inner.publish(repo);
            Ok(value)
        })
        .await
    }

    async fn with_store<T, F>(&self, op: &'static str, work: F) -> ServiceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteTodoRepository<'_>, &ServiceInner) -> RepoResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let started_at = Instant::now();
        let result = tokio::task::spawn_blocking(move || -> ServiceResult<T> {
            let guard = inner
                .conn
                .lock()
                .map_err(|_| ServiceError::Background("store lock poisoned".to_string()))?;
            let conn = guard.as_ref().ok_or(ServiceError::Closed)?;
            let repo = SqliteTodoRepository::new_unchecked(conn);
            work(&repo, &*inner).map_err(ServiceError::from)
        })
        .await
        .unwrap_or_else(|err| Err(ServiceError::Background(err.to_string())));

        match &result {
            Ok(_) => debug!(
                "event={} module=service status=ok duration_ms={}",
                op,
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event={} module=service status=error duration_ms={} error_code={} error={}",
                op,
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }
}
