//! View-state holder for todo list and detail screens.
//!
//! # Responsibility
//! - Mirror the service's live todo list into UI-observable state.
//! - Track the todo loaded for detail/edit flows and a busy flag.
//! - Sequence user-triggered mutations and absorb their failures.
//!
//! # Invariants
//! - No operation panics or returns an error; failures are logged, recorded
//!   in `last_error`, and leave the visible state as it was.
//! - `is_loading` is `true` exactly while at least one operation is in
//!   flight, including operations whose futures were dropped mid-way.
//! - Nothing is retried.

use crate::model::todo::{Todo, TodoDraft, TodoId};
use crate::observable::{Observable, Subscription};
use crate::service::todo_service::{ServiceError, TodoService};
use log::{debug, error};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::task::JoinHandle;

/// UI-facing state and intents for the todo screens.
pub struct TodoViewModel {
    service: TodoService,
    todos: Observable<Vec<Todo>>,
    selected_todo: Observable<Option<Todo>>,
    is_loading: Observable<bool>,
    last_error: Observable<Option<String>>,
    in_flight: AtomicUsize,
    forwarder: JoinHandle<()>,
}

impl TodoViewModel {
    /// Creates a view-model bound to `service`.
    ///
    /// `todos` starts empty and fills once the forwarding task has copied
    /// the service's live list. Must be called inside a Tokio runtime; the
    /// forwarding task stops when the view-model is dropped.
    pub fn new(service: TodoService) -> Self {
        let todos = Observable::new(Vec::new());
        let forwarder = tokio::spawn(forward_live_list(service.get_all(), todos.clone()));

        Self {
            service,
            todos,
            selected_todo: Observable::new(None),
            is_loading: Observable::new(false),
            last_error: Observable::new(None),
            in_flight: AtomicUsize::new(0),
            forwarder,
        }
    }

    /// Live, ordered list of every todo.
    pub fn todos(&self) -> Subscription<Vec<Todo>> {
        self.todos.subscribe()
    }

    /// Todo loaded by the last `load_todo`, if any.
    pub fn selected_todo(&self) -> Subscription<Option<Todo>> {
        self.selected_todo.subscribe()
    }

    pub fn is_loading(&self) -> Subscription<bool> {
        self.is_loading.subscribe()
    }

    /// Message of the most recent failure; cleared by the next success.
    pub fn last_error(&self) -> Subscription<Option<String>> {
        self.last_error.subscribe()
    }

    /// Loads one todo into `selected_todo`, or clears it when the id is
    /// unknown.
    pub async fn load_todo(&self, id: TodoId) -> bool {
        match self
            .run("load_todo", self.service.get_by_id(id))
            .await
        {
            Some(todo) => {
                self.selected_todo.set(todo);
                true
            }
            None => false,
        }
    }

    /// Persists a new todo. Returns whether the store accepted it.
    pub async fn add(&self, todo: Todo) -> bool {
        self.run("add", self.service.insert(todo)).await.is_some()
    }

    /// Builds a todo from form input and persists it.
    pub async fn add_draft(&self, draft: TodoDraft) -> bool {
        self.add(draft.into_todo()).await
    }

    /// Saves edits. The selected todo is replaced by the stored value when
    /// it is the one being edited.
    pub async fn update(&self, todo: Todo) -> bool {
        match self.run("update", self.service.update(todo)).await {
            Some(stored) => {
                self.replace_selected_if_same(stored);
                true
            }
            None => false,
        }
    }

    /// Flips completion in the store.
    ///
    /// A selected todo with the same id flips immediately and is reverted if
    /// the store operation fails. It is cleared when the store no longer
    /// holds that id.
    pub async fn toggle_completion(&self, id: TodoId) -> bool {
        let flipped = self.flip_selected(id);

        match self
            .run("toggle_completion", self.service.toggle_completion(id))
            .await
        {
            Some(Some(stored)) => {
                self.replace_selected_if_same(stored);
                true
            }
            Some(None) => {
                self.clear_selected_if(|todo| todo.id == id);
                true
            }
            None => {
                if flipped {
                    self.flip_selected(id);
                }
                false
            }
        }
    }

    /// Deletes one todo permanently. Clears the selection when it pointed at
    /// the deleted id.
    pub async fn delete(&self, id: TodoId) -> bool {
        match self.run("delete", self.service.delete_by_id(id)).await {
            Some(_) => {
                self.clear_selected_if(|todo| todo.id == id);
                true
            }
            None => false,
        }
    }

    /// Deletes every completed todo.
    pub async fn clear_completed(&self) -> bool {
        match self
            .run("clear_completed", self.service.delete_completed())
            .await
        {
            Some(_) => {
                self.clear_selected_if(|todo| todo.is_completed);
                true
            }
            None => false,
        }
    }

    async fn run<T>(
        &self,
        op: &'static str,
        work: impl Future<Output = Result<T, ServiceError>>,
    ) -> Option<T> {
        let _busy = BusyGuard::enter(&self.in_flight, &self.is_loading);
        match work.await {
            Ok(value) => {
                self.last_error.set_if_changed(None);
                debug!("event=view_model_op module=view_model status=ok op={}", op);
                Some(value)
            }
            Err(err) => {
                error!(
                    "event=view_model_op module=view_model status=error op={} error_code={} error={}",
                    op,
                    err.code(),
                    err
                );
                self.last_error.set(Some(err.to_string()));
                None
            }
        }
    }

    fn flip_selected(&self, id: TodoId) -> bool {
        let mut flipped = false;
        self.selected_todo.update(|selected| {
            if let Some(todo) = selected.as_mut().filter(|todo| todo.id == id) {
                todo.is_completed = !todo.is_completed;
                flipped = true;
            }
        });
        flipped
    }

    fn clear_selected_if(&self, matches: impl FnOnce(&Todo) -> bool) {
        self.selected_todo.update_if(|selected| {
            if selected.as_ref().is_some_and(matches) {
                *selected = None;
                return true;
            }
            false
        });
    }

    fn replace_selected_if_same(&self, stored: Todo) {
        self.selected_todo.update(|selected| {
            if selected.as_ref().is_some_and(|todo| todo.id == stored.id) {
                *selected = Some(stored);
            }
        });
    }
}

impl Drop for TodoViewModel {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

async fn forward_live_list(mut source: Subscription<Vec<Todo>>, target: Observable<Vec<Todo>>) {
    target.set_if_changed(source.current());
    while let Some(todos) = source.changed().await {
        target.set_if_changed(todos);
    }
}

/// Keeps `is_loading` raised while any operation is in flight.
struct BusyGuard<'a> {
    in_flight: &'a AtomicUsize,
    is_loading: &'a Observable<bool>,
}

impl<'a> BusyGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, is_loading: &'a Observable<bool>) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = Self {
            in_flight,
            is_loading,
        };
        guard.sync_flag();
        guard
    }

    // Runs under the observable's write lock, so the last writer always sees
    // the latest counter value.
    fn sync_flag(&self) {
        self.is_loading.update_if(|flag| {
            let busy = self.in_flight.load(Ordering::SeqCst) > 0;
            let changed = *flag != busy;
            *flag = busy;
            changed
        });
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.sync_flag();
    }
}
