//! Observable values for UI-bound state.
//!
//! # Responsibility
//! - Hold one current value and notify subscribers when it changes.
//! - Hand every new subscriber the latest value immediately.
//!
//! # Invariants
//! - Writes never block and never fail, even with zero subscribers.
//! - Subscribers only see the most recent value; intermediate values written
//!   between two polls may be skipped.

use std::sync::Arc;
use tokio::sync::watch;

/// Writable side of an observable value. Cloning shares the same value.
#[derive(Debug)]
pub struct Observable<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Replaces the current value and notifies subscribers.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Mutates the current value in place and notifies subscribers.
    pub fn update(&self, modify: impl FnOnce(&mut T)) {
        self.sender.send_modify(modify);
    }

    /// Mutates the current value in place; subscribers are notified only
    /// when `modify` returns `true`.
    pub fn update_if(&self, modify: impl FnOnce(&mut T) -> bool) {
        self.sender.send_if_modified(modify);
    }

    /// Opens a subscription that starts at the current value.
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone + PartialEq> Observable<T> {
    /// Replaces the current value only when it differs, so subscribers are
    /// not woken for no-op writes.
    pub fn set_if_changed(&self, value: T) {
        self.update_if(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}

/// Read-only handle on an `Observable`. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: watch::Receiver<T>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
        }
    }
}

impl<T: Clone> Subscription<T> {
    /// Returns a copy of the latest value without waiting.
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Waits for the next change and returns the new value.
    ///
    /// Returns `None` once the observable has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Waits until the value satisfies `predicate`, checking the current
    /// value first.
    ///
    /// Returns `None` once the observable has been dropped.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        self.receiver
            .wait_for(predicate)
            .await
            .ok()
            .map(|value| (*value).clone())
    }

    /// Ends the subscription explicitly.
    pub fn unsubscribe(self) {}
}
