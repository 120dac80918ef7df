//! A ready-made multi-subscriber push source

use super::observer::Observer;
use super::PushSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Registry<T, E> = Mutex<Vec<(u64, Observer<T, E>)>>;

/// Change notifier that fans notifications out to every current subscriber
///
/// Each bridged stream over a `Notifier` registers its own observer, so
/// several SSE clients can follow the same notifier. Terminal calls
/// (`complete`, `fail`) detach all current subscribers; later subscribers
/// start fresh.
///
/// # Example
///
/// ```rust,ignore
/// use viewkit_core::bridge::{Notifier, PushSourceExt};
/// use tokio_util::sync::CancellationToken;
///
/// let notifier: Notifier<String> = Notifier::new();
/// let stream = notifier.clone().into_stream(CancellationToken::new());
/// notifier.emit("changed".to_string());
/// ```
pub struct Notifier<T, E = std::convert::Infallible> {
    observers: Arc<Registry<T, E>>,
    next_id: Arc<AtomicU64>,
}

impl<T, E> Notifier<T, E> {
    /// Create a notifier with no subscribers
    pub fn new() -> Self {
        Self {
            observers: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Observer<T, E>)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy the current observers out so callbacks run without the lock held
    fn snapshot(&self, detach: bool) -> Vec<Observer<T, E>> {
        let mut observers = self.lock();
        if detach {
            observers.drain(..).map(|(_, o)| o).collect()
        } else {
            observers.iter().map(|(_, o)| o.clone()).collect()
        }
    }

    /// Complete every current subscriber and detach them
    pub fn complete(&self) {
        for observer in self.snapshot(true) {
            observer.complete();
        }
    }

    /// Get the current number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }
}

impl<T: Clone, E> Notifier<T, E> {
    /// Deliver a value to every current subscriber
    ///
    /// Returns the number of subscribers that accepted it.
    pub fn emit(&self, value: T) -> usize {
        self.snapshot(false)
            .into_iter()
            .filter(|observer| observer.next(value.clone()))
            .count()
    }
}

impl<T, E: Clone> Notifier<T, E> {
    /// Fail every current subscriber with `error` and detach them
    pub fn fail(&self, error: E) {
        for observer in self.snapshot(true) {
            observer.fail(error.clone());
        }
    }
}

impl<T, E> Clone for Notifier<T, E> {
    fn clone(&self) -> Self {
        Self {
            observers: self.observers.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<T, E> Default for Notifier<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription returned by [`Notifier`]; removes its observer on release
pub struct NotifierSubscription<T, E> {
    id: u64,
    observers: Weak<Registry<T, E>>,
}

impl<T, E> super::Subscription for NotifierSubscription<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn unsubscribe(self) {
        if let Some(observers) = self.observers.upgrade() {
            let mut observers = observers.lock().unwrap_or_else(PoisonError::into_inner);
            observers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl<T, E> PushSource for Notifier<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;
    type Subscription = NotifierSubscription<T, E>;

    fn subscribe(&self, observer: Observer<T, E>) -> Self::Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, observer));
        tracing::debug!(subscriber = id, "notifier subscribed");
        NotifierSubscription {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }
}
