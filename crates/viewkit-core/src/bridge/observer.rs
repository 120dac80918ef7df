//! Producer-facing handles: observers and subscriptions

use super::buffer::EventBuffer;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Callback set handed to a push source on subscribe
///
/// Cloning is cheap and every clone feeds the same buffer, so a source may
/// keep one clone per producer thread. Notifications after `complete`,
/// `fail`, or after the consumer has released the subscription are ignored.
pub struct Observer<T, E> {
    buffer: Arc<EventBuffer<T, E>>,
}

impl<T, E> Observer<T, E> {
    pub(crate) fn new(buffer: Arc<EventBuffer<T, E>>) -> Self {
        Self { buffer }
    }

    /// Deliver the next value
    ///
    /// Returns `false` when the value was not queued, either because the
    /// stream has ended or because the buffer policy dropped it.
    pub fn next(&self, value: T) -> bool {
        self.buffer.push(value)
    }

    /// Signal normal completion
    pub fn complete(&self) {
        self.buffer.complete();
    }

    /// Signal failure; the consumer receives this exact value as an error
    pub fn fail(&self, error: E) {
        self.buffer.fail(error);
    }

    /// Check if the consumer will ignore further notifications
    pub fn is_closed(&self) -> bool {
        self.buffer.is_closed()
    }

    /// Number of values discarded by a bounded buffer policy
    pub fn dropped(&self) -> u64 {
        self.buffer.dropped()
    }
}

impl<T, E> Clone for Observer<T, E> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Observer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Handle returned by a push source; releasing it unsubscribes
///
/// Any `FnOnce() + Send` closure is a subscription.
pub trait Subscription: Send + 'static {
    /// Stop delivering notifications to the observer
    fn unsubscribe(self);
}

impl<F> Subscription for F
where
    F: FnOnce() + Send + 'static,
{
    fn unsubscribe(self) {
        self()
    }
}

/// Owns a subscription for one consumption and releases it exactly once
///
/// The slot is shared with the cancellation watcher, so whichever of the
/// stream or the watcher gets there first does the release.
pub(crate) struct SubscriptionGuard<S: Subscription, T, E> {
    slot: Arc<Slot<S, T, E>>,
}

struct Slot<S, T, E> {
    subscription: Mutex<Option<S>>,
    buffer: Arc<EventBuffer<T, E>>,
}

impl<S: Subscription, T, E> Slot<S, T, E> {
    fn release(&self) {
        let taken = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = taken {
            self.buffer.close();
            subscription.unsubscribe();
            tracing::trace!("push source subscription released");
        }
    }
}

impl<S: Subscription, T, E> SubscriptionGuard<S, T, E> {
    pub(crate) fn new(subscription: S, buffer: Arc<EventBuffer<T, E>>) -> Self {
        Self {
            slot: Arc::new(Slot {
                subscription: Mutex::new(Some(subscription)),
                buffer,
            }),
        }
    }

    /// Close the buffer and unsubscribe; later calls do nothing
    pub(crate) fn release(&self) {
        self.slot.release();
    }

    /// Release as soon as `cancel` fires, even if nobody polls the stream
    ///
    /// The watcher stops when the returned guard is dropped. Returns `None`
    /// outside a Tokio runtime, where cancellation is only seen on the next poll.
    pub(crate) fn release_on_cancel(&self, cancel: CancellationToken) -> Option<DropGuard>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let done = CancellationToken::new();
        let finished = done.clone();
        let slot = self.slot.clone();

        handle.spawn(async move {
            tokio::select! {
                biased;
                _ = finished.cancelled() => {}
                _ = cancel.cancelled() => {
                    tracing::debug!("event bridge cancelled");
                    slot.release();
                }
            }
        });
        Some(done.drop_guard())
    }
}

impl<S: Subscription, T, E> Drop for SubscriptionGuard<S, T, E> {
    fn drop(&mut self) {
        self.release();
    }
}
