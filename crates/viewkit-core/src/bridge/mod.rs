//! Push-to-pull event bridge
//!
//! Adapts a push source (something that calls registered callbacks) into a
//! [`Stream`], so consumers such as the SSE writer can iterate uniformly
//! whether events are pushed or pulled.
//!
//! Nothing happens until the stream is first polled. Each stream subscribes
//! exactly once and releases the subscription exactly once: when the source
//! completes, when it fails, when the cancellation token fires, or when the
//! consumer drops the stream. Inside a Tokio runtime a fired token releases
//! the subscription right away, without waiting for the consumer to poll.
//!
//! The stream is single-consumer. Values are buffered in FIFO order between
//! the producer callbacks and the consumer; see [`BufferPolicy`] for what
//! happens when the consumer falls behind.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use tokio_util::sync::CancellationToken;
//! use viewkit_core::bridge::{Notifier, PushSourceExt};
//!
//! let notifier: Notifier<u32> = Notifier::new();
//! let mut stream = notifier.clone().into_stream(CancellationToken::new());
//!
//! tokio::spawn(async move {
//!     while let Some(Ok(value)) = stream.next().await {
//!         println!("got {value}");
//!     }
//! });
//! ```

mod buffer;
mod notifier;
mod observer;

pub use buffer::BufferPolicy;
pub use notifier::{Notifier, NotifierSubscription};
pub use observer::{Observer, Subscription};

use async_stream::stream;
use buffer::{EventBuffer, Pull};
use futures_util::Stream;
use observer::SubscriptionGuard;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Stream produced by the bridge
pub type BridgeStream<T, E> = Pin<Box<dyn Stream<Item = Result<T, E>> + Send + 'static>>;

/// A source that pushes values to registered observers
///
/// The source may call the observer from any thread, before or after
/// `subscribe` returns. It must deliver zero or more `next` calls followed by
/// at most one of `complete` or `fail`.
pub trait PushSource: Send + 'static {
    /// Value type delivered through `next`
    type Item: Send + 'static;
    /// Failure type delivered through `fail`
    type Error: Send + 'static;
    /// Handle that stops delivery when released
    type Subscription: Subscription;

    /// Register `observer` and return the handle that unregisters it
    fn subscribe(&self, observer: Observer<Self::Item, Self::Error>) -> Self::Subscription;
}

impl<S: PushSource + Sync> PushSource for Arc<S> {
    type Item = S::Item;
    type Error = S::Error;
    type Subscription = S::Subscription;

    fn subscribe(&self, observer: Observer<Self::Item, Self::Error>) -> Self::Subscription {
        (**self).subscribe(observer)
    }
}

/// Push source built from a closure, see [`from_fn`]
pub struct FnSource<F, T, E> {
    subscribe: F,
    _types: std::marker::PhantomData<fn() -> (T, E)>,
}

/// Build a push source from a subscribe closure
///
/// # Example
///
/// ```rust,ignore
/// use viewkit_core::bridge::from_fn;
///
/// let source = from_fn(|observer: Observer<u32, std::io::Error>| {
///     let handle = std::thread::spawn(move || {
///         for i in 0..3 {
///             observer.next(i);
///         }
///         observer.complete();
///     });
///     move || drop(handle)
/// });
/// ```
pub fn from_fn<F, T, E, S>(subscribe: F) -> FnSource<F, T, E>
where
    F: Fn(Observer<T, E>) -> S + Send + 'static,
    S: Subscription,
    T: Send + 'static,
    E: Send + 'static,
{
    FnSource {
        subscribe,
        _types: std::marker::PhantomData,
    }
}

impl<F, T, E, S> PushSource for FnSource<F, T, E>
where
    F: Fn(Observer<T, E>) -> S + Send + 'static,
    S: Subscription,
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;
    type Subscription = S;

    fn subscribe(&self, observer: Observer<T, E>) -> S {
        (self.subscribe)(observer)
    }
}

/// Convert a push source into a lazy stream
///
/// Ends normally on completion or cancellation; yields `Err(e)` once and
/// ends when the source fails.
pub fn bridge<S: PushSource>(
    source: S,
    policy: BufferPolicy,
    cancel: CancellationToken,
) -> BridgeStream<S::Item, S::Error> {
    Box::pin(stream! {
        let buffer = Arc::new(EventBuffer::new(policy));
        let subscription = source.subscribe(Observer::new(buffer.clone()));
        let guard = SubscriptionGuard::new(subscription, buffer.clone());
        let _watch = guard.release_on_cancel(cancel.clone());
        tracing::debug!(?policy, "subscribed to push source");

        loop {
            let pulled = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                pulled = buffer.pull() => pulled,
            };

            match pulled {
                Pull::Item(value) => yield Ok(value),
                Pull::Completed | Pull::Closed => break,
                Pull::Failed(err) => {
                    tracing::debug!("push source failed");
                    guard.release();
                    yield Err(err);
                    break;
                }
            }
        }

        guard.release();
    })
}

/// Stream adapters for every [`PushSource`]
pub trait PushSourceExt: PushSource + Sized {
    /// Bridge into a stream with an unbounded buffer
    fn into_stream(self, cancel: CancellationToken) -> BridgeStream<Self::Item, Self::Error> {
        bridge(self, BufferPolicy::Unbounded, cancel)
    }

    /// Bridge into a stream with an explicit buffer policy
    fn into_stream_with(
        self,
        policy: BufferPolicy,
        cancel: CancellationToken,
    ) -> BridgeStream<Self::Item, Self::Error> {
        bridge(self, policy, cancel)
    }
}

impl<S: PushSource> PushSourceExt for S {}
