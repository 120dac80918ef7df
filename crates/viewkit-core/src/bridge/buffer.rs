//! Ordered buffer between push producers and the pull consumer

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// How the bridge buffer behaves when the consumer falls behind
///
/// Terminal signals (completion and failure) are never dropped, whatever
/// the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferPolicy {
    /// Queue every value. Memory grows without limit under a stalled consumer.
    #[default]
    Unbounded,
    /// Keep at most `n` values; when full, discard the oldest queued value
    DropOldest(usize),
    /// Keep at most `n` values; when full, discard the incoming value
    DropNewest(usize),
}

impl BufferPolicy {
    fn capacity(&self) -> Option<usize> {
        match *self {
            Self::Unbounded => None,
            Self::DropOldest(n) | Self::DropNewest(n) => Some(n.max(1)),
        }
    }
}

/// What the consumer gets from [`EventBuffer::pull`]
#[derive(Debug)]
pub(crate) enum Pull<T, E> {
    Item(T),
    Completed,
    Failed(E),
    /// The consumer side closed the buffer
    Closed,
}

#[derive(Debug)]
enum Terminal<E> {
    Completed,
    Failed(E),
}

struct State<T, E> {
    items: VecDeque<T>,
    terminal: Option<Terminal<E>>,
    closed: bool,
    dropped: u64,
    overflowing: bool,
}

/// Single-consumer FIFO shared by every clone of an observer
///
/// The mutex is the only synchronization point. Producers never block on the
/// consumer; `notify_one` stores a permit when the consumer is not waiting,
/// so a push that races a pull is never lost.
pub(crate) struct EventBuffer<T, E> {
    state: Mutex<State<T, E>>,
    notify: Notify,
    policy: BufferPolicy,
}

impl<T, E> EventBuffer<T, E> {
    pub(crate) fn new(policy: BufferPolicy) -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                terminal: None,
                closed: false,
                dropped: 0,
                overflowing: false,
            }),
            notify: Notify::new(),
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a value. Returns `false` if the buffer no longer accepts values
    /// or the policy discarded this value.
    pub(crate) fn push(&self, value: T) -> bool {
        let mut state = self.lock();
        if state.closed || state.terminal.is_some() {
            return false;
        }

        let accepted = match self.policy.capacity() {
            Some(capacity) if state.items.len() >= capacity => {
                state.dropped += 1;
                if !state.overflowing {
                    state.overflowing = true;
                    tracing::warn!(
                        capacity,
                        policy = ?self.policy,
                        "event bridge buffer full; dropping values"
                    );
                }
                match self.policy {
                    BufferPolicy::DropOldest(_) => {
                        state.items.pop_front();
                        state.items.push_back(value);
                        true
                    }
                    _ => false,
                }
            }
            _ => {
                state.overflowing = false;
                state.items.push_back(value);
                true
            }
        };
        drop(state);

        if accepted {
            self.notify.notify_one();
        }
        accepted
    }

    /// Record completion; the first terminal signal wins
    pub(crate) fn complete(&self) {
        self.finish(Terminal::Completed);
    }

    /// Record a failure; the first terminal signal wins
    pub(crate) fn fail(&self, error: E) {
        self.finish(Terminal::Failed(error));
    }

    fn finish(&self, terminal: Terminal<E>) {
        let mut state = self.lock();
        if state.closed || state.terminal.is_some() {
            return;
        }
        state.terminal = Some(terminal);
        drop(state);
        self.notify.notify_one();
    }

    /// Close from the consumer side: queued values are discarded and every
    /// later notification is ignored.
    pub(crate) fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.items.clear();
        drop(state);
        self.notify.notify_one();
    }

    /// Whether producers should stop sending
    pub(crate) fn is_closed(&self) -> bool {
        let state = self.lock();
        state.closed || state.terminal.is_some()
    }

    /// Number of values discarded by the overflow policy so far
    pub(crate) fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Wait for the next value or terminal signal, in FIFO order
    pub(crate) async fn pull(&self) -> Pull<T, E> {
        loop {
            {
                let mut state = self.lock();
                if state.closed {
                    return Pull::Closed;
                }
                if let Some(item) = state.items.pop_front() {
                    return Pull::Item(item);
                }
                match state.terminal.take() {
                    Some(Terminal::Completed) => {
                        // Keep the buffer terminal for late producers
                        state.closed = true;
                        return Pull::Completed;
                    }
                    Some(Terminal::Failed(err)) => {
                        state.closed = true;
                        return Pull::Failed(err);
                    }
                    None => {}
                }
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_then_completion() {
        let buffer: EventBuffer<i32, ()> = EventBuffer::new(BufferPolicy::Unbounded);
        assert!(buffer.push(1));
        assert!(buffer.push(2));
        buffer.complete();
        assert!(!buffer.push(3));

        assert!(matches!(buffer.pull().await, Pull::Item(1)));
        assert!(matches!(buffer.pull().await, Pull::Item(2)));
        assert!(matches!(buffer.pull().await, Pull::Completed));
        assert!(matches!(buffer.pull().await, Pull::Closed));
    }

    #[tokio::test]
    async fn test_failure_after_values() {
        let buffer: EventBuffer<i32, &str> = EventBuffer::new(BufferPolicy::Unbounded);
        buffer.push(42);
        buffer.fail("boom");
        buffer.complete();

        assert!(matches!(buffer.pull().await, Pull::Item(42)));
        assert!(matches!(buffer.pull().await, Pull::Failed("boom")));
    }

    #[tokio::test]
    async fn test_drop_oldest_keeps_latest() {
        let buffer: EventBuffer<i32, ()> = EventBuffer::new(BufferPolicy::DropOldest(2));
        for i in 0..5 {
            assert!(buffer.push(i));
        }
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.dropped(), 3);
        assert!(matches!(buffer.pull().await, Pull::Item(3)));
        assert!(matches!(buffer.pull().await, Pull::Item(4)));
    }

    #[tokio::test]
    async fn test_drop_newest_rejects_incoming() {
        let buffer: EventBuffer<i32, ()> = EventBuffer::new(BufferPolicy::DropNewest(2));
        assert!(buffer.push(0));
        assert!(buffer.push(1));
        assert!(!buffer.push(2));
        buffer.complete();

        assert_eq!(buffer.dropped(), 1);
        assert!(matches!(buffer.pull().await, Pull::Item(0)));
        assert!(matches!(buffer.pull().await, Pull::Item(1)));
        assert!(matches!(buffer.pull().await, Pull::Completed));
    }

    #[tokio::test]
    async fn test_close_discards_and_rejects() {
        let buffer: EventBuffer<i32, ()> = EventBuffer::new(BufferPolicy::Unbounded);
        buffer.push(1);
        buffer.close();
        assert!(buffer.is_closed());
        assert!(!buffer.push(2));
        assert!(matches!(buffer.pull().await, Pull::Closed));
    }

    #[tokio::test]
    async fn test_pull_wakes_on_push_from_thread() {
        let buffer = std::sync::Arc::new(EventBuffer::<i32, ()>::new(BufferPolicy::Unbounded));
        let producer = buffer.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            producer.push(7);
        });

        assert!(matches!(buffer.pull().await, Pull::Item(7)));
        handle.join().unwrap();
    }
}
