//! Joinable work queues connecting the pipeline stages.
//!
//! [`WorkQueue`] pairs a FIFO buffer with unfinished-work accounting:
//! `push` increments the count, `mark_done` decrements it, and `join`
//! resolves once they balance. That lets the controller detect stage
//! completion without consumers reporting back, and `pop` atomically
//! waits-and-removes, so there is no gap between observing "non-empty"
//! and taking an item.

use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Envelope for queue traffic: real work or the end-of-stream marker.
///
/// A consumer that pops `Shutdown` acknowledges it and exits its loop.
/// Producers enqueue exactly one `Shutdown` per consumer, and only once no
/// further `Work` items can follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    /// A unit of real work
    Work(T),
    /// No further real items will arrive for this consumer
    Shutdown,
}

/// Unbounded multi-producer multi-consumer queue with drain accounting.
///
/// `push` never blocks. Items are FIFO relative to a single producer; no
/// ordering is guaranteed across concurrent producers.
#[derive(Debug)]
pub struct WorkQueue<T> {
    state: Mutex<State<T>>,
    /// Signaled once per push; consumers re-check before sleeping
    item_ready: Notify,
    /// Signaled when the unfinished count reaches zero
    drained: Notify,
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    /// Items pushed but not yet acknowledged via `mark_done`
    unfinished: usize,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                unfinished: 0,
            }),
            item_ready: Notify::new(),
            drained: Notify::new(),
        }
    }

    /// Add an item and account it as unfinished work.
    pub fn push(&self, item: T) {
        {
            let mut state = self.lock();
            state.items.push_back(item);
            state.unfinished += 1;
        }
        self.item_ready.notify_one();
    }

    /// Take the next item, suspending the calling task until one arrives.
    ///
    /// The waiter is registered before the buffer is re-checked, so a push
    /// that races with going to sleep is never missed.
    pub async fn pop(&self) -> T {
        loop {
            let notified = self.item_ready.notified();
            if let Some(item) = self.lock().items.pop_front() {
                return item;
            }
            notified.await;
        }
    }

    /// Acknowledge one previously popped item as fully processed.
    ///
    /// Must be called exactly once per `pop`, end-of-stream markers
    /// included.
    ///
    /// # Panics
    ///
    /// Panics if called more times than items were pushed; that is a
    /// protocol bug in the caller, not a runtime condition.
    pub fn mark_done(&self) {
        let drained = {
            let mut state = self.lock();
            state.unfinished = state
                .unfinished
                .checked_sub(1)
                .expect("mark_done called with no unfinished work");
            state.unfinished == 0
        };
        if drained {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every item ever pushed has been acknowledged.
    ///
    /// Resolves immediately when nothing is outstanding. Does not consume
    /// items and may be called from any number of tasks.
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            if self.lock().unfinished == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Number of items currently buffered (popped items are not counted).
    ///
    /// Diagnostic only; contents are never exposed outside `push`/`pop`.
    pub fn pending(&self) -> usize {
        self.lock().items.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<T>> {
        // The critical sections never panic while holding the lock, except
        // for the mark_done contract violation; recover the data either way.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
