//! A minimal internally synchronized MPMC queue.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Unbounded FIFO queue shared between producers and consumers. Consumers
/// pop with a bounded timeout so they can observe a shutdown flag between
/// waits.
pub struct ThreadSafeQueue<T> {
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T> Default for ThreadSafeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ThreadSafeQueue<T> {
    pub fn new() -> ThreadSafeQueue<T> {
        ThreadSafeQueue {
            items: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    pub fn push(&self, item: T) {
        let mut items = self.items.lock().unwrap();
        items.push_back(item);
        self.ready.notify_one();
    }

    /// Pops the oldest item, waiting up to `timeout` for one to arrive.
    pub fn pop_with_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock().unwrap();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _timed_out) = self.ready.wait_timeout(items, remaining).unwrap();
            items = guard;
        }
    }
}
