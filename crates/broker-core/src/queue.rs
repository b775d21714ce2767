use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::invariants::debug_assert_queue_bounded;

struct Inner<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    shut_down: bool,
}

/// A bounded blocking queue: producers block while full, consumers block
/// while empty, exactly the one-mutex-two-condvar shape of the original
/// registration queue.
///
/// Unlike the original's raw `void *` buffer, this queue owns typed
/// values directly; there is no manual alloc/free pairing to get wrong.
pub struct BoundedQueue<T> {
    state: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            state: Mutex::new(Inner {
                buffer: VecDeque::with_capacity(capacity),
                capacity,
                shut_down: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Blocks until there is room, then pushes `item`. Returns `false`
    /// (without pushing) if the queue was shut down while waiting.
    pub fn enqueue(&self, item: T) -> bool {
        let mut inner = self.state.lock().unwrap();
        loop {
            if inner.shut_down {
                return false;
            }
            if inner.buffer.len() < inner.capacity {
                break;
            }
            inner = self.not_full.wait(inner).unwrap();
        }
        inner.buffer.push_back(item);
        debug_assert_queue_bounded!(inner.buffer.len(), inner.capacity);
        self.not_empty.notify_one();
        true
    }

    /// Blocks until an item is available or the queue shuts down, in
    /// which case it returns `None` once the buffer has drained.
    pub fn dequeue(&self) -> Option<T> {
        let mut inner = self.state.lock().unwrap();
        loop {
            if let Some(item) = inner.buffer.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if inner.shut_down {
                return None;
            }
            inner = self.not_empty.wait(inner).unwrap();
        }
    }

    /// Wakes every blocked producer and consumer; subsequent `enqueue`
    /// calls fail and `dequeue` drains what remains, then returns `None`.
    pub fn shut_down(&self) {
        let mut inner = self.state.lock().unwrap();
        inner.shut_down = true;
        drop(inner);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_order_is_preserved() {
        let queue = BoundedQueue::new(4);
        for i in 0..4 {
            assert!(queue.enqueue(i));
        }
        for i in 0..4 {
            assert_eq!(queue.dequeue(), Some(i));
        }
    }

    #[test]
    fn dequeue_blocks_until_item_arrives() {
        let queue = Arc::new(BoundedQueue::new(1));
        let producer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(20));
            producer.enqueue(42);
        });
        assert_eq!(queue.dequeue(), Some(42));
        handle.join().unwrap();
    }

    #[test]
    fn shutdown_wakes_blocked_dequeue_with_none() {
        let queue = Arc::new(BoundedQueue::<i32>::new(1));
        let shutter = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(20));
            shutter.shut_down();
        });
        assert_eq!(queue.dequeue(), None);
        handle.join().unwrap();
    }

    #[test]
    fn shutdown_drains_before_reporting_empty() {
        let queue = BoundedQueue::new(2);
        queue.enqueue(1);
        queue.enqueue(2);
        queue.shut_down();
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(2));
        assert_eq!(queue.dequeue(), None);
    }
}
