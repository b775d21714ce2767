//! Property-based tests for the bounded registration queue's FIFO and
//! capacity invariants (INV-QUEUE-01).

use mbroker_core::BoundedQueue;
use proptest::prelude::*;

proptest! {
    /// Whatever is enqueued, in whatever order, comes back out in that
    /// same order -- a single producer/consumer never sees reordering,
    /// and the queue never reports holding more than it was given.
    #[test]
    fn prop_fifo_order_survives_arbitrary_batches(items in proptest::collection::vec(any::<i32>(), 0..64)) {
        let queue = BoundedQueue::new(items.len().max(1));
        for &item in &items {
            prop_assert!(queue.enqueue(item));
            prop_assert!(queue.len() <= items.len());
        }
        queue.shut_down();
        let mut drained = Vec::new();
        while let Some(item) = queue.dequeue() {
            drained.push(item);
        }
        prop_assert_eq!(drained, items);
    }
}
