//! Debug-only assertions for queue and registry bookkeeping.

// =============================================================================
// INV-QUEUE-01: Bounded occupancy
// =============================================================================

/// Invariant: the registration queue never holds more than its capacity.
macro_rules! debug_assert_queue_bounded {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $len <= $capacity,
            "INV-QUEUE-01 violated: queue holds {} items, capacity is {}",
            $len,
            $capacity
        )
    };
}

// =============================================================================
// INV-REG-01: Slot count matches live box count
// =============================================================================

/// Invariant: the number of occupied registry slots never exceeds the
/// fixed number of slots available.
macro_rules! debug_assert_registry_bounded {
    ($occupied:expr, $capacity:expr) => {
        debug_assert!(
            $occupied <= $capacity,
            "INV-REG-01 violated: {} occupied slots exceeds capacity {}",
            $occupied,
            $capacity
        )
    };
}

pub(crate) use debug_assert_queue_bounded;
pub(crate) use debug_assert_registry_bounded;
