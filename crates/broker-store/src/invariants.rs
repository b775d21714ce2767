//! Debug-only assertions for byte-log bookkeeping.
//!
//! Active only under `#[cfg(debug_assertions)]`, zero cost in release builds.

// =============================================================================
// INV-STORE-01: Bounded log size
// =============================================================================

/// Invariant: `0 <= len <= capacity` for every box's backing buffer.
macro_rules! debug_assert_bounded_len {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $len <= $capacity,
            "INV-STORE-01 violated: box length {} exceeds capacity {}",
            $len,
            $capacity
        )
    };
}

// =============================================================================
// INV-STORE-02: Single publisher
// =============================================================================

/// Invariant: a box's publisher count never exceeds one.
macro_rules! debug_assert_single_publisher {
    ($n_publishers:expr) => {
        debug_assert!(
            $n_publishers <= 1,
            "INV-STORE-02 violated: box has {} publishers",
            $n_publishers
        )
    };
}

// =============================================================================
// INV-STORE-03: Reader cursor within bounds
// =============================================================================

/// Invariant: a subscriber's read cursor never runs past the written length.
macro_rules! debug_assert_cursor_in_bounds {
    ($cursor:expr, $len:expr) => {
        debug_assert!(
            $cursor <= $len,
            "INV-STORE-03 violated: read cursor {} past written length {}",
            $cursor,
            $len
        )
    };
}

pub(crate) use debug_assert_bounded_len;
pub(crate) use debug_assert_cursor_in_bounds;
pub(crate) use debug_assert_single_publisher;
