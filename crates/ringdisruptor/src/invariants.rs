//! Debug assertion macros for the sequence invariants.
//!
//! At any instant: `consumer ≤ cursor ≤ next_claim` and
//! `next_claim − consumer ≤ capacity`. All sequences only move forward.
//!
//! The macros are only active in debug builds (`#[cfg(debug_assertions)]`), so
//! there is zero overhead in release builds.

// =============================================================================
// Bounded claim: a producer never laps the consumer
// =============================================================================

/// Assert that a claimed sequence does not overwrite an unconsumed slot.
///
/// **Invariant**: `claimed − consumer ≤ capacity`
///
/// Used in: sequencer `claim()` after the wrap check succeeds
macro_rules! debug_assert_bounded_claim {
    ($claimed:expr, $consumer:expr, $capacity:expr) => {
        debug_assert!(
            $claimed - $consumer <= $capacity,
            "bounded claim violated: claimed {} with consumer at {} (capacity {})",
            $claimed,
            $consumer,
            $capacity
        )
    };
}

// =============================================================================
// Monotonic progress
// =============================================================================

/// Assert that a sequence advances by exactly one.
///
/// **Invariant**: cursor and consumer sequences move in unit steps
///
/// Used in: `publish()` for the cursor, `consume()` for the consumer sequence
macro_rules! debug_assert_unit_step {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new == $old + 1,
            "monotonic progress violated: {} moved from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// Published read: the consumer only reads what the cursor exposes
// =============================================================================

/// Assert that the consumer reads a published, unconsumed slot.
///
/// **Invariant**: `consumer < sequence ≤ cursor`
///
/// Used in: consumer read path before `RingBuffer::read`
macro_rules! debug_assert_published_read {
    ($sequence:expr, $consumer:expr, $cursor:expr) => {
        debug_assert!(
            $sequence > $consumer && $sequence <= $cursor,
            "published read violated: reading seq {} outside ({}, {}]",
            $sequence,
            $consumer,
            $cursor
        )
    };
}

pub(crate) use debug_assert_bounded_claim;
pub(crate) use debug_assert_published_read;
pub(crate) use debug_assert_unit_step;
