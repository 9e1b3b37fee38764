use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicI64, Ordering};

// =============================================================================
// MEMORY ORDERING
// =============================================================================
//
// Every coordination point in the queue is a `Sequence`:
//
// - cursor      (sequencer): highest published sequence, read by the consumer
// - next claim  (sequencer): highest claimed sequence, read/CAS'd by producers
// - consumer    (barrier):   highest consumed sequence, read by producers
//
// Writers publish with Release (`set`) after touching the slot; readers observe
// with Acquire (`get`) before touching the slot. A consumer that sees
// `cursor >= s` therefore sees the slot write for `s`, and a producer that sees
// `consumer >= s - C` sees the slot read for `s - C` completed before it
// overwrites it.
//
// Loads that only re-read a value the calling thread itself wrote use
// `get_relaxed`.
//
// =============================================================================

/// Value of every sequence before anything is claimed, published or consumed.
pub const INITIAL_SEQUENCE: i64 = -1;

/// Monotonically non-decreasing 64-bit counter shared between threads.
///
/// Padded to its own cache line so that the producer-written cursor and the
/// consumer-written sequence never false-share.
pub struct Sequence {
    value: CachePadded<AtomicI64>,
}

impl Sequence {
    /// Creates a sequence at [`INITIAL_SEQUENCE`].
    pub fn new() -> Self {
        Self::with_value(INITIAL_SEQUENCE)
    }

    /// Creates a sequence starting at `value`.
    pub fn with_value(value: i64) -> Self {
        Self {
            value: CachePadded::new(AtomicI64::new(value)),
        }
    }

    /// Acquire load.
    #[inline]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Relaxed load, for the sequence's own writer.
    #[inline]
    pub fn get_relaxed(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Release store.
    #[inline]
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Release);
    }

    /// Relaxed store, for sequences with a single writer that publish nothing.
    #[inline]
    pub fn set_relaxed(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Atomically replaces `current` with `new`.
    ///
    /// Returns `Ok(current)` on success and `Err(actual)` otherwise.
    #[inline]
    pub fn compare_exchange(&self, current: i64, new: i64) -> Result<i64, i64> {
        self.value
            .compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire)
    }

    /// Weak variant of [`compare_exchange`](Self::compare_exchange) for retry loops.
    #[inline]
    pub fn compare_exchange_weak(&self, current: i64, new: i64) -> Result<i64, i64> {
        self.value
            .compare_exchange_weak(current, new, Ordering::AcqRel, Ordering::Acquire)
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Sequence").field(&self.get_relaxed()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_starts_at_initial() {
        let seq = Sequence::new();
        assert_eq!(seq.get(), INITIAL_SEQUENCE);
        assert_eq!(Sequence::default().get_relaxed(), -1);
    }

    #[test]
    fn test_sequence_set_get() {
        let seq = Sequence::new();
        seq.set(41);
        assert_eq!(seq.get(), 41);
        assert_eq!(seq.get_relaxed(), 41);
    }

    #[test]
    fn test_sequence_compare_exchange() {
        let seq = Sequence::with_value(4);

        assert_eq!(seq.compare_exchange(4, 5), Ok(4));
        assert_eq!(seq.get(), 5);

        // Stale expectation fails and reports the actual value
        assert_eq!(seq.compare_exchange(4, 6), Err(5));
        assert_eq!(seq.get(), 5);
    }

    #[test]
    fn test_sequence_is_cache_padded() {
        assert!(std::mem::align_of::<Sequence>() >= 64);
    }
}
