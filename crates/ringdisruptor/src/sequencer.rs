//! Claim/publish protocol.
//!
//! A producer first *claims* a sequence, which reserves the slot at
//! `sequence & (C - 1)`, then writes the slot, then *publishes* the sequence by
//! advancing the cursor. The consumer only ever reads up to the cursor.
//!
//! Before claiming `candidate`, a producer computes the wrap point
//! `candidate - C`. The slot's previous occupant had sequence `wrap point`, so
//! the claim is only safe once the consumer sequence has reached it. This is
//! the whole of backpressure: no per-slot flags are kept.

use crate::config::Capacity;
use crate::invariants::{debug_assert_bounded_claim, debug_assert_unit_step};
use crate::metrics::Metrics;
use crate::sequence::Sequence;
use crate::wait::WaitStrategy;
use std::mem;
use std::thread;

/// Assigns sequences to producers and exposes the published cursor.
pub trait Sequencer: Send + Sync {
    /// Short name used in diagnostics.
    const MODE: &'static str;

    /// Creates a sequencer for a ring of `capacity` slots.
    fn new(capacity: Capacity) -> Self;

    /// Highest fully published sequence.
    fn cursor(&self) -> &Sequence;

    /// Claims the next sequence, waiting while the buffer is full.
    ///
    /// `gate` is the consumer sequence. Returns a sequence whose slot may be
    /// written by the caller alone.
    fn claim<W: WaitStrategy>(&self, gate: &Sequence, wait: &W, metrics: Option<&Metrics>) -> i64;

    /// Claims the next sequence, or returns `None` if the buffer is full.
    fn try_claim(&self, gate: &Sequence) -> Option<i64>;

    /// Publishes a claimed sequence after its slot has been written.
    fn publish<W: WaitStrategy>(&self, sequence: i64, wait: &W, metrics: Option<&Metrics>);
}

/// Sequencer for exactly one producer thread.
///
/// Claiming is a plain load/store of the next-claim sequence and publishing is
/// a single Release store of the cursor; no read-modify-write atomics are
/// needed. Callers must never claim or publish from two threads at once.
#[derive(Debug)]
pub struct SingleProducerSequencer {
    capacity: i64,
    /// Highest claimed sequence (written only by the producer)
    next: Sequence,
    /// Highest published sequence (written by producer, read by consumer)
    cursor: Sequence,
}

impl Sequencer for SingleProducerSequencer {
    const MODE: &'static str = "single-producer";

    fn new(capacity: Capacity) -> Self {
        Self {
            capacity: capacity.as_sequence(),
            next: Sequence::new(),
            cursor: Sequence::new(),
        }
    }

    #[inline]
    fn cursor(&self) -> &Sequence {
        &self.cursor
    }

    fn claim<W: WaitStrategy>(&self, gate: &Sequence, wait: &W, metrics: Option<&Metrics>) -> i64 {
        let candidate = self.next.get_relaxed() + 1;
        let wrap_point = candidate - self.capacity;

        let mut consumer = gate.get();
        let mut waits = 0;
        while wrap_point > consumer {
            wait.wait();
            waits += 1;
            consumer = gate.get();
        }
        if let Some(m) = metrics {
            if waits > 0 {
                m.add_producer_waits(waits);
            }
        }

        debug_assert_bounded_claim!(candidate, consumer, self.capacity);

        self.next.set_relaxed(candidate);
        candidate
    }

    fn try_claim(&self, gate: &Sequence) -> Option<i64> {
        let candidate = self.next.get_relaxed() + 1;
        if candidate - self.capacity > gate.get() {
            return None;
        }
        self.next.set_relaxed(candidate);
        Some(candidate)
    }

    #[inline]
    fn publish<W: WaitStrategy>(&self, sequence: i64, _wait: &W, _metrics: Option<&Metrics>) {
        debug_assert_unit_step!("cursor", self.cursor.get_relaxed(), sequence);
        self.cursor.set(sequence);
    }
}

/// Sequencer shared by any number of producer threads.
///
/// Sequences are handed out by a compare-and-swap loop on the shared
/// next-claim sequence, so each value is claimed by exactly one producer.
/// Producers may finish writing out of claim order; the cursor is only moved
/// from `s - 1` to `s`, so it always covers a gapless prefix of published
/// sequences and the consumer never observes an unwritten slot.
#[derive(Debug)]
pub struct MultiProducerSequencer {
    capacity: i64,
    /// Highest claimed sequence (CAS'd by all producers)
    next: Sequence,
    /// Highest contiguously published sequence
    cursor: Sequence,
}

impl Sequencer for MultiProducerSequencer {
    const MODE: &'static str = "multi-producer";

    fn new(capacity: Capacity) -> Self {
        Self {
            capacity: capacity.as_sequence(),
            next: Sequence::new(),
            cursor: Sequence::new(),
        }
    }

    #[inline]
    fn cursor(&self) -> &Sequence {
        &self.cursor
    }

    fn claim<W: WaitStrategy>(&self, gate: &Sequence, wait: &W, metrics: Option<&Metrics>) -> i64 {
        let mut waits = 0;
        let claimed = loop {
            let current = self.next.get();
            let candidate = current + 1;
            let consumer = gate.get();

            // The wrap check happens before the CAS so that
            // `next - consumer <= C` holds at every instant.
            if candidate - self.capacity > consumer {
                wait.wait();
                waits += 1;
                continue;
            }

            if self.next.compare_exchange_weak(current, candidate).is_ok() {
                debug_assert_bounded_claim!(candidate, consumer, self.capacity);
                break candidate;
            }
            // Lost the race to another producer; re-read and retry.
        };

        if let Some(m) = metrics {
            if waits > 0 {
                m.add_producer_waits(waits);
            }
        }
        claimed
    }

    fn try_claim(&self, gate: &Sequence) -> Option<i64> {
        let mut current = self.next.get();
        loop {
            let candidate = current + 1;
            if candidate - self.capacity > gate.get() {
                return None;
            }
            match self.next.compare_exchange_weak(current, candidate) {
                Ok(_) => return Some(candidate),
                Err(actual) => current = actual,
            }
        }
    }

    fn publish<W: WaitStrategy>(&self, sequence: i64, wait: &W, metrics: Option<&Metrics>) {
        let predecessor = sequence - 1;
        let mut retries = 0;

        // The slot is already written, so the sequence must reach the cursor
        // even if `wait` unwinds; otherwise every later publish would stall.
        let unwind = PublishOnUnwind {
            cursor: &self.cursor,
            sequence,
        };

        // Strong CAS: a spurious failure would cost an unnecessary wait call.
        while self.cursor.compare_exchange(predecessor, sequence).is_err() {
            // A producer holding a lower sequence has not published yet.
            wait.wait();
            retries += 1;
        }
        mem::forget(unwind);

        if let Some(m) = metrics {
            if retries > 0 {
                m.add_publish_retries(retries);
            }
        }
    }
}

/// Completes a multi-producer publish while a panicking wait strategy unwinds.
struct PublishOnUnwind<'a> {
    cursor: &'a Sequence,
    sequence: i64,
}

impl Drop for PublishOnUnwind<'_> {
    fn drop(&mut self) {
        while self
            .cursor
            .compare_exchange(self.sequence - 1, self.sequence)
            .is_err()
        {
            thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::YieldWait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;

    fn capacity(size: i64) -> Capacity {
        Capacity::new(size).unwrap()
    }

    #[test]
    fn test_single_producer_claims_in_order() {
        let sequencer = SingleProducerSequencer::new(capacity(4));
        let gate = Sequence::new();

        for expected in 0..4 {
            let seq = sequencer.claim(&gate, &YieldWait, None);
            assert_eq!(seq, expected);
            sequencer.publish(seq, &YieldWait, None);
            assert_eq!(sequencer.cursor().get(), expected);
        }
    }

    #[test]
    fn test_single_producer_try_claim_respects_wrap_point() {
        let sequencer = SingleProducerSequencer::new(capacity(2));
        let gate = Sequence::new();

        assert_eq!(sequencer.try_claim(&gate), Some(0));
        assert_eq!(sequencer.try_claim(&gate), Some(1));
        // Slot for sequence 2 still holds sequence 0
        assert_eq!(sequencer.try_claim(&gate), None);

        gate.set(0);
        assert_eq!(sequencer.try_claim(&gate), Some(2));
        assert_eq!(sequencer.try_claim(&gate), None);
    }

    #[test]
    fn test_single_producer_claim_waits_for_consumer() {
        let sequencer = SingleProducerSequencer::new(capacity(1));
        let gate = Arc::new(Sequence::new());

        let first = sequencer.claim(&gate, &YieldWait, None);
        sequencer.publish(first, &YieldWait, None);

        // Each wait call lets the "consumer" catch up by one
        let calls = AtomicUsize::new(0);
        let g = Arc::clone(&gate);
        let advance = || {
            calls.fetch_add(1, Ordering::Relaxed);
            g.set(0);
        };
        let metrics = Metrics::new();

        let second = sequencer.claim(&gate, &advance, Some(&metrics));
        assert_eq!(second, 1);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.snapshot().producer_waits, 1);
    }

    #[test]
    fn test_multi_producer_try_claim_respects_wrap_point() {
        let sequencer = MultiProducerSequencer::new(capacity(2));
        let gate = Sequence::new();

        assert_eq!(sequencer.try_claim(&gate), Some(0));
        assert_eq!(sequencer.try_claim(&gate), Some(1));
        assert_eq!(sequencer.try_claim(&gate), None);

        gate.set(1);
        assert_eq!(sequencer.try_claim(&gate), Some(2));
        assert_eq!(sequencer.try_claim(&gate), Some(3));
        assert_eq!(sequencer.try_claim(&gate), None);
    }

    #[test]
    fn test_multi_producer_out_of_order_publish_holds_cursor() {
        let sequencer = Arc::new(MultiProducerSequencer::new(capacity(8)));
        let gate = Sequence::new();

        let first = sequencer.claim(&gate, &YieldWait, None);
        let second = sequencer.claim(&gate, &YieldWait, None);
        assert_eq!((first, second), (0, 1));

        // Publishing 1 before 0 must poll until 0 lands
        let polls = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&sequencer);
        let p = Arc::clone(&polls);
        let late = thread::spawn(move || {
            let metrics = Metrics::new();
            let poll = || {
                p.fetch_add(1, Ordering::SeqCst);
                thread::yield_now();
            };
            s.publish(second, &poll, Some(&metrics));
            metrics.snapshot().publish_retries
        });

        while polls.load(Ordering::SeqCst) < 3 {
            thread::yield_now();
        }
        // Cursor cannot pass the gap at 0
        assert_eq!(sequencer.cursor().get(), -1);

        sequencer.publish(first, &YieldWait, None);
        let retries = late.join().unwrap();

        assert_eq!(sequencer.cursor().get(), 1);
        assert!(retries >= 3);
    }

    #[test]
    fn test_multi_producer_publish_survives_panicking_wait() {
        let sequencer = Arc::new(MultiProducerSequencer::new(capacity(4)));
        let gate = Sequence::new();

        let first = sequencer.claim(&gate, &YieldWait, None);
        let second = sequencer.claim(&gate, &YieldWait, None);

        let (tx, waiting) = mpsc::sync_channel(1);
        let s = Arc::clone(&sequencer);
        let late = thread::spawn(move || {
            let failing = move || {
                let _ = tx.try_send(());
                panic!("wait strategy failed");
            };
            s.publish(second, &failing, None);
        });

        // The late publish is blocked behind `first` when its wait panics
        waiting.recv().unwrap();
        sequencer.publish(first, &YieldWait, None);
        assert!(late.join().is_err());

        // The unwinding publish still advanced the cursor past `second`
        assert_eq!(sequencer.cursor().get(), second);

        let third = sequencer.claim(&gate, &YieldWait, None);
        sequencer.publish(third, &YieldWait, None);
        assert_eq!(sequencer.cursor().get(), third);
    }

    #[test]
    fn test_multi_producer_unique_claims_under_contention() {
        const THREADS: usize = 4;
        const PER_THREAD: usize = 1_000;

        let sequencer = Arc::new(MultiProducerSequencer::new(capacity(1 << 14)));
        let gate = Arc::new(Sequence::new());

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let s = Arc::clone(&sequencer);
                let g = Arc::clone(&gate);
                thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| s.claim(&g, &YieldWait, None))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut claimed: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        claimed.sort_unstable();

        let expected: Vec<i64> = (0..(THREADS * PER_THREAD) as i64).collect();
        assert_eq!(claimed, expected);
    }
}
