use crate::invariants::debug_assert_unit_step;
use crate::metrics::Metrics;
use crate::sequence::Sequence;
use crate::wait::WaitStrategy;

/// The consumer's side of the protocol.
///
/// Owns the consumer sequence (highest consumed sequence, written only by the
/// single consumer) and gates reads on the sequencer's cursor. Producers read
/// the consumer sequence as the bound for buffer-full detection.
#[derive(Debug, Default)]
pub struct ConsumerBarrier {
    sequence: Sequence,
}

impl ConsumerBarrier {
    /// Creates a barrier with nothing consumed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest consumed sequence.
    #[inline]
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Next sequence the consumer needs.
    #[inline]
    pub fn next(&self) -> i64 {
        self.sequence.get_relaxed() + 1
    }

    /// Waits until `cursor` has published the next needed sequence.
    ///
    /// Returns the observed cursor, which may be ahead of the needed sequence.
    /// The Acquire load of the cursor makes every slot up to the returned
    /// value safe to read.
    pub fn wait_for<W: WaitStrategy>(
        &self,
        cursor: &Sequence,
        wait: &W,
        metrics: Option<&Metrics>,
    ) -> i64 {
        let needed = self.next();

        let mut available = cursor.get();
        let mut waits = 0;
        while available < needed {
            wait.wait();
            waits += 1;
            available = cursor.get();
        }
        if let Some(m) = metrics {
            if waits > 0 {
                m.add_consumer_waits(waits);
            }
        }
        available
    }

    /// Non-blocking variant of [`wait_for`](Self::wait_for).
    #[inline]
    pub fn available(&self, cursor: &Sequence) -> Option<i64> {
        let available = cursor.get();
        (available >= self.next()).then_some(available)
    }

    /// Marks one more sequence as consumed, releasing its slot to producers.
    #[inline]
    pub fn advance(&self, sequence: i64) {
        debug_assert_unit_step!("consumer", self.sequence.get_relaxed(), sequence);
        self.sequence.set(sequence);
    }

    /// Marks every sequence up to `sequence` as consumed with one store.
    #[inline]
    pub fn advance_to(&self, sequence: i64) {
        debug_assert!(
            sequence >= self.sequence.get_relaxed(),
            "monotonic progress violated: consumer moved back to {}",
            sequence
        );
        self.sequence.set(sequence);
    }
}
