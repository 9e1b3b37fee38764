use crate::barrier::ConsumerBarrier;
use crate::config::Capacity;
use crate::invariants::debug_assert_published_read;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::ring::RingBuffer;
use crate::sequencer::{MultiProducerSequencer, Sequencer, SingleProducerSequencer};
use crate::wait::{WaitStrategy, YieldWait};
use std::sync::Arc;

// =============================================================================
// DATA FLOW
// =============================================================================
//
// produce(v):  claim s from the sequencer (waits while s - C > consumer)
//              write v into slot s & (C - 1)
//              publish s (cursor: s - 1 -> s, Release)
//
// consume():   wait until cursor >= consumer + 1 (Acquire)
//              move the value out of slot (consumer + 1) & (C - 1)
//              consumer := consumer + 1 (Release)
//
// At every instant: consumer <= cursor <= next_claim <= consumer + C.
//
// =============================================================================

/// State shared by every handle of one queue.
pub(crate) struct Shared<T, S: Sequencer, W> {
    ring: RingBuffer<T>,
    sequencer: S,
    barrier: ConsumerBarrier,
    wait: W,
    metrics: Metrics,
    enable_metrics: bool,
}

impl<T, S: Sequencer, W: WaitStrategy> Shared<T, S, W> {
    pub(crate) fn new(capacity: Capacity, wait: W, enable_metrics: bool) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
            sequencer: S::new(capacity),
            barrier: ConsumerBarrier::new(),
            wait,
            metrics: Metrics::new(),
            enable_metrics,
        }
    }

    #[inline]
    fn metrics_sink(&self) -> Option<&Metrics> {
        self.enable_metrics.then_some(&self.metrics)
    }

    /// Writes `value` into a claimed slot and publishes it.
    ///
    /// # Safety
    ///
    /// `sequence` must come from this queue's sequencer and must not have been
    /// written yet.
    #[inline]
    unsafe fn write_and_publish(&self, sequence: i64, value: T) {
        self.ring.write(sequence, value);
        self.sequencer
            .publish(sequence, &self.wait, self.metrics_sink());
        if let Some(m) = self.metrics_sink() {
            m.add_items_produced(1);
        }
    }

    /// # Safety
    ///
    /// For a single-producer sequencer the caller must be the only producer.
    unsafe fn produce(&self, value: T) {
        let sequence = self
            .sequencer
            .claim(self.barrier.sequence(), &self.wait, self.metrics_sink());
        self.write_and_publish(sequence, value);
    }

    /// # Safety
    ///
    /// Same as [`produce`](Self::produce).
    unsafe fn try_produce(&self, value: T) -> Result<(), T> {
        match self.sequencer.try_claim(self.barrier.sequence()) {
            Some(sequence) => {
                self.write_and_publish(sequence, value);
                Ok(())
            }
            None => Err(value),
        }
    }

    /// Moves the value at the next sequence out and releases its slot.
    ///
    /// # Safety
    ///
    /// The caller must be the only consumer and must have observed
    /// `cursor >= self.barrier.next()` with Acquire ordering.
    #[inline]
    unsafe fn take_next(&self, available: i64) -> T {
        let sequence = self.barrier.next();
        debug_assert_published_read!(sequence, sequence - 1, available);

        let value = self.ring.read(sequence);
        self.barrier.advance(sequence);
        value
    }

    /// # Safety
    ///
    /// The caller must be the only consumer.
    unsafe fn consume(&self) -> T {
        let available = self
            .barrier
            .wait_for(self.sequencer.cursor(), &self.wait, self.metrics_sink());
        let value = self.take_next(available);
        if let Some(m) = self.metrics_sink() {
            m.add_items_consumed(1);
        }
        value
    }

    /// # Safety
    ///
    /// The caller must be the only consumer.
    unsafe fn try_consume(&self) -> Option<T> {
        let available = self.barrier.available(self.sequencer.cursor())?;
        let value = self.take_next(available);
        if let Some(m) = self.metrics_sink() {
            m.add_items_consumed(1);
        }
        Some(value)
    }

    /// # Safety
    ///
    /// The caller must be the only consumer.
    unsafe fn consume_batch<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(T),
    {
        let Some(available) = self.barrier.available(self.sequencer.cursor()) else {
            return 0;
        };

        let first = self.barrier.next();
        let mut release = BatchRelease {
            barrier: &self.barrier,
            last_taken: first - 1,
        };
        // Process the whole published run, then release it with one store.
        for sequence in first..=available {
            debug_assert_published_read!(sequence, first - 1, available);
            let value = self.ring.read(sequence);
            release.last_taken = sequence;
            handler(value);
        }
        drop(release);

        let count = (available - first + 1) as usize;
        if let Some(m) = self.metrics_sink() {
            m.add_items_consumed(count as u64);
        }
        count
    }

    fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    fn len(&self) -> usize {
        // Consumer first: the cursor read afterwards can only be larger.
        let consumed = self.barrier.sequence().get();
        let published = self.sequencer.cursor().get();
        ((published - consumed).max(0) as usize).min(self.capacity())
    }

    fn metrics(&self) -> MetricsSnapshot {
        if self.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl<T, S: Sequencer, W> Drop for Shared<T, S, W> {
    fn drop(&mut self) {
        // Only published values are initialized; every produce publishes
        // before returning, so nothing is claimed-but-unwritten here.
        let consumed = self.barrier.sequence().get_relaxed();
        let published = self.sequencer.cursor().get_relaxed();
        // SAFETY: we have exclusive access, and exactly (consumed, published]
        // holds values that were written and not moved out.
        unsafe { self.ring.drop_range(consumed, published) };
    }
}

/// Releases the slots a batch has already moved out, even if the handler
/// unwinds part-way through.
struct BatchRelease<'a> {
    barrier: &'a ConsumerBarrier,
    last_taken: i64,
}

impl Drop for BatchRelease<'_> {
    fn drop(&mut self) {
        if self.last_taken >= self.barrier.next() {
            self.barrier.advance_to(self.last_taken);
        }
    }
}

// ---------------------------------------------------------------------
// HANDLES
// ---------------------------------------------------------------------

macro_rules! introspection {
    () => {
        /// Returns the ring buffer capacity.
        #[inline]
        pub fn capacity(&self) -> usize {
            self.shared.capacity()
        }

        /// Returns the number of published, unconsumed values.
        #[inline]
        pub fn len(&self) -> usize {
            self.shared.len()
        }

        /// Returns true if no published value is waiting.
        #[inline]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Get a snapshot of metrics if enabled.
        pub fn metrics(&self) -> MetricsSnapshot {
            self.shared.metrics()
        }
    };
}

/// Producer handle for a queue with exactly one producer.
///
/// Not `Clone`, and producing takes `&mut self`, so only one thread can ever
/// claim sequences. Move it to the producing thread.
pub struct SingleProducer<T, W = YieldWait> {
    shared: Arc<Shared<T, SingleProducerSequencer, W>>,
}

impl<T, W: WaitStrategy> SingleProducer<T, W> {
    pub(crate) fn new(shared: Arc<Shared<T, SingleProducerSequencer, W>>) -> Self {
        Self { shared }
    }

    /// Publishes `value`, waiting while the buffer is full.
    #[inline]
    pub fn produce(&mut self, value: T) {
        // SAFETY: `&mut self` on the only SingleProducer makes this the sole
        // producer of the queue.
        unsafe { self.shared.produce(value) }
    }

    /// Publishes `value` if a slot is free; hands it back otherwise.
    #[inline]
    pub fn try_produce(&mut self, value: T) -> Result<(), T> {
        // SAFETY: see `produce`.
        unsafe { self.shared.try_produce(value) }
    }

    introspection!();
}

/// Producer handle for a queue shared by many producer threads.
///
/// Clone it once per producing thread. Values from one handle are consumed in
/// the order that handle produced them; across handles the order is the
/// order in which publication completed.
pub struct MultiProducer<T, W = YieldWait> {
    shared: Arc<Shared<T, MultiProducerSequencer, W>>,
}

impl<T, W: WaitStrategy> MultiProducer<T, W> {
    pub(crate) fn new(shared: Arc<Shared<T, MultiProducerSequencer, W>>) -> Self {
        Self { shared }
    }

    /// Publishes `value`, waiting while the buffer is full.
    #[inline]
    pub fn produce(&self, value: T) {
        // SAFETY: the multi-producer sequencer hands out every sequence once,
        // via CAS, so concurrent callers never share a slot.
        unsafe { self.shared.produce(value) }
    }

    /// Publishes `value` if a slot is free; hands it back otherwise.
    ///
    /// Never waits for the consumer. It may briefly poll the wait strategy
    /// while a producer holding an earlier sequence finishes publishing.
    #[inline]
    pub fn try_produce(&self, value: T) -> Result<(), T> {
        // SAFETY: see `produce`.
        unsafe { self.shared.try_produce(value) }
    }

    introspection!();
}

impl<T, W> Clone for MultiProducer<T, W> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// The single consumer of a queue.
///
/// Not `Clone`, and consuming takes `&mut self`: the consumer sequence has
/// exactly one writer.
pub struct Consumer<T, S: Sequencer, W = YieldWait> {
    shared: Arc<Shared<T, S, W>>,
}

impl<T, S: Sequencer, W: WaitStrategy> Consumer<T, S, W> {
    pub(crate) fn new(shared: Arc<Shared<T, S, W>>) -> Self {
        Self { shared }
    }

    /// Takes the next value, waiting while the buffer is empty.
    ///
    /// Values are returned in strictly increasing sequence order.
    #[inline]
    pub fn consume(&mut self) -> T {
        // SAFETY: `&mut self` on the only Consumer makes this the sole consumer.
        unsafe { self.shared.consume() }
    }

    /// Takes the next value if one is published.
    #[inline]
    pub fn try_consume(&mut self) -> Option<T> {
        // SAFETY: see `consume`.
        unsafe { self.shared.try_consume() }
    }

    /// Hands every currently published value to `handler`, in order, then
    /// releases all their slots with a single sequence update.
    ///
    /// Returns the number of values consumed. Does not wait.
    pub fn consume_batch<F>(&mut self, handler: F) -> usize
    where
        F: FnMut(T),
    {
        // SAFETY: see `consume`.
        unsafe { self.shared.consume_batch(handler) }
    }

    introspection!();
}

impl<T, W> std::fmt::Debug for SingleProducer<T, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleProducer")
            .field("capacity", &self.shared.ring.capacity())
            .finish_non_exhaustive()
    }
}

impl<T, W> std::fmt::Debug for MultiProducer<T, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiProducer")
            .field("capacity", &self.shared.ring.capacity())
            .finish_non_exhaustive()
    }
}

impl<T, S: Sequencer, W> std::fmt::Debug for Consumer<T, S, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.shared.ring.capacity())
            .field("consumed", &self.shared.barrier.sequence())
            .finish_non_exhaustive()
    }
}
