use crate::config::Capacity;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

/// Fixed-size slot storage for the disruptor.
///
/// The ring performs no synchronization of its own. Whether a slot may be
/// written or read is decided entirely by the sequencer and consumer barrier
/// through sequence arithmetic; slots carry no "occupied" flag.
///
/// Uses `Box<[_]>` because the slot count is fixed at construction and never
/// changes.
pub struct RingBuffer<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    capacity: Capacity,
}

// Safety: slot access is serialized by the sequence protocol. Each slot has at
// most one writer (the claiming producer) and one reader (the consumer) between
// overwrites, ordered by Release/Acquire on the cursor and consumer sequences.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Allocates `capacity` uninitialized slots. This is the only allocation
    /// the queue ever makes.
    pub fn new(capacity: Capacity) -> Self {
        let slots = (0..capacity.get())
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { slots, capacity }
    }

    /// Returns the ring buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Returns the storage cell for `sequence` (`sequence & (C - 1)`).
    #[inline]
    pub fn slot_at(&self, sequence: i64) -> *mut MaybeUninit<T> {
        // The mask keeps the index in [0, C); the bounds check is optimized out.
        self.slots[self.capacity.index(sequence)].get()
    }

    /// Writes `value` into the slot for `sequence`.
    ///
    /// Any value previously in the slot is overwritten without being dropped.
    ///
    /// # Safety
    ///
    /// The caller must have claimed `sequence` exclusively and confirmed that
    /// the previous occupant of this slot (`sequence - C`) has been consumed.
    #[inline]
    pub unsafe fn write(&self, sequence: i64, value: T) {
        (*self.slot_at(sequence)).write(value);
    }

    /// Moves the value for `sequence` out of its slot.
    ///
    /// # Safety
    ///
    /// `sequence` must be published (cursor observed `>= sequence` with
    /// Acquire), not yet consumed, and the caller must be the only consumer.
    /// After this call the slot is logically uninitialized.
    #[inline]
    pub unsafe fn read(&self, sequence: i64) -> T {
        (*self.slot_at(sequence)).assume_init_read()
    }

    /// Drops the values for sequences in `(consumed, published]`.
    ///
    /// # Safety
    ///
    /// Exactly that range must hold initialized values and no other thread may
    /// access the ring.
    pub unsafe fn drop_range(&mut self, consumed: i64, published: i64) {
        let mut sequence = consumed + 1;
        while sequence <= published {
            let idx = self.capacity.index(sequence);
            self.slots[idx].get_mut().assume_init_drop();
            sequence += 1;
        }
    }
}
