//! Property-based tests for the sequence invariants.
//!
//! A `VecDeque` serves as the reference model: for any interleaving of
//! produce/consume operations, the queue must hand back exactly the values the
//! model does, in the same order, and never hold more than its capacity.
//!
//! Coverage:
//! - single-producer and multi-producer sequencers (driven from one thread)
//! - non-blocking and batch consumption paths

use proptest::prelude::*;
use ringdisruptor_rs::Builder;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Op {
    Produce(u32),
    Consume,
    ConsumeBatch,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u32>().prop_map(Op::Produce),
        2 => Just(Op::Consume),
        1 => Just(Op::ConsumeBatch),
    ]
}

fn capacity() -> impl Strategy<Value = i64> {
    (0u32..5).prop_map(|bits| 1i64 << bits)
}

// =============================================================================
// Round trip: every produced value is consumed exactly once, unchanged
// =============================================================================

proptest! {
    #[test]
    fn prop_round_trip_single_producer(
        size in capacity(),
        ops in prop::collection::vec(op(), 1..200),
    ) {
        let (mut producer, mut consumer) = Builder::<u32>::new()
            .with_size(size)
            .build_single_producer()
            .unwrap();
        let capacity = size as usize;
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Op::Produce(v) => {
                    let result = producer.try_produce(v);
                    if model.len() < capacity {
                        prop_assert_eq!(result, Ok(()));
                        model.push_back(v);
                    } else {
                        // Full: the value is handed back untouched
                        prop_assert_eq!(result, Err(v));
                    }
                }
                Op::Consume => {
                    prop_assert_eq!(consumer.try_consume(), model.pop_front());
                }
                Op::ConsumeBatch => {
                    let mut batch = Vec::new();
                    let n = consumer.consume_batch(|v| batch.push(v));
                    prop_assert_eq!(n, model.len());
                    prop_assert_eq!(batch, model.drain(..).collect::<Vec<_>>());
                }
            }

            prop_assert_eq!(consumer.len(), model.len());
            prop_assert!(consumer.len() <= capacity,
                "occupancy {} exceeds capacity {}", consumer.len(), capacity);
        }

        // Drain what is left with the blocking path
        while let Some(expected) = model.pop_front() {
            prop_assert_eq!(consumer.consume(), expected);
        }
        prop_assert!(consumer.is_empty());
    }
}

proptest! {
    #[test]
    fn prop_round_trip_multi_producer(
        size in capacity(),
        ops in prop::collection::vec(op(), 1..200),
    ) {
        let (producer, mut consumer) = Builder::<u32>::new()
            .with_size(size)
            .build_multi_producer()
            .unwrap();
        let secondary = producer.clone();
        let capacity = size as usize;
        let mut model = VecDeque::new();

        for (i, op) in ops.into_iter().enumerate() {
            match op {
                Op::Produce(v) => {
                    // Alternate handles: clones share one sequence space
                    let handle = if i % 2 == 0 { &producer } else { &secondary };
                    if model.len() < capacity {
                        handle.produce(v);
                        model.push_back(v);
                    } else {
                        prop_assert_eq!(handle.try_produce(v), Err(v));
                    }
                }
                Op::Consume => {
                    if let Some(expected) = model.pop_front() {
                        prop_assert_eq!(consumer.consume(), expected);
                    } else {
                        prop_assert_eq!(consumer.try_consume(), None);
                    }
                }
                Op::ConsumeBatch => {
                    let mut batch = Vec::new();
                    consumer.consume_batch(|v| batch.push(v));
                    prop_assert_eq!(batch, model.drain(..).collect::<Vec<_>>());
                }
            }

            prop_assert_eq!(producer.len(), model.len());
        }
    }
}

// =============================================================================
// Values never change identity in transit
// =============================================================================

proptest! {
    #[test]
    fn prop_owned_values_survive_wraparound(
        values in prop::collection::vec(".{0,16}", 1..64),
    ) {
        let (mut producer, mut consumer) = Builder::<String>::new()
            .with_size(4)
            .build_single_producer()
            .unwrap();

        // Produce/consume in lockstep so the ring laps many times
        for value in &values {
            producer.produce(value.clone());
            prop_assert_eq!(&consumer.consume(), value);
        }
    }
}
