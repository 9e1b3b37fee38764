//! RingDisruptor - Bounded Disruptor-Style Inter-Thread Queue
//!
//! A fixed-capacity, power-of-two ring buffer shared by one or more producer
//! threads and a single consumer thread. Coordination happens through
//! monotonically increasing sequence counters, not per-slot locks:
//!
//! - producers *claim* a sequence, write its slot, then *publish* it by
//!   advancing the cursor
//! - the consumer reads up to the cursor and advances its own sequence, which
//!   producers use to detect a full buffer
//!
//! # Key Features
//!
//! - Single-producer sequencer (plain stores) and multi-producer sequencer
//!   (CAS claim, gapless in-order publish)
//! - Pluggable wait strategy: any `Fn()` closure, or [`YieldWait`],
//!   [`SpinWait`], [`SleepWait`]
//! - Cache-padded sequences (no false sharing between producer and consumer)
//! - Batch consumption API (single sequence update for N items)
//! - One allocation, at build time
//!
//! # Example
//!
//! ```
//! use ringdisruptor_rs::Builder;
//! use std::thread;
//!
//! let (producer, mut consumer) = Builder::<u64>::new()
//!     .with_size(1024)
//!     .build_multi_producer()
//!     .unwrap();
//!
//! let handles: Vec<_> = (0..2)
//!     .map(|id| {
//!         let producer = producer.clone();
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 producer.produce(id * 1000 + i);
//!             }
//!         })
//!     })
//!     .collect();
//!
//! let mut received = 0;
//! while received < 200 {
//!     consumer.consume();
//!     received += 1;
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! ```

mod barrier;
mod builder;
mod config;
mod disruptor;
mod invariants;
mod metrics;
mod ring;
mod sequence;
mod sequencer;
mod trace;
mod wait;

pub use barrier::ConsumerBarrier;
pub use builder::{BuildError, Builder, MultiProducerPair, SingleProducerPair};
pub use config::{Capacity, Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use disruptor::{Consumer, MultiProducer, SingleProducer};
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::RingBuffer;
pub use sequence::{Sequence, INITIAL_SEQUENCE};
pub use sequencer::{MultiProducerSequencer, Sequencer, SingleProducerSequencer};
pub use trace::init_tracing;
pub use wait::{SleepWait, SpinWait, WaitStrategy, YieldWait};
