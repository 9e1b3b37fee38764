use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for monitoring a queue.
///
/// Updated with relaxed atomics only when `Config::enable_metrics` is set;
/// counters are advisory and never participate in synchronization.
#[derive(Debug, Default)]
pub struct Metrics {
    items_produced: AtomicU64,
    items_consumed: AtomicU64,
    producer_waits: AtomicU64,
    consumer_waits: AtomicU64,
    publish_retries: AtomicU64,
}

impl Metrics {
    /// Creates a set of counters, all zero.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_items_produced(&self, n: u64) {
        self.items_produced.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_items_consumed(&self, n: u64) {
        self.items_consumed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_producer_waits(&self, n: u64) {
        self.producer_waits.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_consumer_waits(&self, n: u64) {
        self.consumer_waits.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_publish_retries(&self, n: u64) {
        self.publish_retries.fetch_add(n, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_produced: self.items_produced.load(Ordering::Relaxed),
            items_consumed: self.items_consumed.load(Ordering::Relaxed),
            producer_waits: self.producer_waits.load(Ordering::Relaxed),
            consumer_waits: self.consumer_waits.load(Ordering::Relaxed),
            publish_retries: self.publish_retries.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`Metrics`] at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Values published by producers.
    pub items_produced: u64,
    /// Values handed out by the consumer.
    pub items_consumed: u64,
    /// Wait-strategy calls made by producers because the buffer was full.
    pub producer_waits: u64,
    /// Wait-strategy calls made by the consumer because the buffer was empty.
    pub consumer_waits: u64,
    /// Wait-strategy calls made while a predecessor's publish was pending.
    pub publish_retries: u64,
}
