use crate::config::Config;
use crate::disruptor::{Consumer, MultiProducer, Shared, SingleProducer};
use crate::sequencer::{MultiProducerSequencer, Sequencer, SingleProducerSequencer};
use crate::trace::{debug, warn};
use crate::wait::{WaitStrategy, YieldWait};
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// Error types for queue construction.
///
/// Construction is the only fallible step: once built, producing and
/// consuming never fail, they wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Requested size is zero, negative, or not a power of two.
    #[error("invalid capacity {size}: must be a positive power of two")]
    InvalidCapacity {
        /// The rejected size.
        size: i64,
    },
    /// Requested size does not fit in this target's address space.
    #[error("capacity {size} does not fit in usize")]
    CapacityTooLarge {
        /// The rejected size.
        size: i64,
    },
}

/// Producer/consumer pair of a single-producer queue.
pub type SingleProducerPair<T, W = YieldWait> =
    (SingleProducer<T, W>, Consumer<T, SingleProducerSequencer, W>);

/// Producer/consumer pair of a multi-producer queue.
pub type MultiProducerPair<T, W = YieldWait> =
    (MultiProducer<T, W>, Consumer<T, MultiProducerSequencer, W>);

/// Validates configuration and wires a producer/consumer pair.
///
/// # Example
///
/// ```
/// use ringdisruptor_rs::Builder;
///
/// let (mut producer, mut consumer) = Builder::<u64>::new()
///     .with_size(8)
///     .build_single_producer()
///     .unwrap();
///
/// producer.produce(42);
/// assert_eq!(consumer.consume(), 42);
/// ```
pub struct Builder<T, W = YieldWait> {
    config: Config,
    wait: W,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Builder<T> {
    /// Starts from [`Config::default`] and the [`YieldWait`] strategy.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            wait: YieldWait,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Builder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, W: WaitStrategy> Builder<T, W> {
    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the slot count. Validated by the `build_*` methods.
    pub fn with_size(mut self, size: i64) -> Self {
        self.config.size = size;
        self
    }

    /// Enables or disables metrics collection.
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.config.enable_metrics = enable;
        self
    }

    /// Sets the wait strategy used by both producers and the consumer.
    pub fn with_wait_strategy<W2: WaitStrategy>(self, wait: W2) -> Builder<T, W2> {
        Builder {
            config: self.config,
            wait,
            _marker: PhantomData,
        }
    }

    /// Sets a closure as the wait strategy.
    pub fn with_yield<F>(self, callback: F) -> Builder<T, F>
    where
        F: Fn() + Send + Sync,
    {
        self.with_wait_strategy(callback)
    }

    /// Returns the configuration as currently set.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds a queue for exactly one producer thread.
    pub fn build_single_producer(self) -> Result<SingleProducerPair<T, W>, BuildError> {
        let shared = self.build_shared::<SingleProducerSequencer>()?;
        Ok((
            SingleProducer::new(Arc::clone(&shared)),
            Consumer::new(shared),
        ))
    }

    /// Builds a queue for any number of producer threads.
    pub fn build_multi_producer(self) -> Result<MultiProducerPair<T, W>, BuildError> {
        let shared = self.build_shared::<MultiProducerSequencer>()?;
        Ok((
            MultiProducer::new(Arc::clone(&shared)),
            Consumer::new(shared),
        ))
    }

    fn build_shared<S: Sequencer>(self) -> Result<Arc<Shared<T, S, W>>, BuildError> {
        let capacity = match self.config.validate() {
            Ok(capacity) => capacity,
            Err(e) => {
                warn!(size = self.config.size, error = %e, "rejected disruptor configuration");
                return Err(e);
            }
        };

        debug!(
            capacity = capacity.get(),
            mode = S::MODE,
            metrics = self.config.enable_metrics,
            "built disruptor"
        );

        Ok(Arc::new(Shared::new(
            capacity,
            self.wait,
            self.config.enable_metrics,
        )))
    }
}

impl<T, W> std::fmt::Debug for Builder<T, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
