//! Wait strategies for blocked producers and consumers.
//!
//! A wait strategy is called repeatedly by a thread that cannot make progress
//! (buffer full, buffer empty, or a predecessor has not published yet). The
//! caller re-checks its condition after every call; the strategy only decides
//! how to spend the time in between.
//!
//! | strategy     | latency  | cpu      | use case                        |
//! |--------------|----------|----------|---------------------------------|
//! | `SpinWait`   | lowest   | highest  | dedicated cores                 |
//! | `YieldWait`  | low      | moderate | default, shared cores           |
//! | `SleepWait`  | high     | lowest   | background or bursty pipelines  |
//!
//! Any `Fn() + Send + Sync` closure is also a wait strategy.

use std::hint;
use std::thread;
use std::time::Duration;

/// Policy invoked while a thread waits for its counterpart to make progress.
///
/// A strategy may panic. The panic reaches the blocked `produce` or `consume`
/// call, except that a multi-producer publish first finishes advancing the
/// cursor so other producers are not stalled behind its sequence.
pub trait WaitStrategy: Send + Sync {
    /// Called once per failed poll, before the caller polls again.
    fn wait(&self);
}

impl<F> WaitStrategy for F
where
    F: Fn() + Send + Sync,
{
    #[inline]
    fn wait(&self) {
        (self)()
    }
}

/// Cooperative yield to the OS scheduler. The default strategy.
///
/// A pure busy-spin can starve the counterpart thread when both share a core.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldWait;

impl WaitStrategy for YieldWait {
    #[inline]
    fn wait(&self) {
        thread::yield_now();
    }
}

/// Busy-spin with a CPU pause hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinWait;

impl WaitStrategy for SpinWait {
    #[inline]
    fn wait(&self) {
        hint::spin_loop();
    }
}

/// Sleeps for a fixed interval between polls.
#[derive(Debug, Clone, Copy)]
pub struct SleepWait {
    interval: Duration,
}

impl SleepWait {
    /// Creates a sleeping strategy with the given poll interval.
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Returns the poll interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for SleepWait {
    fn default() -> Self {
        Self::new(Duration::from_micros(100))
    }
}

impl WaitStrategy for SleepWait {
    #[inline]
    fn wait(&self) {
        thread::sleep(self.interval);
    }
}
