use crate::builder::BuildError;

/// Configuration for a disruptor queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Requested slot count. Must be a positive power of two (default: 1024)
    pub size: i64,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(size: i64, enable_metrics: bool) -> Self {
        Self {
            size,
            enable_metrics,
        }
    }

    /// Checks the requested size and returns the validated capacity.
    pub fn validate(&self) -> Result<Capacity, BuildError> {
        Capacity::new(self.size)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size: 1024,
            enable_metrics: false,
        }
    }
}

/// Low latency configuration (4K slots, fits in L1 cache for small `T`)
pub const LOW_LATENCY_CONFIG: Config = Config::new(1 << 12, false);

/// High throughput configuration (256K slots)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(1 << 18, false);

/// A validated, power-of-two slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    slots: usize,
}

impl Capacity {
    /// Validates `size`: it must be positive, a power of two, and fit in `usize`.
    pub fn new(size: i64) -> Result<Self, BuildError> {
        if size <= 0 || size & (size - 1) != 0 {
            return Err(BuildError::InvalidCapacity { size });
        }
        let slots = usize::try_from(size).map_err(|_| BuildError::CapacityTooLarge { size })?;
        Ok(Self { slots })
    }

    /// Number of slots.
    #[inline]
    pub const fn get(self) -> usize {
        self.slots
    }

    /// Number of slots as a sequence distance.
    #[inline]
    pub const fn as_sequence(self) -> i64 {
        self.slots as i64
    }

    /// Returns the mask for index wrapping.
    #[inline]
    pub const fn mask(self) -> usize {
        self.slots - 1
    }

    /// Maps a sequence onto its slot index.
    #[inline]
    pub const fn index(self, sequence: i64) -> usize {
        (sequence as usize) & self.mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_accepts_powers_of_two() {
        for bits in 0..20 {
            let size = 1i64 << bits;
            let capacity = Capacity::new(size).unwrap();
            assert_eq!(capacity.get(), size as usize);
            assert_eq!(capacity.mask(), size as usize - 1);
        }
    }

    #[test]
    fn test_capacity_rejects_invalid_sizes() {
        for size in [0, -1, -8, 3, 7, 12, 1000] {
            assert_eq!(
                Capacity::new(size),
                Err(BuildError::InvalidCapacity { size }),
                "size {} should be rejected",
                size
            );
        }
    }

    #[test]
    fn test_capacity_rejects_i64_min() {
        // i64::MIN & (i64::MIN - 1) would overflow without the sign check first
        assert!(Capacity::new(i64::MIN).is_err());
    }

    #[test]
    fn test_index_wraps_with_mask() {
        let capacity = Capacity::new(8).unwrap();
        assert_eq!(capacity.index(0), 0);
        assert_eq!(capacity.index(7), 7);
        assert_eq!(capacity.index(8), 0);
        assert_eq!(capacity.index(13), 5);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(Config::default().validate().is_ok());
        assert_eq!(LOW_LATENCY_CONFIG.validate().unwrap().get(), 4096);
        assert_eq!(HIGH_THROUGHPUT_CONFIG.validate().unwrap().get(), 1 << 18);
    }
}
