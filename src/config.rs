//! Run configuration for a leak test.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_PROBE_COUNT: usize = 10;
pub const DEFAULT_INTERVAL_MS: u64 = 200;
pub const DEFAULT_GRACE_MS: u64 = 1000;
pub const DEFAULT_LEAK_THRESHOLD: usize = 1;

/// Settings for a single leak test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakTestConfig {
    /// Capture device name (e.g., eth0)
    pub device: String,
    /// Number of probe names to resolve
    pub probe_count: usize,
    /// Milliseconds between two probe dispatches
    pub interval_ms: u64,
    /// Extra milliseconds to wait for stragglers after the last probe
    pub grace_ms: u64,
    /// Stop probing once this many leaks are confirmed
    pub leak_threshold: usize,
    /// Print every probe and every inspected query
    pub verbose: bool,
}

impl LeakTestConfig {
    /// Build a config for `device` with default timings.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            probe_count: DEFAULT_PROBE_COUNT,
            interval_ms: DEFAULT_INTERVAL_MS,
            grace_ms: DEFAULT_GRACE_MS,
            leak_threshold: DEFAULT_LEAK_THRESHOLD,
            verbose: false,
        }
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.device.trim().is_empty() {
            return Err(ConfigError::EmptyDevice);
        }
        if self.probe_count == 0 {
            return Err(ConfigError::ZeroProbeCount);
        }
        if self.leak_threshold == 0 {
            return Err(ConfigError::ZeroLeakThreshold);
        }
        Ok(self)
    }

    pub fn interval(&self) -> Duration {
        millis_to_duration(self.interval_ms)
    }

    pub fn grace(&self) -> Duration {
        millis_to_duration(self.grace_ms)
    }
}

/// Split whole milliseconds into a seconds + nanoseconds duration.
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::new(millis / 1000, ((millis % 1000) * 1_000_000) as u32)
}
