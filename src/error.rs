//! Error types for the leak detector.
//!
//! Each concern has its own enum; `LeakTestError` is what the run as a
//! whole can fail with.

use thiserror::Error;

/// Errors from probe registry lookups and population.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("probe index {index} out of range (registry holds {len} probes)")]
    OutOfRange { index: usize, len: usize },

    #[error("cannot generate an empty probe set")]
    EmptyProbeSet,
}

/// Errors from the packet capture layer.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("failed to create capture channel: {0}")]
    ChannelCreation(String),

    #[error("insufficient permissions for packet capture (try running as root)")]
    InsufficientPermissions,

    #[error("capture read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// Errors from dispatching a probe resolution.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The dispatch call was interrupted; the probe counts as sent.
    #[error("dispatch interrupted")]
    Interrupted,

    #[error("failed to dispatch resolution for '{hostname}': {reason}")]
    Failed { hostname: String, reason: String },
}

/// Invalid run configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("probe count must be at least 1")]
    ZeroProbeCount,

    #[error("leak threshold must be at least 1")]
    ZeroLeakThreshold,

    #[error("device name must not be empty")]
    EmptyDevice,
}

/// Top-level error for a leak test run.
#[derive(Error, Debug)]
pub enum LeakTestError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("failed to start capture thread: {0}")]
    CaptureThreadSpawn(#[source] std::io::Error),

    #[error("capture thread exited before its read loop started")]
    CaptureNotReady,

    #[error("capture thread panicked")]
    CaptureThreadPanicked,

    #[error("failed to start resolver runtime: {0}")]
    ResolverRuntime(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = RegistryError::OutOfRange { index: 7, len: 5 };
        assert_eq!(
            err.to_string(),
            "probe index 7 out of range (registry holds 5 probes)"
        );
    }

    #[test]
    fn test_from_conversions() {
        let err: LeakTestError = RegistryError::EmptyProbeSet.into();
        assert!(matches!(err, LeakTestError::Registry(RegistryError::EmptyProbeSet)));

        let err: LeakTestError = DispatchError::Interrupted.into();
        assert!(matches!(err, LeakTestError::Dispatch(DispatchError::Interrupted)));
    }
}
