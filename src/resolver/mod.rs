//! Probe resolution dispatch.
//!
//! The orchestrator only needs to know that a lookup was handed off, never
//! its result, so the seam is a single fire-and-forget call.

mod tokio_resolver;

pub use tokio_resolver::TokioResolver;

use crate::error::DispatchError;

/// Trait for resolution dispatchers (Dependency Inversion Principle).
pub trait ProbeResolver {
    /// Hand `hostname` to the system resolver without waiting for an answer.
    ///
    /// [`DispatchError::Interrupted`] means the request may or may not have
    /// gone out; callers treat the probe as sent.
    fn resolve_async(&self, hostname: &str) -> Result<(), DispatchError>;
}
