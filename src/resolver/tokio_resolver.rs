//! Resolution dispatch on a small dedicated tokio runtime.

use tokio::runtime::{Builder, Runtime};

use super::ProbeResolver;
use crate::error::{DispatchError, LeakTestError};

/// Dispatches lookups through `tokio::net::lookup_host`, i.e. through the
/// system resolver path whose leaks we want to observe.
pub struct TokioResolver {
    runtime: Option<Runtime>,
}

impl TokioResolver {
    pub fn new() -> Result<Self, LeakTestError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("probe-resolver")
            .enable_all()
            .build()
            .map_err(LeakTestError::ResolverRuntime)?;

        Ok(Self {
            runtime: Some(runtime),
        })
    }
}

impl ProbeResolver for TokioResolver {
    fn resolve_async(&self, hostname: &str) -> Result<(), DispatchError> {
        let runtime = self.runtime.as_ref().ok_or_else(|| DispatchError::Failed {
            hostname: hostname.to_string(),
            reason: "resolver runtime is shut down".to_string(),
        })?;

        let host = hostname.to_string();
        runtime.spawn(async move {
            match tokio::net::lookup_host((host.as_str(), 0)).await {
                Ok(addrs) => {
                    tracing::debug!("{} resolved to {} address(es)", host, addrs.count())
                }
                Err(e) => tracing::debug!("{} did not resolve: {}", host, e),
            }
        });
        Ok(())
    }
}

impl Drop for TokioResolver {
    fn drop(&mut self) {
        // Lookups run on blocking threads; don't wait for stragglers.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
