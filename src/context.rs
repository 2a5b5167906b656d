//! State shared between the main thread and the capture thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cancel::CancellationController;
use crate::probe::ProbeRegistry;

/// Count of DNS query events the capture worker has inspected.
#[derive(Debug, Default)]
pub struct PacketTally {
    count: AtomicU64,
}

impl PacketTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more packet and return the new total.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

/// Everything one leak test run shares across threads.
///
/// Built once the probe set is populated, then handed out behind an `Arc`
/// to the orchestrator and the capture worker. The signal handler only
/// needs `cancel`.
#[derive(Debug)]
pub struct RunContext {
    pub registry: ProbeRegistry,
    pub tally: PacketTally,
    pub cancel: Arc<CancellationController>,
}

impl RunContext {
    pub fn new(registry: ProbeRegistry) -> Self {
        Self {
            registry,
            tally: PacketTally::new(),
            cancel: Arc::new(CancellationController::new()),
        }
    }

    /// Free the probe set once every other holder has let go.
    ///
    /// Returns `false`, leaving the context to the remaining holders, while
    /// it is still shared.
    pub fn release(ctx: Arc<Self>) -> bool {
        match Arc::try_unwrap(ctx) {
            Ok(mut ctx) => {
                ctx.registry.release();
                true
            }
            Err(_) => false,
        }
    }
}
