//! Cooperative cancellation shared by the orchestrator, the capture worker
//! and the termination signal handler.
//!
//! Everything reachable from [`CancellationController::request`] is a plain
//! atomic operation: no allocation, no locks, no I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest uninterrupted nap taken by [`CancellationController::sleep`].
const SLEEP_SLICE: Duration = Duration::from_millis(20);

/// What a termination request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelRequest {
    /// First request: wind down and still report a verdict.
    Graceful,
    /// Already winding down: leave now.
    Immediate,
}

/// Asks a blocking capture loop to return.
///
/// Clones share the same flag, so a capture source can hold one while the
/// controller trips it from another thread.
#[derive(Debug, Clone, Default)]
pub struct LoopBreaker {
    broken: Arc<AtomicBool>,
}

impl LoopBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn break_loop(&self) {
        self.broken.store(true, Ordering::Release);
    }

    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }
}

/// Process-wide running flag plus the capture loop breaker.
#[derive(Debug)]
pub struct CancellationController {
    running: AtomicBool,
    breaker: LoopBreaker,
}

impl CancellationController {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            breaker: LoopBreaker::new(),
        }
    }

    /// Handle one termination request.
    ///
    /// The first call flips the flag and unblocks the capture loop. Any
    /// later call returns [`CancelRequest::Immediate`] and changes nothing.
    pub fn request(&self) -> CancelRequest {
        if self.running.swap(false, Ordering::AcqRel) {
            self.breaker.break_loop();
            CancelRequest::Graceful
        } else {
            CancelRequest::Immediate
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the capture loop to return. Idempotent.
    pub fn break_capture(&self) {
        self.breaker.break_loop();
    }

    pub fn breaker(&self) -> LoopBreaker {
        self.breaker.clone()
    }

    /// Sleep for `duration` unless cancellation is requested first.
    ///
    /// Returns `true` if the full duration elapsed. A cut-short sleep still
    /// lets the caller carry on as if it had slept.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if !self.is_running() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

impl Default for CancellationController {
    fn default() -> Self {
        Self::new()
    }
}
