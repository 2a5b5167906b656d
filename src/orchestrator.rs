//! Orchestrator: sends probes at a fixed cadence, decides when enough
//! evidence is in, then stops the capture thread and produces the verdict.
//!
//! A run moves through three phases:
//!
//! - **Sending**: dispatch probe `i` for `i` in `0..probe_count`, sleeping
//!   `interval` between dispatches. Checked before every dispatch: stop if
//!   cancelled or if the leak threshold has been reached.
//! - **Draining**: unless the threshold was reached, wait `grace` once so
//!   queries for probes already sent can still be captured.
//! - **Stopped**: break the capture loop, join the capture thread, report.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::capture::{CaptureHandle, CaptureOutcome};
use crate::config::LeakTestConfig;
use crate::context::RunContext;
use crate::error::{DispatchError, LeakTestError};
use crate::reporter::Reporter;
use crate::resolver::ProbeResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Sending,
    Draining,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sending => write!(f, "sending"),
            Self::Draining => write!(f, "draining"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    LeaksDetected,
    NoLeak,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeaksDetected => write!(f, "leak(s) detected"),
            Self::NoLeak => write!(f, "no leak detected"),
        }
    }
}

/// Final numbers of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub packets_inspected: u64,
    pub leaks: usize,
    pub probes_sent: usize,
    /// The capture source stopped before it was asked to.
    pub capture_ended_early: bool,
}

impl Summary {
    pub fn verdict(&self) -> Verdict {
        if self.leaks > 0 {
            Verdict::LeaksDetected
        } else {
            Verdict::NoLeak
        }
    }
}

/// Drives a leak test run on the main thread.
pub struct Orchestrator<'a> {
    config: &'a LeakTestConfig,
    ctx: Arc<RunContext>,
    resolver: &'a dyn ProbeResolver,
    reporter: &'a dyn Reporter,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a LeakTestConfig,
        ctx: Arc<RunContext>,
        resolver: &'a dyn ProbeResolver,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            ctx,
            resolver,
            reporter,
        }
    }

    /// Run all three phases against an already running capture thread.
    ///
    /// A fatal dispatch or lookup error still stops and joins the capture
    /// thread before it is returned; no summary is reported then.
    pub fn run(&self, capture: CaptureHandle) -> Result<Summary, LeakTestError> {
        debug!(phase = %Phase::Sending, "Sending {} probes", self.config.probe_count);
        let probes_sent = match self.send_probes() {
            Ok(sent) => sent,
            Err(e) => {
                if let Err(join_err) = self.stop(capture) {
                    warn!("Capture shutdown after failure: {}", join_err);
                }
                return Err(e);
            }
        };

        debug!(phase = %Phase::Draining, sent = probes_sent, "Probing finished");
        self.drain();

        debug!(phase = %Phase::Stopped, "Stopping capture");
        let outcome = self.stop(capture)?;
        match &outcome {
            CaptureOutcome::Failed(e) => warn!("Capture ended early: {}", e),
            CaptureOutcome::EndOfStream => warn!("Capture ended early"),
            CaptureOutcome::Stopped => {}
        }

        let summary = Summary {
            packets_inspected: self.ctx.tally.get(),
            leaks: self.ctx.registry.leak_count(),
            probes_sent,
            capture_ended_early: outcome.ended_early(),
        };
        for (index, name) in self.ctx.registry.names().enumerate() {
            if let Ok(true) = self.ctx.registry.is_observed(index) {
                debug!(probe = index, "Leaked: {}", name);
            }
        }
        info!(
            packets = summary.packets_inspected,
            leaks = summary.leaks,
            sent = summary.probes_sent,
            "{}",
            summary.verdict()
        );
        self.reporter.on_summary(&summary);
        Ok(summary)
    }

    fn threshold_reached(&self) -> bool {
        self.ctx.registry.leak_count() >= self.config.leak_threshold
    }

    fn send_probes(&self) -> Result<usize, LeakTestError> {
        let count = self.config.probe_count;
        let interval = self.config.interval();
        let mut sent = 0;

        for i in 0..count {
            if !self.ctx.cancel.is_running() {
                debug!("Cancelled after {} probes", sent);
                break;
            }
            if self.threshold_reached() {
                debug!("Leak threshold reached after {} probes", sent);
                break;
            }

            let hostname = self.ctx.registry.get(i)?;
            self.reporter.on_probe_sent(i, hostname);
            match self.resolver.resolve_async(hostname) {
                Ok(()) => {}
                Err(DispatchError::Interrupted) => debug!("Dispatch of {} interrupted", hostname),
                Err(e) => return Err(e.into()),
            }
            sent += 1;

            if i + 1 != count {
                self.ctx.cancel.sleep(interval);
            }
        }

        Ok(sent)
    }

    /// Wait out the grace period. A graceful cancel skips it entirely.
    fn drain(&self) {
        if self.threshold_reached() {
            debug!("Leak threshold reached, skipping grace period");
            return;
        }
        if !self.ctx.cancel.sleep(self.config.grace()) {
            debug!("Grace period cut short");
        }
    }

    fn stop(&self, capture: CaptureHandle) -> Result<CaptureOutcome, LeakTestError> {
        self.ctx.cancel.break_capture();
        capture.join()
    }
}
