//! Capture worker: runs the blocking capture loop on its own thread and
//! reports every captured query name to the probe registry.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, trace, warn};

use super::{DnsCapture, DnsQuery};
use crate::context::RunContext;
use crate::error::{CaptureError, LeakTestError};
use crate::probe::MarkOutcome;
use crate::reporter::Reporter;

const THREAD_NAME: &str = "dns-capture";

/// Why the capture loop returned.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// The loop breaker was tripped.
    Stopped,
    /// The source ran dry without being asked to stop.
    EndOfStream,
    /// The source reported a fatal read error.
    Failed(CaptureError),
}

impl CaptureOutcome {
    pub fn ended_early(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

/// Feeds captured DNS query names into the shared probe registry.
pub struct CaptureWorker {
    ctx: Arc<RunContext>,
    reporter: Arc<dyn Reporter>,
}

impl CaptureWorker {
    pub fn new(ctx: Arc<RunContext>, reporter: Arc<dyn Reporter>) -> Self {
        Self { ctx, reporter }
    }

    /// Start the capture thread and wait until its read loop is live.
    ///
    /// If the thread dies before reaching the loop the failure is returned
    /// here as a setup error.
    pub fn spawn<C>(self, mut capture: C) -> Result<CaptureHandle, LeakTestError>
    where
        C: DnsCapture + 'static,
    {
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run(&mut capture, ready_tx))
            .map_err(LeakTestError::CaptureThreadSpawn)?;

        if ready_rx.recv().is_err() {
            return match thread.join() {
                Ok(CaptureOutcome::Failed(e)) => Err(e.into()),
                Ok(_) => Err(LeakTestError::CaptureNotReady),
                Err(_) => Err(LeakTestError::CaptureThreadPanicked),
            };
        }

        Ok(CaptureHandle { thread })
    }

    fn run(&self, capture: &mut dyn DnsCapture, ready: mpsc::Sender<()>) -> CaptureOutcome {
        let breaker = self.ctx.cancel.breaker();
        let interface = capture.interface_name().to_string();

        let queries = match capture.dns_queries(breaker.clone()) {
            Ok(queries) => queries,
            Err(e) => return CaptureOutcome::Failed(e),
        };

        info!("Capturing DNS queries on {}", interface);
        self.reporter.on_capture_start(&interface);
        // The receiver may already be gone if setup was abandoned.
        let _ = ready.send(());
        drop(ready);

        for item in queries {
            match item {
                Ok(query) => {
                    self.inspect(&query);
                }
                Err(e) => {
                    warn!("Capture ended early: {}", e);
                    return CaptureOutcome::Failed(e);
                }
            }
        }

        if breaker.is_broken() {
            debug!("Capture loop stopped");
            CaptureOutcome::Stopped
        } else {
            warn!("Capture source ended before it was asked to stop");
            CaptureOutcome::EndOfStream
        }
    }

    /// Count one captured query and mark its hostname if it is a probe.
    pub fn inspect(&self, query: &DnsQuery) -> MarkOutcome {
        let tally = self.ctx.tally.increment();

        let outcome = match query.hostname.as_deref() {
            Some(hostname) => {
                let outcome = self.ctx.registry.mark(hostname);
                match outcome {
                    MarkOutcome::NewlyMarked(index) => {
                        info!(probe = index, "Leak detected: {}", hostname)
                    }
                    _ => trace!("DNS query for {} ({:?})", hostname, outcome),
                }
                outcome
            }
            None => {
                trace!("DNS query without a question");
                MarkOutcome::NotAProbe
            }
        };

        self.reporter.on_query(query, outcome, tally);
        outcome
    }
}

/// A running capture thread.
pub struct CaptureHandle {
    thread: JoinHandle<CaptureOutcome>,
}

impl CaptureHandle {
    /// Whether the capture thread has already returned.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the capture thread exits.
    pub fn join(self) -> Result<CaptureOutcome, LeakTestError> {
        self.thread
            .join()
            .map_err(|_| LeakTestError::CaptureThreadPanicked)
    }
}
