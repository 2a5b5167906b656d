//! Reporting module for leak test progress and results.
//!
//! This module defines the `Reporter` trait (ISP, DIP) and provides a
//! console implementation.

mod console_reporter;

pub use console_reporter::ConsoleReporter;

use crate::capture::DnsQuery;
use crate::orchestrator::Summary;
use crate::probe::MarkOutcome;

/// Trait for reporting leak test activity (Interface Segregation Principle).
///
/// Called from both threads: probes and the summary from the main thread,
/// captured queries from the capture thread.
pub trait Reporter: Send + Sync {
    /// Called once the capture loop is about to start reading.
    fn on_capture_start(&self, interface: &str);

    /// Called just before a probe is dispatched.
    fn on_probe_sent(&self, index: usize, hostname: &str);

    /// Called for every inspected DNS query with its registry outcome and
    /// the running packet tally.
    fn on_query(&self, query: &DnsQuery, outcome: MarkOutcome, tally: u64);

    /// Called once with the final result of a completed run.
    fn on_summary(&self, summary: &Summary);
}
