//! Console-based reporter.

use std::io::{self, Write};

use crate::capture::DnsQuery;
use crate::orchestrator::Summary;
use crate::probe::MarkOutcome;
use crate::reporter::Reporter;

/// Reports leak test activity on stdout.
///
/// Without verbose output only the final summary line is printed.
pub struct ConsoleReporter {
    /// Whether to print every probe and every captured query
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn format_probe(&self, hostname: &str) -> String {
        format!("> DNS '{}'", hostname)
    }

    fn format_query(&self, query: &DnsQuery, outcome: MarkOutcome, tally: u64) -> String {
        let marker = if outcome.is_probe() { "< " } else { "" };
        let hostname = query.hostname.as_deref().unwrap_or("<no question>");
        format!("{}DNS '{}' [#{}]", marker, hostname, tally)
    }

    fn format_summary(&self, summary: &Summary) -> String {
        format!(
            "{} packets inspected, {} leak(s) / {} probe(s) sent: {}",
            summary.packets_inspected,
            summary.leaks,
            summary.probes_sent,
            summary.verdict()
        )
    }

    fn print(&self, line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn on_capture_start(&self, interface: &str) {
        if self.verbose {
            self.print(&format!("Capturing packets on {}...", interface));
        }
    }

    fn on_probe_sent(&self, _index: usize, hostname: &str) {
        if self.verbose {
            self.print(&self.format_probe(hostname));
        }
    }

    fn on_query(&self, query: &DnsQuery, outcome: MarkOutcome, tally: u64) {
        if self.verbose {
            self.print(&self.format_query(query, outcome, tally));
        }
    }

    fn on_summary(&self, summary: &Summary) {
        self.print(&self.format_summary(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::DnsTransport;

    fn summary(leaks: usize) -> Summary {
        Summary {
            packets_inspected: 12,
            leaks,
            probes_sent: 10,
            capture_ended_early: false,
        }
    }

    #[test]
    fn test_format_probe() {
        let reporter = ConsoleReporter::new();
        assert_eq!(reporter.format_probe("abcdef.com"), "> DNS 'abcdef.com'");
    }

    #[test]
    fn test_format_query_marks_probe_hits() {
        let reporter = ConsoleReporter::new().with_verbose(true);
        let query = DnsQuery::udp("abcdef.com");

        assert_eq!(
            reporter.format_query(&query, MarkOutcome::NewlyMarked(0), 3),
            "< DNS 'abcdef.com' [#3]"
        );
        assert_eq!(
            reporter.format_query(&query, MarkOutcome::AlreadyMarked(0), 4),
            "< DNS 'abcdef.com' [#4]"
        );
        assert_eq!(
            reporter.format_query(&query, MarkOutcome::NotAProbe, 5),
            "DNS 'abcdef.com' [#5]"
        );
    }

    #[test]
    fn test_format_query_without_question() {
        let reporter = ConsoleReporter::new();
        let query = DnsQuery {
            hostname: None,
            transport: DnsTransport::Tcp,
        };
        assert_eq!(
            reporter.format_query(&query, MarkOutcome::NotAProbe, 1),
            "DNS '<no question>' [#1]"
        );
    }

    #[test]
    fn test_format_summary() {
        let reporter = ConsoleReporter::new();
        assert_eq!(
            reporter.format_summary(&summary(2)),
            "12 packets inspected, 2 leak(s) / 10 probe(s) sent: leak(s) detected"
        );
        assert_eq!(
            reporter.format_summary(&summary(0)),
            "12 packets inspected, 0 leak(s) / 10 probe(s) sent: no leak detected"
        );
    }
}
