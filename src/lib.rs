//! dnsleak - locally detect DNS leaks.
//!
//! A run generates a handful of never-resolved probe hostnames, asks the
//! system resolver for each of them, and watches a capture device for
//! outgoing DNS queries. Any probe name seen on the wire is a leak.
//!
//! The moving parts:
//! - [`probe`]: probe names and the registry that marks them as seen
//! - [`capture`]: the capture source, DNS dissector and capture worker thread
//! - [`orchestrator`]: the main-thread probe loop and verdict
//! - [`cancel`]: cooperative cancellation shared with the signal handler
//! - [`resolver`] and [`reporter`]: dispatch and output seams

pub mod cancel;
pub mod capture;
pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod probe;
pub mod reporter;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use cancel::{CancelRequest, CancellationController, LoopBreaker};
pub use capture::{CaptureWorker, DnsCapture, DnsQuery, PnetCapture};
pub use config::LeakTestConfig;
pub use context::{PacketTally, RunContext};
pub use error::{CaptureError, ConfigError, DispatchError, LeakTestError, RegistryError};
pub use orchestrator::{Orchestrator, Summary, Verdict};
pub use probe::{MarkOutcome, ProbeNameGenerator, ProbeRegistry};
pub use reporter::{ConsoleReporter, Reporter};
pub use resolver::{ProbeResolver, TokioResolver};
