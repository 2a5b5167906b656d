//! Packet capture abstraction.
//!
//! This module defines the `DnsCapture` trait (DIP), a pnet-based
//! implementation, the DNS dissector it relies on, and the worker that
//! feeds captured query names into the probe registry.

pub mod dissect;
mod pnet_capture;
mod worker;

pub use pnet_capture::PnetCapture;
pub use worker::{CaptureHandle, CaptureOutcome, CaptureWorker};

use crate::cancel::LoopBreaker;
use crate::error::CaptureError;

/// How a captured DNS query reached the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsTransport {
    Udp,
    Tcp,
}

/// A DNS query observed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    /// Queried hostname without the trailing root dot, case preserved.
    /// `None` when the query carried no question.
    pub hostname: Option<String>,
    pub transport: DnsTransport,
}

impl DnsQuery {
    pub fn udp(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            transport: DnsTransport::Udp,
        }
    }
}

/// Stream of decoded query events, in arrival order.
pub type DnsQueries<'a> = Box<dyn Iterator<Item = Result<DnsQuery, CaptureError>> + 'a>;

/// Trait for DNS query capture implementations (Dependency Inversion Principle).
///
/// This trait allows the capture worker to depend on an abstraction rather
/// than a concrete backend, making it easy to:
/// - Test with scripted captures
/// - Switch between different capture backends (pnet, pcap, etc.)
pub trait DnsCapture: Send {
    /// Start reading and return an iterator over DNS query events.
    ///
    /// The iterator blocks while waiting for traffic and returns `None`
    /// soon after `breaker` is tripped. A fatal read error is yielded once
    /// as `Some(Err(..))`.
    fn dns_queries(&mut self, breaker: LoopBreaker) -> Result<DnsQueries<'_>, CaptureError>;

    /// Get the name of the interface being captured.
    fn interface_name(&self) -> &str;
}
