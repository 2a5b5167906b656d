//! pnet-based packet capture implementation.

use std::io;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, DataLinkReceiver, NetworkInterface};

use super::dissect::{dns_query_from_frame, LinkType};
use super::{DnsCapture, DnsQueries, DnsQuery};
use crate::cancel::LoopBreaker;
use crate::error::CaptureError;

/// How long a blocking read waits before the loop breaker is polled again.
const READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Packet capture using the pnet library.
///
/// The channel is opened in [`PnetCapture::open`] so that a bad device or
/// missing privileges fail before any probe is sent.
pub struct PnetCapture {
    interface: NetworkInterface,
    link: LinkType,
    rx: Box<dyn DataLinkReceiver>,
}

impl PnetCapture {
    /// Open a non-promiscuous capture on the named interface.
    pub fn open(interface_name: &str) -> Result<Self, CaptureError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| CaptureError::InterfaceNotFound(interface_name.to_string()))?;

        let config = Config {
            read_timeout: Some(READ_TIMEOUT),
            promiscuous: false,
            ..Config::default()
        };

        let rx = match datalink::channel(&interface, config).map_err(channel_error)? {
            Channel::Ethernet(_tx, rx) => rx,
            _ => {
                return Err(CaptureError::ChannelCreation(
                    "unsupported channel type".to_string(),
                ))
            }
        };

        let link = LinkType::of(&interface);
        tracing::debug!("Opened capture channel on {} ({:?})", interface.name, link);
        Ok(Self { interface, link, rx })
    }

    /// One line per capture device: name, state, framing and addresses.
    pub fn list_interfaces() -> Vec<String> {
        datalink::interfaces().iter().map(describe_interface).collect()
    }
}

/// EPERM and EACCES both surface as `PermissionDenied`.
fn channel_error(e: io::Error) -> CaptureError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => CaptureError::InsufficientPermissions,
        _ => CaptureError::ChannelCreation(e.to_string()),
    }
}

fn describe_interface(iface: &NetworkInterface) -> String {
    let state = if iface.is_up() { "up" } else { "down" };
    let framing = match LinkType::of(iface) {
        LinkType::Ethernet => "ethernet",
        LinkType::RawIp => "raw-ip",
    };
    let addrs = iface
        .ips
        .iter()
        .map(|ip| ip.ip().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{:<16} {:<5} {:<9} {}", iface.name, state, framing, addrs)
        .trim_end()
        .to_string()
}

impl DnsCapture for PnetCapture {
    fn dns_queries(&mut self, breaker: LoopBreaker) -> Result<DnsQueries<'_>, CaptureError> {
        Ok(Box::new(DnsQueryIterator {
            rx: &mut self.rx,
            link: self.link,
            breaker,
            failed: false,
        }))
    }

    fn interface_name(&self) -> &str {
        &self.interface.name
    }
}

/// Iterator that yields DNS queries from the network.
struct DnsQueryIterator<'a> {
    rx: &'a mut Box<dyn DataLinkReceiver>,
    link: LinkType,
    breaker: LoopBreaker,
    failed: bool,
}

impl Iterator for DnsQueryIterator<'_> {
    type Item = Result<DnsQuery, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if self.breaker.is_broken() {
                return None;
            }

            match self.rx.next() {
                Ok(frame) => {
                    if let Some(query) = dns_query_from_frame(frame, self.link) {
                        return Some(Ok(query));
                    }
                }
                Err(e) => match e.kind() {
                    // Read timeout: go round and check the breaker
                    io::ErrorKind::TimedOut
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::Interrupted => continue,
                    _ => {
                        self.failed = true;
                        return Some(Err(CaptureError::Read(e)));
                    }
                },
            }
        }
    }
}
