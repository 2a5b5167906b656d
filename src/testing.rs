//! Fakes shared by the unit tests.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::Duration;

use crate::cancel::LoopBreaker;
use crate::capture::{DnsCapture, DnsQueries, DnsQuery};
use crate::error::{CaptureError, DispatchError};
use crate::orchestrator::Summary;
use crate::probe::MarkOutcome;
use crate::reporter::Reporter;
use crate::resolver::ProbeResolver;

/// Yields a fixed list of events, then ends.
pub struct ScriptedCapture {
    items: Vec<Result<DnsQuery, CaptureError>>,
    fail_open: bool,
}

impl ScriptedCapture {
    pub fn new(items: Vec<Result<DnsQuery, CaptureError>>) -> Self {
        Self {
            items,
            fail_open: false,
        }
    }

    pub fn failing_open() -> Self {
        Self {
            items: Vec::new(),
            fail_open: true,
        }
    }
}

impl DnsCapture for ScriptedCapture {
    fn dns_queries(&mut self, _breaker: LoopBreaker) -> Result<DnsQueries<'_>, CaptureError> {
        if self.fail_open {
            return Err(CaptureError::ChannelCreation("scripted failure".to_string()));
        }
        Ok(Box::new(std::mem::take(&mut self.items).into_iter()))
    }

    fn interface_name(&self) -> &str {
        "scripted0"
    }
}

/// Blocks like a live capture until the breaker trips; events are pushed
/// through the paired sender.
pub struct ChannelCapture {
    rx: Receiver<DnsQuery>,
}

impl ChannelCapture {
    pub fn new() -> (Self, Sender<DnsQuery>) {
        let (tx, rx) = mpsc::channel();
        (Self { rx }, tx)
    }
}

impl DnsCapture for ChannelCapture {
    fn dns_queries(&mut self, breaker: LoopBreaker) -> Result<DnsQueries<'_>, CaptureError> {
        let rx = &self.rx;
        Ok(Box::new(std::iter::from_fn(move || loop {
            if breaker.is_broken() {
                return None;
            }
            match rx.recv_timeout(Duration::from_millis(5)) {
                Ok(query) => return Some(Ok(query)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        })))
    }

    fn interface_name(&self) -> &str {
        "channel0"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CaptureStart(String),
    ProbeSent(usize, String),
    Query(Option<String>, MarkOutcome, u64),
    Summary(Summary),
}

/// Records every call for later inspection.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Query(..)))
            .collect()
    }

    pub fn summaries(&self) -> Vec<Summary> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Summary(summary) => Some(summary),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn on_capture_start(&self, interface: &str) {
        self.push(Event::CaptureStart(interface.to_string()));
    }

    fn on_probe_sent(&self, index: usize, hostname: &str) {
        self.push(Event::ProbeSent(index, hostname.to_string()));
    }

    fn on_query(&self, query: &DnsQuery, outcome: MarkOutcome, tally: u64) {
        self.push(Event::Query(query.hostname.clone(), outcome, tally));
    }

    fn on_summary(&self, summary: &Summary) {
        self.push(Event::Summary(summary.clone()));
    }
}

type DispatchHook = Box<dyn Fn(usize, &str) -> Result<(), DispatchError>>;

/// Records dispatched names and optionally runs a hook per dispatch.
pub struct ScriptedResolver {
    dispatched: Mutex<Vec<String>>,
    hook: Option<DispatchHook>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            dispatched: Mutex::new(Vec::new()),
            hook: None,
        }
    }

    pub fn with_hook<F>(hook: F) -> Self
    where
        F: Fn(usize, &str) -> Result<(), DispatchError> + 'static,
    {
        Self {
            dispatched: Mutex::new(Vec::new()),
            hook: Some(Box::new(hook)),
        }
    }

    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.lock().unwrap().clone()
    }
}

impl ProbeResolver for ScriptedResolver {
    fn resolve_async(&self, hostname: &str) -> Result<(), DispatchError> {
        let index = {
            let mut dispatched = self.dispatched.lock().unwrap();
            dispatched.push(hostname.to_string());
            dispatched.len() - 1
        };
        match &self.hook {
            Some(hook) => hook(index, hostname),
            None => Ok(()),
        }
    }
}

/// Frame builders for dissector and capture tests.
pub mod frames {
    use hickory_proto::op::{Message, MessageType, Query};
    use hickory_proto::rr::{Name, RecordType};
    use pnet::packet::ethernet::{EtherType, MutableEthernetPacket};
    use pnet::packet::ip::IpNextHeaderProtocol;
    use pnet::packet::ipv4::MutableIpv4Packet;
    use pnet::packet::ipv6::MutableIpv6Packet;
    use pnet::packet::tcp::MutableTcpPacket;
    use pnet::packet::udp::MutableUdpPacket;

    const ETH_LEN: usize = 14;
    const IPV4_LEN: usize = 20;
    const IPV6_LEN: usize = 40;
    const UDP_LEN: usize = 8;
    const TCP_LEN: usize = 20;

    pub fn dns_message(name: Option<&str>, message_type: MessageType) -> Vec<u8> {
        let mut message = Message::new();
        message.set_id(0x1234).set_message_type(message_type);
        if let Some(name) = name {
            message.add_query(Query::query(Name::from_ascii(name).unwrap(), RecordType::A));
        }
        message.to_vec().unwrap()
    }

    pub fn ethernet_frame(ethertype: EtherType, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; ETH_LEN + payload.len()];
        let mut ethernet = MutableEthernetPacket::new(&mut frame).unwrap();
        ethernet.set_ethertype(ethertype);
        ethernet.set_payload(payload);
        frame
    }

    pub fn ipv4_packet(protocol: IpNextHeaderProtocol, segment: &[u8]) -> Vec<u8> {
        let mut packet = vec![0u8; IPV4_LEN + segment.len()];
        let mut ip = MutableIpv4Packet::new(&mut packet).unwrap();
        ip.set_version(4);
        ip.set_header_length(5);
        ip.set_total_length((IPV4_LEN + segment.len()) as u16);
        ip.set_ttl(64);
        ip.set_next_level_protocol(protocol);
        ip.set_payload(segment);
        packet
    }

    pub fn ipv6_packet(next_header: IpNextHeaderProtocol, payload: &[u8]) -> Vec<u8> {
        let mut packet = vec![0u8; IPV6_LEN + payload.len()];
        let mut ip = MutableIpv6Packet::new(&mut packet).unwrap();
        ip.set_version(6);
        ip.set_payload_length(payload.len() as u16);
        ip.set_hop_limit(64);
        ip.set_next_header(next_header);
        ip.set_payload(payload);
        packet
    }

    pub fn udp_segment(dst_port: u16, payload: &[u8]) -> Vec<u8> {
        let mut segment = vec![0u8; UDP_LEN + payload.len()];
        let mut udp = MutableUdpPacket::new(&mut segment).unwrap();
        udp.set_source(40000);
        udp.set_destination(dst_port);
        udp.set_length((UDP_LEN + payload.len()) as u16);
        udp.set_payload(payload);
        segment
    }

    /// TCP segment carrying one length-prefixed DNS message.
    pub fn tcp_segment(dst_port: u16, message: &[u8]) -> Vec<u8> {
        let mut payload = (message.len() as u16).to_be_bytes().to_vec();
        payload.extend_from_slice(message);

        let mut segment = vec![0u8; TCP_LEN + payload.len()];
        let mut tcp = MutableTcpPacket::new(&mut segment).unwrap();
        tcp.set_source(40000);
        tcp.set_destination(dst_port);
        tcp.set_data_offset(5);
        tcp.set_payload(&payload);
        segment
    }
}
