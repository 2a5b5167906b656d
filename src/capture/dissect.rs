//! Classify captured frames as outgoing DNS queries.
//!
//! Frames are walked link layer -> IPv4/IPv6 -> UDP/TCP with pnet. Anything
//! addressed to port 53 is handed to hickory-proto for decoding.

use hickory_proto::op::{Message, MessageType};
use hickory_proto::rr::Name;
use pnet::datalink::NetworkInterface;
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::udp::UdpPacket;
use pnet::packet::Packet;
use pnet::util::MacAddr;

use super::{DnsQuery, DnsTransport};

/// DNS server port
pub const DNS_PORT: u16 = 53;

/// Upper bound on IPv6 extension headers walked before giving up.
const MAX_EXTENSION_HEADERS: usize = 8;

/// Framing of the packets a capture device delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// Every frame starts with an Ethernet header.
    Ethernet,
    /// Frames are bare IP packets (tun, wireguard, ppp).
    RawIp,
}

impl LinkType {
    /// Guess the framing from the interface flags and hardware address.
    ///
    /// Loopback keeps its (all zero) Ethernet header on Linux.
    pub fn of(interface: &NetworkInterface) -> Self {
        if interface.is_loopback() {
            return Self::Ethernet;
        }
        let has_mac = interface.mac.is_some_and(|mac| mac != MacAddr::zero());
        if interface.is_point_to_point() || !has_mac {
            Self::RawIp
        } else {
            Self::Ethernet
        }
    }
}

/// Extract a DNS query from a captured frame.
///
/// Returns `None` for anything that is not a decodable query message sent
/// to the DNS port.
pub fn dns_query_from_frame(frame: &[u8], link: LinkType) -> Option<DnsQuery> {
    match link {
        LinkType::Ethernet => {
            let ethernet = EthernetPacket::new(frame)?;
            match ethernet.get_ethertype() {
                EtherTypes::Ipv4 => dns_query_from_ipv4(ethernet.payload()),
                EtherTypes::Ipv6 => dns_query_from_ipv6(ethernet.payload()),
                _ => None,
            }
        }
        // No link header: the version nibble tells the two apart
        LinkType::RawIp => match frame.first()? >> 4 {
            4 => dns_query_from_ipv4(frame),
            6 => dns_query_from_ipv6(frame),
            _ => None,
        },
    }
}

fn dns_query_from_ipv4(packet: &[u8]) -> Option<DnsQuery> {
    let ipv4 = Ipv4Packet::new(packet)?;
    dns_query_from_segment(ipv4.get_next_level_protocol(), ipv4.payload())
}

fn dns_query_from_ipv6(packet: &[u8]) -> Option<DnsQuery> {
    let ipv6 = Ipv6Packet::new(packet)?;
    let mut next = ipv6.get_next_header();
    let mut rest = ipv6.payload();

    for _ in 0..MAX_EXTENSION_HEADERS {
        match next {
            IpNextHeaderProtocols::Hopopt
            | IpNextHeaderProtocols::Ipv6Route
            | IpNextHeaderProtocols::Ipv6Opts => {
                // Length is in 8-octet units, not counting the first 8
                let len = (*rest.get(1)? as usize + 1) * 8;
                next = IpNextHeaderProtocol::new(*rest.first()?);
                rest = rest.get(len..)?;
            }
            IpNextHeaderProtocols::Ipv6Frag => {
                // Only the first fragment carries the transport header
                let offset = u16::from_be_bytes([*rest.get(2)?, *rest.get(3)?]) >> 3;
                if offset != 0 {
                    return None;
                }
                next = IpNextHeaderProtocol::new(*rest.first()?);
                rest = rest.get(8..)?;
            }
            _ => return dns_query_from_segment(next, rest),
        }
    }
    None
}

fn dns_query_from_segment(protocol: IpNextHeaderProtocol, segment: &[u8]) -> Option<DnsQuery> {
    match protocol {
        IpNextHeaderProtocols::Udp => {
            let udp = UdpPacket::new(segment)?;
            if udp.get_destination() != DNS_PORT {
                return None;
            }
            dns_query_from_message(udp.payload(), DnsTransport::Udp)
        }
        IpNextHeaderProtocols::Tcp => {
            let tcp = TcpPacket::new(segment)?;
            if tcp.get_destination() != DNS_PORT {
                return None;
            }
            // RFC 1035 4.2.2: two-byte length prefix
            let payload = tcp.payload();
            let len = u16::from_be_bytes([*payload.first()?, *payload.get(1)?]) as usize;
            let message = payload.get(2..2 + len)?;
            dns_query_from_message(message, DnsTransport::Tcp)
        }
        _ => None,
    }
}

/// Decode a DNS message and keep it only if it is a query.
pub fn dns_query_from_message(data: &[u8], transport: DnsTransport) -> Option<DnsQuery> {
    let message = Message::from_vec(data).ok()?;
    if message.message_type() != MessageType::Query {
        return None;
    }

    let hostname = message.queries().first().map(|query| hostname_of(query.name()));
    Some(DnsQuery { hostname, transport })
}

fn hostname_of(name: &Name) -> String {
    let ascii = name.to_ascii();
    match ascii.strip_suffix('.') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => ascii,
    }
}
