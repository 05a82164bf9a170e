use std::convert::TryInto;
use std::net::Ipv4Addr;
use std::time::Duration;

use pnet_packet::icmp::echo_reply::EchoReplyPacket;
use pnet_packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet_packet::icmp::{IcmpCode, IcmpType, IcmpTypes};
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::{MutablePacket, Packet};

use super::{checksum, ICMP_HEADER_LEN, TIMESTAMP_LEN};
use crate::error::{Error, MalformedPacketError, Result};

const IPV4_MIN_HEADER_LEN: usize = 20;

/// Builds an Echo Request of exactly `size` bytes carrying `sent_at`.
///
/// `size` is expected to hold at least the header and the timestamp; a
/// shorter buffer gets a truncated timestamp.
pub fn make_echo_packet(idt: u16, seq: u16, size: usize, sent_at: Duration) -> Vec<u8> {
    debug_assert!(size >= ICMP_HEADER_LEN);
    let mut buf = vec![0; size.max(ICMP_HEADER_LEN)];
    if let Some(mut packet) = MutableEchoRequestPacket::new(&mut buf) {
        packet.set_icmp_type(IcmpTypes::EchoRequest);
        packet.set_icmp_code(IcmpCode::new(0));
        packet.set_checksum(0);
        packet.set_identifier(idt);
        packet.set_sequence_number(seq);

        let stamp = encode_timestamp(sent_at);
        let payload = packet.payload_mut();
        let n = payload.len().min(TIMESTAMP_LEN);
        payload[..n].copy_from_slice(&stamp[..n]);
    }

    let sum = checksum(&buf);
    buf[2..4].copy_from_slice(&sum.to_be_bytes());
    buf
}

fn encode_timestamp(at: Duration) -> [u8; TIMESTAMP_LEN] {
    let mut out = [0; TIMESTAMP_LEN];
    out[..8].copy_from_slice(&at.as_secs().to_be_bytes());
    out[8..].copy_from_slice(&u64::from(at.subsec_micros()).to_be_bytes());
    out
}

fn decode_timestamp(buf: &[u8]) -> Option<Duration> {
    let secs = u64::from_be_bytes(buf.get(0..8)?.try_into().ok()?);
    let micros = u64::from_be_bytes(buf.get(8..TIMESTAMP_LEN)?.try_into().ok()?);
    if micros >= 1_000_000 {
        return None;
    }
    Some(Duration::new(secs, micros as u32 * 1_000))
}

/// Decoded view of one inbound datagram: IPv4 header plus ICMP header.
#[derive(Debug, Clone)]
pub struct Icmpv4Packet {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub version: u8,
    /// IP header length in bytes.
    pub header_length: usize,
    pub tos: u8,
    pub total_length: u16,
    pub ip_id: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub icmp_type: IcmpType,
    pub icmp_code: IcmpCode,
    pub checksum: u16,
    /// ICMP message length in bytes.
    pub size: usize,
    pub identifier: u16,
    pub sequence: u16,
    /// Send time carried by an Echo Reply, if the payload holds one.
    pub timestamp: Option<Duration>,
}

impl Icmpv4Packet {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let ipv4_packet =
            Ipv4Packet::new(buf).ok_or_else(|| Error::from(MalformedPacketError::NotIpv4Packet))?;
        if ipv4_packet.get_version() != 4 {
            return Err(MalformedPacketError::NotIpv4Packet.into());
        }
        let header_length = usize::from(ipv4_packet.get_header_length()) * 4;
        if header_length < IPV4_MIN_HEADER_LEN {
            return Err(MalformedPacketError::BadHeaderLength(header_length).into());
        }

        let want = header_length + ICMP_HEADER_LEN;
        let icmp_bytes = match buf.get(header_length..) {
            Some(bytes) if bytes.len() >= ICMP_HEADER_LEN => bytes,
            _ => {
                return Err(MalformedPacketError::PayloadTooShort {
                    got: buf.len(),
                    want,
                }
                .into())
            }
        };
        let icmp_packet = EchoReplyPacket::new(icmp_bytes)
            .ok_or_else(|| Error::from(MalformedPacketError::NotIcmpv4Packet))?;

        let timestamp = if icmp_packet.get_icmp_type() == IcmpTypes::EchoReply {
            decode_timestamp(icmp_packet.payload())
        } else {
            None
        };

        Ok(Self {
            source: ipv4_packet.get_source(),
            destination: ipv4_packet.get_destination(),
            version: ipv4_packet.get_version(),
            header_length,
            tos: ipv4_packet.get_dscp() << 2 | ipv4_packet.get_ecn(),
            total_length: ipv4_packet.get_total_length(),
            ip_id: ipv4_packet.get_identification(),
            ttl: ipv4_packet.get_ttl(),
            protocol: ipv4_packet.get_next_level_protocol().0,
            icmp_type: icmp_packet.get_icmp_type(),
            icmp_code: icmp_packet.get_icmp_code(),
            checksum: icmp_packet.get_checksum(),
            size: icmp_bytes.len(),
            identifier: icmp_packet.get_identifier(),
            sequence: icmp_packet.get_sequence_number(),
            timestamp,
        })
    }

    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == IcmpTypes::EchoReply
    }
}

pub fn icmp_type_name(ty: IcmpType) -> &'static str {
    match ty {
        IcmpTypes::EchoReply => "Echo Reply",
        IcmpTypes::DestinationUnreachable => "Destination Unreachable",
        IcmpTypes::SourceQuench => "Source Quench",
        IcmpTypes::RedirectMessage => "Redirect",
        IcmpTypes::EchoRequest => "Echo Request",
        IcmpTypes::TimeExceeded => "Time Exceeded",
        IcmpTypes::ParameterProblem => "Parameter Problem",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wraps an ICMP message in a minimal IPv4 header from `source`.
    fn ipv4_wrap(source: Ipv4Addr, icmp: &[u8]) -> Vec<u8> {
        let mut buf = vec![0; IPV4_MIN_HEADER_LEN];
        buf[0] = 0x45;
        buf[2..4].copy_from_slice(&((IPV4_MIN_HEADER_LEN + icmp.len()) as u16).to_be_bytes());
        buf[8] = 64;
        buf[9] = 1;
        buf[12..16].copy_from_slice(&source.octets());
        buf[16..20].copy_from_slice(&Ipv4Addr::new(10, 0, 0, 1).octets());
        buf.extend_from_slice(icmp);
        buf
    }

    fn as_reply(mut request: Vec<u8>) -> Vec<u8> {
        request[0] = 0;
        request[2] = 0;
        request[3] = 0;
        let sum = checksum(&request);
        request[2..4].copy_from_slice(&sum.to_be_bytes());
        request
    }

    #[test]
    fn echo_request_layout() {
        let sent_at = Duration::new(3, 250_000_000);
        let buf = make_echo_packet(0xbeef, 7, 56, sent_at);
        assert_eq!(buf.len(), 56);
        assert_eq!(buf[0], 8);
        assert_eq!(buf[1], 0);
        assert_eq!(&buf[4..6], &0xbeefu16.to_be_bytes());
        assert_eq!(&buf[6..8], &7u16.to_be_bytes());
        assert_eq!(decode_timestamp(&buf[8..]), Some(sent_at));
        assert!(buf[24..].iter().all(|b| *b == 0));
        assert_eq!(checksum(&buf), 0);
    }

    #[test]
    fn minimum_size_packet_holds_timestamp() {
        let buf = make_echo_packet(1, 1, ICMP_HEADER_LEN + TIMESTAMP_LEN, Duration::from_micros(42));
        assert_eq!(buf.len(), 24);
        assert_eq!(decode_timestamp(&buf[8..]), Some(Duration::from_micros(42)));
        assert_eq!(checksum(&buf), 0);
    }

    #[test]
    fn short_packet_truncates_timestamp() {
        let buf = make_echo_packet(1, 1, 12, Duration::from_secs(1));
        assert_eq!(buf.len(), 12);
        assert_eq!(checksum(&buf), 0);
    }

    #[test]
    fn decode_echo_reply() {
        let sent_at = Duration::from_millis(1500);
        let reply = as_reply(make_echo_packet(0x1234, 9, 64, sent_at));
        let src = Ipv4Addr::new(192, 0, 2, 7);
        let packet = Icmpv4Packet::decode(&ipv4_wrap(src, &reply)).unwrap();

        assert!(packet.is_echo_reply());
        assert_eq!(packet.source, src);
        assert_eq!(packet.header_length, 20);
        assert_eq!(packet.ttl, 64);
        assert_eq!(packet.protocol, 1);
        assert_eq!(packet.size, 64);
        assert_eq!(packet.identifier, 0x1234);
        assert_eq!(packet.sequence, 9);
        assert_eq!(packet.timestamp, Some(sent_at));
    }

    #[test]
    fn decode_other_type_has_no_timestamp() {
        let mut icmp = vec![0; 36];
        icmp[0] = 3;
        icmp[1] = 1;
        let packet = Icmpv4Packet::decode(&ipv4_wrap(Ipv4Addr::LOCALHOST, &icmp)).unwrap();
        assert!(!packet.is_echo_reply());
        assert_eq!(icmp_type_name(packet.icmp_type), "Destination Unreachable");
        assert_eq!(packet.icmp_code, IcmpCode::new(1));
        assert_eq!(packet.timestamp, None);
    }

    #[test]
    fn echo_reply_without_room_for_timestamp() {
        let reply = as_reply(make_echo_packet(1, 1, 12, Duration::from_secs(1)));
        let packet = Icmpv4Packet::decode(&ipv4_wrap(Ipv4Addr::LOCALHOST, &reply)).unwrap();
        assert_eq!(packet.timestamp, None);
    }

    #[test]
    fn truncated_datagrams_are_rejected() {
        let reply = as_reply(make_echo_packet(1, 1, 56, Duration::ZERO));
        let full = ipv4_wrap(Ipv4Addr::LOCALHOST, &reply);

        assert!(matches!(
            Icmpv4Packet::decode(&full[..10]),
            Err(Error::MalformedPacket(MalformedPacketError::NotIpv4Packet))
        ));
        assert!(matches!(
            Icmpv4Packet::decode(&full[..25]),
            Err(Error::MalformedPacket(MalformedPacketError::PayloadTooShort { got: 25, want: 28 }))
        ));

        // Header length claims more bytes than the datagram holds.
        let mut long_header = full[..30].to_vec();
        long_header[0] = 0x4f;
        assert!(matches!(
            Icmpv4Packet::decode(&long_header),
            Err(Error::MalformedPacket(MalformedPacketError::PayloadTooShort { .. }))
        ));

        let mut short_header = full.clone();
        short_header[0] = 0x42;
        assert!(matches!(
            Icmpv4Packet::decode(&short_header),
            Err(Error::MalformedPacket(MalformedPacketError::BadHeaderLength(8)))
        ));

        let mut not_v4 = full;
        not_v4[0] = 0x65;
        assert!(Icmpv4Packet::decode(&not_v4).is_err());
    }

    #[test]
    fn bogus_microseconds_are_ignored() {
        let mut stamp = encode_timestamp(Duration::from_secs(1)).to_vec();
        stamp[8..].copy_from_slice(&2_000_000u64.to_be_bytes());
        assert_eq!(decode_timestamp(&stamp), None);
    }
}
