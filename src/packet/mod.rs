pub mod checksum;
pub mod icmpv4;

pub use checksum::checksum;
pub use icmpv4::{make_echo_packet, Icmpv4Packet};

/// Length of the ICMP echo header: type, code, checksum, identifier, sequence.
pub const ICMP_HEADER_LEN: usize = 8;
/// Length of the embedded send timestamp: seconds and microseconds, both u64.
pub const TIMESTAMP_LEN: usize = 16;
pub const MIN_PACKET_SIZE: usize = ICMP_HEADER_LEN + TIMESTAMP_LEN;
/// Largest ICMP message that fits in one IPv4 datagram.
pub const MAX_PACKET_SIZE: usize = 65_515;
pub const DEFAULT_PACKET_SIZE: usize = 56;
