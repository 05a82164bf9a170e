use std::net::Ipv4Addr;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid packet size {size}, must be between {min} and {max} bytes")]
    InvalidPacketSize { size: usize, min: usize, max: usize },
    #[error("invalid timeout {0} ms (100-60000 ms)")]
    InvalidTimeout(u128),
    #[error("round interval must be non-zero")]
    InvalidInterval,
    #[error("cannot use both verbose and quiet modes")]
    VerboseAndQuiet,
    #[error("could not resolve hostname '{0}'")]
    HostError(String),
    #[error("duplicate target address {0}")]
    DuplicateTarget(Ipv4Addr),
    #[error("too many targets, at most {max} hosts are probed")]
    TooManyTargets { max: usize },
    #[error("no valid hosts specified")]
    NoHosts,
    #[error("malformed packet: {0}")]
    MalformedPacket(#[from] MalformedPacketError),
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MalformedPacketError {
    #[error("expected an Ipv4Packet")]
    NotIpv4Packet,
    #[error("invalid ipv4 header length {0}")]
    BadHeaderLength(usize),
    #[error("expected an Icmpv4Packet payload")]
    NotIcmpv4Packet,
    #[error("payload too short, got {got}, want {want}")]
    PayloadTooShort { got: usize, want: usize },
    #[error("timestamp lies in the future")]
    FutureTimestamp,
}
