use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::io::unix::AsyncFd;
use tokio::time::{timeout, Instant};

use crate::config::Config;
use crate::error::{MalformedPacketError, Result};
use crate::packet::{make_echo_packet, Icmpv4Packet, MIN_PACKET_SIZE};
use crate::socket;
use crate::target::{Target, TargetRegistry};

/// Largest datagram the kernel can hand back, IPv4 header included.
const RECV_BUFFER_LEN: usize = 65_535;

/// Datagram transport the pinger writes requests to and reads replies from.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send_to(&self, buf: &[u8], addr: Ipv4Addr) -> io::Result<usize>;

    /// Waits for the next inbound datagram, IPv4 header included.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

#[derive(Debug)]
pub struct AsyncSocket {
    inner: AsyncFd<socket::Socket>,
}

impl AsyncSocket {
    fn new(socket: socket::Socket) -> io::Result<Self> {
        socket.set_nonblocking(true)?;
        Ok(Self {
            inner: AsyncFd::new(socket)?,
        })
    }

    /// Opens a raw ICMP socket. Needs `CAP_NET_RAW` or root.
    pub fn new_v4() -> io::Result<Self> {
        Self::new(socket::Socket::new_v4()?)
    }
}

impl Transport for AsyncSocket {
    async fn send_to(&self, buf: &[u8], addr: Ipv4Addr) -> io::Result<usize> {
        loop {
            let mut guard = self.inner.writable().await?;

            match guard.try_io(|inner| inner.get_ref().sendto(buf, addr)) {
                Ok(res) => return res,
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.inner.readable().await?;

            match guard.try_io(|inner| inner.get_ref().recv(buf)) {
                Ok(res) => return res,
                Err(_would_block) => continue,
            }
        }
    }
}

/// What the demultiplexer made of one datagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Echo Reply credited to the target at this registry index.
    Matched { target: usize, rtt: f64 },
    /// Echo Reply for a target whose probes are all answered already.
    Duplicate { target: usize },
    /// Any ICMP message other than an Echo Reply.
    OtherType,
    /// Echo Reply from an address that is not registered.
    UnknownSource,
    /// Echo Reply to another process's request.
    ForeignIdentifier,
}

#[derive(Debug, Clone)]
pub struct Received {
    pub packet: Icmpv4Packet,
    pub outcome: Outcome,
}

/// Sends probes to every registered target and matches their replies.
#[derive(Debug)]
pub struct Pinger<T> {
    config: Config,
    targets: TargetRegistry,
    transport: T,
    idt: u16,
    epoch: Instant,
    buf: Vec<u8>,
}

impl<T: Transport> Pinger<T> {
    pub fn new(config: Config, targets: TargetRegistry, transport: T) -> Result<Self> {
        config.validate()?;

        let mut u16_buf = [0; 2];
        let idt = match getrandom::getrandom(&mut u16_buf) {
            Ok(()) => u16::from_ne_bytes(u16_buf),
            Err(_) => std::process::id() as u16,
        };

        Ok(Self {
            config,
            targets,
            transport,
            idt,
            epoch: Instant::now(),
            buf: vec![0; RECV_BUFFER_LEN],
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    pub fn into_targets(self) -> TargetRegistry {
        self.targets
    }

    /// Identifier stamped on every request sent by this pinger.
    pub fn identifier(&self) -> u16 {
        self.idt
    }

    /// Sends one Echo Request to each target in registry order and returns
    /// how many went out. A failed send still counts as sent.
    pub async fn send_round(&mut self) -> usize {
        self.send_round_with(|_| {}).await
    }

    /// Like [`Pinger::send_round`], calling `before_send` right before each
    /// target's request goes out.
    pub async fn send_round_with<F>(&mut self, mut before_send: F) -> usize
    where
        F: FnMut(&Target),
    {
        let mut ok = 0;
        for target in self.targets.iter_mut() {
            before_send(target);
            let seq = target.stats.record_sent();
            let packet =
                make_echo_packet(self.idt, seq, self.config.packet_size, self.epoch.elapsed());
            match self.transport.send_to(&packet, target.addr).await {
                Ok(_) => ok += 1,
                Err(e) => log::error!("socket send packet error to {}: {}", target.addr, e),
            }
        }
        ok
    }

    /// Waits at most `wait` for one datagram and folds it into the stats.
    ///
    /// `Ok(None)` means nothing arrived in time.
    pub async fn recv_reply(&mut self, wait: Duration) -> Result<Option<Received>> {
        let size = match timeout(wait, self.transport.recv(&mut self.buf)).await {
            Ok(res) => res?,
            Err(_elapsed) => return Ok(None),
        };
        let received_at = self.epoch.elapsed();

        let packet = Icmpv4Packet::decode(&self.buf[..size])?;
        let outcome = self.match_reply(&packet, received_at)?;
        Ok(Some(Received { packet, outcome }))
    }

    fn match_reply(&mut self, packet: &Icmpv4Packet, received_at: Duration) -> Result<Outcome> {
        if !packet.is_echo_reply() {
            return Ok(Outcome::OtherType);
        }
        if packet.identifier != self.idt {
            log::debug!(
                "ignoring echo reply from {} with identifier {}",
                packet.source,
                packet.identifier
            );
            return Ok(Outcome::ForeignIdentifier);
        }
        let (index, target) = match self.targets.lookup_mut(packet.source) {
            Some(found) => found,
            None => {
                log::debug!("ignoring echo reply from unregistered {}", packet.source);
                return Ok(Outcome::UnknownSource);
            }
        };

        let sent_at = packet
            .timestamp
            .ok_or(MalformedPacketError::PayloadTooShort {
                got: packet.size,
                want: MIN_PACKET_SIZE,
            })?;
        let rtt = received_at
            .checked_sub(sent_at)
            .ok_or(MalformedPacketError::FutureTimestamp)?;
        let rtt = rtt.as_secs_f64() * 1000.0;

        if target.stats.record_reply(rtt) {
            Ok(Outcome::Matched { target: index, rtt })
        } else {
            log::debug!("duplicate echo reply from {}", packet.source);
            Ok(Outcome::Duplicate { target: index })
        }
    }
}
