#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use multi_ping::packet::checksum;
use multi_ping::Transport;
use tokio::time::{sleep_until, Instant};

pub const REPLY_TTL: u8 = 57;

/// In-memory network: registered hosts echo every request back after a
/// fixed delay, everything else stays silent.
#[derive(Clone, Default)]
pub struct MockNetwork {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    responders: HashMap<Ipv4Addr, Duration>,
    failing: HashSet<Ipv4Addr>,
    queue: Vec<(Instant, Vec<u8>)>,
    sent: Vec<(Ipv4Addr, Vec<u8>)>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, addr: Ipv4Addr, delay: Duration) -> Self {
        self.inner.lock().unwrap().responders.insert(addr, delay);
        self
    }

    pub fn fail_sends_to(self, addr: Ipv4Addr) -> Self {
        self.inner.lock().unwrap().failing.insert(addr);
        self
    }

    /// Delivers `datagram` once `delay` has passed.
    pub fn inject(&self, delay: Duration, datagram: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.push((Instant::now() + delay, datagram));
        inner.queue.sort_by_key(|(at, _)| *at);
    }

    pub fn sent(&self) -> Vec<(Ipv4Addr, Vec<u8>)> {
        self.inner.lock().unwrap().sent.clone()
    }
}

impl Transport for MockNetwork {
    async fn send_to(&self, buf: &[u8], addr: Ipv4Addr) -> io::Result<usize> {
        let delay = {
            let mut inner = self.inner.lock().unwrap();
            if inner.failing.contains(&addr) {
                return Err(io::Error::new(io::ErrorKind::Other, "network is unreachable"));
            }
            inner.sent.push((addr, buf.to_vec()));
            inner.responders.get(&addr).copied()
        };
        if let Some(delay) = delay {
            self.inject(delay, ipv4_wrap(addr, &echo_reply(buf)));
        }
        Ok(buf.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let next = {
                let mut inner = self.inner.lock().unwrap();
                let due = inner.queue.first().map(|(at, _)| *at);
                match due {
                    Some(at) if at <= Instant::now() => {
                        let (_, datagram) = inner.queue.remove(0);
                        let n = datagram.len().min(buf.len());
                        buf[..n].copy_from_slice(&datagram[..n]);
                        return Ok(n);
                    }
                    other => other,
                }
            };
            match next {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        }
    }
}

/// Turns an Echo Request into the matching Echo Reply.
pub fn echo_reply(request: &[u8]) -> Vec<u8> {
    let mut reply = request.to_vec();
    reply[0] = 0;
    reply[2] = 0;
    reply[3] = 0;
    let sum = checksum(&reply);
    reply[2..4].copy_from_slice(&sum.to_be_bytes());
    reply
}

/// Prepends a 20-byte IPv4 header from `source`.
pub fn ipv4_wrap(source: Ipv4Addr, icmp: &[u8]) -> Vec<u8> {
    let mut buf = vec![0; 20];
    buf[0] = 0x45;
    buf[2..4].copy_from_slice(&((20 + icmp.len()) as u16).to_be_bytes());
    buf[8] = REPLY_TTL;
    buf[9] = 1;
    buf[12..16].copy_from_slice(&source.octets());
    buf[16..20].copy_from_slice(&[10, 0, 0, 1]);
    buf.extend_from_slice(icmp);
    buf
}
