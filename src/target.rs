use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

use crate::error::{Error, Result};
use crate::stats::Stats;

/// Upper bound on the number of hosts probed in one run.
pub const MAX_TARGETS: usize = 10;

#[derive(Debug, Clone)]
pub struct Target {
    pub hostname: String,
    pub addr: Ipv4Addr,
    pub stats: Stats,
}

impl Target {
    pub fn new(hostname: impl Into<String>, addr: Ipv4Addr) -> Self {
        Self {
            hostname: hostname.into(),
            addr,
            stats: Stats::new(),
        }
    }
}

/// Fixed set of probe targets, in the order they were added.
///
/// Lookups by address are a linear scan; the registry never holds more than
/// [`MAX_TARGETS`] entries.
#[derive(Debug, Default, Clone)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `addr` and returns its index.
    pub fn add(&mut self, hostname: impl Into<String>, addr: Ipv4Addr) -> Result<usize> {
        if self.find(addr).is_some() {
            return Err(Error::DuplicateTarget(addr));
        }
        if self.targets.len() >= MAX_TARGETS {
            return Err(Error::TooManyTargets { max: MAX_TARGETS });
        }
        self.targets.push(Target::new(hostname, addr));
        Ok(self.targets.len() - 1)
    }

    /// Resolves each host and registers the ones that succeed.
    ///
    /// Unresolvable, duplicate and surplus hosts are skipped with a warning.
    /// Fails only when nothing could be registered.
    pub fn from_hosts<I, S>(hosts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for host in hosts {
            let host = host.as_ref();
            let added = resolve(host).and_then(|addr| registry.add(host, addr));
            if let Err(e) = added {
                log::warn!("skipping '{}': {}", host, e);
            }
        }
        if registry.is_empty() {
            return Err(Error::NoHosts);
        }
        Ok(registry)
    }

    pub fn find(&self, addr: Ipv4Addr) -> Option<usize> {
        self.targets.iter().position(|t| t.addr == addr)
    }

    pub fn lookup_mut(&mut self, addr: Ipv4Addr) -> Option<(usize, &mut Target)> {
        self.targets
            .iter_mut()
            .enumerate()
            .find(|(_, t)| t.addr == addr)
    }

    pub fn get(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Target> {
        self.targets.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Resolves `host` to its first IPv4 address.
pub fn resolve(host: &str) -> Result<Ipv4Addr> {
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(addr);
    }
    let addrs = (host, 0)
        .to_socket_addrs()
        .map_err(|_| Error::HostError(host.to_string()))?;
    addrs
        .filter_map(|addr| match addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| Error::HostError(host.to_string()))
}
