use std::time::Duration;

use crate::error::{Error, Result};
use crate::packet::{DEFAULT_PACKET_SIZE, MAX_PACKET_SIZE, MIN_PACKET_SIZE};

pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);
pub const MAX_TIMEOUT: Duration = Duration::from_millis(60_000);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1_000);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Probe settings, fixed for the lifetime of a run.
///
/// Build one with the `with_*` methods and call [`Config::validate`] before
/// handing it to a [`crate::ping::Pinger`].
///
/// ```
/// use multi_ping::Config;
/// use std::time::Duration;
///
/// let config = Config::default()
///     .with_packet_size(64)
///     .with_timeout(Duration::from_millis(500))
///     .with_quiet(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Size of each Echo Request in bytes, ICMP header included.
    pub packet_size: usize,
    /// Dump IP and ICMP header fields of every received datagram.
    pub verbose: bool,
    /// Suppress per-packet output. The final summary is still printed.
    pub quiet: bool,
    /// How long each round waits for replies.
    pub timeout: Duration,
    /// Print the resolved address next to the hostname before each send.
    pub show_address: bool,
    /// Fixed period between the start of two rounds.
    pub interval: Duration,
    /// Stop after this many rounds. `None` runs until cancelled.
    pub count: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            verbose: false,
            quiet: false,
            timeout: DEFAULT_TIMEOUT,
            show_address: false,
            interval: DEFAULT_INTERVAL,
            count: None,
        }
    }
}

impl Config {
    pub fn with_packet_size(mut self, size: usize) -> Self {
        self.packet_size = size;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_show_address(mut self, show: bool) -> Self {
        self.show_address = show;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_count(mut self, count: Option<u64>) -> Self {
        self.count = count;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&self.packet_size) {
            return Err(Error::InvalidPacketSize {
                size: self.packet_size,
                min: MIN_PACKET_SIZE,
                max: MAX_PACKET_SIZE,
            });
        }
        if !(MIN_TIMEOUT..=MAX_TIMEOUT).contains(&self.timeout) {
            return Err(Error::InvalidTimeout(self.timeout.as_millis()));
        }
        if self.interval.is_zero() {
            return Err(Error::InvalidInterval);
        }
        if self.verbose && self.quiet {
            return Err(Error::VerboseAndQuiet);
        }
        Ok(())
    }
}
