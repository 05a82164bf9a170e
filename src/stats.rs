/// Running round-trip statistics for one target. RTTs are in milliseconds.
///
/// Only the aggregates are stored, so memory stays constant however long a
/// run lasts.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub min_rtt: f64,
    pub max_rtt: f64,
    pub sum_rtt: f64,
    pub sum_rtt_squared: f64,
}

/// Derived view of [`Stats`] at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub sent: u64,
    pub received: u64,
    pub loss: f64,
    /// `None` when no reply was ever matched.
    pub rtt: Option<RttSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RttSummary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    /// Population standard deviation.
    pub jitter: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            packets_sent: 0,
            packets_received: 0,
            min_rtt: f64::INFINITY,
            max_rtt: f64::NEG_INFINITY,
            sum_rtt: 0.0,
            sum_rtt_squared: 0.0,
        }
    }
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one probe and returns its sequence number.
    pub fn record_sent(&mut self) -> u16 {
        self.packets_sent += 1;
        self.packets_sent as u16
    }

    /// Folds one matched reply into the aggregates.
    ///
    /// Returns `false` without touching anything when every sent probe is
    /// already answered, which keeps `received <= sent`.
    pub fn record_reply(&mut self, rtt: f64) -> bool {
        if self.packets_received >= self.packets_sent {
            return false;
        }
        self.packets_received += 1;
        self.min_rtt = self.min_rtt.min(rtt);
        self.max_rtt = self.max_rtt.max(rtt);
        self.sum_rtt += rtt;
        self.sum_rtt_squared += rtt * rtt;
        true
    }

    pub fn loss(&self) -> Option<f64> {
        if self.packets_sent == 0 {
            return None;
        }
        let lost = self.packets_sent - self.packets_received;
        Some(100.0 * lost as f64 / self.packets_sent as f64)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.packets_received == 0 {
            return None;
        }
        Some(self.sum_rtt / self.packets_received as f64)
    }

    pub fn jitter(&self) -> Option<f64> {
        let mean = self.mean()?;
        let variance = self.sum_rtt_squared / self.packets_received as f64 - mean * mean;
        // Cancellation can push a near-zero variance below zero.
        Some(variance.max(0.0).sqrt())
    }

    /// `None` until at least one probe was sent.
    pub fn summary(&self) -> Option<Summary> {
        let loss = self.loss()?;
        let rtt = match (self.mean(), self.jitter()) {
            (Some(mean), Some(jitter)) => Some(RttSummary {
                min: self.min_rtt,
                mean,
                max: self.max_rtt,
                jitter,
            }),
            _ => None,
        };
        Some(Summary {
            sent: self.packets_sent,
            received: self.packets_received,
            loss,
            rtt,
        })
    }
}
