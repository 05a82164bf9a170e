use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::ping::{Outcome, Pinger, Received, Transport};
use crate::report;
use crate::target::TargetRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Draining,
    Stopped,
}

/// Drives rounds of send, drain and sleep until cancelled or the configured
/// round count is reached, then prints one summary per target.
#[derive(Debug)]
pub struct Scheduler<T> {
    pinger: Pinger<T>,
    token: CancellationToken,
    state: State,
    rounds: u64,
}

impl<T: Transport> Scheduler<T> {
    pub fn new(pinger: Pinger<T>, token: CancellationToken) -> Self {
        Self {
            pinger,
            token,
            state: State::Running,
            rounds: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn into_targets(self) -> TargetRegistry {
        self.pinger.into_targets()
    }

    /// Runs rounds until cancelled or the round count is reached, then
    /// prints the final statistics.
    pub async fn run(&mut self) {
        while self.state == State::Running {
            self.round().await;
        }

        for target in self.pinger.targets().iter() {
            println!("{}", report::summary_block(target));
        }
        self.state = State::Stopped;
    }

    async fn round(&mut self) {
        if self.token.is_cancelled() || self.count_reached() {
            self.state = State::Draining;
            return;
        }
        self.rounds += 1;
        let config = self.pinger.config().clone();
        let start = Instant::now();

        let announce = config.show_address && !config.quiet;
        self.pinger
            .send_round_with(|target| {
                if announce {
                    println!("{}", report::address_line(target));
                }
            })
            .await;

        // The receive window never stretches the round past its interval.
        self.drain(start + config.timeout.min(config.interval)).await;
        if self.token.is_cancelled() || self.count_reached() {
            self.state = State::Draining;
            return;
        }

        tokio::select! {
            _ = self.token.cancelled() => {
                self.state = State::Draining;
            }
            _ = sleep_until(start + config.interval) => {}
        }
    }

    fn count_reached(&self) -> bool {
        matches!(self.pinger.config().count, Some(count) if self.rounds >= count)
    }

    /// Processes every datagram that shows up before `deadline`.
    async fn drain(&mut self, deadline: Instant) {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            let res = tokio::select! {
                _ = self.token.cancelled() => return,
                res = self.pinger.recv_reply(deadline - now) => res,
            };
            match res {
                Ok(Some(received)) => self.report(&received),
                Ok(None) => return,
                Err(Error::MalformedPacket(e)) => log::debug!("discarding datagram: {}", e),
                Err(e) => {
                    if !self.pinger.config().quiet {
                        log::error!("receive error: {}", e);
                    }
                    return;
                }
            }
        }
    }

    fn report(&self, received: &Received) {
        let config = self.pinger.config();
        if config.quiet {
            return;
        }
        if config.verbose {
            println!("{}", report::header_dump(&received.packet));
        }
        match received.outcome {
            Outcome::Matched { rtt, .. } => println!("{}", report::echo_line(&received.packet, rtt)),
            Outcome::OtherType => println!("{}", report::other_line(&received.packet)),
            Outcome::Duplicate { .. } | Outcome::UnknownSource | Outcome::ForeignIdentifier => {}
        }
    }
}
