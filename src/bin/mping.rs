use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use multi_ping::packet::DEFAULT_PACKET_SIZE;
use multi_ping::{AsyncSocket, Config, Pinger, Scheduler, TargetRegistry};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "mping")]
#[command(about = "Send ICMP echo requests to several hosts and report RTT statistics", long_about = None)]
#[command(version)]
struct Args {
    /// Hosts to probe (at most 10)
    #[arg(required = true)]
    hosts: Vec<String>,

    /// Packet size in bytes, ICMP header included
    #[arg(short, long, default_value_t = DEFAULT_PACKET_SIZE)]
    size: usize,

    /// Print IP and ICMP header fields of every received packet
    #[arg(short, long)]
    verbose: bool,

    /// Only print the final statistics
    #[arg(short, long)]
    quiet: bool,

    /// Time to wait for replies each round, in milliseconds (100-60000)
    #[arg(short, long, default_value_t = 1000)]
    timeout: u64,

    /// Show the resolved address before each probe
    #[arg(short = 'd', long)]
    show_address: bool,

    /// Time between rounds, in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    interval: u64,

    /// Stop after this many rounds
    #[arg(short, long)]
    count: Option<u64>,
}

impl Args {
    fn config(&self) -> Config {
        Config::default()
            .with_packet_size(self.size)
            .with_verbose(self.verbose)
            .with_quiet(self.quiet)
            .with_timeout(Duration::from_millis(self.timeout))
            .with_show_address(self.show_address)
            .with_interval(Duration::from_millis(self.interval))
            .with_count(self.count)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = args.config();
    config.validate()?;

    let targets = TargetRegistry::from_hosts(&args.hosts)?;
    let socket = AsyncSocket::new_v4().context("failed to open raw ICMP socket (root required)")?;
    let quiet = config.quiet;
    let pinger = Pinger::new(config, targets, socket)?;

    let token = CancellationToken::new();
    let stop = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            if !quiet {
                println!("\nReceived SIGINT, stopping...");
            }
            stop.cancel();
        }
    });

    let mut scheduler = Scheduler::new(pinger, token);
    scheduler.run().await;
    Ok(())
}
