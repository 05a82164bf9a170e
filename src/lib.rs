pub mod config;
pub mod error;
pub mod packet;
pub mod ping;
pub mod report;
pub mod scheduler;
pub mod stats;
pub mod target;

mod socket;
#[cfg(unix)]
#[path = "sys/unix.rs"]
mod sys;

pub use config::Config;
pub use error::{Error, Result};
pub use ping::{AsyncSocket, Outcome, Pinger, Received, Transport};
pub use scheduler::Scheduler;
pub use stats::{Stats, Summary};
pub use target::{Target, TargetRegistry};
