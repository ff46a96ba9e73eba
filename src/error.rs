//! Error taxonomy for the contention simulator.
//!
//! Configuration problems fail fast before any trial starts. Schedule
//! underrun and backoff underflow indicate sequencing bugs in the
//! arbitration loop and are surfaced instead of being clamped away.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("arrival schedule exhausted: cursor {cursor} past {len} entries")]
    ScheduleUnderrun { cursor: usize, len: usize },

    #[error("backoff underflow: cannot reduce {backoff} by {amount}")]
    BackoffUnderflow { backoff: u64, amount: u64 },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
