use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

/// Channel access variant.
#[derive(Debug, Hash, Eq, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Basic,
    RtsCts,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Basic => write!(f, "Basic"),
            Protocol::RtsCts => write!(f, "RTS/CTS"),
        }
    }
}

/// Slots the channel is occupied for by one contention outcome.
///
/// `backoff` is the backoff value the transmitting contender counted down.
pub trait CostModel {
    fn collision_cost(&self, backoff: u64) -> u64;
    fn success_cost(&self, backoff: u64) -> u64;
}

/// Timing constants of one protocol variant, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingProfile {
    pub protocol: Protocol,
    pub difs: u64,
    pub sifs: u64,
    pub ack: u64,
    pub rts: u64,
    pub cts: u64,
    /// Data frame duration, rounded up to whole slots.
    pub tx_slots: u64,
}

impl TimingProfile {
    pub fn from_config(config: &SimulationConfig) -> TimingProfile {
        let tx_slots = (config.packet_size / (config.bandwidth * config.slot_duration)).ceil();
        TimingProfile {
            protocol: config.protocol,
            difs: config.difs,
            sifs: config.sifs,
            ack: config.ack,
            rts: config.rts,
            cts: config.cts,
            tx_slots: tx_slots as u64,
        }
    }
}

impl CostModel for TimingProfile {
    fn collision_cost(&self, backoff: u64) -> u64 {
        match self.protocol {
            Protocol::Basic => self.difs + backoff + self.sifs + self.ack,
            // Only the control frames are lost when RTS frames collide.
            Protocol::RtsCts => self.difs + backoff + self.rts + self.sifs + self.cts,
        }
    }

    fn success_cost(&self, backoff: u64) -> u64 {
        match self.protocol {
            Protocol::Basic => self.difs + backoff + self.tx_slots + self.sifs + self.ack,
            Protocol::RtsCts => {
                self.difs
                    + backoff
                    + self.rts
                    + self.sifs
                    + self.cts
                    + self.sifs
                    + self.tx_slots
                    + self.sifs
                    + self.ack
            }
        }
    }
}
