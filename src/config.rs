//! Immutable run configuration shared by every component of a batch.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::protocol::Protocol;

/// Upper bound on `rate * simulation_time`, the expected arrivals per node
/// in one trial. Schedules hold about twice this many entries.
pub const MAX_EXPECTED_ARRIVALS: f64 = 10_000_000.0;

/// Parameters of one batch of rate trials.
///
/// Durations are in seconds, rates in frames per second, sizes in bits.
/// Inter-frame spacings and control frames are expressed in slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub arrival_rates: Vec<f64>,
    pub simulation_time: f64,
    pub slot_duration: f64,
    pub bandwidth: f64,
    pub packet_size: f64,
    pub cw_base: u64,
    pub cw_max: u64,
    pub protocol: Protocol,
    pub difs: u64,
    pub sifs: u64,
    pub ack: u64,
    pub rts: u64,
    pub cts: u64,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            arrival_rates: vec![100.0, 200.0, 300.0, 400.0, 700.0, 1000.0],
            simulation_time: 10.0,
            slot_duration: 10e-6,
            bandwidth: 8e6,
            packet_size: 8000.0,
            cw_base: 4,
            cw_max: 1024,
            protocol: Protocol::Basic,
            difs: 4,
            sifs: 1,
            ack: 2,
            rts: 2,
            cts: 2,
            seed: None,
        }
    }
}

fn positive(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::Configuration(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}

impl SimulationConfig {
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks every parameter before any trial is allowed to start.
    pub fn validate(&self) -> SimResult<()> {
        if self.arrival_rates.is_empty() {
            return Err(SimError::Configuration(
                "at least one arrival rate is required".into(),
            ));
        }
        for &rate in &self.arrival_rates {
            positive("arrival rate", rate)?;
        }
        positive("simulation_time", self.simulation_time)?;
        for &rate in &self.arrival_rates {
            self.check_expected_arrivals(rate)?;
        }
        positive("slot_duration", self.slot_duration)?;
        positive("bandwidth", self.bandwidth)?;
        positive("packet_size", self.packet_size)?;

        if self.horizon() == 0 {
            return Err(SimError::Configuration(format!(
                "simulation_time {}s is shorter than one {}s slot",
                self.simulation_time, self.slot_duration
            )));
        }
        if self.cw_base == 0 {
            return Err(SimError::Configuration("cw_base must be at least 1".into()));
        }
        if self.cw_max < self.cw_base {
            return Err(SimError::Configuration(format!(
                "cw_max {} is smaller than cw_base {}",
                self.cw_max, self.cw_base
            )));
        }
        if self.difs == 0 {
            return Err(SimError::Configuration("difs must be at least 1 slot".into()));
        }
        Ok(())
    }

    /// Rejects rates whose schedule would exceed `MAX_EXPECTED_ARRIVALS`.
    pub fn check_expected_arrivals(&self, rate: f64) -> SimResult<()> {
        let expected = rate * self.simulation_time;
        if expected > MAX_EXPECTED_ARRIVALS {
            return Err(SimError::Configuration(format!(
                "arrival rate {} over {}s expects {} packets, limit is {}",
                rate, self.simulation_time, expected, MAX_EXPECTED_ARRIVALS
            )));
        }
        Ok(())
    }

    /// Simulation length in slots.
    pub fn horizon(&self) -> u64 {
        (self.simulation_time / self.slot_duration).round() as u64
    }

    /// `cw_base * 2^extension`, capped at `cw_max`.
    pub fn contention_window(&self, extension: u32) -> u64 {
        1u64.checked_shl(extension)
            .and_then(|factor| self.cw_base.checked_mul(factor))
            .map_or(self.cw_max, |window| window.min(self.cw_max))
    }

    /// Seed for the trial at `index`, or `None` when the batch is unseeded.
    pub fn trial_seed(&self, index: usize) -> Option<u64> {
        self.seed
            .map(|seed| seed.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }
}
