//! Per-rate performance report derived from a finished arbitration run.

use std::fmt;

use log::warn;
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::node::Node;

/// Ratio of node 1 to node 2 deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fairness {
    Defined(f64),
    /// Node 2 delivered nothing, so the ratio has no value.
    Undefined,
}

impl Fairness {
    pub fn from_counts(successes_1: u64, successes_2: u64) -> Fairness {
        if successes_2 == 0 {
            Fairness::Undefined
        } else {
            Fairness::Defined(successes_1 as f64 / successes_2 as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Fairness::Defined(ratio) => Some(*ratio),
            Fairness::Undefined => None,
        }
    }
}

impl fmt::Display for Fairness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fairness::Defined(ratio) => write!(f, "{:.2}", ratio),
            Fairness::Undefined => write!(f, "undefined"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub rate: f64,
    pub collisions: u64,
    pub successes_1: u64,
    pub successes_2: u64,
    /// bits per second
    pub throughput_1: f64,
    pub throughput_2: f64,
    pub fairness_index: Fairness,
}

impl fmt::Display for PerformanceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "------------------------ arrival rate {} frames/sec ------------------------",
            self.rate
        )?;
        writeln!(
            f,
            "Node 1 - packets sent: {}, Node 2 - packets sent: {}",
            self.successes_1, self.successes_2
        )?;
        write!(
            f,
            "Collisions: {}, Node 1 Throughput: {:.2} Kbps, Node 2 Throughput: {:.2} Kbps, FI: {}",
            self.collisions,
            self.throughput_1 * 1e-3,
            self.throughput_2 * 1e-3,
            self.fairness_index
        )
    }
}

pub struct MetricsCollector<'a> {
    config: &'a SimulationConfig,
}

impl<'a> MetricsCollector<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        MetricsCollector { config }
    }

    fn throughput(&self, successes: u64) -> f64 {
        successes as f64 * self.config.packet_size / self.config.simulation_time
    }

    pub fn collect(
        &self,
        rate: f64,
        node1: &Node,
        node2: &Node,
        collision_counter: u64,
    ) -> PerformanceMetrics {
        let successes_1 = node1.successes() as u64;
        let successes_2 = node2.successes() as u64;
        let fairness_index = Fairness::from_counts(successes_1, successes_2);
        if fairness_index == Fairness::Undefined {
            warn!(
                "node {} delivered nothing at {} frames/s, fairness index undefined",
                node2.get_id(),
                rate
            );
        }
        PerformanceMetrics {
            rate,
            collisions: collision_counter,
            successes_1,
            successes_2,
            throughput_1: self.throughput(successes_1),
            throughput_2: self.throughput(successes_2),
            fairness_index,
        }
    }
}
