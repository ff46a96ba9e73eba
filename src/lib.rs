//! Slotted simulator of two wireless nodes contending for one channel
//! with CSMA/CA binary exponential backoff, in Basic access or RTS/CTS
//! mode. For each offered arrival rate it reports collisions, per-node
//! throughput and a fairness index.

pub mod batch;
pub mod config;
pub mod error;
pub mod metrics;
pub mod node;
pub mod protocol;
pub mod scheduler;
pub mod theoretical;
pub mod traffic;

pub use batch::{run_batch, run_trial};
pub use config::SimulationConfig;
pub use error::{SimError, SimResult};
pub use metrics::{Fairness, MetricsCollector, PerformanceMetrics};
pub use node::{Backoff, Node};
pub use protocol::{CostModel, Protocol, TimingProfile};
pub use scheduler::{ArbitrationLoop, ArbitrationOutcome, ContentionState, Step};
pub use theoretical::{saturation_estimate, SaturationEstimate};
pub use traffic::{ArrivalSchedule, TrafficGenerator};
