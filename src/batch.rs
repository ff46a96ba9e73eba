//! Runs one independent trial per configured arrival rate.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::error::SimResult;
use crate::metrics::{MetricsCollector, PerformanceMetrics};
use crate::node::Node;
use crate::protocol::TimingProfile;
use crate::scheduler::ArbitrationLoop;
use crate::traffic::TrafficGenerator;

/// Generates both schedules at `rate`, arbitrates to the horizon and
/// collects the metrics. Assumes `config` has been validated.
pub fn run_trial<R: Rng + ?Sized>(
    config: &SimulationConfig,
    rate: f64,
    rng: &mut R,
) -> SimResult<PerformanceMetrics> {
    let profile = TimingProfile::from_config(config);
    let generator = TrafficGenerator::new(config);
    let node1 = Node::new(1, generator.generate(rate, rng)?);
    let node2 = Node::new(2, generator.generate(rate, rng)?);

    debug!(
        "trial at {} frames/s: {} protocol, horizon {} slots, {} slots per frame",
        rate,
        profile.protocol,
        config.horizon(),
        profile.tx_slots
    );

    let outcome = ArbitrationLoop::new(node1, node2, &profile, config).run(rng)?;
    let metrics = MetricsCollector::new(config).collect(
        rate,
        &outcome.node1,
        &outcome.node2,
        outcome.state.collision_counter,
    );

    info!(
        "rate {}: {} collisions, {}/{} delivered, FI {}",
        rate, metrics.collisions, metrics.successes_1, metrics.successes_2, metrics.fairness_index
    );
    Ok(metrics)
}

/// Validates `config` once, then runs the rates in order, each with its
/// own generator seeded from the batch seed.
pub fn run_batch(config: &SimulationConfig) -> SimResult<Vec<PerformanceMetrics>> {
    config.validate()?;

    let mut report = Vec::with_capacity(config.arrival_rates.len());
    for (index, &rate) in config.arrival_rates.iter().enumerate() {
        let mut rng = match config.trial_seed(index) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        report.push(run_trial(config, rate, &mut rng)?);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::protocol::Protocol;

    fn short_config() -> SimulationConfig {
        SimulationConfig {
            arrival_rates: vec![100.0, 1000.0],
            simulation_time: 1.0,
            seed: Some(2024),
            ..Default::default()
        }
    }

    #[test]
    fn one_record_per_rate_in_order() {
        let report = run_batch(&short_config()).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].rate, 100.0);
        assert_eq!(report[1].rate, 1000.0);
    }

    #[test]
    fn seeded_batches_replay_exactly() {
        let config = short_config();
        assert_eq!(run_batch(&config).unwrap(), run_batch(&config).unwrap());
    }

    #[test]
    fn heavier_load_collides_more() {
        let report = run_batch(&short_config()).unwrap();
        assert!(report[1].collisions > report[0].collisions);
    }

    #[test]
    fn invalid_config_fails_before_any_trial() {
        let config = SimulationConfig {
            slot_duration: 0.0,
            ..short_config()
        };
        assert!(matches!(run_batch(&config), Err(SimError::Configuration(_))));
    }

    #[test]
    fn rts_cts_batch_runs() {
        let config = SimulationConfig {
            protocol: Protocol::RtsCts,
            ..short_config()
        };
        let report = run_batch(&config).unwrap();
        assert!(report.iter().all(|m| m.successes_1 > 0 && m.successes_2 > 0));
    }
}
