/*
    p = 1- ((1-tao)^(n-1))
    tao = 2 / (1 + W + p * W * (1 - ((2*p) ^ m) )/(1-2p))
 */

use log::debug;

use crate::config::SimulationConfig;

const CONTENDERS: f64 = 2.0;
const TOLERANCE: f64 = 0.0001;
const MAX_ITERATIONS: usize = 10_000;

/// Saturation fixed point of the two-station DCF model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationEstimate {
    /// Per-slot transmission probability of one station.
    pub tau: f64,
    /// Probability a transmission collides.
    pub collision_probability: f64,
    pub iterations: usize,
}

/// Number of window doublings before `cw_max` is reached.
fn backoff_stages(cw_base: u64, cw_max: u64) -> i32 {
    let mut stages = 0;
    let mut window = cw_base.max(1);
    while window < cw_max {
        window = window.saturating_mul(2);
        stages += 1;
    }
    stages
}

pub fn saturation_estimate(config: &SimulationConfig) -> SaturationEstimate {
    let w = config.cw_base as f64;
    let m = backoff_stages(config.cw_base, config.cw_max);
    let mut p_current: f64 = 0.5;
    let mut tau: f64 = 0.0;
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        iterations += 1;
        let denom = if (p_current - 0.5).abs() > f64::EPSILON {
            let series = (1.0 - (2.0 * p_current).powi(m)) / (1.0 - 2.0 * p_current);
            1.0 + w + p_current * w * series
        } else {
            // Limit of the geometric series at p = 1/2.
            1.0 + w + (m as f64) * w * 0.5
        };

        tau = 2.0 / denom;
        let p_next = 1.0 - (1.0 - tau).powf(CONTENDERS - 1.0);
        let p_diff = (p_current - p_next).abs();
        p_current = p_next;
        if p_diff <= TOLERANCE {
            break;
        }
    }

    debug!(
        "saturation estimate: tau {:.4}, p {:.4} after {} iterations",
        tau, p_current, iterations
    );
    SaturationEstimate {
        tau,
        collision_probability: p_current,
        iterations,
    }
}
