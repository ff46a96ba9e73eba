//! Poisson arrival schedules expressed in slot indices.

use log::debug;
use rand::Rng;

use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};

/// Extra gaps drawn on top of twice the expected arrival count.
const OVERSAMPLE_MARGIN: u64 = 32;

/// Sentinel entries appended after the last real arrival.
const SENTINEL_PADDING: usize = 1;

/// Slot indices at which one node's packets become ready to send.
///
/// Non-decreasing. The last real arrival lies at or beyond the horizon,
/// and the real arrivals are followed by sentinel entries at or beyond
/// the horizon, so a node that has sent everything it could never reads
/// past the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalSchedule {
    slots: Vec<u64>,
    real_len: usize,
    horizon: u64,
}

impl ArrivalSchedule {
    /// Builds a schedule from already accumulated arrival slots.
    pub fn from_arrivals(mut arrivals: Vec<u64>, horizon: u64) -> SimResult<Self> {
        if arrivals.windows(2).any(|w| w[0] > w[1]) {
            return Err(SimError::Configuration(
                "arrival slots must be non-decreasing".into(),
            ));
        }
        let real_len = arrivals.len();
        let sentinel = arrivals.last().map_or(horizon, |&last| last.max(horizon));
        arrivals.extend(std::iter::repeat(sentinel).take(SENTINEL_PADDING));
        Ok(ArrivalSchedule {
            slots: arrivals,
            real_len,
            horizon,
        })
    }

    pub fn slot_at(&self, cursor: usize) -> SimResult<u64> {
        self.slots.get(cursor).copied().ok_or(SimError::ScheduleUnderrun {
            cursor,
            len: self.slots.len(),
        })
    }

    pub fn real_arrivals(&self) -> &[u64] {
        &self.slots[..self.real_len]
    }

    /// Number of real arrivals strictly before `slot`.
    pub fn arrivals_before(&self, slot: u64) -> usize {
        self.real_arrivals().partition_point(|&a| a < slot)
    }

    pub fn first_arrival(&self) -> u64 {
        self.slots[0]
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Draws exponential interarrival gaps and converts them to slot indices.
pub struct TrafficGenerator<'a> {
    config: &'a SimulationConfig,
}

impl<'a> TrafficGenerator<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        TrafficGenerator { config }
    }

    /// One gap in seconds, by inverse-CDF sampling: `-(1/rate) ln(1 - u)`.
    fn gap_slots<R: Rng + ?Sized>(&self, rate: f64, rng: &mut R) -> u64 {
        let u: f64 = rng.gen();
        let gap = -(1.0 / rate) * (1.0 - u).ln();
        (gap / self.config.slot_duration).ceil() as u64
    }

    pub fn generate<R: Rng + ?Sized>(&self, rate: f64, rng: &mut R) -> SimResult<ArrivalSchedule> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(SimError::Configuration(format!(
                "arrival rate must be positive, got {}",
                rate
            )));
        }
        self.config.check_expected_arrivals(rate)?;
        let horizon = self.config.horizon();
        if horizon == 0 {
            return Err(SimError::Configuration("horizon must be at least one slot".into()));
        }

        let expected = (rate * self.config.simulation_time).ceil() as u64;
        let samples = expected
            .saturating_mul(2)
            .max(expected.saturating_add(OVERSAMPLE_MARGIN));

        let capacity = usize::try_from(samples)
            .ok()
            .and_then(|n| n.checked_add(SENTINEL_PADDING))
            .ok_or_else(|| {
                SimError::Configuration(format!("{} arrival samples do not fit in memory", samples))
            })?;

        let mut arrivals = Vec::with_capacity(capacity);
        let mut clock = 0u64;
        for _ in 0..samples {
            clock = clock.saturating_add(self.gap_slots(rate, rng));
            arrivals.push(clock);
        }
        // Keep drawing until the schedule covers the whole horizon.
        while clock < horizon {
            clock = clock.saturating_add(self.gap_slots(rate, rng));
            arrivals.push(clock);
        }

        debug!(
            "generated {} arrivals at {} frames/s ({} expected before horizon {})",
            arrivals.len(),
            rate,
            expected,
            horizon
        );
        ArrivalSchedule::from_arrivals(arrivals, horizon)
    }
}
