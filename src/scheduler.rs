//! Slotted arbitration between two contenders sharing one channel.

use std::fmt;

use log::trace;
use rand::Rng;

use crate::config::SimulationConfig;
use crate::error::SimResult;
use crate::node::Node;
use crate::protocol::CostModel;

/// Outcome of processing one slot step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Both contenders drew the same backoff.
    Collision { backoff: u64 },
    /// The node at `node` (0 or 1) delivered a packet.
    Transmitted { node: usize, backoff: u64 },
    /// Nobody had a packet ready.
    Idle,
    /// The clock already reached the horizon; nothing was processed.
    Finished,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Collision { backoff } => write!(f, "Collision (backoff {})", backoff),
            Step::Transmitted { node, backoff } => {
                write!(f, "Node {} Tx (backoff {})", node + 1, backoff)
            }
            Step::Idle => write!(f, "Idle"),
            Step::Finished => write!(f, "Finished"),
        }
    }
}

/// Shared contention bookkeeping for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentionState {
    /// Consecutive collisions since the last delivery.
    pub extension: u32,
    pub collision_counter: u64,
    pub clock: u64,
}

/// Final state of a completed arbitration run.
#[derive(Debug, Clone)]
pub struct ArbitrationOutcome {
    pub node1: Node,
    pub node2: Node,
    pub state: ContentionState,
}

/// Slot-by-slot stepper that arbitrates two contenders under a cost model.
pub struct ArbitrationLoop<'a, C: CostModel> {
    nodes: [Node; 2],
    state: ContentionState,
    horizon: u64,
    cost_model: &'a C,
    config: &'a SimulationConfig,
}

impl<'a, C: CostModel> ArbitrationLoop<'a, C> {
    /// The clock starts at the earlier of the two first arrivals.
    pub fn new(
        node1: Node,
        node2: Node,
        cost_model: &'a C,
        config: &'a SimulationConfig,
    ) -> Self {
        let clock = node1
            .schedule()
            .first_arrival()
            .min(node2.schedule().first_arrival());
        ArbitrationLoop {
            nodes: [node1, node2],
            state: ContentionState {
                clock,
                ..ContentionState::default()
            },
            horizon: config.horizon(),
            cost_model,
            config,
        }
    }

    pub fn state(&self) -> &ContentionState {
        &self.state
    }

    pub fn nodes(&self) -> &[Node; 2] {
        &self.nodes
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    /// Window the next backoff draw uses.
    pub fn current_window(&self) -> u64 {
        self.config.contention_window(self.state.extension)
    }

    pub fn is_finished(&self) -> bool {
        self.state.clock >= self.horizon
    }

    fn transmit(&mut self, winner: usize, backoff: u64) -> Step {
        self.state.clock += self.cost_model.success_cost(backoff);
        self.nodes[winner].commit();
        self.state.extension = 0;
        trace!(
            "T={} node {} delivered packet {} (backoff {})",
            self.state.clock,
            self.nodes[winner].get_id(),
            self.nodes[winner].successes(),
            backoff
        );
        Step::Transmitted { node: winner, backoff }
    }

    /// Processes one contention step at the current clock.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SimResult<Step> {
        if self.is_finished() {
            return Ok(Step::Finished);
        }

        let clock = self.state.clock;
        let ready = [self.nodes[0].is_ready(clock)?, self.nodes[1].is_ready(clock)?];
        let window = self.current_window();

        let step = match ready {
            [true, true] => {
                let b1 = self.nodes[0].ensure_backoff(window, rng);
                let b2 = self.nodes[1].ensure_backoff(window, rng);
                if b1 == b2 {
                    self.state.clock += self.cost_model.collision_cost(b1);
                    self.state.extension += 1;
                    self.state.collision_counter += 1;
                    // Both retry with a fresh draw from the widened window.
                    self.nodes[0].reset_backoff();
                    self.nodes[1].reset_backoff();
                    trace!(
                        "T={} collision #{} on backoff {}, window now {}",
                        self.state.clock,
                        self.state.collision_counter,
                        b1,
                        self.current_window()
                    );
                    Step::Collision { backoff: b1 }
                } else {
                    let (winner, loser, backoff) = if b1 < b2 { (0, 1, b1) } else { (1, 0, b2) };
                    let step = self.transmit(winner, backoff);
                    self.nodes[loser].reduce_backoff(backoff)?;
                    step
                }
            }
            [true, false] => {
                let backoff = self.nodes[0].ensure_backoff(window, rng);
                self.transmit(0, backoff)
            }
            [false, true] => {
                let backoff = self.nodes[1].ensure_backoff(window, rng);
                self.transmit(1, backoff)
            }
            [false, false] => {
                self.state.clock += 1;
                Step::Idle
            }
        };
        Ok(step)
    }

    /// Steps until the clock reaches the horizon.
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> SimResult<ArbitrationOutcome> {
        while !self.is_finished() {
            self.step(rng)?;
        }
        let [node1, node2] = self.nodes;
        Ok(ArbitrationOutcome {
            node1,
            node2,
            state: self.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Backoff;
    use crate::protocol::{Protocol, TimingProfile};
    use crate::traffic::ArrivalSchedule;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Flat costs so clock arithmetic is easy to follow.
    struct FixedCost {
        collision: u64,
        success: u64,
    }

    impl CostModel for FixedCost {
        fn collision_cost(&self, backoff: u64) -> u64 {
            self.collision + backoff
        }
        fn success_cost(&self, backoff: u64) -> u64 {
            self.success + backoff
        }
    }

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            simulation_time: 0.01,
            ..Default::default()
        }
    }

    fn node(id: usize, arrivals: Vec<u64>, config: &SimulationConfig) -> Node {
        Node::new(id, ArrivalSchedule::from_arrivals(arrivals, config.horizon()).unwrap())
    }

    #[test]
    fn clock_starts_at_earliest_arrival() {
        let config = small_config();
        let cost = FixedCost { collision: 5, success: 10 };
        let lp = ArbitrationLoop::new(
            node(1, vec![40, 2000], &config),
            node(2, vec![25, 2000], &config),
            &cost,
            &config,
        );
        assert_eq!(lp.state().clock, 25);
    }

    #[test]
    fn idle_advances_one_slot() {
        let config = small_config();
        let cost = FixedCost { collision: 5, success: 10 };
        let mut lp = ArbitrationLoop::new(
            node(1, vec![10, 2000], &config),
            node(2, vec![10, 2000], &config),
            &cost,
            &config,
        );
        let mut rng = StdRng::seed_from_u64(0);
        lp.state.clock = 3;
        assert_eq!(lp.step(&mut rng).unwrap(), Step::Idle);
        assert_eq!(lp.state().clock, 4);
    }

    #[test]
    fn lone_sender_transmits_immediately() {
        let config = small_config();
        let cost = FixedCost { collision: 5, success: 10 };
        let mut lp = ArbitrationLoop::new(
            node(1, vec![0, 2000], &config),
            node(2, vec![500, 2000], &config),
            &cost,
            &config,
        );
        let mut rng = StdRng::seed_from_u64(0);
        match lp.step(&mut rng).unwrap() {
            Step::Transmitted { node, backoff } => {
                assert_eq!(node, 0);
                assert!(backoff < 4);
                assert_eq!(lp.state().clock, 10 + backoff);
            }
            other => panic!("unexpected step {}", other),
        }
        assert_eq!(lp.nodes()[0].successes(), 1);
        assert_eq!(lp.nodes()[0].backoff(), Backoff::Unset);
    }

    #[test]
    fn collision_widens_window_and_keeps_cursors() {
        let config = small_config();
        let cost = FixedCost { collision: 5, success: 10 };
        let mut lp = ArbitrationLoop::new(
            node(1, vec![0, 2000], &config),
            node(2, vec![0, 2000], &config),
            &cost,
            &config,
        );
        lp.nodes[0].ensure_backoff(1, &mut StdRng::seed_from_u64(0));
        lp.nodes[1].ensure_backoff(1, &mut StdRng::seed_from_u64(0));
        assert_eq!(lp.current_window(), 4);

        let step = lp.step(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(step, Step::Collision { backoff: 0 });
        assert_eq!(lp.state().collision_counter, 1);
        assert_eq!(lp.state().extension, 1);
        assert_eq!(lp.state().clock, 5);
        assert_eq!(lp.current_window(), 8);
        assert_eq!(lp.nodes()[0].cursor(), 0);
        assert_eq!(lp.nodes()[1].cursor(), 0);
        assert_eq!(lp.nodes()[0].backoff(), Backoff::Unset);
    }

    fn force_backoff(n: &mut Node, value: u64, rng: &mut StdRng) {
        n.reset_backoff();
        while n.ensure_backoff(value + 1, rng) != value {
            n.reset_backoff();
        }
    }

    #[test]
    fn winner_credit_is_subtracted_from_loser() {
        let config = small_config();
        let cost = FixedCost { collision: 5, success: 10 };
        let mut lp = ArbitrationLoop::new(
            node(1, vec![0, 2000], &config),
            node(2, vec![0, 2000], &config),
            &cost,
            &config,
        );
        let mut rng = StdRng::seed_from_u64(8);
        lp.state.extension = 2;
        force_backoff(&mut lp.nodes[0], 2, &mut rng);
        force_backoff(&mut lp.nodes[1], 5, &mut rng);

        let step = lp.step(&mut rng).unwrap();
        assert_eq!(step, Step::Transmitted { node: 0, backoff: 2 });
        assert_eq!(lp.state().clock, 12);
        assert_eq!(lp.state().extension, 0);
        assert_eq!(lp.nodes()[1].backoff(), Backoff::Pending(3));

        // Node 1 is now alone and spends its remaining credit.
        let step = lp.step(&mut rng).unwrap();
        assert_eq!(step, Step::Transmitted { node: 1, backoff: 3 });
        assert_eq!(lp.state().clock, 25);
    }

    #[test]
    fn run_reaches_horizon_with_real_profile() {
        let config = SimulationConfig {
            simulation_time: 0.5,
            protocol: Protocol::RtsCts,
            ..Default::default()
        };
        let profile = TimingProfile::from_config(&config);
        let mut rng = StdRng::seed_from_u64(42);
        let generator = crate::traffic::TrafficGenerator::new(&config);
        let n1 = Node::new(1, generator.generate(700.0, &mut rng).unwrap());
        let n2 = Node::new(2, generator.generate(700.0, &mut rng).unwrap());
        let outcome = ArbitrationLoop::new(n1, n2, &profile, &config)
            .run(&mut rng)
            .unwrap();
        assert!(outcome.state.clock >= config.horizon());
        assert!(outcome.node1.successes() > 0);
        assert!(outcome.node2.successes() > 0);
    }

    #[test]
    fn finished_loop_does_nothing() {
        let config = small_config();
        let cost = FixedCost { collision: 5, success: 10 };
        let mut lp = ArbitrationLoop::new(
            node(1, vec![0], &config),
            node(2, vec![0], &config),
            &cost,
            &config,
        );
        lp.state.clock = config.horizon();
        assert_eq!(lp.step(&mut StdRng::seed_from_u64(0)).unwrap(), Step::Finished);
        assert_eq!(lp.state().collision_counter, 0);
    }
}
