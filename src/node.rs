use std::fmt;

use rand::Rng;

use crate::error::{SimError, SimResult};
use crate::traffic::ArrivalSchedule;

/// Backoff state of a contender.
#[derive(Debug, Hash, Eq, Clone, Copy, PartialEq)]
pub enum Backoff {
    Unset,
    Pending(u64),
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::Unset => write!(f, "Unset"),
            Backoff::Pending(slots) => write!(f, "Pending({})", slots),
        }
    }
}

/// One contender: its arrival schedule, a cursor to the next unsent
/// packet and the current backoff.
#[derive(Debug, Clone)]
pub struct Node {
    id: usize,
    schedule: ArrivalSchedule,
    cursor: usize,
    backoff: Backoff,
}

impl Node {
    pub fn new(id: usize, schedule: ArrivalSchedule) -> Node {
        Node {
            id,
            schedule,
            cursor: 0,
            backoff: Backoff::Unset,
        }
    }

    pub fn get_id(&self) -> usize {
        self.id
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Packets delivered so far.
    pub fn successes(&self) -> usize {
        self.cursor
    }

    pub fn schedule(&self) -> &ArrivalSchedule {
        &self.schedule
    }

    pub fn next_arrival(&self) -> SimResult<u64> {
        self.schedule.slot_at(self.cursor)
    }

    /// True when the next unsent packet has arrived by `clock`.
    pub fn is_ready(&self, clock: u64) -> SimResult<bool> {
        Ok(self.next_arrival()? <= clock)
    }

    /// Draws a backoff in `[0, window - 1]` unless one is already pending,
    /// and returns the pending value.
    pub fn ensure_backoff<R: Rng + ?Sized>(&mut self, window: u64, rng: &mut R) -> u64 {
        match self.backoff {
            Backoff::Pending(slots) => slots,
            Backoff::Unset => {
                let slots = rng.gen_range(0..window.max(1));
                self.backoff = Backoff::Pending(slots);
                slots
            }
        }
    }

    /// Marks the current packet as delivered.
    pub fn commit(&mut self) {
        self.cursor += 1;
        self.backoff = Backoff::Unset;
    }

    /// Drops a pending backoff so the next contention draws from the
    /// current window.
    pub fn reset_backoff(&mut self) {
        self.backoff = Backoff::Unset;
    }

    /// Credits slots already counted down while another node held the channel.
    pub fn reduce_backoff(&mut self, amount: u64) -> SimResult<()> {
        if let Backoff::Pending(slots) = self.backoff {
            let remaining = slots
                .checked_sub(amount)
                .ok_or(SimError::BackoffUnderflow { backoff: slots, amount })?;
            self.backoff = Backoff::Pending(remaining);
        }
        Ok(())
    }
}
