//! HID idle-rate bookkeeping.
//!
//! The host sets an idle rate in 4 ms units (SET_IDLE); 0 disables idle
//! retransmission.  A fixed ≈22 ms hardware tick drains a counter by
//! `IDLE_UNITS_PER_TICK` units; when the counter can no longer absorb a
//! full tick it is reloaded from the rate and a retransmission is due.
//!
//! The threshold is "more than `IDLE_UNITS_PER_TICK - 1` units left",
//! so a rate of R fires every `R / 5 + 1` ticks, not every `R * 4 / 22`.

use crate::config::IDLE_UNITS_PER_TICK;

/// Source of the periodic hardware tick.
pub trait TickSource {
    /// True once per elapsed period; reading clears the flag.
    fn take_elapsed(&mut self) -> bool;
}

/// Idle rate plus the countdown that paces forced reports.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IdleTimer {
    /// Host-configured rate, 4 ms units.  0 = report on change only.
    rate: u8,
    /// Units left before the next forced report.  Unused while `rate == 0`.
    counter: u8,
}

impl IdleTimer {
    pub const fn new() -> Self {
        Self {
            rate: 0,
            counter: 0,
        }
    }

    pub const fn rate(&self) -> u8 {
        self.rate
    }

    /// The rate byte itself, for handing to the control pipe.
    pub fn rate_ref(&self) -> &u8 {
        &self.rate
    }

    /// Set by SET_IDLE.  The running countdown is left alone.
    pub fn set_rate(&mut self, rate: u8) {
        self.rate = rate;
    }

    /// Advance by one hardware tick.  Returns `true` when a report must be
    /// resent even if nothing changed.
    pub fn tick(&mut self) -> bool {
        if self.rate == 0 {
            return false;
        }
        if self.counter > IDLE_UNITS_PER_TICK - 1 {
            self.counter -= IDLE_UNITS_PER_TICK;
            false
        } else {
            self.counter = self.rate;
            true
        }
    }
}
