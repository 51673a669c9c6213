//! The countdown state machine: arm, count down with periodic feedback,
//! abort, hand off to demolition.
//!
//! The sequencer is a polled state machine, not a timer: the engine polls it
//! every tick, and it acts only at poll boundaries (every
//! [`STATUS_POLL_TICKS`] ticks of elapsed time), matching the 0.2 s suspend
//! interval of the countdown loop. The abort flag and the deadline are both
//! observed there, so an abort requested between boundaries is honored within
//! one interval. Once `Detonating`, the sequencer is terminal: demolition is
//! deliberately not cancellable.

use crate::fixed::{Ticks, ticks_to_whole_seconds};
use serde::{Deserialize, Serialize};

/// Elapsed ticks between countdown polls (0.2 s at the fixed tick rate).
pub const STATUS_POLL_TICKS: Ticks = 2;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Countdown state. Arming captures the configured delay, so `Counting`
/// carries everything elapsed-time checks need.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownState {
    /// No countdown is running.
    #[default]
    Idle,
    /// Counting down toward detonation.
    Counting {
        /// Tick at which the countdown was armed.
        armed_at: Ticks,
        /// Delay captured from settings at arm time, in ticks.
        delay_ticks: Ticks,
    },
    /// The countdown expired. Terminal.
    Detonating,
}

/// Outcome of an arm request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// The countdown was started.
    Armed,
    /// A sequence was already running; the duplicate trigger was ignored.
    Ignored,
}

/// Outcome of a single countdown poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPoll {
    /// Nothing to do: idle, detonating, or between poll boundaries.
    Waiting,
    /// A status update is due.
    StatusDue {
        /// Whole seconds remaining, rounded up.
        remaining_seconds: u64,
        /// Exact ticks remaining.
        remaining_ticks: Ticks,
    },
    /// The abort flag was observed; the sequencer reset to idle.
    Aborted,
    /// The delay elapsed; the sequencer transitioned to detonating.
    Expired,
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Owns the arm -> countdown -> (detonate | abort) state machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sequencer {
    state: CountdownState,
    abort_requested: bool,
}

impl Sequencer {
    /// Create a new sequencer in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current countdown state.
    pub fn state(&self) -> CountdownState {
        self.state
    }

    /// Whether a countdown is currently running.
    pub fn is_counting(&self) -> bool {
        matches!(self.state, CountdownState::Counting { .. })
    }

    /// Whether the countdown has expired and demolition is under way.
    pub fn is_detonating(&self) -> bool {
        matches!(self.state, CountdownState::Detonating)
    }

    /// Start the countdown. Re-arming while a sequence is running is a
    /// benign duplicate trigger and is ignored, not queued: an action and an
    /// automatic activation can fire together.
    pub fn arm(&mut self, now: Ticks, delay_ticks: Ticks) -> ArmOutcome {
        match self.state {
            CountdownState::Idle => {
                self.state = CountdownState::Counting {
                    armed_at: now,
                    delay_ticks,
                };
                self.abort_requested = false;
                ArmOutcome::Armed
            }
            CountdownState::Counting { .. } | CountdownState::Detonating => ArmOutcome::Ignored,
        }
    }

    /// Request cancellation of a running countdown. No-op otherwise. The
    /// flag is honored at the next poll boundary.
    pub fn request_abort(&mut self) {
        if self.is_counting() {
            self.abort_requested = true;
        }
    }

    /// Advance the countdown by one tick of observation.
    pub fn poll(&mut self, now: Ticks) -> CountdownPoll {
        let CountdownState::Counting {
            armed_at,
            delay_ticks,
        } = self.state
        else {
            return CountdownPoll::Waiting;
        };

        let elapsed = now.saturating_sub(armed_at);
        if elapsed % STATUS_POLL_TICKS != 0 {
            return CountdownPoll::Waiting;
        }

        if self.abort_requested {
            // Reset: dropping Counting also drops the recorded start time.
            self.state = CountdownState::Idle;
            self.abort_requested = false;
            return CountdownPoll::Aborted;
        }

        if elapsed >= delay_ticks {
            self.state = CountdownState::Detonating;
            return CountdownPoll::Expired;
        }

        let remaining_ticks = delay_ticks - elapsed;
        CountdownPoll::StatusDue {
            remaining_seconds: ticks_to_whole_seconds(remaining_ticks),
            remaining_ticks,
        }
    }
}
