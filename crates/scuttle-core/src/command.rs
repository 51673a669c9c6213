//! Trigger surface for externally-submitted commands.
//!
//! Triggers come from the host in any order (a user action, an automatic
//! activation, a grouped dispatch) and are queued, then executed at the
//! start of the next tick to maintain determinism. Guard checks happen at
//! dispatch, not submission: an arm submitted while a countdown is running
//! is drained and silently ignored.

use crate::fixed::Fixed64;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single externally-submitted trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Start the self-destruct countdown. Duplicate triggers while a
    /// sequence is running are ignored.
    ArmSelfDestruct,
    /// Request cancellation of a running countdown. No-op otherwise.
    AbortSelfDestruct,
    /// Destroy the initiator's parent and the initiator immediately, with
    /// no countdown. Ignored while a sequence is running.
    DetonateParent,
    /// Destroy just the initiator immediately. Ignored while a sequence is
    /// running.
    ExplodeSelf,
    /// Staging activation; dispatches per the configured staging mode.
    ActivateStage,
    /// Change the configured countdown delay (clamped into the valid
    /// range). A countdown already running keeps the delay it captured.
    SetDelay { seconds: Fixed64 },
}

// ---------------------------------------------------------------------------
// TriggerState
// ---------------------------------------------------------------------------

/// Which triggers the engine currently accepts. Mirrors how a host would
/// enable and disable its action UI as the sequence starts and stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerState {
    pub arm: bool,
    pub abort: bool,
    pub detonate_parent: bool,
    pub explode_self: bool,
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// A queue of commands waiting to be executed at the next tick boundary.
///
/// Supports optional bounded history for replay and debugging.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
    /// History of executed commands: (tick, command).
    history: Vec<(u64, Command)>,
    /// Maximum history entries to retain. 0 = no history.
    max_history: usize,
}

impl CommandQueue {
    /// Create a new empty queue with no history tracking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that retains up to `max_history` executed entries.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    /// Push a single command onto the queue.
    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    /// Push multiple commands onto the queue at once.
    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Drain all pending commands, moving them to history with the given
    /// tick. Returns the drained commands in submission order.
    pub fn drain(&mut self, tick: u64) -> Vec<Command> {
        let commands: Vec<Command> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            for cmd in &commands {
                self.history.push((tick, cmd.clone()));
            }
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        commands
    }

    /// Number of commands waiting to be executed.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue has no pending commands.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Get the executed-command history (tick, command) pairs.
    pub fn history(&self) -> &[(u64, Command)] {
        &self.history
    }

    /// Clear all history entries.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_queue_is_empty() {
        let queue = CommandQueue::new();
        assert_eq!(queue.pending_count(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_preserves_submission_order() {
        let mut queue = CommandQueue::new();
        queue.push(Command::ArmSelfDestruct);
        queue.push(Command::AbortSelfDestruct);
        queue.push(Command::SetDelay {
            seconds: Fixed64::from_num(30),
        });

        let drained = queue.drain(0);
        assert_eq!(drained.len(), 3);
        assert!(matches!(drained[0], Command::ArmSelfDestruct));
        assert!(matches!(drained[1], Command::AbortSelfDestruct));
        assert!(matches!(drained[2], Command::SetDelay { .. }));
        assert!(queue.is_empty());
    }

    #[test]
    fn push_batch() {
        let mut queue = CommandQueue::new();
        queue.push_batch([Command::ActivateStage, Command::ExplodeSelf, Command::DetonateParent]);
        assert_eq!(queue.pending_count(), 3);
    }

    #[test]
    fn history_records_drain_tick() {
        let mut queue = CommandQueue::with_max_history(100);
        queue.push(Command::ArmSelfDestruct);
        queue.push(Command::AbortSelfDestruct);
        let _ = queue.drain(42);

        let history = queue.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].0, 42);
        assert!(matches!(history[0].1, Command::ArmSelfDestruct));
    }

    #[test]
    fn history_trims_oldest() {
        let mut queue = CommandQueue::with_max_history(2);
        queue.push(Command::ArmSelfDestruct);
        queue.push(Command::AbortSelfDestruct);
        let _ = queue.drain(1);
        queue.push(Command::ActivateStage);
        let _ = queue.drain(2);

        let history = queue.history();
        assert_eq!(history.len(), 2);
        assert!(matches!(history[0].1, Command::AbortSelfDestruct));
        assert!(matches!(history[1].1, Command::ActivateStage));
    }

    #[test]
    fn no_history_by_default() {
        let mut queue = CommandQueue::new();
        queue.push(Command::ArmSelfDestruct);
        let _ = queue.drain(10);
        assert!(queue.history().is_empty());
    }

    #[test]
    fn clear_history() {
        let mut queue = CommandQueue::with_max_history(10);
        queue.push(Command::ArmSelfDestruct);
        let _ = queue.drain(5);
        assert!(!queue.history().is_empty());
        queue.clear_history();
        assert!(queue.history().is_empty());
    }
}
