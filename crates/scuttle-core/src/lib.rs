//! Scuttle Core -- a timed, cancellable self-destruct sequencer for
//! part-tree vessels.
//!
//! The crate provides a deterministic, tick-driven engine around two
//! cooperating components: a countdown [`sequencer::Sequencer`] (arm,
//! periodic feedback, abort) and a [`demolition::DemolitionPlanner`] that
//! tears a vessel down children-first, sparing the root and the initiating
//! part until the very end.
//!
//! # Five-Phase Step
//!
//! Each call to [`engine::Engine::step`] advances the sequence by one tick
//! through the following phases:
//!
//! 1. **Commands** -- Drain externally-submitted triggers (arm, abort,
//!    staging, immediate detonations).
//! 2. **Countdown** -- Poll the countdown state machine; expiry installs
//!    the demolition planner.
//! 3. **Demolition** -- One removal step while detonating.
//! 4. **Display** -- Reconcile and expire the live status notice.
//! 5. **Bookkeeping** -- Settlement check, tick counter, state hash.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns the vessel and orchestrates the pipeline.
//! - [`vessel::Vessel`] -- Rooted part tree with slotmap-keyed parts.
//! - [`sequencer::Sequencer`] -- Idle/Counting/Detonating state machine.
//! - [`demolition::DemolitionPlanner`] -- Leaf-first teardown with a
//!   forced-termination fallback.
//! - [`command::CommandQueue`] -- Tick-boundary trigger queue.
//! - [`event::EventBus`] -- Buffered typed sequencing events.
//! - [`status::StatusSink`] -- Optional host display surface; timing never
//!   depends on it.
//! - [`serialize`] -- Versioned snapshot support via bitcode.

pub mod command;
pub mod demolition;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod id;
pub mod sequencer;
pub mod serialize;
pub mod settings;
pub mod sim;
pub mod status;
pub mod vessel;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
