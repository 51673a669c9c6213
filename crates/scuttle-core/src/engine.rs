//! The sequencing engine: owns the vessel and orchestrates the five-phase
//! step pipeline.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A [`Vessel`] (the part tree) and the id of the host part carrying the
//!   sequencer
//! - A [`Sequencer`] (countdown state machine) and, once a countdown
//!   expires, an active [`DemolitionPlanner`]
//! - A [`CommandQueue`] for externally-submitted triggers
//! - An [`EventBus`] for typed sequencing events
//! - A [`CountdownDisplay`] slot and an optional boxed [`StatusSink`]
//! - [`DestructSettings`], a [`SimState`] and a [`SimulationStrategy`]
//!
//! # Five-Phase Step
//!
//! Each `step()` runs:
//! 1. **Commands** -- drain queued triggers and dispatch them.
//! 2. **Countdown** -- poll the sequencer; an expiry installs the planner.
//! 3. **Demolition** -- one removal step while detonating.
//! 4. **Display** -- expire the live notice once its duration elapses.
//! 5. **Bookkeeping** -- settlement check, tick counter, state hash.
//!
//! Everything runs single-threaded and cooperatively: the host's frame loop
//! drives `step()`/`advance()`, and the two wait intervals of the sequence
//! (status poll, inter-removal gap) fall out of the fixed tick rate.

use crate::command::{Command, CommandQueue, TriggerState};
use crate::demolition::DemolitionPlanner;
use crate::event::{Event, EventBus};
use crate::fixed::{Ticks, seconds_to_ticks};
use crate::id::PartId;
use crate::sequencer::{ArmOutcome, CountdownPoll, CountdownState, Sequencer};
use crate::settings::{DestructSettings, StagingMode};
use crate::sim::{AdvanceResult, SimState, SimulationStrategy, StateHash};
use crate::status::{CountdownDisplay, StatusSink};
use crate::vessel::{Vessel, VesselError};
use slotmap::Key;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The sequencing engine. Drives one self-destruct sequence over one vessel.
#[derive(Debug)]
pub struct Engine {
    pub(crate) vessel: Vessel,
    /// The part hosting the sequencer. Spared by the planner until last.
    pub(crate) host_part: PartId,
    pub(crate) sequencer: Sequencer,
    /// Installed when the countdown expires; never removed afterwards.
    pub(crate) planner: Option<DemolitionPlanner>,
    pub(crate) commands: CommandQueue,
    pub(crate) event_bus: EventBus,
    pub(crate) display: CountdownDisplay,
    pub(crate) status_sink: Option<Box<dyn StatusSink>>,
    pub(crate) settings: DestructSettings,
    pub(crate) strategy: SimulationStrategy,
    pub(crate) sim_state: SimState,
    /// Set once the vessel has been fully cleared.
    pub(crate) settled: bool,
    pub(crate) last_state_hash: u64,
}

impl Engine {
    /// Create an engine over a vessel. `host_part` must be a part of the
    /// vessel; it is the part whose triggers drive the sequence.
    pub fn new(
        vessel: Vessel,
        host_part: PartId,
        settings: DestructSettings,
        strategy: SimulationStrategy,
    ) -> Result<Self, VesselError> {
        if !vessel.contains(host_part) {
            return Err(VesselError::PartNotFound(host_part));
        }
        let mut engine = Self {
            vessel,
            host_part,
            sequencer: Sequencer::new(),
            planner: None,
            commands: CommandQueue::new(),
            event_bus: EventBus::new(),
            display: CountdownDisplay::default(),
            status_sink: None,
            settings,
            strategy,
            sim_state: SimState::new(),
            settled: false,
            last_state_hash: 0,
        };
        engine.last_state_hash = engine.compute_state_hash();
        Ok(engine)
    }

    // -----------------------------------------------------------------------
    // Host surface
    // -----------------------------------------------------------------------

    /// Submit a trigger; it executes at the start of the next step.
    pub fn submit(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Submit several triggers at once.
    pub fn submit_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.commands.push_batch(commands);
    }

    /// Attach (or replace) the status display surface.
    pub fn attach_status_sink(&mut self, sink: Box<dyn StatusSink>) {
        self.status_sink = Some(sink);
    }

    /// Detach the status display surface. Timing is unaffected.
    pub fn detach_status_sink(&mut self) {
        self.status_sink = None;
    }

    /// Take all buffered events, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.event_bus.drain()
    }

    /// The vessel under sequencing.
    pub fn vessel(&self) -> &Vessel {
        &self.vessel
    }

    /// The part hosting the sequencer.
    pub fn host_part(&self) -> PartId {
        self.host_part
    }

    /// The current countdown state.
    pub fn countdown_state(&self) -> CountdownState {
        self.sequencer.state()
    }

    /// Whether the vessel has been fully cleared.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// The current settings.
    pub fn settings(&self) -> &DestructSettings {
        &self.settings
    }

    /// Mutable settings access. The countdown delay is only read at arm
    /// time, so changes during a countdown take effect on the next arm.
    pub fn settings_mut(&mut self) -> &mut DestructSettings {
        &mut self.settings
    }

    /// The currently live status message, if any.
    pub fn live_status(&self) -> Option<&crate::status::StatusMessage> {
        self.display.live()
    }

    /// Current tick counter.
    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    /// The state hash computed at the end of the most recent step.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    /// Which triggers are currently accepted.
    pub fn trigger_state(&self) -> TriggerState {
        match self.sequencer.state() {
            CountdownState::Idle => TriggerState {
                arm: true,
                abort: false,
                detonate_parent: true,
                explode_self: true,
            },
            CountdownState::Counting { .. } => TriggerState {
                arm: false,
                abort: true,
                detonate_parent: false,
                explode_self: false,
            },
            CountdownState::Detonating => TriggerState {
                arm: false,
                abort: false,
                detonate_parent: false,
                explode_self: false,
            },
        }
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Run exactly one simulation step.
    pub fn step(&mut self) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        self.step_internal(&mut result);
        result
    }

    /// Advance per the configured strategy: one step in tick mode, or as
    /// many fixed steps as `dt` accumulates to in delta mode.
    pub fn advance(&mut self, dt: Ticks) -> AdvanceResult {
        match self.strategy {
            SimulationStrategy::Tick => self.step(),
            SimulationStrategy::Delta { fixed_timestep } => {
                let mut result = AdvanceResult::default();
                let timestep = fixed_timestep.max(1);
                self.sim_state.accumulator += dt;
                while self.sim_state.accumulator >= timestep {
                    self.sim_state.accumulator -= timestep;
                    self.step_internal(&mut result);
                }
                result
            }
        }
    }

    fn step_internal(&mut self, result: &mut AdvanceResult) {
        let now = self.sim_state.tick;

        // Phase 1: Commands -- drain queued triggers.
        self.phase_commands(now);

        // Phase 2: Countdown -- poll the sequencer.
        self.phase_countdown(now);

        // Phase 3: Demolition -- one removal step while detonating.
        self.phase_demolition(now);

        // Phase 4: Display -- expire the live notice if due.
        self.phase_display(now);

        // Phase 5: Bookkeeping -- settlement, tick counter, state hash.
        self.phase_bookkeeping(now);

        result.steps_run += 1;
    }

    // -----------------------------------------------------------------------
    // Phase 1: Commands
    // -----------------------------------------------------------------------

    fn phase_commands(&mut self, now: Ticks) {
        for command in self.commands.drain(now) {
            match command {
                Command::ArmSelfDestruct => self.dispatch_arm(now),
                Command::AbortSelfDestruct => self.sequencer.request_abort(),
                Command::DetonateParent => self.dispatch_detonate_parent(now),
                Command::ExplodeSelf => self.dispatch_explode_self(now),
                Command::ActivateStage => self.dispatch_stage(now),
                Command::SetDelay { seconds } => self.settings.set_delay_seconds(seconds),
            }
        }
    }

    fn dispatch_arm(&mut self, now: Ticks) {
        let delay_ticks = seconds_to_ticks(self.settings.effective_delay());
        match self.sequencer.arm(now, delay_ticks) {
            ArmOutcome::Armed => {
                log::info!("self destruct armed, {delay_ticks} ticks on the clock");
                self.event_bus.emit(Event::SequenceArmed {
                    part: self.host_part,
                    tick: now,
                });
                self.display.post_initiated(
                    now,
                    delay_ticks,
                    self.settings.show_countdown,
                    self.status_sink.as_deref_mut(),
                );
            }
            ArmOutcome::Ignored => {}
        }
    }

    fn dispatch_detonate_parent(&mut self, now: Ticks) {
        if self.sequencer.state() != CountdownState::Idle {
            return;
        }
        if let Some(parent) = self.vessel.parent(self.host_part) {
            if self.vessel.destroy_part(parent).is_ok() {
                self.event_bus.emit(Event::PartDestroyed { part: parent, tick: now });
            }
        }
        if self.vessel.destroy_part(self.host_part).is_ok() {
            self.event_bus.emit(Event::PartDestroyed {
                part: self.host_part,
                tick: now,
            });
        }
    }

    fn dispatch_explode_self(&mut self, now: Ticks) {
        if self.sequencer.state() != CountdownState::Idle {
            return;
        }
        if self.vessel.destroy_part(self.host_part).is_ok() {
            self.event_bus.emit(Event::PartDestroyed {
                part: self.host_part,
                tick: now,
            });
        }
    }

    fn dispatch_stage(&mut self, now: Ticks) {
        if !self.settings.can_stage || self.sequencer.state() != CountdownState::Idle {
            return;
        }
        let mode = self.settings.staging_mode;
        self.event_bus.emit(Event::StageActivated { mode, tick: now });
        match mode {
            StagingMode::SelfDestruct => self.dispatch_arm(now),
            StagingMode::DetonateParent => self.dispatch_detonate_parent(now),
        }
    }

    // -----------------------------------------------------------------------
    // Phase 2: Countdown
    // -----------------------------------------------------------------------

    fn phase_countdown(&mut self, now: Ticks) {
        match self.sequencer.poll(now) {
            CountdownPoll::Waiting => {}
            CountdownPoll::StatusDue {
                remaining_seconds,
                remaining_ticks,
            } => {
                self.event_bus.emit(Event::CountdownTick {
                    remaining_seconds,
                    tick: now,
                });
                self.display.refresh_countdown(
                    now,
                    remaining_seconds,
                    remaining_ticks,
                    self.settings.show_countdown,
                    self.status_sink.as_deref_mut(),
                );
            }
            CountdownPoll::Aborted => {
                log::info!("self destruct sequence stopped");
                self.event_bus.emit(Event::SequenceAborted { tick: now });
                self.display.post_stopped(now, self.status_sink.as_deref_mut());
            }
            CountdownPoll::Expired => {
                log::info!("countdown expired, demolition starting");
                self.event_bus.emit(Event::DetonationStarted { tick: now });
                self.planner = Some(DemolitionPlanner::new(self.host_part));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 3: Demolition
    // -----------------------------------------------------------------------

    fn phase_demolition(&mut self, now: Ticks) {
        if self.settled {
            return;
        }
        let Some(planner) = &self.planner else { return };
        planner.step(&mut self.vessel, now, &mut self.event_bus);
    }

    // -----------------------------------------------------------------------
    // Phase 4: Display
    // -----------------------------------------------------------------------

    fn phase_display(&mut self, now: Ticks) {
        self.display.expire(now, self.status_sink.as_deref_mut());
    }

    // -----------------------------------------------------------------------
    // Phase 5: Bookkeeping
    // -----------------------------------------------------------------------

    fn phase_bookkeeping(&mut self, now: Ticks) {
        if !self.settled && self.vessel.is_empty() {
            self.settled = true;
            log::info!("vessel cleared at tick {now}");
            self.event_bus.emit(Event::VesselCleared { tick: now });
        }
        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();
    }

    pub(crate) fn compute_state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        match self.sequencer.state() {
            CountdownState::Idle => hash.write_u32(0),
            CountdownState::Counting {
                armed_at,
                delay_ticks,
            } => {
                hash.write_u32(1);
                hash.write_u64(armed_at);
                hash.write_u64(delay_ticks);
            }
            CountdownState::Detonating => hash.write_u32(2),
        }
        hash.write_fixed64(self.settings.delay_seconds);
        hash.write_u64(self.vessel.part_count() as u64);
        let mut ids: Vec<u64> = self.vessel.parts().map(|(id, _)| id.data().as_ffi()).collect();
        ids.sort_unstable();
        for id in ids {
            hash.write_u64(id);
        }
        hash.write_u32(self.settled as u32);
        hash.finish()
    }
}
