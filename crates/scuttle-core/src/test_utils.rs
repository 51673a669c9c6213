//! Shared test helpers for integration tests and property tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests and, via the `test-utils` feature, in
//! integration and property tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::id::{PartId, PartTypeId};
use crate::settings::DestructSettings;
use crate::sim::SimulationStrategy;
use crate::status::{StatusMessage, StatusSink};
use crate::vessel::Vessel;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Part type constructors
// ===========================================================================

pub fn pod() -> PartTypeId {
    PartTypeId(0)
}
pub fn tank() -> PartTypeId {
    PartTypeId(1)
}
pub fn strut() -> PartTypeId {
    PartTypeId(2)
}
pub fn charge() -> PartTypeId {
    PartTypeId(3)
}

// ===========================================================================
// Vessel builders
// ===========================================================================

/// The four-part tree used throughout the scenario tests:
/// Root, A(child of Root), B(child of A), Initiator(child of Root).
pub struct FourPartVessel {
    pub vessel: Vessel,
    pub root: PartId,
    pub a: PartId,
    pub b: PartId,
    pub initiator: PartId,
}

pub fn four_part_vessel() -> FourPartVessel {
    let mut vessel = Vessel::new();
    let root = vessel.add_root(pod()).unwrap();
    let a = vessel.attach(tank(), root).unwrap();
    let b = vessel.attach(strut(), a).unwrap();
    let initiator = vessel.attach(charge(), root).unwrap();
    FourPartVessel {
        vessel,
        root,
        a,
        b,
        initiator,
    }
}

// ===========================================================================
// Engine builders
// ===========================================================================

pub struct TestEngine {
    pub engine: Engine,
    pub root: PartId,
    pub a: PartId,
    pub b: PartId,
    pub initiator: PartId,
}

pub fn settings_with_delay(seconds: f64) -> DestructSettings {
    DestructSettings {
        delay_seconds: fixed(seconds),
        ..DestructSettings::default()
    }
}

/// Engine over the four-part vessel, tick strategy, given delay.
pub fn four_part_engine(delay_seconds: f64) -> TestEngine {
    let parts = four_part_vessel();
    let engine = Engine::new(
        parts.vessel,
        parts.initiator,
        settings_with_delay(delay_seconds),
        SimulationStrategy::Tick,
    )
    .unwrap();
    TestEngine {
        engine,
        root: parts.root,
        a: parts.a,
        b: parts.b,
        initiator: parts.initiator,
    }
}

// ===========================================================================
// Recording status sink
// ===========================================================================

#[derive(Debug, Default)]
struct SinkLog {
    unavailable: bool,
    shown: Vec<StatusMessage>,
    retire_count: u32,
}

/// Status sink that records every call. Clone one handle into the engine
/// and keep another for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<SinkLog>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message shown so far, oldest first.
    pub fn shown(&self) -> Vec<StatusMessage> {
        self.log.borrow().shown.clone()
    }

    /// The most recently shown message.
    pub fn last_shown(&self) -> Option<StatusMessage> {
        self.log.borrow().shown.last().cloned()
    }

    /// How many times the surface was asked to retire its message.
    pub fn retire_count(&self) -> u32 {
        self.log.borrow().retire_count
    }

    /// Simulate the display surface being hidden or shown.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.log.borrow_mut().unavailable = unavailable;
    }
}

impl StatusSink for RecordingSink {
    fn is_available(&self) -> bool {
        !self.log.borrow().unavailable
    }

    fn show(&mut self, message: &StatusMessage) {
        self.log.borrow_mut().shown.push(message.clone());
    }

    fn retire(&mut self) {
        self.log.borrow_mut().retire_count += 1;
    }
}
