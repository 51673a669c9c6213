//! Typed sequencing events with buffered delivery.
//!
//! Events are emitted during the step phases and drained by the host after
//! stepping. The bus is a plain buffer; nothing in this domain needs
//! bounded-memory event streams, and the host is expected to drain every
//! step (or whenever it cares to catch up).

use crate::fixed::Ticks;
use crate::id::PartId;
use crate::settings::StagingMode;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A sequencing event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A countdown was started on the given part.
    SequenceArmed { part: PartId, tick: Ticks },
    /// Periodic countdown feedback, whole seconds remaining.
    CountdownTick { remaining_seconds: u64, tick: Ticks },
    /// A running countdown was cancelled and the sequencer reset.
    SequenceAborted { tick: Ticks },
    /// The countdown expired; demolition has begun.
    DetonationStarted { tick: Ticks },
    /// A part was destroyed and removed from the vessel.
    PartDestroyed { part: PartId, tick: Ticks },
    /// The vessel's part collection is empty.
    VesselCleared { tick: Ticks },
    /// Staging activated this part; the mode says what was dispatched.
    StageActivated { mode: StagingMode, tick: Ticks },
}

/// Discriminant tag for event types, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SequenceArmed,
    CountdownTick,
    SequenceAborted,
    DetonationStarted,
    PartDestroyed,
    VesselCleared,
    StageActivated,
}

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::SequenceArmed { .. } => EventKind::SequenceArmed,
            Event::CountdownTick { .. } => EventKind::CountdownTick,
            Event::SequenceAborted { .. } => EventKind::SequenceAborted,
            Event::DetonationStarted { .. } => EventKind::DetonationStarted,
            Event::PartDestroyed { .. } => EventKind::PartDestroyed,
            Event::VesselCleared { .. } => EventKind::VesselCleared,
            Event::StageActivated { .. } => EventKind::StageActivated,
        }
    }

    /// The tick at which the event occurred.
    pub fn tick(&self) -> Ticks {
        match *self {
            Event::SequenceArmed { tick, .. }
            | Event::CountdownTick { tick, .. }
            | Event::SequenceAborted { tick }
            | Event::DetonationStarted { tick }
            | Event::PartDestroyed { tick, .. }
            | Event::VesselCleared { tick }
            | Event::StageActivated { tick, .. } => tick,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Buffered event bus. Emitters push during a step; the host drains after.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    /// Create a new, empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an event for delivery.
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Take all buffered events, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are buffered.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate buffered events without draining them.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}
