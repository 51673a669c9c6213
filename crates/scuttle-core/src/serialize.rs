//! Versioned snapshot serialization for the sequencing engine.
//!
//! Snapshots are binary (`bitcode`) with a small validated header, so format
//! and version mismatches are caught before the payload is decoded. The
//! snapshot captures everything the sequence needs to resume (settings, sim
//! state, sequencer state, active planner and vessel) but not the host-owned
//! pieces: the status sink, pending commands and undrained events.

use crate::command::CommandQueue;
use crate::demolition::DemolitionPlanner;
use crate::engine::Engine;
use crate::event::EventBus;
use crate::id::PartId;
use crate::sequencer::Sequencer;
use crate::settings::DestructSettings;
use crate::sim::{SimState, SimulationStrategy};
use crate::status::CountdownDisplay;
use crate::vessel::Vessel;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a scuttle engine snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x5C07_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during snapshot encode/decode.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("data too short for snapshot header")]
    TooShort,
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {FORMAT_VERSION}, got {0}")]
    UnsupportedVersion(u32),
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic number for format detection.
    pub magic: u32,
    /// Format version for forward compatibility.
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    /// Validate the header. Returns `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version != FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct SnapshotPayload {
    settings: DestructSettings,
    strategy: SimulationStrategy,
    sim_state: SimState,
    sequencer: Sequencer,
    planner: Option<DemolitionPlanner>,
    vessel: Vessel,
    host_part: PartId,
    settled: bool,
}

// ---------------------------------------------------------------------------
// Save / load
// ---------------------------------------------------------------------------

/// Serialize an engine snapshot: length-prefixed header, then payload.
pub fn save(engine: &Engine) -> Result<Vec<u8>, SnapshotError> {
    let header = SnapshotHeader::new(engine.tick());
    let payload = SnapshotPayload {
        settings: engine.settings.clone(),
        strategy: engine.strategy.clone(),
        sim_state: engine.sim_state.clone(),
        sequencer: engine.sequencer.clone(),
        planner: engine.planner.clone(),
        vessel: engine.vessel.clone(),
        host_part: engine.host_part,
        settled: engine.settled,
    };

    let header_bytes =
        bitcode::serialize(&header).map_err(|e| SnapshotError::Encode(e.to_string()))?;
    let payload_bytes =
        bitcode::serialize(&payload).map_err(|e| SnapshotError::Encode(e.to_string()))?;

    let mut out = Vec::with_capacity(4 + header_bytes.len() + payload_bytes.len());
    out.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&payload_bytes);
    Ok(out)
}

/// Decode a snapshot back into an engine. The restored engine has no status
/// sink attached and empty command/event buffers.
pub fn load(data: &[u8]) -> Result<Engine, SnapshotError> {
    if data.len() < 4 {
        return Err(SnapshotError::TooShort);
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&data[..4]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    if data.len() < 4 + header_len {
        return Err(SnapshotError::TooShort);
    }

    let header: SnapshotHeader = bitcode::deserialize(&data[4..4 + header_len])
        .map_err(|e| SnapshotError::Decode(e.to_string()))?;
    header.validate()?;

    let payload: SnapshotPayload = bitcode::deserialize(&data[4 + header_len..])
        .map_err(|e| SnapshotError::Decode(e.to_string()))?;

    let mut engine = Engine {
        vessel: payload.vessel,
        host_part: payload.host_part,
        sequencer: payload.sequencer,
        planner: payload.planner,
        commands: CommandQueue::new(),
        event_bus: EventBus::new(),
        display: CountdownDisplay::default(),
        status_sink: None,
        settings: payload.settings,
        strategy: payload.strategy,
        sim_state: payload.sim_state,
        settled: payload.settled,
        last_state_hash: 0,
    };
    engine.last_state_hash = engine.compute_state_hash();
    Ok(engine)
}
