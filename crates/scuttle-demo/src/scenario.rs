//! RON scenario schema and engine construction.
//!
//! A scenario file describes a vessel layout by part name, the countdown
//! delay, and an optional scripted abort. Names are resolved to part ids
//! while the tree is built; the engine itself never sees them.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use scuttle_core::engine::Engine;
use scuttle_core::fixed::{TICK_RATE, f64_to_fixed64};
use scuttle_core::id::{PartId, PartTypeId};
use scuttle_core::settings::DestructSettings;
use scuttle_core::sim::SimulationStrategy;
use scuttle_core::vessel::{Vessel, VesselError};
use serde::Deserialize;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or building a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },
    #[error("scenario has no parts")]
    EmptyVessel,
    #[error("first part is the root and must not declare a parent")]
    RootHasParent,
    #[error("part '{0}' must declare a parent")]
    MissingParent(String),
    #[error("duplicate part name '{0}'")]
    DuplicateName(String),
    #[error("part '{part}' declares unknown parent '{parent}'")]
    UnknownParent { part: String, parent: String },
    #[error("initiator '{0}' not found among parts")]
    UnknownInitiator(String),
    #[error("two identical runs of scenario '{0}' diverged")]
    NonDeterministic(String),
    #[error(transparent)]
    Vessel(#[from] VesselError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Schema
// ===========================================================================

/// A part entry. The first entry in the list is the root.
#[derive(Debug, Clone, Deserialize)]
pub struct PartSpec {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// A complete scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    pub description: String,
    pub delay_seconds: f64,
    /// If set, an abort is submitted this many seconds after arming.
    #[serde(default)]
    pub abort_at_seconds: Option<f64>,
    pub parts: Vec<PartSpec>,
    pub initiator: String,
}

pub fn load_spec(path: &Path) -> Result<ScenarioSpec, ScenarioError> {
    let text = fs::read_to_string(path)?;
    ron::from_str(&text).map_err(|e| ScenarioError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    })
}

// ===========================================================================
// Construction
// ===========================================================================

/// A scenario resolved into a ready-to-run engine.
pub struct BuiltScenario {
    pub engine: Engine,
    /// Part names for reporting; the engine works in ids.
    pub names: HashMap<PartId, String>,
    /// Tick at which to submit the scripted abort, if any.
    pub abort_tick: Option<u64>,
}

pub fn build(spec: &ScenarioSpec) -> Result<BuiltScenario, ScenarioError> {
    if spec.parts.is_empty() {
        return Err(ScenarioError::EmptyVessel);
    }

    let mut vessel = Vessel::new();
    let mut by_name: HashMap<String, PartId> = HashMap::new();
    let mut names: HashMap<PartId, String> = HashMap::new();

    for (index, part) in spec.parts.iter().enumerate() {
        if by_name.contains_key(&part.name) {
            return Err(ScenarioError::DuplicateName(part.name.clone()));
        }
        let id = match (index, &part.parent) {
            (0, None) => vessel.add_root(PartTypeId(index as u32))?,
            (0, Some(_)) => return Err(ScenarioError::RootHasParent),
            (_, None) => return Err(ScenarioError::MissingParent(part.name.clone())),
            (_, Some(parent_name)) => {
                let parent = *by_name.get(parent_name).ok_or_else(|| {
                    ScenarioError::UnknownParent {
                        part: part.name.clone(),
                        parent: parent_name.clone(),
                    }
                })?;
                vessel.attach(PartTypeId(index as u32), parent)?
            }
        };
        by_name.insert(part.name.clone(), id);
        names.insert(id, part.name.clone());
    }

    let initiator = *by_name
        .get(&spec.initiator)
        .ok_or_else(|| ScenarioError::UnknownInitiator(spec.initiator.clone()))?;

    let mut settings = DestructSettings::default();
    settings.set_delay_seconds(f64_to_fixed64(spec.delay_seconds));

    let engine = Engine::new(vessel, initiator, settings, SimulationStrategy::Tick)?;
    let abort_tick = spec
        .abort_at_seconds
        .map(|s| (s * TICK_RATE as f64).round() as u64);

    Ok(BuiltScenario {
        engine,
        names,
        abort_tick,
    })
}
