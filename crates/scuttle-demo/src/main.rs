//! Scuttle Demolition Harness
//!
//! Loads every RON scenario, runs each arm-to-resolution script twice, and
//! verifies the two runs produce identical event streams and state hashes.
//! Runs entirely in-process -- no rendering, no host engine.
//!
//! Usage:
//!   cargo run -p scuttle-demo
//!   cargo run -p scuttle-demo -- --verbose

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use scuttle_core::command::Command;
use scuttle_core::event::Event;
use scuttle_core::fixed::TICK_RATE;
use scuttle_core::id::PartId;

mod scenario;
use scenario::{BuiltScenario, ScenarioError, ScenarioSpec, build, load_spec};

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Scuttle Demolition Harness ===\n");

    let scenarios_dir = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios"));
    let paths = match scenario_paths(scenarios_dir) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("failed to list scenarios in {}: {e}", scenarios_dir.display());
            std::process::exit(1);
        }
    };

    let mut failures = 0usize;
    for path in &paths {
        match check_scenario(path, verbose) {
            Ok(summary) => println!("PASS  {summary}"),
            Err(e) => {
                failures += 1;
                println!("FAIL  {}: {e}", path.display());
            }
        }
    }

    println!("\n{} scenario(s), {} failure(s)", paths.len(), failures);
    if failures > 0 {
        std::process::exit(1);
    }
}

fn scenario_paths(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load a scenario, run it twice, and verify the runs are identical.
fn check_scenario(path: &Path, verbose: bool) -> Result<String, ScenarioError> {
    let spec = load_spec(path)?;

    let (events_a, hash_a, names) = run_script(&spec)?;
    let (events_b, hash_b, _) = run_script(&spec)?;

    if events_a != events_b || hash_a != hash_b {
        return Err(ScenarioError::NonDeterministic(spec.name.clone()));
    }

    println!("--- {} ---", spec.name);
    println!("    {}", spec.description);
    if verbose {
        for event in &events_a {
            println!("    {}", describe_event(event, &names));
        }
    }

    let removed = events_a
        .iter()
        .filter(|e| matches!(e, Event::PartDestroyed { .. }))
        .count();
    Ok(format!(
        "{}: {} events, {} of {} parts removed, state 0x{:016x}",
        spec.name,
        events_a.len(),
        removed,
        spec.parts.len(),
        hash_a
    ))
}

/// Run one scripted sequence to resolution.
fn run_script(spec: &ScenarioSpec) -> Result<(Vec<Event>, u64, HashMap<PartId, String>), ScenarioError> {
    let BuiltScenario {
        mut engine,
        names,
        abort_tick,
    } = build(spec)?;

    engine.submit(Command::ArmSelfDestruct);

    // Generous budget: the countdown, one removal per part, the stopped
    // notice, and slack. Aborted runs simply coast to the end of it.
    let budget =
        (spec.delay_seconds.ceil() as u64 + 6) * TICK_RATE + spec.parts.len() as u64 + 20;

    let mut events = Vec::new();
    for _ in 0..budget {
        if Some(engine.tick()) == abort_tick {
            engine.submit(Command::AbortSelfDestruct);
        }
        engine.step();
        events.extend(engine.drain_events());
        if engine.is_settled() {
            break;
        }
    }

    Ok((events, engine.state_hash(), names))
}

fn describe_event(event: &Event, names: &HashMap<PartId, String>) -> String {
    let name = |part: &PartId| {
        names
            .get(part)
            .map(String::as_str)
            .unwrap_or("<unknown>")
            .to_string()
    };
    match event {
        Event::SequenceArmed { part, tick } => {
            format!("[{tick:>4}] armed on '{}'", name(part))
        }
        Event::CountdownTick {
            remaining_seconds,
            tick,
        } => format!("[{tick:>4}] T-{remaining_seconds}"),
        Event::SequenceAborted { tick } => format!("[{tick:>4}] sequence stopped"),
        Event::DetonationStarted { tick } => format!("[{tick:>4}] detonation started"),
        Event::PartDestroyed { part, tick } => {
            format!("[{tick:>4}] destroyed '{}'", name(part))
        }
        Event::VesselCleared { tick } => format!("[{tick:>4}] vessel cleared"),
        Event::StageActivated { mode, tick } => {
            format!("[{tick:>4}] staging activated ({mode:?})")
        }
    }
}
