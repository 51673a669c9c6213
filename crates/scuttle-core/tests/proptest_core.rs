//! Property-based tests for the scuttle sequencing engine.
//!
//! Uses proptest to generate random part trees and countdown scripts, then
//! verify the timing and teardown invariants hold.

use std::collections::HashMap;

use proptest::prelude::*;
use scuttle_core::command::Command;
use scuttle_core::engine::Engine;
use scuttle_core::event::Event;
use scuttle_core::fixed::TICK_RATE;
use scuttle_core::id::{PartId, PartTypeId};
use scuttle_core::sequencer::CountdownState;
use scuttle_core::sim::SimulationStrategy;
use scuttle_core::test_utils::*;
use scuttle_core::vessel::Vessel;

// ===========================================================================
// Generators
// ===========================================================================

/// A random tree shape: for node `i` (1-based), the parent is chosen among
/// nodes `0..i` by seed. Node 0 is the root. The initiator is any node.
#[derive(Debug, Clone)]
struct TreeShape {
    parent_seeds: Vec<u64>,
    initiator_seed: u64,
}

fn arb_tree_shape(max_nodes: usize) -> impl Strategy<Value = TreeShape> {
    (2..=max_nodes).prop_flat_map(|n| {
        (
            proptest::collection::vec(any::<u64>(), n - 1),
            any::<u64>(),
        )
            .prop_map(|(parent_seeds, initiator_seed)| TreeShape {
                parent_seeds,
                initiator_seed,
            })
    })
}

/// Materialize a tree shape into a vessel. Returns the ids in creation
/// order, the child map, and the chosen initiator.
fn build_tree(shape: &TreeShape) -> (Vessel, Vec<PartId>, HashMap<PartId, Vec<PartId>>, PartId) {
    let mut vessel = Vessel::new();
    let mut ids = Vec::with_capacity(shape.parent_seeds.len() + 1);
    ids.push(vessel.add_root(pod()).unwrap());

    for (i, seed) in shape.parent_seeds.iter().enumerate() {
        let parent = ids[(*seed as usize) % (i + 1)];
        ids.push(vessel.attach(tank(), parent).unwrap());
    }

    let mut children: HashMap<PartId, Vec<PartId>> = HashMap::new();
    for &id in &ids {
        if let Some(parent) = vessel.parent(id) {
            children.entry(parent).or_default().push(id);
        }
    }

    let initiator = ids[(shape.initiator_seed as usize) % ids.len()];
    (vessel, ids, children, initiator)
}

fn engine_over(vessel: Vessel, initiator: PartId, delay_seconds: f64) -> Engine {
    Engine::new(
        vessel,
        initiator,
        settings_with_delay(delay_seconds),
        SimulationStrategy::Tick,
    )
    .unwrap()
}

/// Run to settlement, returning (part, tick) removals in order.
fn run_to_settlement(engine: &mut Engine, max_ticks: u64) -> Vec<(PartId, u64)> {
    let mut removed = Vec::new();
    for _ in 0..max_ticks {
        engine.step();
        for event in engine.drain_events() {
            if let Event::PartDestroyed { part, tick } = event {
                removed.push((part, tick));
            }
        }
        if engine.is_settled() {
            break;
        }
    }
    removed
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For every whole-second delay in range, the countdown hands off to
    /// demolition exactly `delay * TICK_RATE` ticks after arming.
    #[test]
    fn countdown_expires_exactly_on_delay(delay in 1u64..=60) {
        let mut t = four_part_engine(delay as f64);
        t.engine.submit(Command::ArmSelfDestruct);

        let mut detonation_tick = None;
        for _ in 0..(delay * TICK_RATE + 40) {
            t.engine.step();
            for event in t.engine.drain_events() {
                if let Event::DetonationStarted { tick } = event {
                    detonation_tick = Some(tick);
                }
            }
            if detonation_tick.is_some() {
                break;
            }
        }
        prop_assert_eq!(detonation_tick, Some(delay * TICK_RATE));
    }

    /// Any tree is fully torn down, and parts removed via the single-leaf
    /// path never go before their children.
    #[test]
    fn demolition_clears_any_tree_children_first(shape in arb_tree_shape(24)) {
        let (vessel, ids, children, initiator) = build_tree(&shape);
        let n = ids.len() as u64;
        let root = ids[0];
        let mut engine = engine_over(vessel, initiator, 1.0);
        engine.submit(Command::ArmSelfDestruct);

        let removed = run_to_settlement(&mut engine, TICK_RATE + 2 * n + 20);

        // Completeness: every part went exactly once.
        prop_assert_eq!(removed.len(), ids.len());
        prop_assert!(engine.vessel().is_empty());
        prop_assert!(engine.is_settled());

        let removal_tick: HashMap<PartId, u64> = removed.iter().copied().collect();
        let final_tick = removed.last().map(|(_, tick)| *tick).unwrap_or(0);
        let mut per_tick: HashMap<u64, usize> = HashMap::new();
        for (_, tick) in &removed {
            *per_tick.entry(*tick).or_default() += 1;
        }

        for (part, tick) in &removed {
            let solo = per_tick[tick] == 1;
            if solo {
                // Single-leaf path: root and initiator are never the sole
                // target unless they are the last part standing.
                if *part == root || *part == initiator {
                    prop_assert_eq!(*tick, final_tick);
                }
                // And every child must already be gone.
                for child in children.get(part).map(Vec::as_slice).unwrap_or(&[]) {
                    prop_assert!(removal_tick[child] < *tick);
                }
            }
        }
    }

    /// An abort observed before expiry always wins: nothing is destroyed
    /// and the sequencer returns to idle.
    #[test]
    fn abort_before_expiry_destroys_nothing(
        delay in 1u64..=60,
        abort_fraction in 0.0f64..1.0,
    ) {
        let abort_tick = ((delay * TICK_RATE - 1) as f64 * abort_fraction) as u64;
        let mut t = four_part_engine(delay as f64);
        t.engine.submit(Command::ArmSelfDestruct);

        let mut destroyed = 0usize;
        for _ in 0..(delay * TICK_RATE + 20) {
            if t.engine.tick() == abort_tick {
                t.engine.submit(Command::AbortSelfDestruct);
            }
            t.engine.step();
            destroyed += t
                .engine
                .drain_events()
                .iter()
                .filter(|e| matches!(e, Event::PartDestroyed { .. }))
                .count();
        }

        prop_assert_eq!(destroyed, 0);
        prop_assert_eq!(t.engine.countdown_state(), CountdownState::Idle);
        prop_assert_eq!(t.engine.vessel().part_count(), 4);
    }

    /// Snapshots taken at an arbitrary point resume identically. At least
    /// one step runs first: pending commands are host-owned and not part
    /// of a snapshot.
    #[test]
    fn snapshot_resume_is_transparent(
        shape in arb_tree_shape(12),
        pause_after in 1u64..30,
    ) {
        let (vessel, _ids, _children, initiator) = build_tree(&shape);
        let mut original = engine_over(vessel, initiator, 2.0);
        original.submit(Command::ArmSelfDestruct);

        for _ in 0..pause_after {
            original.step();
        }
        original.drain_events();

        let data = scuttle_core::serialize::save(&original).unwrap();
        let mut restored = scuttle_core::serialize::load(&data).unwrap();

        for _ in 0..80 {
            original.step();
            restored.step();
            prop_assert_eq!(original.state_hash(), restored.state_hash());
            prop_assert_eq!(original.drain_events(), restored.drain_events());
        }
        prop_assert!(restored.is_settled());
    }
}

// ===========================================================================
// Degenerate shapes worth pinning down outside proptest
// ===========================================================================

#[test]
fn initiator_on_the_root_still_clears() {
    let mut vessel = Vessel::new();
    let root = vessel.add_root(PartTypeId(0)).unwrap();
    let a = vessel.attach(PartTypeId(1), root).unwrap();
    let _b = vessel.attach(PartTypeId(2), a).unwrap();

    // The self-destruct part is the root itself.
    let mut engine = engine_over(vessel, root, 1.0);
    engine.submit(Command::ArmSelfDestruct);
    let removed = run_to_settlement(&mut engine, 60);

    assert_eq!(removed.len(), 3);
    assert!(engine.vessel().is_empty());
    // The root goes alone, but only as the last part standing.
    assert_eq!(removed.last().unwrap().0, root);
}
