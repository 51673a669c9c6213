//! Ordered teardown of a vessel's part tree.
//!
//! One removal happens per tick (the 0.1 s inter-removal interval at the
//! fixed tick rate), which yields observable step-by-step destruction and
//! gives the host's frame loop a chance to react between removals. The tree
//! is re-queried fresh each step rather than snapshotted: destroying a leaf
//! may have turned its parent into a new leaf.

use crate::event::{Event, EventBus};
use crate::fixed::Ticks;
use crate::id::PartId;
use crate::vessel::Vessel;
use serde::{Deserialize, Serialize};

/// Progress reported by a single demolition step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemolitionProgress {
    /// One qualifying leaf was removed.
    RemovedLeaf(PartId),
    /// No qualifying leaf remained; every remaining part was removed in one
    /// pass.
    RemovedAll(usize),
    /// The vessel was already empty.
    Cleared,
}

/// Tears down a vessel children-first, deferring the root and the initiating
/// part until the very end.
///
/// Each step strictly reduces the part count (a leaf removal takes one part,
/// the fallback takes all remaining), so a run over N parts finishes in at
/// most N steps with at most one fallback pass. Destroy is treated as
/// infallible here; a collection that fails to shrink after destroy would be
/// a fatal host contract violation, not something this component can detect
/// or recover from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemolitionPlanner {
    initiator: PartId,
}

impl DemolitionPlanner {
    /// Create a planner that spares `initiator` until the final pass.
    pub fn new(initiator: PartId) -> Self {
        Self { initiator }
    }

    /// The part that started the sequence.
    pub fn initiator(&self) -> PartId {
        self.initiator
    }

    /// Run one demolition step against the vessel.
    pub fn step(&self, vessel: &mut Vessel, tick: Ticks, events: &mut EventBus) -> DemolitionProgress {
        if vessel.is_empty() {
            return DemolitionProgress::Cleared;
        }

        let root = vessel.root();
        let target = vessel
            .parts()
            .map(|(id, _)| id)
            .find(|&id| Some(id) != root && id != self.initiator && vessel.is_leaf(id));

        match target {
            Some(part) => {
                // The id was just read from the collection; destroy cannot miss.
                let _ = vessel.destroy_part(part);
                log::debug!("demolition removed leaf part {part:?}");
                events.emit(Event::PartDestroyed { part, tick });
                DemolitionProgress::RemovedLeaf(part)
            }
            None => {
                // Only the root and/or initiator remain, or the tree still
                // shows stale child links. Both cases take the same path: the
                // remaining parts go in one pass so the teardown terminates.
                let remaining: Vec<PartId> = vessel.parts().map(|(id, _)| id).collect();
                let count = remaining.len();
                for part in remaining {
                    let _ = vessel.destroy_part(part);
                    events.emit(Event::PartDestroyed { part, tick });
                }
                log::info!("demolition fallback removed {count} remaining parts");
                DemolitionProgress::RemovedAll(count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PartTypeId;

    fn pod() -> PartTypeId {
        PartTypeId(0)
    }

    /// Root, A(child of Root), B(child of A), Initiator(child of Root).
    fn four_part_tree() -> (Vessel, PartId, PartId, PartId, PartId) {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        let a = vessel.attach(pod(), root).unwrap();
        let b = vessel.attach(pod(), a).unwrap();
        let initiator = vessel.attach(pod(), root).unwrap();
        (vessel, root, a, b, initiator)
    }

    #[test]
    fn removes_deepest_leaf_first() {
        let (mut vessel, _root, a, b, initiator) = four_part_tree();
        let planner = DemolitionPlanner::new(initiator);
        let mut events = EventBus::new();

        assert_eq!(
            planner.step(&mut vessel, 0, &mut events),
            DemolitionProgress::RemovedLeaf(b)
        );
        // B's removal made A a leaf.
        assert_eq!(
            planner.step(&mut vessel, 1, &mut events),
            DemolitionProgress::RemovedLeaf(a)
        );
    }

    #[test]
    fn root_and_initiator_go_together_last() {
        let (mut vessel, root, _a, _b, initiator) = four_part_tree();
        let planner = DemolitionPlanner::new(initiator);
        let mut events = EventBus::new();

        planner.step(&mut vessel, 0, &mut events);
        planner.step(&mut vessel, 1, &mut events);
        assert_eq!(vessel.part_count(), 2);
        assert!(vessel.contains(root));
        assert!(vessel.contains(initiator));

        assert_eq!(
            planner.step(&mut vessel, 2, &mut events),
            DemolitionProgress::RemovedAll(2)
        );
        assert!(vessel.is_empty());
        assert_eq!(
            planner.step(&mut vessel, 3, &mut events),
            DemolitionProgress::Cleared
        );
    }

    #[test]
    fn initiator_leaf_is_spared_while_others_remain() {
        // Initiator is a leaf from the start; a deeper chain exists elsewhere.
        let (mut vessel, _root, _a, b, initiator) = four_part_tree();
        let planner = DemolitionPlanner::new(initiator);
        let mut events = EventBus::new();

        let first = planner.step(&mut vessel, 0, &mut events);
        assert_eq!(first, DemolitionProgress::RemovedLeaf(b));
        assert!(vessel.contains(initiator));
    }

    #[test]
    fn stale_child_links_trigger_single_fallback_pass() {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        let initiator = vessel.attach(pod(), root).unwrap();
        let ghost = vessel.attach(pod(), root).unwrap();
        vessel.destroy_part(ghost).unwrap();

        // Both survivors still show a destroyed child.
        vessel.force_child_link(root, ghost);
        vessel.force_child_link(initiator, ghost);

        let planner = DemolitionPlanner::new(initiator);
        let mut events = EventBus::new();
        assert_eq!(
            planner.step(&mut vessel, 0, &mut events),
            DemolitionProgress::RemovedAll(2)
        );
        assert!(vessel.is_empty());
    }

    #[test]
    fn lone_root_vessel_clears_in_one_pass() {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        let planner = DemolitionPlanner::new(root);
        let mut events = EventBus::new();

        assert_eq!(
            planner.step(&mut vessel, 0, &mut events),
            DemolitionProgress::RemovedAll(1)
        );
        assert!(vessel.is_empty());
        assert_eq!(events.len(), 1);
    }
}
