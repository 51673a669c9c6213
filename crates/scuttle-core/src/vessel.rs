//! The vessel: a rooted tree of parts.
//!
//! Parts live in a `SlotMap` keyed by [`PartId`]; tree adjacency is stored in
//! a `SecondaryMap` alongside it, which guarantees key synchronization with
//! the primary map. Destroying a part removes it from the collection as an
//! observable side effect, unlinks it from its parent's child list, and
//! orphans any surviving children.

use crate::id::{PartId, PartTypeId};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during vessel operations.
#[derive(Debug, thiserror::Error)]
pub enum VesselError {
    #[error("part not found: {0:?}")]
    PartNotFound(PartId),
    #[error("vessel already has a root part")]
    RootAlreadySet,
    #[error("vessel has no root part")]
    MissingRoot,
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// Per-part payload stored in the vessel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartData {
    /// The part template this part was created from.
    pub part_type: PartTypeId,
}

/// Tree links for a single part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PartLinks {
    /// The part this one is attached to. `None` for the root and for
    /// orphans whose parent was destroyed.
    parent: Option<PartId>,
    /// Parts attached to this one.
    children: Vec<PartId>,
}

// ---------------------------------------------------------------------------
// Vessel
// ---------------------------------------------------------------------------

/// The current assembly: a mutable collection of parts plus a distinguished
/// root. Insertion order is irrelevant to callers; parts leave the collection
/// only by being destroyed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vessel {
    parts: SlotMap<PartId, PartData>,
    links: SecondaryMap<PartId, PartLinks>,
    root: Option<PartId>,
}

impl Vessel {
    /// Create a new, empty vessel.
    pub fn new() -> Self {
        Self {
            parts: SlotMap::with_key(),
            links: SecondaryMap::new(),
            root: None,
        }
    }

    /// Install the distinguished root part. Fails if a root is already set.
    pub fn add_root(&mut self, part_type: PartTypeId) -> Result<PartId, VesselError> {
        if self.root.is_some() {
            return Err(VesselError::RootAlreadySet);
        }
        let id = self.parts.insert(PartData { part_type });
        self.links.insert(id, PartLinks::default());
        self.root = Some(id);
        Ok(id)
    }

    /// Attach a new part under `parent`.
    pub fn attach(&mut self, part_type: PartTypeId, parent: PartId) -> Result<PartId, VesselError> {
        if !self.parts.contains_key(parent) {
            return Err(VesselError::PartNotFound(parent));
        }
        let id = self.parts.insert(PartData { part_type });
        self.links.insert(
            id,
            PartLinks {
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(parent_links) = self.links.get_mut(parent) {
            parent_links.children.push(id);
        }
        Ok(id)
    }

    /// Destroy a part: remove it from the collection, unlink it from its
    /// parent, and orphan its surviving children. Irreversible; a part can
    /// be destroyed at most once.
    pub fn destroy_part(&mut self, part: PartId) -> Result<(), VesselError> {
        if !self.parts.contains_key(part) {
            return Err(VesselError::PartNotFound(part));
        }
        let links = self.links.remove(part).unwrap_or_default();
        if let Some(parent) = links.parent {
            if let Some(parent_links) = self.links.get_mut(parent) {
                parent_links.children.retain(|c| *c != part);
            }
        }
        for child in links.children {
            if let Some(child_links) = self.links.get_mut(child) {
                child_links.parent = None;
            }
        }
        if self.root == Some(part) {
            self.root = None;
        }
        self.parts.remove(part);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The distinguished root part, if it still exists.
    pub fn root(&self) -> Option<PartId> {
        self.root
    }

    /// Number of parts currently in the collection.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Whether no parts remain.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Whether the given part is still in the collection.
    pub fn contains(&self, part: PartId) -> bool {
        self.parts.contains_key(part)
    }

    /// The parent of a part, if it has one.
    pub fn parent(&self, part: PartId) -> Option<PartId> {
        self.links.get(part).and_then(|l| l.parent)
    }

    /// The children attached to a part. Empty for unknown parts.
    pub fn children(&self, part: PartId) -> &[PartId] {
        self.links.get(part).map(|l| l.children.as_slice()).unwrap_or(&[])
    }

    /// Whether a part has no children attached.
    pub fn is_leaf(&self, part: PartId) -> bool {
        self.children(part).is_empty()
    }

    /// Iterate over all parts in the collection.
    pub fn parts(&self) -> impl Iterator<Item = (PartId, &PartData)> {
        self.parts.iter()
    }

    /// The payload for a part, if it exists.
    pub fn part(&self, part: PartId) -> Option<&PartData> {
        self.parts.get(part)
    }

    /// Record a child link without attaching anything, fabricating the kind
    /// of stale tree state a host can leave behind. Test use only.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn force_child_link(&mut self, parent: PartId, child: PartId) {
        if let Some(parent_links) = self.links.get_mut(parent) {
            parent_links.children.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod() -> PartTypeId {
        PartTypeId(0)
    }

    #[test]
    fn add_root_once() {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        assert_eq!(vessel.root(), Some(root));
        assert!(matches!(vessel.add_root(pod()), Err(VesselError::RootAlreadySet)));
    }

    #[test]
    fn attach_builds_tree_links() {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        let a = vessel.attach(pod(), root).unwrap();
        let b = vessel.attach(pod(), a).unwrap();

        assert_eq!(vessel.parent(a), Some(root));
        assert_eq!(vessel.parent(b), Some(a));
        assert_eq!(vessel.children(root), &[a]);
        assert!(vessel.is_leaf(b));
        assert!(!vessel.is_leaf(a));
        assert_eq!(vessel.part_count(), 3);
    }

    #[test]
    fn attach_to_unknown_parent_fails() {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        let a = vessel.attach(pod(), root).unwrap();
        vessel.destroy_part(a).unwrap();
        assert!(matches!(
            vessel.attach(pod(), a),
            Err(VesselError::PartNotFound(_))
        ));
    }

    #[test]
    fn destroy_leaf_updates_parent() {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        let a = vessel.attach(pod(), root).unwrap();
        let b = vessel.attach(pod(), a).unwrap();

        vessel.destroy_part(b).unwrap();
        assert!(!vessel.contains(b));
        // Destroying the leaf turned its parent into a new leaf.
        assert!(vessel.is_leaf(a));
        assert_eq!(vessel.part_count(), 2);
    }

    #[test]
    fn destroy_parent_orphans_children() {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        let a = vessel.attach(pod(), root).unwrap();
        let b = vessel.attach(pod(), a).unwrap();

        vessel.destroy_part(a).unwrap();
        assert!(vessel.contains(b));
        assert_eq!(vessel.parent(b), None);
        assert_eq!(vessel.children(root), &[] as &[PartId]);
    }

    #[test]
    fn destroy_twice_fails() {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        vessel.destroy_part(root).unwrap();
        assert!(matches!(
            vessel.destroy_part(root),
            Err(VesselError::PartNotFound(_))
        ));
        assert_eq!(vessel.root(), None);
    }

    #[test]
    fn forced_child_link_defeats_leaf_check() {
        let mut vessel = Vessel::new();
        let root = vessel.add_root(pod()).unwrap();
        let a = vessel.attach(pod(), root).unwrap();
        let ghost = vessel.attach(pod(), a).unwrap();
        vessel.destroy_part(ghost).unwrap();
        assert!(vessel.is_leaf(a));

        // Re-record the destroyed id, as a host with stale tree state would.
        vessel.force_child_link(a, ghost);
        assert!(!vessel.is_leaf(a));
    }
}
