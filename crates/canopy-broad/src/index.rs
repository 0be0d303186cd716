// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Handle-to-leaf index.

use core::hash::Hash;

use rustc_hash::FxHashMap;

use crate::tree::{HierarchyTree, NodeId};

/// Leaf payload: the caller's handle plus the geometry's free flag, cached so
/// voxel traversal can prune without reaching back into caller storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Tracked<H> {
    /// Caller-owned object handle.
    pub handle: H,
    /// Whether the object's geometry is known free space.
    pub free: bool,
}

/// Hierarchy whose leaves carry [`Tracked`] handles.
pub type TrackedTree<H> = HierarchyTree<Tracked<H>>;

/// Maps each registered handle to its leaf.
///
/// Leaf ids are stable across rebalancing, so entries change only on
/// register and unregister.
#[derive(Debug, Clone)]
pub struct ObjectIndex<H> {
    map: FxHashMap<H, NodeId>,
}

impl<H> Default for ObjectIndex<H> {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }
}

impl<H: Copy + Eq + Hash> ObjectIndex<H> {
    /// Empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves room for `additional` more handles.
    pub fn reserve(&mut self, additional: usize) {
        self.map.reserve(additional);
    }

    /// Records `handle -> leaf`, returning the previous leaf if any.
    pub fn insert(&mut self, handle: H, leaf: NodeId) -> Option<NodeId> {
        self.map.insert(handle, leaf)
    }

    /// Forgets `handle`, returning its leaf.
    pub fn remove(&mut self, handle: &H) -> Option<NodeId> {
        self.map.remove(handle)
    }

    /// Leaf of `handle`.
    #[must_use]
    pub fn get(&self, handle: &H) -> Option<NodeId> {
        self.map.get(handle).copied()
    }

    /// Returns `true` if `handle` is indexed.
    #[must_use]
    pub fn contains(&self, handle: &H) -> bool {
        self.map.contains_key(handle)
    }

    /// Number of indexed handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` when nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All `(handle, leaf)` entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (H, NodeId)> + '_ {
        self.map.iter().map(|(h, id)| (*h, *id))
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}
