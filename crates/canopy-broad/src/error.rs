// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for the broad phase.

use canopy_geom::GeomError;
use thiserror::Error;

use crate::tree::NodeId;

/// Errors surfaced by [`crate::DynamicAabbTreeManager`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BroadPhaseError {
    /// The handle is not registered with this manager.
    #[error("object is not registered")]
    UnknownObject,
    /// The handle is already registered with this manager.
    #[error("object is already registered")]
    DuplicateObject,
    /// Rejected geometry input.
    #[error(transparent)]
    Geometry(#[from] GeomError),
}

/// A structural invariant of [`crate::HierarchyTree`] that does not hold.
///
/// Reported by [`crate::HierarchyTree::validate`]; never produced by normal
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeInvariantError {
    /// The root records a parent.
    #[error("root {0:?} has a parent")]
    RootHasParent(NodeId),
    /// A reachable id points at a released slot.
    #[error("node {0:?} is not live")]
    DeadNode(NodeId),
    /// A child's parent link does not point back at its parent.
    #[error("node {0:?} has a wrong parent link")]
    ParentMismatch(NodeId),
    /// An internal box is not the union of its children.
    #[error("node {0:?} does not bound its children")]
    LooseBounds(NodeId),
    /// A stored height disagrees with the subtree.
    #[error("node {0:?} has a wrong height")]
    HeightMismatch(NodeId),
    /// Leaf count disagrees with the number of reachable leaves.
    #[error("expected {expected} leaves, found {found}")]
    LeafCount {
        /// Count tracked by the tree.
        expected: usize,
        /// Leaves reachable from the root.
        found: usize,
    },
}
