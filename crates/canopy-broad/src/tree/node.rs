// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use canopy_geom::Aabb;

/// Stable handle to a slot in a [`super::HierarchyTree`] arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

/// What a slot currently holds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<T> {
    /// A tracked object.
    Leaf(T),
    /// Exactly two children.
    Internal([NodeId; 2]),
    /// Released slot awaiting reuse.
    Free,
}

/// One arena slot: bounds, parent link, height and payload.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub(crate) bv: Aabb,
    pub(crate) parent: Option<NodeId>,
    pub(crate) height: u32,
    pub(crate) kind: NodeKind<T>,
}

impl<T> Node<T> {
    pub(crate) fn leaf(bv: Aabb, data: T) -> Self {
        Self {
            bv,
            parent: None,
            height: 0,
            kind: NodeKind::Leaf(data),
        }
    }

    pub(crate) fn internal(bv: Aabb, children: [NodeId; 2], height: u32) -> Self {
        Self {
            bv,
            parent: None,
            height,
            kind: NodeKind::Internal(children),
        }
    }

    /// Bounding box (tight for leaves, union of children for internal nodes).
    #[must_use]
    pub fn bv(&self) -> &Aabb {
        &self.bv
    }

    /// Parent, or `None` for the root and released slots.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// `0` for leaves, `1 + max(child heights)` otherwise.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Slot contents.
    #[must_use]
    pub fn kind(&self) -> &NodeKind<T> {
        &self.kind
    }

    /// Returns `true` for leaves.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Children of an internal node.
    #[must_use]
    pub fn children(&self) -> Option<[NodeId; 2]> {
        match self.kind {
            NodeKind::Internal(c) => Some(c),
            _ => None,
        }
    }

    /// Payload of a leaf.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match &self.kind {
            NodeKind::Leaf(d) => Some(d),
            _ => None,
        }
    }
}
