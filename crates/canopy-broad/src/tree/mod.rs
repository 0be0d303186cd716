// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Array-backed dynamic AABB hierarchy.
//!
//! Nodes live in a flat arena addressed by [`NodeId`]; released slots go on a
//! free list and are reused by later allocations. Leaves hold the caller's
//! payload and keep their id for as long as they are in the tree: updates,
//! incremental rotations and top-down rebuilds only ever recycle internal
//! nodes, so an external index of leaf ids never needs rewriting.
//!
//! Invariants after every public mutation (checked by
//! [`HierarchyTree::validate`]):
//! - an internal node's box is exactly the union of its two children's boxes;
//! - heights are `0` for leaves and `1 + max(children)` otherwise;
//! - parent links mirror child links and the root has no parent.
//!
//! [`HierarchyTree::set_leaf_bv`] is the one deliberate exception: it writes a
//! leaf box without touching ancestors, and the caller finishes with
//! [`HierarchyTree::refit`].

use core::mem;
use core::ops::Index;

use canopy_geom::Aabb;

use crate::error::TreeInvariantError;

mod balance;
mod build;
mod node;

pub use node::{Node, NodeId, NodeKind};

/// Dynamic bounding-volume hierarchy over payloads of type `T`.
#[derive(Debug, Clone)]
pub struct HierarchyTree<T> {
    nodes: Vec<Node<T>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    leaf_count: usize,
    /// Tie-break bits for the incremental balancer's descent.
    opath: u32,
    bu_threshold: usize,
    topdown_level: u32,
}

impl<T> Default for HierarchyTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<NodeId> for HierarchyTree<T> {
    type Output = Node<T>;

    fn index(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.slot()]
    }
}

impl<T> HierarchyTree<T> {
    /// Empty tree with the default build parameters (bottom-up below 2
    /// leaves, median split).
    #[must_use]
    pub fn new() -> Self {
        Self::with_build_params(2, 0)
    }

    /// Empty tree with explicit build parameters.
    ///
    /// `bu_threshold`: subtrees of at most this many leaves are merged
    /// greedily bottom-up. `topdown_level`: `0` splits at the median of the
    /// longest axis, anything else at the mean centre.
    #[must_use]
    pub fn with_build_params(bu_threshold: usize, topdown_level: u32) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            leaf_count: 0,
            opath: 0,
            bu_threshold,
            topdown_level,
        }
    }

    /// Replaces the build parameters used by later top-down builds.
    pub fn set_build_params(&mut self, bu_threshold: usize, topdown_level: u32) {
        self.bu_threshold = bu_threshold;
        self.topdown_level = topdown_level;
    }

    /// Number of leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Returns `true` when the tree holds no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Root node, `None` when empty.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Live node at `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes
            .get(id.slot())
            .filter(|n| !matches!(n.kind, NodeKind::Free))
    }

    /// Payload of the leaf at `id`.
    #[must_use]
    pub fn leaf_data(&self, id: NodeId) -> Option<&T> {
        self.node(id).and_then(Node::data)
    }

    pub(crate) fn leaf_data_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match &mut self.nodes.get_mut(id.slot())?.kind {
            NodeKind::Leaf(data) => Some(data),
            _ => None,
        }
    }

    /// All leaves in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(slot, n)| n.data().map(|d| (NodeId(slot as u32), d)))
    }

    /// Height of the root; `0` for empty and single-leaf trees.
    #[must_use]
    pub fn max_height(&self) -> u32 {
        self.root.map_or(0, |r| self[r].height)
    }

    /// Drops every node and payload.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.leaf_count = 0;
        self.opath = 0;
    }

    /// Inserts a leaf and returns its id.
    ///
    /// The new leaf is paired with the existing leaf reached by repeatedly
    /// descending into the child whose box centre lies closer to `bv`'s
    /// centre; ancestors are refitted up to the root.
    pub fn insert(&mut self, bv: Aabb, data: T) -> NodeId {
        let leaf = self.alloc(Node::leaf(bv, data));
        self.insert_leaf(leaf);
        self.leaf_count += 1;
        leaf
    }

    /// Removes the leaf at `id` and returns its payload.
    ///
    /// Its sibling takes the parent's place. Returns `None` if `id` is not a
    /// leaf.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        if !self.node(id)?.is_leaf() {
            return None;
        }
        self.remove_leaf(id);
        self.leaf_count -= 1;
        match self.release(id) {
            NodeKind::Leaf(data) => Some(data),
            _ => None,
        }
    }

    /// Moves the leaf at `id` to `bv`.
    ///
    /// When the stored box still contains `bv` the box is overwritten in
    /// place and ancestors are refitted; otherwise the leaf is detached and
    /// reinserted from the root under the same id. Returns `true` on
    /// reinsertion.
    pub fn update(&mut self, id: NodeId, bv: Aabb) -> bool {
        if !self.node(id).is_some_and(Node::is_leaf) {
            return false;
        }
        if self[id].bv.contains(&bv) {
            self.node_mut(id).bv = bv;
            let parent = self[id].parent;
            self.refit_upward(parent);
            return false;
        }
        self.remove_leaf(id);
        self.node_mut(id).bv = bv;
        self.insert_leaf(id);
        true
    }

    /// Overwrites a leaf box without refitting ancestors.
    ///
    /// Returns `false` if `id` is not a leaf. Follow a batch of these with
    /// [`HierarchyTree::refit`].
    pub fn set_leaf_bv(&mut self, id: NodeId, bv: Aabb) -> bool {
        if !self.node(id).is_some_and(Node::is_leaf) {
            return false;
        }
        self.node_mut(id).bv = bv;
        true
    }

    /// Recomputes every internal box and height bottom-up.
    pub fn refit(&mut self) {
        if let Some(root) = self.root {
            self.refit_subtree(root);
        }
    }

    /// Checks the structural invariants listed in the module docs.
    pub fn validate(&self) -> Result<(), TreeInvariantError> {
        let Some(root) = self.root else {
            return if self.leaf_count == 0 {
                Ok(())
            } else {
                Err(TreeInvariantError::LeafCount {
                    expected: self.leaf_count,
                    found: 0,
                })
            };
        };
        if self.node(root).ok_or(TreeInvariantError::DeadNode(root))?.parent.is_some() {
            return Err(TreeInvariantError::RootHasParent(root));
        }
        let mut found = 0usize;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.node(id).ok_or(TreeInvariantError::DeadNode(id))?;
            match node.kind {
                NodeKind::Leaf(_) => {
                    if node.height != 0 {
                        return Err(TreeInvariantError::HeightMismatch(id));
                    }
                    found += 1;
                }
                NodeKind::Internal([a, b]) => {
                    let ca = self.node(a).ok_or(TreeInvariantError::DeadNode(a))?;
                    let cb = self.node(b).ok_or(TreeInvariantError::DeadNode(b))?;
                    for (c, child) in [(a, ca), (b, cb)] {
                        if child.parent != Some(id) {
                            return Err(TreeInvariantError::ParentMismatch(c));
                        }
                    }
                    if node.bv != ca.bv.union(&cb.bv) {
                        return Err(TreeInvariantError::LooseBounds(id));
                    }
                    if node.height != 1 + ca.height.max(cb.height) {
                        return Err(TreeInvariantError::HeightMismatch(id));
                    }
                    stack.push(a);
                    stack.push(b);
                }
                NodeKind::Free => return Err(TreeInvariantError::DeadNode(id)),
            }
        }
        if found != self.leaf_count {
            return Err(TreeInvariantError::LeafCount {
                expected: self.leaf_count,
                found,
            });
        }
        Ok(())
    }

    /// Index (`0` or `1`) of the child whose box centre is closer to
    /// `query`'s centre, by Manhattan distance over doubled centres.
    pub(crate) fn select(&self, query: &Aabb, c0: NodeId, c1: NodeId) -> usize {
        let v = query.min() + query.max();
        let b0 = &self[c0].bv;
        let b1 = &self[c1].bv;
        let d0 = (v - (b0.min() + b0.max())).abs().element_sum();
        let d1 = (v - (b1.min() + b1.max())).abs().element_sum();
        usize::from(d0 >= d1)
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.slot()]
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.slot()] = node;
            id
        } else {
            let id = NodeId(self.nodes.len() as u32);
            self.nodes.push(node);
            id
        }
    }

    fn release(&mut self, id: NodeId) -> NodeKind<T> {
        let node = self.node_mut(id);
        node.parent = None;
        node.height = 0;
        let kind = mem::replace(&mut node.kind, NodeKind::Free);
        self.free.push(id);
        kind
    }

    /// Creates an internal node over `a` and `b`.
    fn join(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let bv = self[a].bv.union(&self[b].bv);
        let height = 1 + self[a].height.max(self[b].height);
        let node = self.alloc(Node::internal(bv, [a, b], height));
        self.node_mut(a).parent = Some(node);
        self.node_mut(b).parent = Some(node);
        node
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if let NodeKind::Internal(children) = &mut self.node_mut(parent).kind {
            for c in children.iter_mut().filter(|c| **c == old) {
                *c = new;
            }
        }
    }

    /// Recomputes box and height of an internal node from its children.
    /// Returns `true` if either changed.
    fn fit(&mut self, id: NodeId) -> bool {
        let Some([a, b]) = self[id].children() else {
            return false;
        };
        let bv = self[a].bv.union(&self[b].bv);
        let height = 1 + self[a].height.max(self[b].height);
        let node = self.node_mut(id);
        let changed = node.bv != bv || node.height != height;
        node.bv = bv;
        node.height = height;
        changed
    }

    /// Refits from `from` towards the root, stopping at the first node that
    /// does not change.
    fn refit_upward(&mut self, mut from: Option<NodeId>) {
        while let Some(id) = from {
            if !self.fit(id) {
                break;
            }
            from = self[id].parent;
        }
    }

    fn refit_subtree(&mut self, id: NodeId) {
        if let Some([a, b]) = self[id].children() {
            self.refit_subtree(a);
            self.refit_subtree(b);
            self.fit(id);
        }
    }

    /// Attaches a detached leaf.
    fn insert_leaf(&mut self, leaf: NodeId) {
        let Some(root) = self.root else {
            self.node_mut(leaf).parent = None;
            self.root = Some(leaf);
            return;
        };
        let bv = self[leaf].bv;
        let mut sibling = root;
        while let Some([c0, c1]) = self[sibling].children() {
            sibling = if self.select(&bv, c0, c1) == 0 { c0 } else { c1 };
        }
        let prev = self[sibling].parent;
        let node = self.join(sibling, leaf);
        self.node_mut(node).parent = prev;
        match prev {
            Some(p) => {
                self.replace_child(p, sibling, node);
                self.refit_upward(Some(p));
            }
            None => self.root = Some(node),
        }
    }

    /// Detaches a leaf, promoting its sibling into the parent's place.
    fn remove_leaf(&mut self, leaf: NodeId) {
        if self.root == Some(leaf) {
            self.root = None;
            return;
        }
        let Some(parent) = self[leaf].parent else {
            return;
        };
        let Some([c0, c1]) = self[parent].children() else {
            return;
        };
        let sibling = if c0 == leaf { c1 } else { c0 };
        let prev = self[parent].parent;
        self.release(parent);
        self.node_mut(leaf).parent = None;
        self.node_mut(sibling).parent = prev;
        match prev {
            Some(p) => {
                self.replace_child(p, parent, sibling);
                self.refit_upward(Some(p));
            }
            None => self.root = Some(sibling),
        }
    }
}
