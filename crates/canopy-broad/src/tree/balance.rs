// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Incremental rebalancing by local rotations.

use core::cmp::Ordering;

use tracing::trace;

use super::{HierarchyTree, NodeId, NodeKind};

/// Children whose heights differ by more than this are rotated.
const BALANCE_THRESHOLD: u32 = 1;

impl<T> HierarchyTree<T> {
    /// Runs up to `passes` rebalancing passes.
    ///
    /// Each pass follows the taller child from the root down to a leaf
    /// (ties alternate through a rolling bit pattern so successive passes
    /// visit different paths), then walks back up rotating every node whose
    /// children's heights differ by more than one. Rotations only relink
    /// internal nodes and never increase the height of the subtree they
    /// touch.
    pub fn balance_incremental(&mut self, passes: u32) {
        if self.root.is_none() {
            return;
        }
        let mut rotations = 0u32;
        for _ in 0..passes {
            let Some(mut node) = self.root else {
                break;
            };
            let mut bit = 0u32;
            while let Some([a, b]) = self[node].children() {
                node = match self[a].height.cmp(&self[b].height) {
                    Ordering::Greater => a,
                    Ordering::Less => b,
                    Ordering::Equal if (self.opath >> bit) & 1 == 0 => a,
                    Ordering::Equal => b,
                };
                bit = (bit + 1) % u32::BITS;
            }
            let mut cursor = self[node].parent;
            while let Some(id) = cursor {
                let top = self.rotate(id);
                if top != id {
                    rotations += 1;
                }
                self.fit(top);
                cursor = self[top].parent;
            }
            self.opath = self.opath.wrapping_add(1);
        }
        trace!(passes, rotations, height = self.max_height(), "incremental balance");
    }

    /// Rotates the taller child of `a` into `a`'s place when the children's
    /// heights are too far apart. Returns the node now at that position.
    fn rotate(&mut self, a: NodeId) -> NodeId {
        let Some([b, c]) = self[a].children() else {
            return a;
        };
        let (hb, hc) = (self[b].height, self[c].height);
        if hc > hb + BALANCE_THRESHOLD {
            self.promote(a, 1)
        } else if hb > hc + BALANCE_THRESHOLD {
            self.promote(a, 0)
        } else {
            a
        }
    }

    /// Lifts child `side` of `a` into `a`'s slot. `a` becomes its child and
    /// adopts the shorter of the lifted node's children, then is rotated
    /// again if that left it lopsided.
    fn promote(&mut self, a: NodeId, side: usize) -> NodeId {
        let Some(children) = self[a].children() else {
            return a;
        };
        let up = children[side];
        let Some([f, g]) = self[up].children() else {
            return a;
        };
        let (keep, give) = if self[f].height > self[g].height {
            (f, g)
        } else {
            (g, f)
        };

        let parent = self[a].parent;
        self.node_mut(up).parent = parent;
        match parent {
            Some(p) => self.replace_child(p, a, up),
            None => self.root = Some(up),
        }

        let mut lowered = children;
        lowered[side] = give;
        self.node_mut(a).kind = NodeKind::Internal(lowered);
        self.node_mut(give).parent = Some(a);

        self.node_mut(up).kind = NodeKind::Internal([a, keep]);
        self.node_mut(a).parent = Some(up);

        self.fit(a);
        self.rotate(a);
        self.fit(up);
        up
    }
}
