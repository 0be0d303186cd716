// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Whole-tree construction: bulk init and top-down rebuild.

use canopy_geom::Aabb;
use glam::Vec3;
use tracing::{debug, instrument};

use super::{HierarchyTree, Node, NodeId};

/// Highest bit of a 30-bit Morton code (10 bits per axis).
const MORTON_TOP_BIT: u32 = 1 << 29;

impl<T> HierarchyTree<T> {
    /// Replaces the tree with a bulk build over `leaves`.
    ///
    /// Returns the new leaf ids in input order. `init_level == 0` builds
    /// top-down with the configured split rule; any other value sorts leaves
    /// along a Morton curve and splits on code bits, falling back to a
    /// top-down build once the bits run out.
    #[instrument(skip_all, fields(init_level = init_level))]
    pub fn init<I>(&mut self, leaves: I, init_level: u32) -> Vec<NodeId>
    where
        I: IntoIterator<Item = (Aabb, T)>,
    {
        self.clear();
        let ids: Vec<NodeId> = leaves
            .into_iter()
            .map(|(bv, data)| self.alloc(Node::leaf(bv, data)))
            .collect();
        self.leaf_count = ids.len();

        let mut order = ids.clone();
        self.root = if init_level == 0 {
            self.build_topdown(&mut order)
        } else {
            self.build_morton(&mut order)
        };
        if let Some(root) = self.root {
            self.node_mut(root).parent = None;
        }
        debug!(leaves = ids.len(), height = self.max_height(), "bulk build");
        ids
    }

    /// Rebuilds the whole tree top-down from its current leaves.
    ///
    /// Leaf ids survive; every internal node is released and rebuilt.
    #[instrument(skip_all, fields(leaves = self.leaf_count))]
    pub fn balance_topdown(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let before = self.max_height();
        let mut ids = Vec::with_capacity(self.leaf_count);
        self.detach_leaves(root, &mut ids);
        self.root = self.build_topdown(&mut ids);
        if let Some(root) = self.root {
            self.node_mut(root).parent = None;
        }
        debug!(before, after = self.max_height(), "top-down rebuild");
    }

    /// Collects the leaves under `id` and releases every internal node.
    fn detach_leaves(&mut self, id: NodeId, out: &mut Vec<NodeId>) {
        match self[id].children() {
            Some([a, b]) => {
                self.detach_leaves(a, out);
                self.detach_leaves(b, out);
                self.release(id);
            }
            None => {
                self.node_mut(id).parent = None;
                out.push(id);
            }
        }
    }

    fn build_topdown(&mut self, ids: &mut [NodeId]) -> Option<NodeId> {
        match ids.len() {
            0 => None,
            1 => Some(ids[0]),
            n if n <= self.bu_threshold => Some(self.build_bottomup(ids)),
            _ => {
                let mid = if self.topdown_level == 0 {
                    self.split_median(ids)
                } else {
                    self.split_mean(ids)
                };
                let (lo, hi) = ids.split_at_mut(mid);
                let a = self.build_topdown(lo)?;
                let b = self.build_topdown(hi)?;
                Some(self.join(a, b))
            }
        }
    }

    /// Greedily merges the pair whose union is smallest until one root remains.
    fn build_bottomup(&mut self, ids: &[NodeId]) -> NodeId {
        let mut work = ids.to_vec();
        while work.len() > 1 {
            let mut best = (0, 1, f32::INFINITY);
            for i in 0..work.len() {
                for j in i + 1..work.len() {
                    let size = self[work[i]].bv.union(&self[work[j]].bv).size();
                    if size < best.2 {
                        best = (i, j, size);
                    }
                }
            }
            let (i, j, _) = best;
            work[i] = self.join(work[i], work[j]);
            work.swap_remove(j);
        }
        work[0]
    }

    fn bounds_of(&self, ids: &[NodeId]) -> Option<Aabb> {
        let (first, rest) = ids.split_first()?;
        Some(
            rest.iter()
                .fold(self[*first].bv, |acc, id| acc.union(&self[*id].bv)),
        )
    }

    /// Partitions around the median centre on the longest axis.
    fn split_median(&self, ids: &mut [NodeId]) -> usize {
        let mid = ids.len() / 2;
        let Some(vol) = self.bounds_of(ids) else {
            return mid;
        };
        let extent = vol.extents();
        let mut axis = 0;
        if extent.y > extent.x {
            axis = 1;
        }
        if extent.z > extent[axis] {
            axis = 2;
        }
        // Centre sums order the same way as centres.
        let key = |id: &NodeId| self[*id].bv.min()[axis] + self[*id].bv.max()[axis];
        ids.select_nth_unstable_by(mid, |a, b| key(a).total_cmp(&key(b)));
        mid
    }

    /// Partitions around the mean centre on the axis that splits most evenly.
    fn split_mean(&self, ids: &mut [NodeId]) -> usize {
        let n = ids.len();
        let mean = ids
            .iter()
            .fold(Vec3::ZERO, |acc, id| acc + self[*id].bv.center())
            / n as f32;

        let mut counts = [[0usize; 2]; 3];
        for id in ids.iter() {
            let offset = self[*id].bv.center() - mean;
            for (axis, count) in counts.iter_mut().enumerate() {
                count[usize::from(offset[axis] > 0.0)] += 1;
            }
        }
        let mut axis = 0;
        let mut best = n;
        for (a, [lo, hi]) in counts.iter().enumerate() {
            if *lo > 0 && *hi > 0 && lo.abs_diff(*hi) < best {
                axis = a;
                best = lo.abs_diff(*hi);
            }
        }

        let split = mean[axis];
        let mut lower = 0;
        for i in 0..n {
            if self[ids[i]].bv.center()[axis] < split {
                ids.swap(i, lower);
                lower += 1;
            }
        }
        // Coincident centres leave one side empty.
        if lower == 0 || lower == n {
            n / 2
        } else {
            lower
        }
    }

    fn build_morton(&mut self, ids: &mut [NodeId]) -> Option<NodeId> {
        let bounds = self.bounds_of(ids)?;
        let origin = bounds.min();
        let extent = bounds.extents();
        let scale = Vec3::select(extent.cmpgt(Vec3::ZERO), extent.recip(), Vec3::ZERO);

        let mut keyed: Vec<(u32, NodeId)> = ids
            .iter()
            .map(|id| (morton_code((self[*id].bv.center() - origin) * scale), *id))
            .collect();
        keyed.sort_unstable();
        for (slot, (_, id)) in ids.iter_mut().zip(&keyed) {
            *slot = *id;
        }
        let codes: Vec<u32> = keyed.iter().map(|(code, _)| *code).collect();
        Some(self.morton_recurse(ids, &codes, MORTON_TOP_BIT))
    }

    /// Splits a code-sorted range on `bit`. All codes in the range agree on
    /// every higher bit, so the split point is a partition point.
    fn morton_recurse(&mut self, ids: &mut [NodeId], codes: &[u32], bit: u32) -> NodeId {
        if ids.len() == 1 {
            return ids[0];
        }
        if bit == 0 {
            return self.build_topdown(ids).unwrap_or(ids[0]);
        }
        let split = codes.partition_point(|code| code & bit == 0);
        if split == 0 || split == ids.len() {
            return self.morton_recurse(ids, codes, bit >> 1);
        }
        let (lo, hi) = ids.split_at_mut(split);
        let (clo, chi) = codes.split_at(split);
        let a = self.morton_recurse(lo, clo, bit >> 1);
        let b = self.morton_recurse(hi, chi, bit >> 1);
        self.join(a, b)
    }
}

/// Interleaves 10-bit quantised coordinates of a point in the unit cube.
fn morton_code(p: Vec3) -> u32 {
    let q = (p.clamp(Vec3::ZERO, Vec3::ONE) * 1023.0).as_uvec3();
    (spread_bits(q.x) << 2) | (spread_bits(q.y) << 1) | spread_bits(q.z)
}

/// Inserts two zero bits between each of the low ten bits of `v`.
fn spread_bits(v: u32) -> u32 {
    let mut v = v & 0x3ff;
    v = (v | (v << 16)) & 0x0300_00ff;
    v = (v | (v << 8)) & 0x0300_f00f;
    v = (v | (v << 4)) & 0x030c_30c3;
    v = (v | (v << 2)) & 0x0924_9249;
    v
}
