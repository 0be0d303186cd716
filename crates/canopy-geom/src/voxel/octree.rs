// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use glam::Vec3;

use super::{child_box, VoxelMap, VoxelNodeRef};
use crate::types::aabb::Aabb;

/// Deepest tree accepted by [`OccupancyOctree::new`].
const MAX_DEPTH: u8 = 16;

#[derive(Debug, Clone)]
struct OctNode {
    occupancy: f32,
    children: [Option<usize>; 8],
}

impl OctNode {
    fn new(occupancy: f32) -> Self {
        Self {
            occupancy,
            children: [None; 8],
        }
    }

    fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }
}

/// Sparse occupancy octree stored in a flat arena.
///
/// The root is a cube of side `resolution * 2^depth` centred on the origin.
/// Voxels are created on demand by [`OccupancyOctree::set_occupancy`]; every
/// inner node carries the maximum occupancy of its children, so a subtree is
/// only ever pruned as free when everything below it is free.
#[derive(Debug, Clone)]
pub struct OccupancyOctree {
    nodes: Vec<OctNode>,
    resolution: f32,
    depth: u8,
    occupancy_threshold: f32,
    free_threshold: f32,
    default_occupancy: f32,
}

impl OccupancyOctree {
    /// Empty map with voxels of edge `resolution` and `depth` subdivision levels.
    ///
    /// Thresholds default to 0.5 (occupied) and 0.0 (free); unobserved space
    /// reports the occupied threshold, i.e. unknown counts as potentially
    /// occupied. `depth` is clamped to 16.
    #[must_use]
    pub fn new(resolution: f32, depth: u8) -> Self {
        Self {
            nodes: Vec::new(),
            resolution: resolution.abs(),
            depth: depth.min(MAX_DEPTH),
            occupancy_threshold: 0.5,
            free_threshold: 0.0,
            default_occupancy: 0.5,
        }
    }

    /// Overrides the occupied/free thresholds. Unknown space keeps tracking
    /// the occupied threshold.
    #[must_use]
    pub fn with_thresholds(mut self, occupied: f32, free: f32) -> Self {
        self.occupancy_threshold = occupied;
        self.free_threshold = free;
        self.default_occupancy = occupied;
        self
    }

    /// Edge length of a leaf voxel.
    #[must_use]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Number of subdivision levels below the root.
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Number of allocated nodes (inner and leaf).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Records `occupancy` (clamped to `[0, 1]`) for the voxel containing `point`.
    ///
    /// Returns `false` and leaves the map untouched when the point lies outside
    /// the root box or either input is non-finite.
    pub fn set_occupancy(&mut self, point: Vec3, occupancy: f32) -> bool {
        if !point.is_finite() || !occupancy.is_finite() {
            return false;
        }
        let root_box = self.root_box();
        if !root_box.contains(&Aabb::new(point, point)) {
            return false;
        }
        let occupancy = occupancy.clamp(0.0, 1.0);

        if self.nodes.is_empty() {
            self.nodes.push(OctNode::new(self.default_occupancy));
        }
        let mut path = Vec::with_capacity(usize::from(self.depth) + 1);
        let mut node = 0usize;
        let mut bounds = root_box;
        path.push(node);
        for _ in 0..self.depth {
            let mid = bounds.center();
            let index = u8::from(point.x >= mid.x)
                | (u8::from(point.y >= mid.y) << 1)
                | (u8::from(point.z >= mid.z) << 2);
            let slot = usize::from(index);
            node = match self.nodes[node].children[slot] {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(OctNode::new(self.default_occupancy));
                    self.nodes[node].children[slot] = Some(child);
                    child
                }
            };
            bounds = child_box(&bounds, index);
            path.push(node);
        }
        self.nodes[node].occupancy = occupancy;

        // Inner nodes summarise their subtree with the maximum child value.
        for &inner in path.iter().rev().skip(1) {
            let max = self.nodes[inner]
                .children
                .iter()
                .flatten()
                .map(|&c| self.nodes[c].occupancy)
                .fold(f32::NEG_INFINITY, f32::max);
            self.nodes[inner].occupancy = max;
        }
        true
    }

    /// Boxes of every leaf voxel whose occupancy meets the occupied threshold.
    #[must_use]
    pub fn occupied_leaf_boxes(&self) -> Vec<Aabb> {
        let mut out = Vec::new();
        if let Some(root) = self.root() {
            self.collect_occupied(root, self.root_box(), &mut out);
        }
        out
    }

    fn collect_occupied(&self, node: VoxelNodeRef, bounds: Aabb, out: &mut Vec<Aabb>) {
        if !self.node_has_children(node) {
            if self.is_occupied(node) {
                out.push(bounds);
            }
            return;
        }
        for i in 0..8u8 {
            if let Some(child) = self.child(node, i) {
                self.collect_occupied(child, child_box(&bounds, i), out);
            }
        }
    }
}

impl VoxelMap for OccupancyOctree {
    fn root(&self) -> Option<VoxelNodeRef> {
        (!self.nodes.is_empty()).then_some(VoxelNodeRef(0))
    }

    fn root_box(&self) -> Aabb {
        let half = self.resolution * (1u32 << self.depth) as f32 * 0.5;
        Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(half))
    }

    fn node_has_children(&self, node: VoxelNodeRef) -> bool {
        self.nodes.get(node.0).is_some_and(OctNode::has_children)
    }

    fn child(&self, node: VoxelNodeRef, index: u8) -> Option<VoxelNodeRef> {
        self.nodes
            .get(node.0)?
            .children
            .get(usize::from(index))
            .copied()
            .flatten()
            .map(VoxelNodeRef)
    }

    fn occupancy(&self, node: VoxelNodeRef) -> f32 {
        self.nodes
            .get(node.0)
            .map_or(self.default_occupancy, |n| n.occupancy)
    }

    fn default_occupancy(&self) -> f32 {
        self.default_occupancy
    }

    fn occupancy_threshold(&self) -> f32 {
        self.occupancy_threshold
    }

    fn free_threshold(&self) -> f32 {
        self.free_threshold
    }
}
