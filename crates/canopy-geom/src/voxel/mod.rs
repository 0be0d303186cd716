// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Voxel occupancy maps.
//!
//! The broad phase never looks inside a map's storage. It walks the map
//! through [`VoxelMap`], one octant at a time, and derives child boxes with
//! [`child_box`]. [`OccupancyOctree`] is a small in-memory implementation used
//! by tests and benches; production maps implement the trait themselves.

use core::fmt;

use crate::types::aabb::Aabb;

mod octree;

pub use octree::OccupancyOctree;

/// Opaque reference to a node inside a [`VoxelMap`].
///
/// Only meaningful for the map that produced it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VoxelNodeRef(pub usize);

/// Read-only capability the broad phase needs from a sparse occupancy map.
///
/// Children are indexed `0..8`; see [`child_box`] for the octant layout.
/// Occupancy values are probabilities in `[0, 1]`.
pub trait VoxelMap: fmt::Debug + Send + Sync {
    /// Root node, or `None` when nothing has been observed yet.
    fn root(&self) -> Option<VoxelNodeRef>;

    /// Box covered by the root node, in the map's local frame.
    fn root_box(&self) -> Aabb;

    /// Returns `true` if `node` has at least one child.
    fn node_has_children(&self, node: VoxelNodeRef) -> bool;

    /// Returns `true` if child `index` of `node` exists.
    fn child_exists(&self, node: VoxelNodeRef, index: u8) -> bool {
        self.child(node, index).is_some()
    }

    /// Child `index` of `node`, if present.
    fn child(&self, node: VoxelNodeRef, index: u8) -> Option<VoxelNodeRef>;

    /// Occupancy probability stored at `node`.
    fn occupancy(&self, node: VoxelNodeRef) -> f32;

    /// Occupancy assumed for space the map has never observed.
    fn default_occupancy(&self) -> f32;

    /// Nodes at or above this occupancy are occupied.
    fn occupancy_threshold(&self) -> f32;

    /// Nodes at or below this occupancy are free.
    fn free_threshold(&self) -> f32;

    /// Returns `true` if `node` is occupied.
    fn is_occupied(&self, node: VoxelNodeRef) -> bool {
        self.occupancy(node) >= self.occupancy_threshold()
    }

    /// Returns `true` if `node` is known free space.
    fn is_free(&self, node: VoxelNodeRef) -> bool {
        self.occupancy(node) <= self.free_threshold()
    }
}

/// Box of octant `index` inside `parent`.
///
/// Bit 0 selects the upper half along x, bit 1 along y, bit 2 along z.
#[must_use]
pub fn child_box(parent: &Aabb, index: u8) -> Aabb {
    let mid = parent.center();
    let (mut min, mut max) = (parent.min(), parent.max());
    if index & 1 == 0 {
        max.x = mid.x;
    } else {
        min.x = mid.x;
    }
    if index & 2 == 0 {
        max.y = mid.y;
    } else {
        min.y = mid.y;
    }
    if index & 4 == 0 {
        max.z = mid.z;
    } else {
        min.z = mid.z;
    }
    Aabb::new(min, max)
}
