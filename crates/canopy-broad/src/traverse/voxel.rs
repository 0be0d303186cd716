// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hierarchy against a voxel occupancy map, octant by octant.
//!
//! Voxel boxes are expressed in the map's local frame and placed into the
//! world through a [`VoxelPlacement`]. Leaf pairs reach the callback as a
//! transient box-shaped [`CollisionObject`] that lives for that one call.

use std::sync::Arc;

use canopy_geom::{
    child_box, Aabb, CollisionGeometry, CollisionObject, Obb, Shape, Transform, VoxelMap,
    VoxelNodeRef,
};
use glam::Vec3;

use super::nearer_first;
use crate::index::TrackedTree;
use crate::tree::{NodeId, NodeKind};

/// Places map-local voxel boxes into the world.
pub trait VoxelPlacement {
    /// Overlap between a world-space tree box and a map-local voxel box.
    fn overlaps(&self, tree_bv: &Aabb, voxel_bv: &Aabb) -> bool;
    /// World-space box enclosing a map-local voxel box.
    fn world_aabb(&self, voxel_bv: &Aabb) -> Aabb;
    /// Pose of the proxy box built for a map-local voxel box.
    fn proxy_transform(&self, voxel_bv: &Aabb) -> Transform;
}

/// Map pose without rotation: boxes are shifted, never re-enclosed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Translated(pub Vec3);

impl VoxelPlacement for Translated {
    fn overlaps(&self, tree_bv: &Aabb, voxel_bv: &Aabb) -> bool {
        tree_bv.overlaps(&voxel_bv.translated(self.0))
    }

    fn world_aabb(&self, voxel_bv: &Aabb) -> Aabb {
        voxel_bv.translated(self.0)
    }

    fn proxy_transform(&self, voxel_bv: &Aabb) -> Transform {
        Transform::from_translation(self.0 + voxel_bv.center())
    }
}

/// General rigid map pose: overlap is an oriented-box test, distance bounds
/// use the enclosing world box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rigid(pub Transform);

impl VoxelPlacement for Rigid {
    fn overlaps(&self, tree_bv: &Aabb, voxel_bv: &Aabb) -> bool {
        Obb::from_aabb(voxel_bv, &self.0).overlaps_aabb(tree_bv)
    }

    fn world_aabb(&self, voxel_bv: &Aabb) -> Aabb {
        voxel_bv.transformed(&self.0)
    }

    fn proxy_transform(&self, voxel_bv: &Aabb) -> Transform {
        self.0
            .mul_transform(&Transform::from_translation(voxel_bv.center()))
    }
}

/// Builds the transient box standing in for a voxel.
fn proxy<P: VoxelPlacement>(
    placement: &P,
    voxel_bv: &Aabb,
    geometry: CollisionGeometry,
) -> Option<CollisionObject> {
    // Non-finite voxel boxes cannot be placed; they are skipped.
    CollisionObject::new(Arc::new(geometry), placement.proxy_transform(voxel_bv)).ok()
}

fn voxel_box(voxel_bv: &Aabb) -> CollisionGeometry {
    CollisionGeometry::new(Shape::Cuboid {
        half_extents: voxel_bv.half_extents(),
    })
}

/// Reports tree leaves that may touch occupied or unknown voxels.
///
/// `node == None` stands for space the map has never observed: it counts as
/// potentially occupied with the map's default occupancy, so every non-free
/// leaf overlapping it is reported. Known free voxels prune their whole
/// subtree. Proxies for observed voxels carry the voxel's occupancy as
/// `cost_density` and the map's occupied threshold; proxies for unknown space
/// carry the default occupancy.
///
/// The tree side is split while the map node has no children or the tree
/// node is the larger box; otherwise all eight octants are visited, absent
/// ones as unknown space.
pub fn collide_voxels<H, P, F>(
    tree: &TrackedTree<H>,
    root: NodeId,
    map: &dyn VoxelMap,
    node: Option<VoxelNodeRef>,
    voxel_bv: &Aabb,
    placement: &P,
    callback: &mut F,
) -> bool
where
    H: Copy,
    P: VoxelPlacement,
    F: FnMut(H, &CollisionObject) -> bool,
{
    let tree_node = &tree[root];
    let Some(vnode) = node else {
        return match tree_node.kind() {
            NodeKind::Leaf(obj) => {
                if obj.free || !placement.overlaps(tree_node.bv(), voxel_bv) {
                    return false;
                }
                let geometry = voxel_box(voxel_bv).with_cost_density(map.default_occupancy());
                proxy(placement, voxel_bv, geometry)
                    .is_some_and(|p| callback(obj.handle, &p))
            }
            NodeKind::Internal([c0, c1]) => {
                placement.overlaps(tree_node.bv(), voxel_bv)
                    && (collide_voxels(tree, *c0, map, None, voxel_bv, placement, callback)
                        || collide_voxels(tree, *c1, map, None, voxel_bv, placement, callback))
            }
            NodeKind::Free => false,
        };
    };

    let map_leaf = !map.node_has_children(vnode);
    if let (NodeKind::Leaf(obj), true) = (tree_node.kind(), map_leaf) {
        if map.is_free(vnode) || obj.free || !placement.overlaps(tree_node.bv(), voxel_bv) {
            return false;
        }
        let geometry = voxel_box(voxel_bv)
            .with_cost_density(map.occupancy(vnode))
            .with_thresholds(map.occupancy_threshold(), 0.0);
        return proxy(placement, voxel_bv, geometry).is_some_and(|p| callback(obj.handle, &p));
    }

    if map.is_free(vnode) || !placement.overlaps(tree_node.bv(), voxel_bv) {
        return false;
    }

    match tree_node.children() {
        Some([c0, c1]) if map_leaf || tree_node.bv().size() > voxel_bv.size() => {
            collide_voxels(tree, c0, map, node, voxel_bv, placement, callback)
                || collide_voxels(tree, c1, map, node, voxel_bv, placement, callback)
        }
        _ => (0..8u8).any(|i| {
            let child_bv = child_box(voxel_bv, i);
            collide_voxels(tree, root, map, map.child(vnode, i), &child_bv, placement, callback)
        }),
    }
}

/// Branch-and-bound search between tree leaves and occupied voxels.
///
/// Only existing, occupied octants are visited; unknown space never reaches
/// the callback. Descent follows the same size rule as [`collide_voxels`],
/// nearer candidates first.
pub fn distance_voxels<H, P, F>(
    tree: &TrackedTree<H>,
    root: NodeId,
    map: &dyn VoxelMap,
    node: VoxelNodeRef,
    voxel_bv: &Aabb,
    placement: &P,
    callback: &mut F,
    min_dist: &mut f32,
) -> bool
where
    H: Copy,
    P: VoxelPlacement,
    F: FnMut(H, &CollisionObject, &mut f32) -> bool,
{
    let tree_node = &tree[root];
    let map_leaf = !map.node_has_children(node);
    if let (NodeKind::Leaf(obj), true) = (tree_node.kind(), map_leaf) {
        if !map.is_occupied(node) {
            return false;
        }
        return proxy(placement, voxel_bv, voxel_box(voxel_bv))
            .is_some_and(|p| callback(obj.handle, &p, min_dist));
    }

    if !map.is_occupied(node) {
        return false;
    }

    match tree_node.children() {
        Some([c0, c1]) if map_leaf || tree_node.bv().size() > voxel_bv.size() => {
            let world = placement.world_aabb(voxel_bv);
            let d0 = world.distance(tree[c0].bv());
            let d1 = world.distance(tree[c1].bv());
            for (d, child) in nearer_first((d0, c0), (d1, c1)) {
                if d < *min_dist
                    && distance_voxels(
                        tree, child, map, node, voxel_bv, placement, callback, min_dist,
                    )
                {
                    return true;
                }
            }
            false
        }
        _ => {
            for i in 0..8u8 {
                let Some(child) = map.child(node, i) else {
                    continue;
                };
                let child_bv = child_box(voxel_bv, i);
                let d = tree_node.bv().distance(&placement.world_aabb(&child_bv));
                if d < *min_dist
                    && distance_voxels(
                        tree, root, map, child, &child_bv, placement, callback, min_dist,
                    )
                {
                    return true;
                }
            }
            false
        }
    }
}
