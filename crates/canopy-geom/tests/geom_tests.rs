// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Integration tests for canopy-geom bounding volumes and placement.

use std::sync::Arc;

use canopy_geom::{
    child_box, Aabb, CollisionGeometry, CollisionObject, Obb, OccupancyOctree, Shape, Transform,
    VoxelMap,
};
use glam::{Quat, Vec3};
use proptest::prelude::*;

fn corners(b: &Aabb) -> [Vec3; 8] {
    let (lo, hi) = (b.min(), b.max());
    core::array::from_fn(|i| {
        Vec3::new(
            if i & 1 == 0 { lo.x } else { hi.x },
            if i & 2 == 0 { lo.y } else { hi.y },
            if i & 4 == 0 { lo.z } else { hi.z },
        )
    })
}

fn vec3() -> impl Strategy<Value = Vec3> {
    (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn aabb() -> impl Strategy<Value = Aabb> {
    (vec3(), (0.01f32..3.0, 0.01f32..3.0, 0.01f32..3.0))
        .prop_map(|(c, (hx, hy, hz))| Aabb::from_center_half_extents(c, Vec3::new(hx, hy, hz)))
}

fn rotation() -> impl Strategy<Value = Quat> {
    (vec3(), -3.1f32..3.1).prop_map(|(axis, angle)| {
        let axis = axis.try_normalize().unwrap_or(Vec3::Z);
        Quat::from_axis_angle(axis, angle)
    })
}

proptest! {
    #[test]
    fn transformed_box_encloses_every_transformed_corner(
        b in aabb(),
        t in vec3(),
        r in rotation(),
    ) {
        let tf = Transform::new(t, r);
        let world = b.transformed(&tf).inflate(1e-4);
        for c in corners(&b) {
            let p = tf.transform_point(c);
            prop_assert!(world.contains(&Aabb::new(p, p)), "corner {p:?} escapes {world:?}");
        }
    }

    #[test]
    fn obb_overlap_implies_enclosing_box_overlap(
        a in aabb(),
        b in aabb(),
        t in vec3(),
        r in rotation(),
    ) {
        let tf = Transform::new(t, r);
        let placed = Obb::from_aabb(&a, &tf);
        if placed.overlaps_aabb(&b) {
            prop_assert!(a.transformed(&tf).inflate(1e-4).overlaps(&b));
        }
    }

    #[test]
    fn distance_is_zero_exactly_when_overlapping(a in aabb(), b in aabb()) {
        let d = a.distance(&b);
        prop_assert!(d >= 0.0);
        prop_assert_eq!(d == 0.0, a.overlaps(&b));
        prop_assert!((d - b.distance(&a)).abs() < 1e-5);
    }

    #[test]
    fn union_contains_both(a in aabb(), b in aabb()) {
        let u = a.union(&b);
        prop_assert!(u.contains(&a) && u.contains(&b));
        prop_assert!(u.size() >= a.size().max(b.size()));
    }
}

#[test]
fn pure_translation_matches_general_path() {
    let local = Aabb::from_center_half_extents(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 0.1, 0.1));
    let shift = Transform::from_translation(Vec3::new(10.0, -2.0, 0.5));
    let fast = local.transformed(&shift);
    let slow = local.transformed(&Transform::new(
        shift.translation(),
        Quat::from_rotation_z(1e-9),
    ));
    assert!(fast.min().abs_diff_eq(Vec3::new(10.0, -2.1, 0.4), 1e-6));
    assert!(fast.min().abs_diff_eq(slow.min(), 1e-5));
    assert!(fast.max().abs_diff_eq(slow.max(), 1e-5));
}

#[test]
fn object_over_octree_uses_root_box() -> Result<(), canopy_geom::GeomError> {
    let mut map = OccupancyOctree::new(0.25, 4);
    assert!(map.set_occupancy(Vec3::new(0.1, 0.1, 0.1), 1.0));
    let root_box = map.root_box();
    let geometry = Arc::new(CollisionGeometry::new(Shape::Octree(Box::new(map))));
    let obj = CollisionObject::new(geometry, Transform::from_translation(Vec3::X))?;
    assert_eq!(obj.aabb().min().to_array(), (root_box.min() + Vec3::X).to_array());
    assert!(!obj.is_free());
    Ok(())
}

#[test]
fn octant_walk_reaches_the_occupied_voxel() {
    let mut map = OccupancyOctree::new(1.0, 3);
    let target = Vec3::new(-2.5, 1.5, 3.5);
    assert!(map.set_occupancy(target, 0.8));

    let mut node = map.root();
    let mut bounds = map.root_box();
    let mut levels = 0;
    while let Some(n) = node.filter(|n| map.node_has_children(*n)) {
        let next = (0..8u8).find(|i| map.child_exists(n, *i));
        let Some(i) = next else { break };
        bounds = child_box(&bounds, i);
        node = map.child(n, i);
        levels += 1;
    }
    assert_eq!(levels, 3);
    assert!(bounds.contains(&Aabb::new(target, target)));
    assert!(node.is_some_and(|n| map.is_occupied(n)));
}
