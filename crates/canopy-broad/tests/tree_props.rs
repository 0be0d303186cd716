// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Structural invariants under random operation sequences.

use std::collections::BTreeMap;
use std::sync::Arc;

use canopy_broad::{DynamicAabbTreeManager, HierarchyTree, NodeId};
use canopy_geom::{Aabb, CollisionGeometry, CollisionObject, Shape, Transform};
use glam::Vec3;
use proptest::prelude::*;

fn vec3(range: f32) -> impl Strategy<Value = Vec3> {
    (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn aabb() -> impl Strategy<Value = Aabb> {
    (vec3(50.0), (0.01f32..5.0, 0.01f32..5.0, 0.01f32..5.0))
        .prop_map(|(c, (x, y, z))| Aabb::from_center_half_extents(c, Vec3::new(x, y, z)))
}

#[derive(Debug, Clone)]
enum TreeOp {
    Insert(Aabb),
    Remove(usize),
    Update(usize, Aabb),
    Incremental(u32),
    TopDown,
}

fn tree_op() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        4 => aabb().prop_map(TreeOp::Insert),
        2 => any::<usize>().prop_map(TreeOp::Remove),
        3 => (any::<usize>(), aabb()).prop_map(|(i, b)| TreeOp::Update(i, b)),
        1 => (1u32..8).prop_map(TreeOp::Incremental),
        1 => Just(TreeOp::TopDown),
    ]
}

#[derive(Debug, Clone)]
enum ManagerOp {
    Register(u8, Vec3),
    Unregister(u8),
    Move(u8, Vec3),
    ShiftAll(Vec3),
    Query,
}

fn manager_op() -> impl Strategy<Value = ManagerOp> {
    prop_oneof![
        4 => (0u8..24, vec3(30.0)).prop_map(|(h, p)| ManagerOp::Register(h, p)),
        2 => (0u8..24).prop_map(ManagerOp::Unregister),
        3 => (0u8..24, vec3(30.0)).prop_map(|(h, p)| ManagerOp::Move(h, p)),
        1 => vec3(3.0).prop_map(ManagerOp::ShiftAll),
        1 => Just(ManagerOp::Query),
    ]
}

fn unit_box_at(p: Vec3) -> Option<CollisionObject> {
    let shape = Shape::cuboid(Vec3::splat(0.75)).ok()?;
    let geometry = Arc::new(CollisionGeometry::new(shape));
    CollisionObject::new(geometry, Transform::from_translation(p)).ok()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tree_invariants_hold_after_every_operation(ops in prop::collection::vec(tree_op(), 1..80)) {
        let mut tree = HierarchyTree::new();
        let mut live: Vec<(NodeId, Aabb, u32)> = Vec::new();
        let mut next = 0u32;
        for op in ops {
            match op {
                TreeOp::Insert(bv) => {
                    let id = tree.insert(bv, next);
                    live.push((id, bv, next));
                    next += 1;
                }
                TreeOp::Remove(i) if !live.is_empty() => {
                    let (id, _, data) = live.swap_remove(i % live.len());
                    prop_assert_eq!(tree.remove(id), Some(data));
                }
                TreeOp::Update(i, bv) if !live.is_empty() => {
                    let slot = i % live.len();
                    tree.update(live[slot].0, bv);
                    live[slot].1 = bv;
                }
                TreeOp::Incremental(passes) => {
                    let before = tree.max_height();
                    tree.balance_incremental(passes);
                    prop_assert!(tree.max_height() <= before);
                }
                TreeOp::TopDown => {
                    tree.balance_topdown();
                    if tree.len() > 1 {
                        let ideal = usize::BITS - (tree.len() - 1).leading_zeros();
                        prop_assert_eq!(tree.max_height(), ideal);
                    }
                }
                _ => {}
            }
            prop_assert!(tree.validate().is_ok(), "{:?}", tree.validate());
            prop_assert_eq!(tree.len(), live.len());
            // Leaf ids survive every rebalance with their box and payload.
            for (id, bv, data) in &live {
                let node = tree.node(*id);
                prop_assert_eq!(node.map(|n| *n.bv()), Some(*bv));
                prop_assert_eq!(tree.leaf_data(*id), Some(data));
            }
        }
    }

    #[test]
    fn manager_index_tracks_last_reported_boxes(ops in prop::collection::vec(manager_op(), 1..60)) {
        let mut mgr = DynamicAabbTreeManager::new();
        let mut model: BTreeMap<u8, CollisionObject> = BTreeMap::new();
        for op in ops {
            match op {
                ManagerOp::Register(h, p) => {
                    let Some(object) = unit_box_at(p) else { continue };
                    let result = mgr.register_object(h, &object);
                    prop_assert_eq!(result.is_ok(), !model.contains_key(&h));
                    model.entry(h).or_insert(object);
                }
                ManagerOp::Unregister(h) => {
                    prop_assert_eq!(mgr.unregister_object(h).is_ok(), model.remove(&h).is_some());
                }
                ManagerOp::Move(h, p) => {
                    if let Some(object) = model.get_mut(&h) {
                        object.set_translation(p);
                        prop_assert!(object.compute_aabb().is_ok());
                        prop_assert!(mgr.update_object(h, object).is_ok());
                    } else {
                        let Some(object) = unit_box_at(p) else { continue };
                        prop_assert!(mgr.update_object(h, &object).is_err());
                    }
                }
                ManagerOp::ShiftAll(step) => {
                    for object in model.values_mut() {
                        let p = object.transform().translation() + step;
                        object.set_translation(p);
                        prop_assert!(object.compute_aabb().is_ok());
                    }
                    prop_assert!(mgr.update(&model).is_ok());
                }
                ManagerOp::Query => {
                    let mut count = 0usize;
                    mgr.self_collide(|_, _| {
                        count += 1;
                        false
                    });
                    let n = model.len();
                    prop_assert!(count <= n * n.saturating_sub(1) / 2);
                }
            }

            prop_assert!(mgr.tree().validate().is_ok());
            prop_assert_eq!(mgr.len(), model.len());
            let leaves: BTreeMap<u8, Aabb> = mgr
                .tree()
                .leaves()
                .map(|(id, t)| (t.handle, *mgr.tree()[id].bv()))
                .collect();
            let expected: BTreeMap<u8, Aabb> =
                model.iter().map(|(h, o)| (*h, *o.aabb())).collect();
            prop_assert_eq!(leaves, expected);
            for h in model.keys() {
                prop_assert!(mgr.contains(*h));
            }
        }
    }

    #[test]
    fn register_then_unregister_round_trips(
        points in prop::collection::vec(vec3(20.0), 0..40),
        extra in vec3(20.0),
    ) {
        let mut mgr = DynamicAabbTreeManager::new();
        for (i, p) in points.iter().enumerate() {
            let Some(object) = unit_box_at(*p) else { continue };
            prop_assert!(mgr.register_object(i, &object).is_ok());
        }
        let before_len = mgr.len();
        let before_tree = mgr.tree().len();
        let handle = points.len();
        let Some(object) = unit_box_at(extra) else { return Ok(()) };
        prop_assert!(mgr.register_object(handle, &object).is_ok());
        prop_assert!(mgr.contains(handle));
        prop_assert!(mgr.unregister_object(handle).is_ok());
        prop_assert_eq!(mgr.len(), before_len);
        prop_assert_eq!(mgr.tree().len(), before_tree);
        prop_assert!(!mgr.contains(handle));
        prop_assert!(mgr.tree().validate().is_ok());
    }
}
