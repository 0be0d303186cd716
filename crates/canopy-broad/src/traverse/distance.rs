// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use canopy_geom::CollisionObject;

use super::nearer_first;
use crate::index::TrackedTree;
use crate::tree::{NodeId, NodeKind};

/// Branch-and-bound nearest-pair search between two subtrees.
///
/// Leaf pairs reach `callback` unconditionally once their ancestors survive
/// the bound; the callback computes the true distance and lowers `min_dist`
/// when it finds something closer.
pub fn distance_trees<H, F>(
    tree1: &TrackedTree<H>,
    root1: NodeId,
    tree2: &TrackedTree<H>,
    root2: NodeId,
    callback: &mut F,
    min_dist: &mut f32,
) -> bool
where
    H: Copy,
    F: FnMut(H, H, &mut f32) -> bool,
{
    let (n1, n2) = (&tree1[root1], &tree2[root2]);
    match (n1.kind(), n2.kind()) {
        (NodeKind::Leaf(a), NodeKind::Leaf(b)) => callback(a.handle, b.handle, min_dist),
        (NodeKind::Internal([c0, c1]), _) if n2.is_leaf() || n1.bv().size() > n2.bv().size() => {
            let d0 = n2.bv().distance(tree1[*c0].bv());
            let d1 = n2.bv().distance(tree1[*c1].bv());
            for (d, child) in nearer_first((d0, *c0), (d1, *c1)) {
                if d < *min_dist && distance_trees(tree1, child, tree2, root2, callback, min_dist) {
                    return true;
                }
            }
            false
        }
        (_, NodeKind::Internal([c0, c1])) => {
            let d0 = n1.bv().distance(tree2[*c0].bv());
            let d1 = n1.bv().distance(tree2[*c1].bv());
            for (d, child) in nearer_first((d0, *c0), (d1, *c1)) {
                if d < *min_dist && distance_trees(tree1, root1, tree2, child, callback, min_dist) {
                    return true;
                }
            }
            false
        }
        _ => false,
    }
}

/// Nearest-pair search within one subtree.
pub fn self_distance<H, F>(
    tree: &TrackedTree<H>,
    root: NodeId,
    callback: &mut F,
    min_dist: &mut f32,
) -> bool
where
    H: Copy,
    F: FnMut(H, H, &mut f32) -> bool,
{
    let Some([c0, c1]) = tree[root].children() else {
        return false;
    };
    self_distance(tree, c0, callback, min_dist)
        || self_distance(tree, c1, callback, min_dist)
        || distance_trees(tree, c0, tree, c1, callback, min_dist)
}

/// Nearest-leaf search against a single query object.
pub fn distance_query<H, F>(
    tree: &TrackedTree<H>,
    root: NodeId,
    query: &CollisionObject,
    callback: &mut F,
    min_dist: &mut f32,
) -> bool
where
    H: Copy,
    F: FnMut(H, &CollisionObject, &mut f32) -> bool,
{
    match tree[root].kind() {
        NodeKind::Leaf(t) => callback(t.handle, query, min_dist),
        NodeKind::Internal([c0, c1]) => {
            let d0 = query.aabb().distance(tree[*c0].bv());
            let d1 = query.aabb().distance(tree[*c1].bv());
            for (d, child) in nearer_first((d0, *c0), (d1, *c1)) {
                if d < *min_dist && distance_query(tree, child, query, callback, min_dist) {
                    return true;
                }
            }
            false
        }
        NodeKind::Free => false,
    }
}
