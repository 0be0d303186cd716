// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use canopy_geom::CollisionObject;

use crate::index::TrackedTree;
use crate::tree::{NodeId, NodeKind};

/// Reports every overlapping leaf pair between the subtrees at `root1` and
/// `root2`.
///
/// Descends the larger node (by [`canopy_geom::Aabb::size`]) while the other
/// stays put. Returns `true` if the callback stopped the traversal.
pub fn collide_trees<H, F>(
    tree1: &TrackedTree<H>,
    root1: NodeId,
    tree2: &TrackedTree<H>,
    root2: NodeId,
    callback: &mut F,
) -> bool
where
    H: Copy,
    F: FnMut(H, H) -> bool,
{
    let (n1, n2) = (&tree1[root1], &tree2[root2]);
    if !n1.bv().overlaps(n2.bv()) {
        return false;
    }
    match (n1.kind(), n2.kind()) {
        (NodeKind::Leaf(a), NodeKind::Leaf(b)) => callback(a.handle, b.handle),
        (NodeKind::Internal([c0, c1]), _) if n2.is_leaf() || n1.bv().size() > n2.bv().size() => {
            collide_trees(tree1, *c0, tree2, root2, callback)
                || collide_trees(tree1, *c1, tree2, root2, callback)
        }
        (_, NodeKind::Internal([c0, c1])) => {
            collide_trees(tree1, root1, tree2, *c0, callback)
                || collide_trees(tree1, root1, tree2, *c1, callback)
        }
        _ => false,
    }
}

/// Reports every overlapping leaf pair within one subtree, each unordered
/// pair once and never a leaf with itself.
pub fn self_collide<H, F>(tree: &TrackedTree<H>, root: NodeId, callback: &mut F) -> bool
where
    H: Copy,
    F: FnMut(H, H) -> bool,
{
    let Some([c0, c1]) = tree[root].children() else {
        return false;
    };
    self_collide(tree, c0, callback)
        || self_collide(tree, c1, callback)
        || collide_trees(tree, c0, tree, c1, callback)
}

/// Reports every leaf whose box overlaps `query`'s box.
///
/// At each internal node the child selected as closer to the query is
/// visited first.
pub fn collide_query<H, F>(
    tree: &TrackedTree<H>,
    root: NodeId,
    query: &CollisionObject,
    callback: &mut F,
) -> bool
where
    H: Copy,
    F: FnMut(H, &CollisionObject) -> bool,
{
    let node = &tree[root];
    if !node.bv().overlaps(query.aabb()) {
        return false;
    }
    match node.kind() {
        NodeKind::Leaf(t) => callback(t.handle, query),
        NodeKind::Internal([c0, c1]) => {
            let (first, second) = if tree.select(query.aabb(), *c0, *c1) == 0 {
                (*c0, *c1)
            } else {
                (*c1, *c0)
            };
            collide_query(tree, first, query, callback)
                || collide_query(tree, second, query, callback)
        }
        NodeKind::Free => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Tracked;
    use canopy_geom::Aabb;
    use glam::Vec3;

    fn tree_of(centers: &[f32]) -> TrackedTree<usize> {
        let mut tree = TrackedTree::new();
        for (i, x) in centers.iter().enumerate() {
            let bv = Aabb::from_center_half_extents(Vec3::new(*x, 0.0, 0.0), Vec3::splat(0.5));
            tree.insert(bv, Tracked { handle: i, free: false });
        }
        tree
    }

    #[test]
    fn self_collide_visits_each_pair_once() {
        // 0-1 overlap, 1-2 touch, 3 is isolated.
        let tree = tree_of(&[0.0, 0.5, 1.5, 10.0]);
        let mut pairs = Vec::new();
        let root = tree.root().unwrap_or(NodeId(0));
        let stopped = self_collide(&tree, root, &mut |a, b| {
            pairs.push((a.min(b), a.max(b)));
            false
        });
        assert!(!stopped);
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn callback_true_stops_immediately() {
        let tree = tree_of(&[0.0, 0.1, 0.2, 0.3, 0.4]);
        let root = tree.root().unwrap_or(NodeId(0));
        let mut calls = 0;
        let stopped = self_collide(&tree, root, &mut |_, _| {
            calls += 1;
            true
        });
        assert!(stopped);
        assert_eq!(calls, 1);
    }
}
