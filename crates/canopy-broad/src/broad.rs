// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Handle-keyed broad-phase contract with deterministic pair output.

use core::fmt;
use core::hash::Hash;

use canopy_geom::Aabb;

use crate::manager::DynamicAabbTreeManager;

/// Broad-phase interface for inserting proxies and querying overlapping pairs.
///
/// Implementations must return pairs deterministically: the pair `(a, b)` is
/// canonicalized such that `a < b`, and the full list is sorted ascending by
/// `(a, b)`.
pub trait BroadPhase<H> {
    /// Inserts or updates the proxy with the given `id` and `aabb`.
    fn upsert(&mut self, id: H, aabb: Aabb);
    /// Removes a proxy if present.
    fn remove(&mut self, id: H);
    /// Returns a canonical, deterministically-ordered list of overlapping pairs.
    ///
    /// Takes `&mut self` so implementations may restructure before walking.
    fn pairs(&mut self) -> Vec<(H, H)>;
}

/// Proxies inserted through [`BroadPhase::upsert`] are never free space.
///
/// `upsert` and `remove` only mark the hierarchy dirty; `pairs` rebalances it
/// like any other query before walking.
impl<H> BroadPhase<H> for DynamicAabbTreeManager<H>
where
    H: Copy + Ord + Hash + fmt::Debug,
{
    fn upsert(&mut self, id: H, aabb: Aabb) {
        self.upsert_box(id, aabb);
    }

    fn remove(&mut self, id: H) {
        // Unknown ids are ignored.
        let _ = self.unregister_object(id);
    }

    fn pairs(&mut self) -> Vec<(H, H)> {
        let mut out = Vec::new();
        self.self_collide(|a, b| {
            out.push(if a < b { (a, b) } else { (b, a) });
            false
        });
        out.sort_unstable();
        out.dedup();
        out
    }
}
