// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lookup into caller-owned object storage.
//!
//! The manager never owns tracked objects. A full
//! [`crate::DynamicAabbTreeManager::update`] reads every registered handle's
//! current pose and box through this trait.

use core::hash::{BuildHasher, Hash};
use std::collections::{BTreeMap, HashMap};

use canopy_geom::CollisionObject;

/// Resolves handles of type `H` to objects.
pub trait ObjectStore<H> {
    /// Object behind `handle`, if it still exists.
    fn object(&self, handle: H) -> Option<&CollisionObject>;
}

impl<H: Eq + Hash, S: BuildHasher> ObjectStore<H> for HashMap<H, CollisionObject, S> {
    fn object(&self, handle: H) -> Option<&CollisionObject> {
        self.get(&handle)
    }
}

impl<H: Ord> ObjectStore<H> for BTreeMap<H, CollisionObject> {
    fn object(&self, handle: H) -> Option<&CollisionObject> {
        self.get(&handle)
    }
}

impl ObjectStore<usize> for [CollisionObject] {
    fn object(&self, handle: usize) -> Option<&CollisionObject> {
        self.get(handle)
    }
}

impl ObjectStore<usize> for Vec<CollisionObject> {
    fn object(&self, handle: usize) -> Option<&CollisionObject> {
        self.get(handle)
    }
}
