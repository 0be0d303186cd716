// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Broad-phase manager over a dynamic AABB hierarchy.

use core::fmt;
use core::hash::Hash;

use canopy_geom::{Aabb, CollisionObject, Shape, Transform, VoxelMap};
use rustc_hash::FxHashSet;
use tracing::{debug, instrument, trace};

use crate::config::{BroadPhaseConfig, ConfigError};
use crate::error::BroadPhaseError;
use crate::index::{ObjectIndex, Tracked, TrackedTree};
use crate::store::ObjectStore;
use crate::traverse::{
    collide_query, collide_trees, collide_voxels, distance_query, distance_trees,
    distance_voxels, self_collide, self_distance, Rigid, Translated,
};
use crate::tree::NodeId;

/// Tracks caller-owned objects by handle and answers collision and distance
/// queries against them.
///
/// The manager never owns objects; it stores each handle's last reported
/// box. Mutations mark the hierarchy as possibly unbalanced and every query
/// rebalances first (see [`DynamicAabbTreeManager::setup`]), which is why
/// queries take `&mut self`.
///
/// Callbacks receive handles (or a handle and an object). Returning `true`
/// stops the query. The order in which pairs are reported is unspecified and
/// may change after any mutation or rebalance; use
/// [`crate::BroadPhase::pairs`] for a canonical ordering.
#[derive(Debug, Clone)]
pub struct DynamicAabbTreeManager<H> {
    tree: TrackedTree<H>,
    index: ObjectIndex<H>,
    config: BroadPhaseConfig,
    setup_done: bool,
}

impl<H> Default for DynamicAabbTreeManager<H> {
    fn default() -> Self {
        let config = BroadPhaseConfig::default();
        Self {
            tree: TrackedTree::with_build_params(
                config.tree_topdown_balance_threshold,
                config.tree_topdown_level,
            ),
            index: ObjectIndex::default(),
            config,
            setup_done: false,
        }
    }
}

impl<H: Copy + Eq + Hash + fmt::Debug> DynamicAabbTreeManager<H> {
    /// Empty manager with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty manager with a validated configuration.
    pub fn with_config(config: BroadPhaseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tree: TrackedTree::with_build_params(
                config.tree_topdown_balance_threshold,
                config.tree_topdown_level,
            ),
            index: ObjectIndex::new(),
            config,
            setup_done: false,
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &BroadPhaseConfig {
        &self.config
    }

    /// Number of registered objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `handle` is registered.
    #[must_use]
    pub fn contains(&self, handle: H) -> bool {
        self.index.contains(&handle)
    }

    /// Registered handles in unspecified order.
    pub fn objects(&self) -> impl Iterator<Item = H> + '_ {
        self.index.iter().map(|(h, _)| h)
    }

    /// Read-only view of the hierarchy.
    #[must_use]
    pub fn tree(&self) -> &TrackedTree<H> {
        &self.tree
    }

    /// Registers one object under `handle` using its current cached box.
    pub fn register_object(
        &mut self,
        handle: H,
        object: &CollisionObject,
    ) -> Result<(), BroadPhaseError> {
        if self.index.contains(&handle) {
            return Err(BroadPhaseError::DuplicateObject);
        }
        self.insert_leaf(handle, *object.aabb(), object.is_free());
        Ok(())
    }

    /// Registers a batch of objects.
    ///
    /// An empty manager is bulk-built in one pass and left balanced;
    /// otherwise objects are inserted one by one. The batch is rejected
    /// whole if any handle is already registered or repeats within it.
    pub fn register_objects<'a, I>(&mut self, objects: I) -> Result<(), BroadPhaseError>
    where
        I: IntoIterator<Item = (H, &'a CollisionObject)>,
    {
        let batch: Vec<(H, &CollisionObject)> = objects.into_iter().collect();
        if batch.is_empty() {
            return Ok(());
        }
        let mut seen = FxHashSet::default();
        seen.reserve(batch.len());
        for (handle, _) in &batch {
            if self.index.contains(handle) || !seen.insert(*handle) {
                return Err(BroadPhaseError::DuplicateObject);
            }
        }

        if !self.is_empty() {
            for (handle, object) in batch {
                self.insert_leaf(handle, *object.aabb(), object.is_free());
            }
            return Ok(());
        }

        let leaves = batch.iter().map(|(handle, object)| {
            let data = Tracked {
                handle: *handle,
                free: object.is_free(),
            };
            (*object.aabb(), data)
        });
        let ids = self.tree.init(leaves, self.config.tree_init_level);
        self.index.reserve(ids.len());
        for ((handle, _), leaf) in batch.iter().zip(ids) {
            self.index.insert(*handle, leaf);
        }
        self.setup_done = true;
        debug!(objects = self.len(), "registered batch");
        Ok(())
    }

    /// Unregisters `handle`.
    pub fn unregister_object(&mut self, handle: H) -> Result<(), BroadPhaseError> {
        let leaf = self
            .index
            .remove(&handle)
            .ok_or(BroadPhaseError::UnknownObject)?;
        self.tree.remove(leaf);
        self.setup_done = false;
        trace!(?handle, "unregistered");
        Ok(())
    }

    /// Refreshes every registered object's box from `store`, refits the
    /// hierarchy once and rebalances.
    ///
    /// Fails with [`BroadPhaseError::UnknownObject`] before touching the tree
    /// if `store` is missing any registered handle.
    #[instrument(skip_all, fields(objects = self.index.len()))]
    pub fn update<S>(&mut self, store: &S) -> Result<(), BroadPhaseError>
    where
        S: ObjectStore<H> + ?Sized,
    {
        let fresh = self
            .index
            .iter()
            .map(|(handle, leaf)| {
                let object = store.object(handle).ok_or(BroadPhaseError::UnknownObject)?;
                Ok((leaf, *object.aabb(), object.is_free()))
            })
            .collect::<Result<Vec<_>, BroadPhaseError>>()?;

        for (leaf, bv, free) in fresh {
            self.tree.set_leaf_bv(leaf, bv);
            if let Some(data) = self.tree.leaf_data_mut(leaf) {
                data.free = free;
            }
        }
        self.tree.refit();
        self.setup_done = false;
        self.setup();
        Ok(())
    }

    /// Refreshes one registered object's box and rebalances.
    ///
    /// The tree is left untouched when the box did not change.
    pub fn update_object(
        &mut self,
        handle: H,
        object: &CollisionObject,
    ) -> Result<(), BroadPhaseError> {
        let leaf = self.leaf_of(handle)?;
        self.refresh_leaf(leaf, object);
        self.setup_done = false;
        self.setup();
        Ok(())
    }

    /// Refreshes several registered objects and rebalances once.
    ///
    /// All handles are checked before any box is written.
    pub fn update_objects<'a, I>(&mut self, objects: I) -> Result<(), BroadPhaseError>
    where
        I: IntoIterator<Item = (H, &'a CollisionObject)>,
    {
        let batch = objects
            .into_iter()
            .map(|(handle, object)| Ok((self.leaf_of(handle)?, object)))
            .collect::<Result<Vec<_>, BroadPhaseError>>()?;
        for (leaf, object) in batch {
            self.refresh_leaf(leaf, object);
        }
        self.setup_done = false;
        self.setup();
        Ok(())
    }

    /// Rebalances the hierarchy if anything changed since the last call.
    ///
    /// A tree whose height exceeds the balanced height `log2(n)` by less than
    /// `max_tree_nonbalanced_level` gets incremental rotation passes; a
    /// taller one is rebuilt top-down.
    pub fn setup(&mut self) {
        if self.setup_done {
            return;
        }
        let n = self.tree.len();
        if n > 0 {
            let height = self.tree.max_height();
            let slack = f64::from(height) - (n as f64).log2();
            if slack < f64::from(self.config.max_tree_nonbalanced_level) {
                self.tree
                    .balance_incremental(self.config.tree_incremental_balance_pass);
                trace!(leaves = n, height, "incremental balance");
            } else {
                debug!(leaves = n, height, "top-down rebuild");
                self.tree.balance_topdown();
            }
        }
        self.setup_done = true;
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        debug!(objects = self.len(), "clear");
        self.tree.clear();
        self.index.clear();
        self.setup_done = false;
    }

    /// Reports every registered object whose box overlaps `query`'s box.
    ///
    /// A voxel-map query is walked octant by octant unless
    /// `octree_as_geometry_collide` is set; leaves then meet box proxies of
    /// the occupied and unknown voxels they touch.
    pub fn collide<F>(&mut self, query: &CollisionObject, mut callback: F)
    where
        F: FnMut(H, &CollisionObject) -> bool,
    {
        self.setup();
        let Some(root) = self.tree.root() else {
            return;
        };
        match query.geometry().shape() {
            Shape::Octree(map) if !self.config.octree_as_geometry_collide => {
                self.collide_map(root, map.as_ref(), query.transform(), &mut callback);
            }
            _ => {
                collide_query(&self.tree, root, query, &mut callback);
            }
        }
    }

    /// Reports every overlapping pair of registered objects, each pair once.
    pub fn self_collide<F>(&mut self, mut callback: F)
    where
        F: FnMut(H, H) -> bool,
    {
        self.setup();
        if let Some(root) = self.tree.root() {
            self_collide(&self.tree, root, &mut callback);
        }
    }

    /// Reports every overlapping pair between this manager and `other`,
    /// this manager's handle first.
    pub fn collide_manager<F>(&mut self, other: &mut Self, mut callback: F)
    where
        F: FnMut(H, H) -> bool,
    {
        self.setup();
        other.setup();
        if let (Some(a), Some(b)) = (self.tree.root(), other.tree.root()) {
            collide_trees(&self.tree, a, &other.tree, b, &mut callback);
        }
    }

    /// Nearest-object search against `query`; returns the final running
    /// minimum (`f32::MAX` when nothing was compared).
    ///
    /// A voxel-map query is walked through its occupied voxels unless
    /// `octree_as_geometry_distance` is set.
    pub fn distance<F>(&mut self, query: &CollisionObject, mut callback: F) -> f32
    where
        F: FnMut(H, &CollisionObject, &mut f32) -> bool,
    {
        self.setup();
        let mut min_dist = f32::MAX;
        let Some(root) = self.tree.root() else {
            return min_dist;
        };
        match query.geometry().shape() {
            Shape::Octree(map) if !self.config.octree_as_geometry_distance => {
                let pose = query.transform();
                self.distance_map(root, map.as_ref(), pose, &mut callback, &mut min_dist);
            }
            _ => {
                distance_query(&self.tree, root, query, &mut callback, &mut min_dist);
            }
        }
        min_dist
    }

    /// Nearest-pair search among registered objects.
    pub fn self_distance<F>(&mut self, mut callback: F) -> f32
    where
        F: FnMut(H, H, &mut f32) -> bool,
    {
        self.setup();
        let mut min_dist = f32::MAX;
        if let Some(root) = self.tree.root() {
            self_distance(&self.tree, root, &mut callback, &mut min_dist);
        }
        min_dist
    }

    /// Nearest-pair search between this manager and `other`.
    pub fn distance_manager<F>(&mut self, other: &mut Self, mut callback: F) -> f32
    where
        F: FnMut(H, H, &mut f32) -> bool,
    {
        self.setup();
        other.setup();
        let mut min_dist = f32::MAX;
        if let (Some(a), Some(b)) = (self.tree.root(), other.tree.root()) {
            distance_trees(&self.tree, a, &other.tree, b, &mut callback, &mut min_dist);
        }
        min_dist
    }

    /// Inserts or overwrites the leaf of `handle` with a plain box.
    pub(crate) fn upsert_box(&mut self, handle: H, bv: Aabb) {
        match self.index.get(&handle) {
            Some(leaf) => {
                if self.tree[leaf].bv() != &bv {
                    self.tree.update(leaf, bv);
                    self.setup_done = false;
                }
            }
            None => self.insert_leaf(handle, bv, false),
        }
    }

    fn insert_leaf(&mut self, handle: H, bv: Aabb, free: bool) {
        let leaf = self.tree.insert(bv, Tracked { handle, free });
        self.index.insert(handle, leaf);
        self.setup_done = false;
        trace!(?handle, ?leaf, "registered");
    }

    fn leaf_of(&self, handle: H) -> Result<NodeId, BroadPhaseError> {
        self.index.get(&handle).ok_or(BroadPhaseError::UnknownObject)
    }

    fn refresh_leaf(&mut self, leaf: NodeId, object: &CollisionObject) {
        if self.tree[leaf].bv() != object.aabb() {
            let reinserted = self.tree.update(leaf, *object.aabb());
            trace!(?leaf, reinserted, "leaf moved");
        }
        if let Some(data) = self.tree.leaf_data_mut(leaf) {
            data.free = object.is_free();
        }
    }

    fn collide_map<F>(&self, root: NodeId, map: &dyn VoxelMap, pose: &Transform, callback: &mut F)
    where
        F: FnMut(H, &CollisionObject) -> bool,
    {
        let bv = map.root_box();
        if pose.is_pure_translation() {
            let placement = Translated(pose.translation());
            collide_voxels(&self.tree, root, map, map.root(), &bv, &placement, callback);
        } else {
            collide_voxels(&self.tree, root, map, map.root(), &bv, &Rigid(*pose), callback);
        }
    }

    fn distance_map<F>(
        &self,
        root: NodeId,
        map: &dyn VoxelMap,
        pose: &Transform,
        callback: &mut F,
        min_dist: &mut f32,
    ) where
        F: FnMut(H, &CollisionObject, &mut f32) -> bool,
    {
        let Some(vroot) = map.root() else {
            return;
        };
        let bv = map.root_box();
        if pose.is_pure_translation() {
            let placement = Translated(pose.translation());
            distance_voxels(&self.tree, root, map, vroot, &bv, &placement, callback, min_dist);
        } else {
            distance_voxels(&self.tree, root, map, vroot, &bv, &Rigid(*pose), callback, min_dist);
        }
    }
}
