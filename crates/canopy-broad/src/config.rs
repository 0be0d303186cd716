// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Manager tunables and their JSON form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted `tree_topdown_balance_threshold`.
///
/// The bottom-up merge below this threshold is cubic in the leaf count.
pub const MAX_BOTTOM_UP_LEAVES: usize = 64;

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A value outside its accepted range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for [`crate::DynamicAabbTreeManager`].
///
/// Missing JSON fields take their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadPhaseConfig {
    /// `setup` balances incrementally while `height - log2(n)` stays below
    /// this slack, and rebuilds top-down otherwise.
    pub max_tree_nonbalanced_level: u32,
    /// Passes per incremental balance.
    pub tree_incremental_balance_pass: u32,
    /// Subtrees with at most this many leaves are built by greedy pairwise
    /// merging during a top-down build.
    pub tree_topdown_balance_threshold: usize,
    /// Top-down split rule: `0` splits at the median of the longest axis,
    /// anything else at the mean centre.
    pub tree_topdown_level: u32,
    /// Bulk-build rule: `0` builds top-down, anything else in Morton order.
    pub tree_init_level: u32,
    /// Treat a voxel map as one opaque geometry in `collide`.
    pub octree_as_geometry_collide: bool,
    /// Treat a voxel map as one opaque geometry in `distance`.
    pub octree_as_geometry_distance: bool,
}

impl Default for BroadPhaseConfig {
    fn default() -> Self {
        Self {
            max_tree_nonbalanced_level: 10,
            tree_incremental_balance_pass: 10,
            tree_topdown_balance_threshold: 2,
            tree_topdown_level: 0,
            tree_init_level: 0,
            octree_as_geometry_collide: true,
            octree_as_geometry_distance: false,
        }
    }
}

impl BroadPhaseConfig {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tree_topdown_balance_threshold > MAX_BOTTOM_UP_LEAVES {
            return Err(ConfigError::Invalid(format!(
                "tree_topdown_balance_threshold {} exceeds {MAX_BOTTOM_UP_LEAVES}",
                self.tree_topdown_balance_threshold
            )));
        }
        Ok(())
    }

    /// Deserializes and validates a JSON config.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_vec(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
