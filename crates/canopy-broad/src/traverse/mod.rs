// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recursive descent over one or two hierarchies.
//!
//! Every entry point has the same shape: prune a node pair by its boxes, and
//! hand surviving leaf pairs to a caller callback. A callback returning
//! `true` stops the whole traversal; each frame propagates that immediately.
//!
//! - Collision prunes on box overlap. The only correctness-critical rule is
//!   that a non-overlapping pair of boxes is never descended.
//! - Distance is branch-and-bound over a running minimum owned by the caller.
//!   A child is visited only while its box distance is strictly below the
//!   current minimum, nearer child first. Callbacks may lower the minimum and
//!   every later check sees the new value.
//!
//! The order in which leaf pairs reach a callback follows tree shape and is
//! not stable across rebalances.

mod collide;
mod distance;
mod voxel;

pub use collide::{collide_query, collide_trees, self_collide};
pub use distance::{distance_query, distance_trees, self_distance};
pub use voxel::{collide_voxels, distance_voxels, Rigid, Translated, VoxelPlacement};

/// Orders two candidates by ascending lower bound; ties keep `a` first.
fn nearer_first<N>(a: (f32, N), b: (f32, N)) -> [(f32, N); 2] {
    if b.0 < a.0 {
        [b, a]
    } else {
        [a, b]
    }
}
