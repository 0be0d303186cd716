// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounding volumes and rigid transforms.
//!
//! Conventions:
//! - Overlap semantics are inclusive on faces so touching objects still pair
//!   up in the broad phase.
//! - `f32` throughout; `Aabb::size` is an ordering metric only, never a
//!   physical volume.

#[doc = "Axis-aligned bounding boxes (world space)."]
pub mod aabb;
#[doc = "Oriented bounding boxes for rotated placements."]
pub mod obb;
#[doc = "Rigid transforms (rotation + translation)."]
pub mod transform;
