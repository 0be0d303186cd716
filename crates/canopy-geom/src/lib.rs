// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    rust_2018_idioms,
    missing_docs,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![doc = r"Geometry primitives for the canopy broad phase.

This crate provides:
- Axis-aligned and oriented bounding boxes (`Aabb`, `Obb`).
- Rigid transforms (`Transform`).
- Collision geometry (`Shape`, `CollisionGeometry`) and placed objects
  (`CollisionObject`).
- The voxel occupancy capability (`VoxelMap`) and a reference sparse octree.

Design notes:
- Float32 throughout; math comes from `glam`.
- Bounding boxes are validated at construction boundaries (`Aabb::try_new`,
  `Shape::sphere`, `CollisionObject::new`), never inside traversal.
- Rustdoc is treated as part of the contract; public items are documented.
"]

mod error;
/// Placed geometry with cached world bounds.
pub mod object;
/// Shapes and occupancy metadata.
pub mod shape;
/// Foundational geometric types.
pub mod types;
/// Voxel occupancy maps.
pub mod voxel;

pub use error::GeomError;
pub use object::CollisionObject;
pub use shape::{CollisionGeometry, GeometryKind, Shape};
pub use types::aabb::Aabb;
pub use types::obb::Obb;
pub use types::transform::Transform;
pub use voxel::{child_box, OccupancyOctree, VoxelMap, VoxelNodeRef};
