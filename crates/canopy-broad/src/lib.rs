// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r"Canopy broad phase.

A dynamic AABB hierarchy that tracks caller-owned collision objects by handle
and reports candidate pairs for collision and nearest-distance queries.

This crate provides:
- `HierarchyTree`: an arena-backed bounding-volume hierarchy with
  incremental rotation balancing, top-down rebuilds and bulk construction.
- `traverse`: recursive collision and branch-and-bound distance descent over
  one or two hierarchies, or a hierarchy against a voxel occupancy map.
- `DynamicAabbTreeManager`: registration, updates and queries with automatic
  rebalancing before each query.
- `BroadPhase`: a handle-keyed contract with canonical, sorted pair output.

Design notes:
- Single-threaded and synchronous. Callbacks return `true` to stop a query.
- Objects live in caller storage; unregister a handle before dropping its
  object.
- Raw callback order is unspecified and may change across rebalances.
"]

mod broad;
mod config;
mod error;
mod index;
mod manager;
mod store;
pub mod traverse;
pub mod tree;

pub use broad::BroadPhase;
pub use config::{BroadPhaseConfig, ConfigError, MAX_BOTTOM_UP_LEAVES};
pub use error::{BroadPhaseError, TreeInvariantError};
pub use index::{ObjectIndex, Tracked, TrackedTree};
pub use manager::DynamicAabbTreeManager;
pub use store::ObjectStore;
pub use tree::{HierarchyTree, Node, NodeId, NodeKind};
