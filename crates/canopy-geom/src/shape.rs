// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Collision geometry: the shape an object carries plus occupancy metadata.

use glam::Vec3;

use crate::error::GeomError;
use crate::types::aabb::Aabb;
use crate::voxel::VoxelMap;

/// Discriminant of [`Shape`], used by the broad phase to pick a traversal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// [`Shape::Sphere`].
    Sphere,
    /// [`Shape::Cuboid`].
    Cuboid,
    /// [`Shape::Octree`].
    Octree,
}

/// Closed set of shapes the broad phase understands.
///
/// Only [`Shape::Octree`] changes how queries traverse; the other variants
/// are seen purely through their bounding boxes.
#[derive(Debug)]
pub enum Shape {
    /// Sphere centred on the local origin.
    Sphere {
        /// Radius in meters.
        radius: f32,
    },
    /// Box centred on the local origin.
    Cuboid {
        /// Half edge lengths along the local axes.
        half_extents: Vec3,
    },
    /// Sparse voxel occupancy map, walked octant by octant.
    Octree(Box<dyn VoxelMap>),
}

impl Shape {
    /// Validated sphere constructor.
    pub fn sphere(radius: f32) -> Result<Self, GeomError> {
        if !radius.is_finite() {
            return Err(GeomError::NonFinite);
        }
        if radius < 0.0 {
            return Err(GeomError::InvalidBounds {
                min: [-radius; 3],
                max: [radius; 3],
            });
        }
        Ok(Self::Sphere { radius })
    }

    /// Validated box constructor.
    pub fn cuboid(half_extents: Vec3) -> Result<Self, GeomError> {
        if !half_extents.is_finite() {
            return Err(GeomError::NonFinite);
        }
        if half_extents.min_element() < 0.0 {
            return Err(GeomError::InvalidBounds {
                min: (-half_extents).to_array(),
                max: half_extents.to_array(),
            });
        }
        Ok(Self::Cuboid { half_extents })
    }

    /// Which variant this is.
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Sphere { .. } => GeometryKind::Sphere,
            Self::Cuboid { .. } => GeometryKind::Cuboid,
            Self::Octree(_) => GeometryKind::Octree,
        }
    }

    /// Tight box around the shape in its local frame.
    #[must_use]
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Self::Sphere { radius } => {
                Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(*radius))
            }
            Self::Cuboid { half_extents } => {
                Aabb::from_center_half_extents(Vec3::ZERO, *half_extents)
            }
            Self::Octree(map) => map.root_box(),
        }
    }

    /// The voxel map behind an [`Shape::Octree`].
    #[must_use]
    pub fn as_voxel_map(&self) -> Option<&dyn VoxelMap> {
        match self {
            Self::Octree(map) => Some(map.as_ref()),
            _ => None,
        }
    }
}

/// A shape plus the occupancy metadata carried by every geometry.
///
/// For ordinary shapes the defaults (`cost_density` 1, occupied threshold 1,
/// free threshold 0) make the geometry occupied and never free. Voxel proxies
/// handed to callbacks carry the voxel's occupancy as `cost_density`.
#[derive(Debug)]
pub struct CollisionGeometry {
    shape: Shape,
    cost_density: f32,
    threshold_occupied: f32,
    threshold_free: f32,
}

impl CollisionGeometry {
    /// Wraps `shape` with default occupancy metadata.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            cost_density: 1.0,
            threshold_occupied: 1.0,
            threshold_free: 0.0,
        }
    }

    /// Replaces the cost density.
    #[must_use]
    pub fn with_cost_density(mut self, cost_density: f32) -> Self {
        self.cost_density = cost_density;
        self
    }

    /// Replaces both thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, occupied: f32, free: f32) -> Self {
        self.threshold_occupied = occupied;
        self.threshold_free = free;
        self
    }

    /// The wrapped shape.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Shorthand for `self.shape().kind()`.
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        self.shape.kind()
    }

    /// Occupancy carried by this geometry.
    #[must_use]
    pub fn cost_density(&self) -> f32 {
        self.cost_density
    }

    /// Occupied threshold.
    #[must_use]
    pub fn threshold_occupied(&self) -> f32 {
        self.threshold_occupied
    }

    /// Free threshold.
    #[must_use]
    pub fn threshold_free(&self) -> f32 {
        self.threshold_free
    }

    /// `cost_density <= threshold_free`.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.cost_density <= self.threshold_free
    }

    /// `cost_density >= threshold_occupied`.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.cost_density >= self.threshold_occupied
    }
}

impl From<Shape> for CollisionGeometry {
    fn from(shape: Shape) -> Self {
        Self::new(shape)
    }
}
