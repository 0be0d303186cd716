// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Placed geometry with a cached world-space bounding box.

use std::sync::Arc;

use glam::Vec3;

use crate::error::GeomError;
use crate::shape::{CollisionGeometry, Shape};
use crate::types::aabb::Aabb;
use crate::types::transform::Transform;

/// A geometry placed in the world.
///
/// The world box is cached: [`CollisionObject::set_transform`] and
/// [`CollisionObject::set_translation`] only move the pose, and callers
/// refresh the box with [`CollisionObject::compute_aabb`] before handing the
/// object to a broad phase. Geometry is shared, so many objects may place the
/// same shape.
#[derive(Debug, Clone)]
pub struct CollisionObject {
    geometry: Arc<CollisionGeometry>,
    transform: Transform,
    aabb: Aabb,
}

impl CollisionObject {
    /// Places `geometry` at `transform` and computes its world box.
    pub fn new(geometry: Arc<CollisionGeometry>, transform: Transform) -> Result<Self, GeomError> {
        let aabb = world_aabb(&geometry, &transform)?;
        Ok(Self {
            geometry,
            transform,
            aabb,
        })
    }

    /// Places `geometry` at the identity pose.
    pub fn at_origin(geometry: Arc<CollisionGeometry>) -> Result<Self, GeomError> {
        Self::new(geometry, Transform::identity())
    }

    /// Shared geometry.
    #[must_use]
    pub fn geometry(&self) -> &Arc<CollisionGeometry> {
        &self.geometry
    }

    /// Current pose.
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World box as of the last [`CollisionObject::compute_aabb`].
    #[must_use]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Replaces the pose. The cached box is left stale.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Replaces the translation. The cached box is left stale.
    pub fn set_translation(&mut self, translation: Vec3) {
        self.transform.set_translation(translation);
    }

    /// Recomputes the cached world box from the current pose.
    pub fn compute_aabb(&mut self) -> Result<(), GeomError> {
        self.aabb = world_aabb(&self.geometry, &self.transform)?;
        Ok(())
    }

    /// Returns `true` when the geometry is known free space.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.geometry.is_free()
    }
}

fn world_aabb(geometry: &CollisionGeometry, tf: &Transform) -> Result<Aabb, GeomError> {
    let local = geometry.shape().local_aabb();
    let aabb = match geometry.shape() {
        // Rotation leaves a sphere's box unchanged.
        Shape::Sphere { .. } => local.translated(tf.translation()),
        _ => local.transformed(tf),
    };
    if !aabb.min().is_finite() || !aabb.max().is_finite() {
        return Err(GeomError::NonFinite);
    }
    Ok(aabb)
}
