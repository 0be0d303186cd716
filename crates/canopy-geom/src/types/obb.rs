// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use glam::{Mat3, Vec3};

use crate::types::aabb::Aabb;
use crate::types::transform::Transform;

/// Guards the cross-product axes against near-parallel edge pairs.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Oriented bounding box: a center, three orthonormal axes and half-extents.
///
/// Only used where a placed voxel box must be tested against a world-space
/// AABB without the looseness of re-enclosing it in another AABB.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Obb {
    center: Vec3,
    axes: Mat3,
    half: Vec3,
}

impl Obb {
    /// Places the local box `aabb` under `tf`.
    #[must_use]
    pub fn from_aabb(aabb: &Aabb, tf: &Transform) -> Self {
        Self {
            center: tf.transform_point(aabb.center()),
            axes: tf.to_mat3(),
            half: aabb.half_extents(),
        }
    }

    /// Center point in world space.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Half-extents along the box's own axes.
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        self.half
    }

    /// Separating-axis overlap test (inclusive on touching faces).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let a = self.half.to_array();
        let b = other.half.to_array();

        // Rotation of `other` expressed in `self`'s frame.
        let mut r = [[0.0f32; 3]; 3];
        let mut abs_r = [[0.0f32; 3]; 3];
        for (i, (row, abs_row)) in r.iter_mut().zip(abs_r.iter_mut()).enumerate() {
            for j in 0..3 {
                row[j] = self.axes.col(i).dot(other.axes.col(j));
                abs_row[j] = row[j].abs() + PARALLEL_EPSILON;
            }
        }
        let d = other.center - self.center;
        let t = [
            d.dot(self.axes.col(0)),
            d.dot(self.axes.col(1)),
            d.dot(self.axes.col(2)),
        ];

        for i in 0..3 {
            let rb = b[0] * abs_r[i][0] + b[1] * abs_r[i][1] + b[2] * abs_r[i][2];
            if t[i].abs() > a[i] + rb {
                return false;
            }
        }
        for j in 0..3 {
            let ra = a[0] * abs_r[0][j] + a[1] * abs_r[1][j] + a[2] * abs_r[2][j];
            let proj = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
            if proj.abs() > ra + b[j] {
                return false;
            }
        }
        // Edge-edge axes A_i x B_j.
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = a[i1] * abs_r[i2][j] + a[i2] * abs_r[i1][j];
                let rb = b[j1] * abs_r[i][j2] + b[j2] * abs_r[i][j1];
                let proj = t[i2] * r[i1][j] - t[i1] * r[i2][j];
                if proj.abs() > ra + rb {
                    return false;
                }
            }
        }
        true
    }

    /// Overlap test against an unrotated world-space box.
    #[must_use]
    pub fn overlaps_aabb(&self, aabb: &Aabb) -> bool {
        self.overlaps(&Self::from_aabb(aabb, &Transform::identity()))
    }
}
