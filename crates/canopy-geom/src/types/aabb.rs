// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use glam::Vec3;

use crate::error::GeomError;
use crate::types::transform::Transform;

/// Axis-aligned bounding box in world coordinates.
///
/// Invariants:
/// - `min` components are less than or equal to `max` components.
/// - Values are `f32` and represent meters in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    /// Constructs an AABB from its minimum and maximum corners.
    ///
    /// # Panics
    /// Panics if any component of `min` is greater than its counterpart in `max`.
    /// Use [`Aabb::try_new`] at input boundaries.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        assert!(min.cmple(max).all(), "invalid AABB: min > max");
        Self { min, max }
    }

    /// Constructs an AABB, rejecting inverted or non-finite corners.
    pub fn try_new(min: Vec3, max: Vec3) -> Result<Self, GeomError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(GeomError::NonFinite);
        }
        if !min.cmple(max).all() {
            return Err(GeomError::InvalidBounds {
                min: min.to_array(),
                max: max.to_array(),
            });
        }
        Ok(Self { min, max })
    }

    /// Returns the minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Returns the maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Builds an AABB centered at `center` with half-extents `half`.
    #[must_use]
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        let half = half.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Center point of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full edge lengths along each axis.
    #[must_use]
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half edge lengths along each axis.
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        self.extents() * 0.5
    }

    /// Returns `true` if this AABB overlaps another (inclusive on faces).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        // Inclusive so touching faces pair up in the broad phase.
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Returns `true` if `other` lies entirely inside this box.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    /// Ordering metric: squared length of the diagonal.
    ///
    /// Monotonic in the box's extent; only meaningful for comparisons.
    #[must_use]
    pub fn size(&self) -> f32 {
        self.extents().length_squared()
    }

    /// Euclidean gap between the two boxes; `0.0` when they overlap.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let gap = (other.min - self.max).max(self.min - other.max).max(Vec3::ZERO);
        gap.length()
    }

    /// Returns the union of two AABBs.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the box shifted by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Inflates the box by a uniform margin `m` in all directions.
    #[must_use]
    pub fn inflate(&self, m: f32) -> Self {
        let delta = Vec3::splat(m);
        Self {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    /// Computes the AABB that bounds this box after placement by `tf`.
    ///
    /// Rotation-free transforms reduce to a translation; otherwise the eight
    /// corners are transformed and re-enclosed.
    #[must_use]
    pub fn transformed(&self, tf: &Transform) -> Self {
        if tf.is_pure_translation() {
            return self.translated(tf.translation());
        }
        let center = tf.transform_point(self.center());
        let rot = tf.to_mat3();
        let half = self.half_extents();
        // Projected radius per world axis: |R| * half.
        let radius = Vec3::new(
            rot.row(0).abs().dot(half),
            rot.row(1).abs().dot(half),
            rot.row(2).abs().dot(half),
        );
        Self {
            min: center - radius,
            max: center + radius,
        }
    }

    /// Builds the minimal AABB that contains all `points`.
    ///
    /// Returns `None` if `points` is empty.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut out = Self {
            min: *first,
            max: *first,
        };
        for p in rest {
            out.min = out.min.min(*p);
            out.max = out.max.max(*p);
        }
        Some(out)
    }
}
