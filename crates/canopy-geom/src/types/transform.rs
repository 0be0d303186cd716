// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use glam::{Mat3, Quat, Vec3};

/// Rigid transform (rotation then translation) used to place geometry.
///
/// Conventions:
/// - `translation` in meters (world space).
/// - `rotation` as a unit quaternion; callers are responsible for passing a
///   normalized value.
///
/// Broad-phase code branches on [`Transform::is_pure_translation`]: a
/// rotation-free pose lets bounding boxes be shifted instead of re-enclosed.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform (no translation, no rotation).
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    /// Creates a transform from components.
    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Pure translation.
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// Translation component.
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Rotation component.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Replaces the translation component.
    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    /// Replaces the rotation component.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Returns `true` when the rotation is exactly the identity.
    ///
    /// Exact comparison on purpose: callers take the translation-only fast
    /// path only when it is bit-for-bit equivalent to the general one.
    #[must_use]
    pub fn is_pure_translation(&self) -> bool {
        self.rotation == Quat::IDENTITY
    }

    /// Rotation as a 3×3 matrix (columns are the rotated basis vectors).
    #[must_use]
    pub fn to_mat3(&self) -> Mat3 {
        Mat3::from_quat(self.rotation)
    }

    /// Applies the transform to a point.
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation * p + self.translation
    }

    /// Composition `self * other`: applies `other` first, then `self`.
    #[must_use]
    pub fn mul_transform(&self, other: &Self) -> Self {
        Self {
            translation: self.transform_point(other.translation),
            rotation: self.rotation * other.rotation,
        }
    }
}
