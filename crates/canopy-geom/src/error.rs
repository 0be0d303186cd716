// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type for geometry construction.

use thiserror::Error;

/// Rejected geometry input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeomError {
    /// A bounding box whose minimum corner exceeds its maximum on some axis.
    #[error("invalid bounds: min {min:?} exceeds max {max:?}")]
    InvalidBounds {
        /// Offending minimum corner.
        min: [f32; 3],
        /// Offending maximum corner.
        max: [f32; 3],
    },
    /// A coordinate, extent or radius that is NaN or infinite.
    #[error("non-finite coordinate")]
    NonFinite,
}
