//! Math types for 3D graphics
//!
//! Provides the fundamental value types the scene graph is built on:
//! points, vectors, a column-major 4x4 matrix, and planes. All components
//! are `f64`; the small fixed sizes keep closed-form algorithms (cofactor
//! inversion, covariant plane mapping) numerically deterministic.

mod matrix;
mod plane;
mod point;
mod vector;

pub use matrix::Matrix44;
pub use plane::Plane;
pub use point::{Point3, Point4};
pub use vector::Vector3;

use thiserror::Error;

/// Errors raised by math precondition violations
///
/// Expected geometric degeneracies (a zero-length vector handed to
/// `normalized`, a ray parallel to a triangle) are not errors; they are
/// handled locally by the operations that meet them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    /// The matrix has a zero or non-finite determinant and cannot be
    /// inverted.
    #[error("matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// A homogeneous point with `w == 0` has no affine equivalent.
    #[error("homogeneous point has zero w and no affine equivalent")]
    ZeroW,

    /// Projection parameters that do not describe a valid volume.
    #[error("invalid projection parameters: {0}")]
    InvalidProjection(&'static str),
}
