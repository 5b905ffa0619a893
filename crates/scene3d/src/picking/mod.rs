//! Pick segments, results, and intersection geometry
//!
//! Picking resolves a 2D pointer position to a 3D object and surface point.
//! The pointer ray is represented as a bounded [`PickSegment`] spanning the
//! full depth range of the view volume; traversal carries the segment into
//! each node's local frame, and leaves test their geometry against it with
//! the routines in [`geometry`].

pub mod geometry;

use crate::foundation::math::{Matrix44, Point3};
use crate::scene::NodeKey;

/// A 3D line segment bounded by near and far endpoints
///
/// The segment lives in whichever coordinate frame the active traversal
/// currently represents; it is re-expressed in lock-step with every
/// local-to-world push and pop. Parametric positions run from 0 at the near
/// endpoint to 1 at the far endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PickSegment {
    near: Point3,
    far: Point3,
}

impl PickSegment {
    /// Create a segment from its endpoints
    #[must_use]
    pub const fn new(near: Point3, far: Point3) -> Self {
        Self { near, far }
    }

    /// Endpoint nearest the viewer
    #[must_use]
    pub const fn near(&self) -> Point3 {
        self.near
    }

    /// Endpoint farthest from the viewer
    #[must_use]
    pub const fn far(&self) -> Point3 {
        self.far
    }

    /// Point at parametric position `t` in [0, 1]
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.near + (self.far - self.near) * t
    }

    /// The segment with both endpoints mapped through an affine transform
    ///
    /// Projective factors belong to the fixed view chain, which is applied
    /// once when the segment is built; transforms pushed during traversal
    /// are affine, so no homogeneous divide is needed here.
    #[must_use]
    pub fn transformed_by(&self, m: &Matrix44) -> Self {
        Self {
            near: m.transform_point(self.near),
            far: m.transform_point(self.far),
        }
    }
}

/// One intersection found by a pick traversal
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    path: Vec<NodeKey>,
    local_point: Point3,
    world_point: Point3,
    depth: f64,
}

impl PickResult {
    pub(crate) fn new(
        path: Vec<NodeKey>,
        local_point: Point3,
        world_point: Point3,
        depth: f64,
    ) -> Self {
        Self { path, local_point, world_point, depth }
    }

    /// Node path from the traversal root to the hit leaf
    #[must_use]
    pub fn path(&self) -> &[NodeKey] {
        &self.path
    }

    /// The hit leaf itself
    #[must_use]
    pub fn node(&self) -> Option<NodeKey> {
        self.path.last().copied()
    }

    /// Intersection point in the leaf's local coordinates
    #[must_use]
    pub const fn local_point(&self) -> Point3 {
        self.local_point
    }

    /// Intersection point in world coordinates
    #[must_use]
    pub const fn world_point(&self) -> Point3 {
        self.world_point
    }

    /// Pixel-space depth in [0, 1]; smaller is nearer the viewer
    #[must_use]
    pub const fn depth(&self) -> f64 {
        self.depth
    }
}
