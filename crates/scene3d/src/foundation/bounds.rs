//! Bounding volumes for culling and pick pruning
//!
//! A [`BoundingSphere`] is the unit of conservatism the traversal code
//! reasons about: cheap to test against planes and segments, cheap to union
//! across a group's children. Spheres carry two sentinel states besides the
//! normal one — *empty* (contains nothing, prunes its subtree) and
//! *infinite* (contains everything, used for view-dependent-size objects
//! whose local extent cannot be bounded). Expansion never shrinks a sphere.

use thiserror::Error;

use super::math::{Matrix44, Point3, Vector3};

/// Errors raised by invalid bounding-volume construction
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsError {
    /// A bounding box was given corners with `min > max` in some component.
    #[error("bounding box corners are not ordered min <= max")]
    InvalidCorners,
}

/// A bounding sphere with empty and infinite sentinel states
///
/// The sentinels are encoded in the radius: negative infinity for the empty
/// sphere, positive infinity for the infinite one. A normal sphere has a
/// finite, non-negative radius.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingSphere {
    center: Point3,
    radius: f64,
}

impl BoundingSphere {
    /// Create a sphere from center and radius
    ///
    /// # Panics
    /// Panics when the radius is negative or non-finite; the sentinels have
    /// their own constructors.
    #[must_use]
    pub fn new(center: Point3, radius: f64) -> Self {
        assert!(
            radius >= 0.0 && radius.is_finite(),
            "bounding sphere radius must be finite and non-negative"
        );
        Self { center, radius }
    }

    /// The sphere that contains nothing
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            center: Point3::origin(),
            radius: f64::NEG_INFINITY,
        }
    }

    /// The sphere that contains every point
    #[must_use]
    pub const fn infinite() -> Self {
        Self {
            center: Point3::origin(),
            radius: f64::INFINITY,
        }
    }

    /// True when this sphere contains nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.radius < 0.0
    }

    /// True when this sphere contains everything
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.radius == f64::INFINITY
    }

    /// Center of the sphere; meaningless for the sentinels
    #[must_use]
    pub const fn center(&self) -> Point3 {
        self.center
    }

    /// Radius of the sphere, with sentinel values for empty and infinite
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Whether the sphere contains a point
    #[must_use]
    pub fn contains(&self, p: Point3) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.is_infinite() {
            return true;
        }
        self.center.distance_squared_to(&p) <= self.radius * self.radius
    }

    /// The smallest sphere containing this sphere and a point
    #[must_use]
    pub fn expanded_by_point(&self, p: Point3) -> Self {
        if self.is_infinite() {
            return *self;
        }
        if self.is_empty() {
            return Self::new(p, 0.0);
        }
        let d = self.center.distance_to(&p);
        if d <= self.radius {
            return *self;
        }
        // d > radius >= 0, so the direction to p is well defined
        let radius = (self.radius + d) / 2.0;
        let center = self.center + (p - self.center) * ((radius - self.radius) / d);
        Self { center, radius }
    }

    /// The smallest sphere containing this sphere and another
    #[must_use]
    pub fn expanded_by_sphere(&self, other: &Self) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        if self.is_infinite() || other.is_infinite() {
            return Self::infinite();
        }
        let d = self.center.distance_to(&other.center);
        if d + other.radius <= self.radius {
            return *self;
        }
        if d + self.radius <= other.radius {
            return *other;
        }
        // neither contains the other, so d > 0
        let radius = (self.radius + other.radius + d) / 2.0;
        let center =
            self.center + (other.center - self.center) * ((radius - self.radius) / d);
        Self { center, radius }
    }

    /// The smallest sphere containing this sphere and a box
    #[must_use]
    pub fn expanded_by_box(&self, b: &BoundingBox) -> Self {
        if b.is_empty() {
            return *self;
        }
        let mut sphere = *self;
        for i in 0..8 {
            sphere = sphere.expanded_by_point(b.corner(i));
        }
        sphere
    }

    /// A sphere guaranteed to contain this sphere's image under `m`
    ///
    /// The center maps exactly; the radius scales by the longest of the
    /// three transformed basis vectors, which over-covers under non-uniform
    /// scale or shear. The sentinels map to themselves.
    #[must_use]
    pub fn transformed_by(&self, m: &Matrix44) -> Self {
        if self.is_empty() || self.is_infinite() {
            return *self;
        }
        let sx = m.transform_vector(Vector3::new(1.0, 0.0, 0.0)).length();
        let sy = m.transform_vector(Vector3::new(0.0, 1.0, 0.0)).length();
        let sz = m.transform_vector(Vector3::new(0.0, 0.0, 1.0)).length();
        Self::new(m.transform_point(self.center), self.radius * sx.max(sy).max(sz))
    }
}

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    min: Point3,
    max: Point3,
}

impl BoundingBox {
    /// Create a box from ordered corners
    ///
    /// # Errors
    /// Returns [`BoundsError::InvalidCorners`] when any component of `min`
    /// exceeds the matching component of `max`. The empty box is built with
    /// [`empty`](Self::empty), not by inverting corners.
    pub fn new(min: Point3, max: Point3) -> Result<Self, BoundsError> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(BoundsError::InvalidCorners);
        }
        Ok(Self { min, max })
    }

    /// The box that contains nothing
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// True when this box contains nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Minimum corner
    #[must_use]
    pub const fn min(&self) -> Point3 {
        self.min
    }

    /// Maximum corner
    #[must_use]
    pub const fn max(&self) -> Point3 {
        self.max
    }

    /// Center of the box
    #[must_use]
    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    /// Corner `i` of 8; bit 0 selects max x, bit 1 max y, bit 2 max z
    #[must_use]
    pub fn corner(&self, i: usize) -> Point3 {
        Point3::new(
            if i & 1 == 0 { self.min.x } else { self.max.x },
            if i & 2 == 0 { self.min.y } else { self.max.y },
            if i & 4 == 0 { self.min.z } else { self.max.z },
        )
    }

    /// Whether the box contains a point
    #[must_use]
    pub fn contains(&self, p: Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// The smallest box containing this box and a point
    #[must_use]
    pub fn expanded_by_point(&self, p: Point3) -> Self {
        Self {
            min: Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            max: Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        }
    }

    /// The smallest box containing this box and another
    #[must_use]
    pub fn expanded_by_box(&self, other: &Self) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        self.expanded_by_point(other.min).expanded_by_point(other.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_sphere_contains_nothing() {
        let s = BoundingSphere::empty();
        assert!(s.is_empty());
        assert!(!s.contains(Point3::origin()));
    }

    #[test]
    fn test_infinite_sphere_contains_everything() {
        let s = BoundingSphere::infinite();
        assert!(s.is_infinite());
        assert!(s.contains(Point3::new(1.0e300, -1.0e300, 0.0)));
    }

    #[test]
    fn test_expand_empty_by_point() {
        let s = BoundingSphere::empty().expanded_by_point(Point3::new(1.0, 2.0, 3.0));
        assert!(!s.is_empty());
        assert_relative_eq!(s.radius(), 0.0);
        assert!(s.contains(Point3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_expand_by_point_keeps_old_contents() {
        let s = BoundingSphere::new(Point3::origin(), 1.0);
        let grown = s.expanded_by_point(Point3::new(5.0, 0.0, 0.0));

        assert!(grown.contains(Point3::new(5.0, 0.0, 0.0)));
        assert!(grown.contains(Point3::new(-1.0, 0.0, 0.0)));
        assert!(grown.radius() >= s.radius());
        assert_relative_eq!(grown.radius(), 3.0);
        assert_relative_eq!(grown.center(), Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_expand_by_contained_point_is_identity() {
        let s = BoundingSphere::new(Point3::origin(), 2.0);
        assert_eq!(s.expanded_by_point(Point3::new(1.0, 0.0, 0.0)), s);
    }

    #[test]
    fn test_union_contains_sampled_points_of_both() {
        let a = BoundingSphere::new(Point3::new(-3.0, 0.0, 1.0), 1.5);
        let b = BoundingSphere::new(Point3::new(4.0, 2.0, -1.0), 2.5);
        let u = a.expanded_by_sphere(&b);

        // deterministic samples inside each source sphere
        let offsets = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.9, 0.0, 0.0),
            Vector3::new(-0.5, 0.5, 0.5),
            Vector3::new(0.0, -0.9, 0.0),
            Vector3::new(0.3, 0.3, -0.8),
        ];
        for o in offsets {
            assert!(u.contains(a.center() + o * a.radius()));
            assert!(u.contains(b.center() + o * b.radius()));
        }
    }

    #[test]
    fn test_union_with_contained_sphere_is_identity() {
        let big = BoundingSphere::new(Point3::origin(), 10.0);
        let small = BoundingSphere::new(Point3::new(1.0, 0.0, 0.0), 2.0);

        assert_eq!(big.expanded_by_sphere(&small), big);
        assert_eq!(small.expanded_by_sphere(&big), big);
    }

    #[test]
    fn test_union_sentinels() {
        let s = BoundingSphere::new(Point3::origin(), 1.0);

        assert_eq!(s.expanded_by_sphere(&BoundingSphere::empty()), s);
        assert_eq!(BoundingSphere::empty().expanded_by_sphere(&s), s);
        assert!(s.expanded_by_sphere(&BoundingSphere::infinite()).is_infinite());
    }

    #[test]
    fn test_transformed_sphere_is_conservative() {
        let s = BoundingSphere::new(Point3::new(1.0, 0.0, 0.0), 1.0);
        let m = Matrix44::scale(3.0, 1.0, 1.0);
        let t = s.transformed_by(&m);

        // images of points on the source sphere stay inside
        assert!(t.contains(m.transform_point(Point3::new(2.0, 0.0, 0.0))));
        assert!(t.contains(m.transform_point(Point3::new(1.0, 1.0, 0.0))));
        assert_relative_eq!(t.center(), Point3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(t.radius(), 3.0);
    }

    #[test]
    fn test_box_invalid_corners() {
        let r = BoundingBox::new(Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0));
        assert_eq!(r, Err(BoundsError::InvalidCorners));
    }

    #[test]
    fn test_box_corners_and_containment() {
        let b = BoundingBox::new(Point3::new(-1.0, -2.0, -3.0), Point3::new(1.0, 2.0, 3.0)).unwrap();

        assert!(b.contains(Point3::origin()));
        assert!(!b.contains(Point3::new(0.0, 3.0, 0.0)));
        assert_eq!(b.corner(0), Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(b.corner(7), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(b.corner(5), Point3::new(1.0, -2.0, 3.0));
    }

    #[test]
    fn test_sphere_expanded_by_box() {
        let b = BoundingBox::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)).unwrap();
        let s = BoundingSphere::empty().expanded_by_box(&b);

        for i in 0..8 {
            assert!(s.contains(b.corner(i)));
        }
        assert!(s.expanded_by_box(&BoundingBox::empty()) == s);
    }
}
