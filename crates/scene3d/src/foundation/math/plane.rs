//! Plane in 3D space

use super::{Matrix44, Point3, Vector3};

/// A plane with coefficients (a, b, c, d)
///
/// A point p satisfies `a*p.x + b*p.y + c*p.z + d == 0` when it lies on the
/// plane. The signed distance is positive on the side the normal (a, b, c)
/// points into; culling treats that side as "inside".
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    /// Normal x coefficient
    pub a: f64,
    /// Normal y coefficient
    pub b: f64,
    /// Normal z coefficient
    pub c: f64,
    /// Offset coefficient
    pub d: f64,
}

impl Plane {
    /// Create a plane from its four coefficients
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// Create a plane from a normal and a point on the plane
    #[must_use]
    pub fn from_normal_point(normal: Vector3, point: Point3) -> Self {
        let d = -(normal.x * point.x + normal.y * point.y + normal.z * point.z);
        Self::new(normal.x, normal.y, normal.z, d)
    }

    /// The plane normal (a, b, c), not necessarily unit length
    #[must_use]
    pub const fn normal(&self) -> Vector3 {
        Vector3::new(self.a, self.b, self.c)
    }

    /// Signed distance from the plane to a point
    ///
    /// Only a true Euclidean distance when the plane is normalized.
    #[must_use]
    pub fn distance_to(&self, p: Point3) -> f64 {
        self.a * p.x + self.b * p.y + self.c * p.z + self.d
    }

    /// The same plane with a unit-length normal
    ///
    /// A plane with a zero normal is returned unchanged.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let len = self.normal().length();
        if len == 0.0 {
            *self
        } else {
            Self::new(self.a / len, self.b / len, self.c / len, self.d / len)
        }
    }

    /// Map the plane through a point transform, covariantly
    ///
    /// If `m` carries points from frame B to frame A and this plane lives in
    /// frame A, the result is the same plane expressed in frame B:
    /// `result.distance_to(p) == self.distance_to(m * p)` for every point p.
    /// Planes transform by a row-vector product with `m`, so no matrix
    /// inversion is needed.
    #[must_use]
    pub fn transformed_by(&self, m: &Matrix44) -> Self {
        let e = &m.m;
        Self::new(
            self.a * e[0] + self.b * e[1] + self.c * e[2] + self.d * e[3],
            self.a * e[4] + self.b * e[5] + self.c * e[6] + self.d * e[7],
            self.a * e[8] + self.b * e[9] + self.c * e[10] + self.d * e[11],
            self.a * e[12] + self.b * e[13] + self.c * e[14] + self.d * e[15],
        )
    }
}
