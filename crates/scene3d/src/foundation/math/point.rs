//! 3D and homogeneous 4D point types

use std::ops::{Add, Sub};

use approx::{AbsDiffEq, RelativeEq};

use super::{MathError, Vector3};

/// A 3D affine point with `f64` coordinates
///
/// Points and [`Vector3`] are distinct on purpose: a point minus a point is
/// a vector, a point plus a vector is a point, and a point plus a point is
/// not defined.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Point3 {
    /// Create a new point from coordinates
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin (0, 0, 0)
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Distance to another point
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (*other - *self).length()
    }

    /// Squared distance to another point; avoids a square root
    #[must_use]
    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        (*other - *self).length_squared()
    }

    /// The point's coordinates as a vector from the origin
    #[must_use]
    pub const fn to_vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl Add<Vector3> for Point3 {
    type Output = Self;

    fn add(self, rhs: Vector3) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub<Vector3> for Point3 {
    type Output = Self;

    fn sub(self, rhs: Vector3) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Vector3;

    fn sub(self, rhs: Self) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl AbsDiffEq for Point3 {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
    }
}

impl RelativeEq for Point3 {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.x.relative_eq(&other.x, epsilon, max_relative)
            && self.y.relative_eq(&other.y, epsilon, max_relative)
            && self.z.relative_eq(&other.z, epsilon, max_relative)
    }
}

/// A homogeneous 4D point
///
/// Used where projective transforms are in play, notably unprojecting pixel
/// coordinates back through a perspective matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point4 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
    /// Homogeneous weight
    pub w: f64,
}

impl Point4 {
    /// Create a new homogeneous point
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Lift an affine point to homogeneous coordinates with `w = 1`
    #[must_use]
    pub const fn from_point3(p: Point3) -> Self {
        Self::new(p.x, p.y, p.z, 1.0)
    }

    /// Project back to an affine point by the perspective divide
    ///
    /// # Errors
    /// Returns [`MathError::ZeroW`] when `w == 0`; such a point lies at
    /// infinity and has no affine equivalent.
    pub fn to_point3(&self) -> Result<Point3, MathError> {
        if self.w == 0.0 {
            return Err(MathError::ZeroW);
        }
        Ok(Point3::new(self.x / self.w, self.y / self.w, self.z / self.w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_vector_arithmetic() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let q = Point3::new(4.0, 6.0, 3.0);

        assert_relative_eq!(q - p, Vector3::new(3.0, 4.0, 0.0));
        assert_relative_eq!(p + Vector3::new(3.0, 4.0, 0.0), q);
        assert_relative_eq!(p.distance_to(&q), 5.0);
    }

    #[test]
    fn test_homogeneous_divide() {
        let h = Point4::new(2.0, 4.0, 6.0, 2.0);
        let p = h.to_point3().unwrap();
        assert_relative_eq!(p, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_zero_w_is_an_error() {
        let h = Point4::new(1.0, 1.0, 1.0, 0.0);
        assert_eq!(h.to_point3(), Err(MathError::ZeroW));
    }
}
