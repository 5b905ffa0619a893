//! Column-major 4x4 matrix

use std::ops::Mul;

use approx::{AbsDiffEq, RelativeEq};

use super::{MathError, Point3, Point4, Vector3};

/// A 4x4 matrix of `f64`, stored column-major
///
/// Storage follows the OpenGL convention: element (row, col) lives at
/// `m[col * 4 + row]`, so the array can be handed to an immediate-mode
/// matrix stack unchanged. Matrices multiply points on the right:
/// `p' = M * p`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix44 {
    /// Packed elements, column-major
    pub m: [f64; 16],
}

impl Matrix44 {
    /// Create a matrix from elements listed row by row
    ///
    /// The argument order reads like the matrix on paper; storage is still
    /// column-major.
    #[must_use]
    pub const fn new(
        m00: f64, m01: f64, m02: f64, m03: f64,
        m10: f64, m11: f64, m12: f64, m13: f64,
        m20: f64, m21: f64, m22: f64, m23: f64,
        m30: f64, m31: f64, m32: f64, m33: f64,
    ) -> Self {
        Self {
            m: [
                m00, m10, m20, m30, // column 0
                m01, m11, m21, m31, // column 1
                m02, m12, m22, m32, // column 2
                m03, m13, m23, m33, // column 3
            ],
        }
    }

    /// The identity matrix
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Element at (row, col)
    #[must_use]
    pub const fn get(&self, row: usize, col: usize) -> f64 {
        self.m[col * 4 + row]
    }

    /// The transpose
    #[must_use]
    pub fn transpose(&self) -> Self {
        let m = &self.m;
        Self {
            m: [
                m[0], m[4], m[8], m[12],
                m[1], m[5], m[9], m[13],
                m[2], m[6], m[10], m[14],
                m[3], m[7], m[11], m[15],
            ],
        }
    }

    /// Determinant, by cofactor expansion along the first row
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        let s0 = m[10] * m[15] - m[14] * m[11];
        let s1 = m[6] * m[15] - m[14] * m[7];
        let s2 = m[6] * m[11] - m[10] * m[7];
        let s3 = m[2] * m[15] - m[14] * m[3];
        let s4 = m[2] * m[11] - m[10] * m[3];
        let s5 = m[2] * m[7] - m[6] * m[3];

        let c0 = m[5] * s0 - m[9] * s1 + m[13] * s2;
        let c1 = -(m[1] * s0 - m[9] * s3 + m[13] * s4);
        let c2 = m[1] * s1 - m[5] * s3 + m[13] * s5;
        let c3 = -(m[1] * s2 - m[5] * s4 + m[9] * s5);

        m[0] * c0 + m[4] * c1 + m[8] * c2 + m[12] * c3
    }

    /// Exact inverse via the cofactor/adjugate closed form
    ///
    /// Gaussian elimination is deliberately avoided; the closed form is
    /// deterministic for these small matrices and pivots nothing.
    ///
    /// # Errors
    /// Returns [`MathError::SingularMatrix`] when the determinant is zero
    /// or non-finite, instead of silently dividing into Inf/NaN.
    pub fn inverse(&self) -> Result<Self, MathError> {
        let m = &self.m;
        let mut inv = [0.0; 16];

        // 2x2 sub-determinants of the lower half, reused across cofactors
        let s0 = m[10] * m[15] - m[14] * m[11];
        let s1 = m[6] * m[15] - m[14] * m[7];
        let s2 = m[6] * m[11] - m[10] * m[7];
        let s3 = m[2] * m[15] - m[14] * m[3];
        let s4 = m[2] * m[11] - m[10] * m[3];
        let s5 = m[2] * m[7] - m[6] * m[3];

        inv[0] = m[5] * s0 - m[9] * s1 + m[13] * s2;
        inv[1] = -(m[1] * s0 - m[9] * s3 + m[13] * s4);
        inv[2] = m[1] * s1 - m[5] * s3 + m[13] * s5;
        inv[3] = -(m[1] * s2 - m[5] * s4 + m[9] * s5);

        inv[4] = -(m[4] * s0 - m[8] * s1 + m[12] * s2);
        inv[5] = m[0] * s0 - m[8] * s3 + m[12] * s4;
        inv[6] = -(m[0] * s1 - m[4] * s3 + m[12] * s5);
        inv[7] = m[0] * s2 - m[4] * s4 + m[8] * s5;

        // 2x2 sub-determinants of the upper half
        let t0 = m[8] * m[13] - m[12] * m[9];
        let t1 = m[4] * m[13] - m[12] * m[5];
        let t2 = m[4] * m[9] - m[8] * m[5];
        let t3 = m[0] * m[13] - m[12] * m[1];
        let t4 = m[0] * m[9] - m[8] * m[1];
        let t5 = m[0] * m[5] - m[4] * m[1];

        inv[8] = m[7] * t0 - m[11] * t1 + m[15] * t2;
        inv[9] = -(m[3] * t0 - m[11] * t3 + m[15] * t4);
        inv[10] = m[3] * t1 - m[7] * t3 + m[15] * t5;
        inv[11] = -(m[3] * t2 - m[7] * t4 + m[11] * t5);

        inv[12] = -(m[6] * t0 - m[10] * t1 + m[14] * t2);
        inv[13] = m[2] * t0 - m[10] * t3 + m[14] * t4;
        inv[14] = -(m[2] * t1 - m[6] * t3 + m[14] * t5);
        inv[15] = m[2] * t2 - m[6] * t4 + m[10] * t5;

        let det = m[0] * inv[0] + m[4] * inv[1] + m[8] * inv[2] + m[12] * inv[3];
        if det == 0.0 || !det.is_finite() {
            return Err(MathError::SingularMatrix);
        }

        let inv_det = 1.0 / det;
        for e in &mut inv {
            *e *= inv_det;
        }
        Ok(Self { m: inv })
    }

    /// Transform an affine point; the projective fourth row is ignored
    ///
    /// Use [`transform_point_homogeneous`](Self::transform_point_homogeneous)
    /// when the matrix may carry perspective.
    #[must_use]
    pub fn transform_point(&self, p: Point3) -> Point3 {
        let m = &self.m;
        Point3::new(
            m[0] * p.x + m[4] * p.y + m[8] * p.z + m[12],
            m[1] * p.x + m[5] * p.y + m[9] * p.z + m[13],
            m[2] * p.x + m[6] * p.y + m[10] * p.z + m[14],
        )
    }

    /// Transform a point through the full projective matrix, with divide
    ///
    /// # Errors
    /// Returns [`MathError::ZeroW`] when the transformed point lands on the
    /// plane at infinity.
    pub fn transform_point_homogeneous(&self, p: Point3) -> Result<Point3, MathError> {
        let m = &self.m;
        let h = Point4::new(
            m[0] * p.x + m[4] * p.y + m[8] * p.z + m[12],
            m[1] * p.x + m[5] * p.y + m[9] * p.z + m[13],
            m[2] * p.x + m[6] * p.y + m[10] * p.z + m[14],
            m[3] * p.x + m[7] * p.y + m[11] * p.z + m[15],
        );
        h.to_point3()
    }

    /// Transform a direction vector by the upper-left 3x3 part
    #[must_use]
    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        let m = &self.m;
        Vector3::new(
            m[0] * v.x + m[4] * v.y + m[8] * v.z,
            m[1] * v.x + m[5] * v.y + m[9] * v.z,
            m[2] * v.x + m[6] * v.y + m[10] * v.z,
        )
    }

    /// Translation by (tx, ty, tz)
    #[must_use]
    pub const fn translate(tx: f64, ty: f64, tz: f64) -> Self {
        Self::new(
            1.0, 0.0, 0.0, tx,
            0.0, 1.0, 0.0, ty,
            0.0, 0.0, 1.0, tz,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Non-uniform scaling by (sx, sy, sz)
    #[must_use]
    pub const fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self::new(
            sx, 0.0, 0.0, 0.0,
            0.0, sy, 0.0, 0.0,
            0.0, 0.0, sz, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation about the X axis by `angle` radians
    #[must_use]
    pub fn rotate_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c, -s, 0.0,
            0.0, s, c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation about the Y axis by `angle` radians
    #[must_use]
    pub fn rotate_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(
            c, 0.0, s, 0.0,
            0.0, 1.0, 0.0, 0.0,
            -s, 0.0, c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation about the Z axis by `angle` radians
    #[must_use]
    pub fn rotate_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(
            c, -s, 0.0, 0.0,
            s, c, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation about an arbitrary axis by `angle` radians (Rodrigues)
    ///
    /// The axis need not be normalized; a zero axis yields the identity.
    #[must_use]
    pub fn rotate_axis_angle(axis: Vector3, angle: f64) -> Self {
        let a = axis.normalized();
        if a.length_squared() == 0.0 {
            return Self::identity();
        }
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (a.x, a.y, a.z);
        Self::new(
            t * x * x + c, t * x * y - s * z, t * x * z + s * y, 0.0,
            t * x * y + s * z, t * y * y + c, t * y * z - s * x, 0.0,
            t * x * z - s * y, t * y * z + s * x, t * z * z + c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Perspective projection from frustum edges, as in `glFrustum`
    ///
    /// Maps the view-space frustum to the clip cube with z in [-1, 1].
    ///
    /// # Errors
    /// Returns [`MathError::InvalidProjection`] for degenerate extents or a
    /// non-positive near/far distance.
    pub fn frustum(
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Result<Self, MathError> {
        if left == right || bottom == top || near == far {
            return Err(MathError::InvalidProjection("degenerate frustum extents"));
        }
        if near <= 0.0 || far <= 0.0 {
            return Err(MathError::InvalidProjection("near and far must be positive"));
        }
        let w = right - left;
        let h = top - bottom;
        let d = far - near;
        Ok(Self::new(
            2.0 * near / w, 0.0, (right + left) / w, 0.0,
            0.0, 2.0 * near / h, (top + bottom) / h, 0.0,
            0.0, 0.0, -(far + near) / d, -2.0 * far * near / d,
            0.0, 0.0, -1.0, 0.0,
        ))
    }

    /// Orthographic projection, as in `glOrtho`
    ///
    /// # Errors
    /// Returns [`MathError::InvalidProjection`] for degenerate extents.
    pub fn ortho(
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Result<Self, MathError> {
        if left == right || bottom == top || near == far {
            return Err(MathError::InvalidProjection("degenerate ortho extents"));
        }
        let w = right - left;
        let h = top - bottom;
        let d = far - near;
        Ok(Self::new(
            2.0 / w, 0.0, 0.0, -(right + left) / w,
            0.0, 2.0 / h, 0.0, -(top + bottom) / h,
            0.0, 0.0, -2.0 / d, -(far + near) / d,
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    /// Perspective projection from a vertical field of view, as in
    /// `gluPerspective`
    ///
    /// `fovy` is in radians; `aspect` is width over height.
    ///
    /// # Errors
    /// Returns [`MathError::InvalidProjection`] for a non-positive field of
    /// view, aspect, or near/far distance, or `near == far`.
    pub fn perspective(fovy: f64, aspect: f64, near: f64, far: f64) -> Result<Self, MathError> {
        if fovy <= 0.0 || fovy >= std::f64::consts::PI {
            return Err(MathError::InvalidProjection("field of view out of (0, pi)"));
        }
        if aspect <= 0.0 {
            return Err(MathError::InvalidProjection("aspect must be positive"));
        }
        if near <= 0.0 || far <= 0.0 || near == far {
            return Err(MathError::InvalidProjection("near and far must be positive and distinct"));
        }
        let f = 1.0 / (fovy / 2.0).tan();
        let d = near - far;
        Ok(Self::new(
            f / aspect, 0.0, 0.0, 0.0,
            0.0, f, 0.0, 0.0,
            0.0, 0.0, (far + near) / d, 2.0 * far * near / d,
            0.0, 0.0, -1.0, 0.0,
        ))
    }

}

impl Default for Matrix44 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Matrix44 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = &self.m;
        let b = &rhs.m;
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[k * 4 + row] * b[col * 4 + k];
                }
                out[col * 4 + row] = sum;
            }
        }
        Self { m: out }
    }
}

impl AbsDiffEq for Matrix44 {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl RelativeEq for Matrix44 {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A well-conditioned, invertible test matrix with no special structure
    fn scrambled() -> Matrix44 {
        Matrix44::translate(1.0, -2.0, 3.0)
            * Matrix44::rotate_y(0.7)
            * Matrix44::rotate_x(-0.3)
            * Matrix44::scale(2.0, 0.5, 1.5)
    }

    #[test]
    fn test_identity_multiply() {
        let m = scrambled();
        assert_relative_eq!(m * Matrix44::identity(), m);
        assert_relative_eq!(Matrix44::identity() * m, m);
    }

    #[test]
    fn test_transpose_round_trip() {
        let m = scrambled();
        assert_eq!(m.transpose().transpose(), m);
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = scrambled();
        let inv = m.inverse().unwrap();

        assert_relative_eq!(m * inv, Matrix44::identity(), epsilon = 1.0e-12);
        assert_relative_eq!(inv.inverse().unwrap(), m, epsilon = 1.0e-12);
    }

    #[test]
    fn test_singular_matrix_is_an_error() {
        let m = Matrix44::scale(1.0, 0.0, 1.0); // flattens y, determinant 0
        assert_eq!(m.inverse(), Err(MathError::SingularMatrix));
    }

    #[test]
    fn test_determinant_of_scale() {
        let m = Matrix44::scale(2.0, 3.0, 4.0);
        assert_relative_eq!(m.determinant(), 24.0);
    }

    #[test]
    fn test_translate_moves_points_not_vectors() {
        let m = Matrix44::translate(1.0, 2.0, 3.0);
        let p = Point3::new(1.0, 1.0, 1.0);
        let v = Vector3::new(1.0, 1.0, 1.0);

        assert_relative_eq!(m.transform_point(p), Point3::new(2.0, 3.0, 4.0));
        assert_relative_eq!(m.transform_vector(v), v);
    }

    #[test]
    fn test_rotate_z_quarter_turn() {
        let m = Matrix44::rotate_z(std::f64::consts::FRAC_PI_2);
        let p = m.transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1.0e-15);
    }

    #[test]
    fn test_rotate_axis_angle_matches_rotate_y() {
        let a = Matrix44::rotate_axis_angle(Vector3::new(0.0, 2.0, 0.0), 1.1);
        let b = Matrix44::rotate_y(1.1);
        assert_relative_eq!(a, b, epsilon = 1.0e-15);
    }

    #[test]
    fn test_perspective_maps_near_far_to_cube() {
        let m = Matrix44::perspective(std::f64::consts::FRAC_PI_3, 1.0, 1.0, 10.0).unwrap();

        let near = m
            .transform_point_homogeneous(Point3::new(0.0, 0.0, -1.0))
            .unwrap();
        let far = m
            .transform_point_homogeneous(Point3::new(0.0, 0.0, -10.0))
            .unwrap();

        assert_relative_eq!(near.z, -1.0, epsilon = 1.0e-12);
        assert_relative_eq!(far.z, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn test_ortho_maps_extents_to_cube() {
        let m = Matrix44::ortho(-2.0, 2.0, -1.0, 1.0, 1.0, 5.0).unwrap();

        let p = m.transform_point(Point3::new(2.0, -1.0, -1.0));
        assert_relative_eq!(p, Point3::new(1.0, -1.0, -1.0), epsilon = 1.0e-12);

        let q = m.transform_point(Point3::new(-2.0, 1.0, -5.0));
        assert_relative_eq!(q, Point3::new(-1.0, 1.0, 1.0), epsilon = 1.0e-12);
    }

    #[test]
    fn test_invalid_projection_parameters() {
        assert!(Matrix44::frustum(-1.0, -1.0, -1.0, 1.0, 1.0, 10.0).is_err());
        assert!(Matrix44::frustum(-1.0, 1.0, -1.0, 1.0, -1.0, 10.0).is_err());
        assert!(Matrix44::ortho(0.0, 0.0, -1.0, 1.0, 1.0, 10.0).is_err());
        assert!(Matrix44::perspective(0.0, 1.0, 1.0, 10.0).is_err());
        assert!(Matrix44::perspective(1.0, 1.0, 5.0, 5.0).is_err());
    }
}
