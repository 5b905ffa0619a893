//! Segment intersection tests
//!
//! All tests are bounded to the segment's parametric range [0, 1] — the
//! pick volume ends at the far clip plane, so hits beyond the far endpoint
//! are misses, not far-away hits. Near-degenerate configurations (a segment
//! almost parallel to a triangle's plane) are rejected by epsilon instead of
//! dividing into Inf/NaN.

use crate::foundation::bounds::{BoundingBox, BoundingSphere};
use crate::foundation::math::Point3;

use super::PickSegment;

/// Whether a segment touches a bounding sphere
///
/// Finds the point of the segment closest to the center by clamped
/// parametric projection and compares squared distances; no square root.
/// The empty sphere intersects nothing, the infinite sphere everything.
#[must_use]
pub fn segment_intersects_sphere(segment: &PickSegment, sphere: &BoundingSphere) -> bool {
    if sphere.is_empty() {
        return false;
    }
    if sphere.is_infinite() {
        return true;
    }
    let dir = segment.far() - segment.near();
    let to_center = sphere.center() - segment.near();
    let len_sq = dir.length_squared();
    let t = if len_sq == 0.0 {
        0.0 // degenerate segment: test the single point
    } else {
        (to_center.dot(&dir) / len_sq).clamp(0.0, 1.0)
    };
    let closest = segment.point_at(t);
    closest.distance_squared_to(&sphere.center()) <= sphere.radius() * sphere.radius()
}

/// Intersect a segment with a triangle (Möller–Trumbore)
///
/// Returns `(t, u, v)` where `t` is the parametric position along the
/// segment and `(u, v)` are barycentric weights of `v1` and `v2`; the
/// weight of `v0` is `1 - u - v`. Returns `None` when the segment is
/// near-parallel to the triangle's plane, the hit falls outside the
/// triangle, or the hit lies outside the segment's [0, 1] range.
#[must_use]
pub fn intersect_segment_triangle(
    segment: &PickSegment,
    v0: Point3,
    v1: Point3,
    v2: Point3,
) -> Option<(f64, f64, f64)> {
    const EPSILON: f64 = 1.0e-12;

    let dir = segment.far() - segment.near();
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);

    // Segment parallel to the triangle's plane?
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = segment.near() - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    // Parametric position along the segment, not an unbounded ray
    let t = f * edge2.dot(&q);
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    Some((t, u, v))
}

/// Intersect a segment with an axis-aligned box (slab method)
///
/// Returns the parametric entry position, clamped to 0 when the near
/// endpoint starts inside the box. Returns `None` when the segment misses
/// or the box lies entirely outside [0, 1].
#[must_use]
pub fn intersect_segment_box(segment: &PickSegment, bbox: &BoundingBox) -> Option<f64> {
    if bbox.is_empty() {
        return None;
    }
    let near = segment.near();
    let dir = segment.far() - near;
    let min = bbox.min();
    let max = bbox.max();

    let slab = |origin: f64, d: f64, lo: f64, hi: f64| -> (f64, f64) {
        let inv = if d == 0.0 { f64::INFINITY } else { 1.0 / d };
        let t1 = (lo - origin) * inv;
        let t2 = (hi - origin) * inv;
        (t1.min(t2), t1.max(t2))
    };

    let (x1, x2) = slab(near.x, dir.x, min.x, max.x);
    let (y1, y2) = slab(near.y, dir.y, min.y, max.y);
    let (z1, z2) = slab(near.z, dir.z, min.z, max.z);

    let t_min = x1.max(y1).max(z1);
    let t_max = x2.min(y2).min(z2);

    if t_max >= t_min && t_max >= 0.0 && t_min <= 1.0 {
        Some(t_min.max(0.0))
    } else {
        None
    }
}
