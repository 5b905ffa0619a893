//! Transform and node-path state shared by every traversal

use crate::foundation::math::{Matrix44, Vector3};
use crate::scene::{HandleGroup, NodeKey};

/// The coordinate-chain state a traversal carries
///
/// Holds the path of visited nodes from the root, the current
/// local-to-world matrix with its save stack, and the three fixed
/// transforms — world-to-view, view-to-cube (projection), and
/// cube-to-pixel (viewport) — copied from the view and canvas when the
/// traversal starts. Derived transforms are composed fresh on every query;
/// queries are rare next to traversal steps, so there is nothing worth
/// caching.
#[derive(Debug)]
pub struct TransformContext {
    path: Vec<NodeKey>,
    local_to_world: Matrix44,
    saved: Vec<Matrix44>,
    world_to_view: Matrix44,
    view_to_cube: Matrix44,
    cube_to_pixel: Matrix44,
}

impl TransformContext {
    /// Create a context at the world frame with the given fixed chain
    #[must_use]
    pub const fn new(
        world_to_view: Matrix44,
        view_to_cube: Matrix44,
        cube_to_pixel: Matrix44,
    ) -> Self {
        Self {
            path: Vec::new(),
            local_to_world: Matrix44::identity(),
            saved: Vec::new(),
            world_to_view,
            view_to_cube,
            cube_to_pixel,
        }
    }

    /// Path of node keys from the traversal root to the current node
    #[must_use]
    pub fn path(&self) -> &[NodeKey] {
        &self.path
    }

    pub(crate) fn push_node(&mut self, key: NodeKey) {
        self.path.push(key);
    }

    pub(crate) fn pop_node(&mut self) {
        self.path.pop();
    }

    /// Compose a transform onto the local-to-world matrix, saving the old
    ///
    /// `m` applies first to local points: the new local-to-world is
    /// `current * m`. Every push must be matched by exactly one
    /// [`pop_local_to_world`](Self::pop_local_to_world); the begin/end
    /// pairing of group traversal maintains that discipline.
    pub fn push_local_to_world(&mut self, m: &Matrix44) {
        self.saved.push(self.local_to_world);
        self.local_to_world = self.local_to_world * *m;
    }

    /// Restore the local-to-world matrix saved by the matching push
    ///
    /// # Panics
    /// Panics on a pop with no outstanding push; that is a begin/end
    /// pairing bug in the caller, not a recoverable state.
    pub fn pop_local_to_world(&mut self) {
        self.local_to_world = self
            .saved
            .pop()
            .expect("transform stack underflow: pop without matching push");
    }

    /// Number of outstanding local-to-world pushes
    #[must_use]
    pub fn transform_depth(&self) -> usize {
        self.saved.len()
    }

    /// Current local-to-world matrix
    #[must_use]
    pub const fn local_to_world(&self) -> Matrix44 {
        self.local_to_world
    }

    /// Fixed world-to-view matrix
    #[must_use]
    pub const fn world_to_view(&self) -> Matrix44 {
        self.world_to_view
    }

    /// Fixed view-to-cube (projection) matrix
    #[must_use]
    pub const fn view_to_cube(&self) -> Matrix44 {
        self.view_to_cube
    }

    /// Fixed cube-to-pixel (viewport) matrix
    #[must_use]
    pub const fn cube_to_pixel(&self) -> Matrix44 {
        self.cube_to_pixel
    }

    /// Current local-to-view matrix
    #[must_use]
    pub fn local_to_view(&self) -> Matrix44 {
        self.world_to_view * self.local_to_world
    }

    /// Current local-to-cube matrix
    #[must_use]
    pub fn local_to_cube(&self) -> Matrix44 {
        self.view_to_cube * self.local_to_view()
    }

    /// Current local-to-pixel matrix
    #[must_use]
    pub fn local_to_pixel(&self) -> Matrix44 {
        self.cube_to_pixel * self.local_to_cube()
    }

    /// Fixed world-to-cube matrix
    #[must_use]
    pub fn world_to_cube(&self) -> Matrix44 {
        self.view_to_cube * self.world_to_view
    }

    /// Fixed world-to-pixel matrix
    #[must_use]
    pub fn world_to_pixel(&self) -> Matrix44 {
        self.cube_to_pixel * self.world_to_cube()
    }
}

/// View-dependent matrix a handle group pushes around its children
///
/// Scales about the handle's center so that one local unit spans the
/// handle's pixel size on screen. The scale factor comes from the mean
/// on-screen length of the three local basis vectors at the center. Returns
/// `None` when the center or a basis point projects to infinity or the
/// handle is degenerate on screen; callers skip or neutralize the handle
/// for this traversal.
pub(crate) fn handle_matrix(handle: &HandleGroup, tc: &TransformContext) -> Option<Matrix44> {
    let l2p = tc.local_to_pixel();
    let center = handle.center();
    let p0 = l2p.transform_point_homogeneous(center).ok()?;

    let axes = [
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
    ];
    let mut sum = 0.0;
    for axis in axes {
        let p = l2p.transform_point_homogeneous(center + axis).ok()?;
        let dx = p.x - p0.x;
        let dy = p.y - p0.y;
        sum += dx.hypot(dy);
    }
    let pixels_per_unit = sum / 3.0;
    if pixels_per_unit <= 0.0 || !pixels_per_unit.is_finite() {
        log::debug!("handle degenerate on screen; no view scale this traversal");
        return None;
    }

    let s = handle.pixel_size() / pixels_per_unit;
    let to_center = Matrix44::translate(center.x, center.y, center.z);
    let from_center = Matrix44::translate(-center.x, -center.y, -center.z);
    Some(to_center * Matrix44::scale(s, s, s) * from_center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    fn context_with_chain() -> TransformContext {
        TransformContext::new(
            Matrix44::translate(0.0, 0.0, -10.0),
            Matrix44::ortho(-2.0, 2.0, -2.0, 2.0, 1.0, 20.0).unwrap(),
            Matrix44::scale(100.0, 100.0, 1.0),
        )
    }

    #[test]
    fn test_push_composes_on_the_right() {
        let mut tc = context_with_chain();
        tc.push_local_to_world(&Matrix44::translate(1.0, 0.0, 0.0));
        tc.push_local_to_world(&Matrix44::scale(2.0, 2.0, 2.0));

        // local point scales first, then translates
        let p = tc.local_to_world().transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_pop_restores_previous_matrix() {
        let mut tc = context_with_chain();
        let before = tc.local_to_world();
        tc.push_local_to_world(&Matrix44::rotate_z(1.0));
        tc.pop_local_to_world();
        assert_eq!(tc.local_to_world(), before);
        assert_eq!(tc.transform_depth(), 0);
    }

    #[test]
    #[should_panic(expected = "transform stack underflow")]
    fn test_unbalanced_pop_panics() {
        let mut tc = context_with_chain();
        tc.pop_local_to_world();
    }

    #[test]
    fn test_derived_transforms_compose_the_chain() {
        let mut tc = context_with_chain();
        tc.push_local_to_world(&Matrix44::translate(0.0, 1.0, 0.0));

        let p = Point3::new(0.5, -0.5, 2.0);
        let by_steps = tc.cube_to_pixel().transform_point(
            tc.view_to_cube().transform_point(
                tc.world_to_view()
                    .transform_point(tc.local_to_world().transform_point(p)),
            ),
        );
        assert_relative_eq!(tc.local_to_pixel().transform_point(p), by_steps, epsilon = 1.0e-12);
    }
}
