//! Views, canvases, and the fixed transform chain
//!
//! A [`View`] owns the world-to-view (camera) and view-to-cube (projection)
//! matrices; a [`Canvas`] supplies the cube-to-pixel (viewport) matrix from
//! its size. Together they complete the chain traversals consume, and the
//! view exposes the three entry points of the control flow: cull the scene
//! into a draw list, replay the list against a backend, and pick at a pixel
//! position.
//!
//! Conventions, pinned by tests: cube (clip) coordinates span [-1, 1] on
//! every axis, pixel x grows right from 0, pixel y grows *down* from 0, and
//! pixel depth spans [0, 1] from near to far.

use crate::foundation::bounds::BoundingSphere;
use crate::foundation::math::{MathError, Matrix44, Point3};
use crate::picking::PickResult;
use crate::render::RenderBackend;
use crate::scene::SceneGraph;
use crate::traversal::{cull, draw, pick, CullContext, DrawContext, DrawList, PickContext};

/// Distance from the eye to the orbit center, in normalized view units
///
/// [`View::set_orbit`] scales the world sphere to unit radius; the eye then
/// sits three units away, and [`View::fit_perspective`] frames exactly that
/// sphere.
const EYE_DISTANCE: f64 = 3.0;

/// The on-screen target a view renders into
///
/// Only the pixel size matters to the core; windowing is someone else's
/// concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
}

impl Canvas {
    /// Create a canvas of the given pixel size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width in pixels
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Record a resize
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Aspect ratio, width over height
    #[must_use]
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// The cube-to-pixel matrix for this size
    ///
    /// Maps cube x in [-1, 1] to [0, width], cube y in [-1, 1] to
    /// [height, 0] (pixel y grows down), and cube z in [-1, 1] to pixel
    /// depth [0, 1].
    #[must_use]
    pub fn cube_to_pixel(&self) -> Matrix44 {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        Matrix44::new(
            w / 2.0, 0.0, 0.0, w / 2.0,
            0.0, -h / 2.0, 0.0, h / 2.0,
            0.0, 0.0, 0.5, 0.5,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// Orbit camera parameters
///
/// Angles are radians; `scale` is a zoom factor around the framed world
/// sphere, 1.0 meaning the sphere exactly fills the normalized orbit
/// distance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrbitParams {
    /// Rotation about the world's y axis
    pub azimuth: f64,
    /// Rotation about the view's x axis
    pub elevation: f64,
    /// Zoom factor; larger is closer
    pub scale: f64,
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self { azimuth: 0.0, elevation: 0.0, scale: 1.0 }
    }
}

/// A camera over a scene: world-to-view plus view-to-cube
///
/// The matrices can be set directly or through the orbit and projection
/// helpers. The view is also where the traversal control flow lives:
/// [`cull`](Self::cull) → [`draw`](Self::draw) for repaints, and
/// [`pick_at`](Self::pick_at) for pointer input.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    world_to_view: Matrix44,
    view_to_cube: Matrix44,
}

impl View {
    /// Create a view with identity camera and projection
    #[must_use]
    pub const fn new() -> Self {
        Self {
            world_to_view: Matrix44::identity(),
            view_to_cube: Matrix44::identity(),
        }
    }

    /// Current world-to-view matrix
    #[must_use]
    pub const fn world_to_view(&self) -> Matrix44 {
        self.world_to_view
    }

    /// Replace the world-to-view matrix
    pub fn set_world_to_view(&mut self, m: Matrix44) {
        self.world_to_view = m;
    }

    /// Current view-to-cube (projection) matrix
    #[must_use]
    pub const fn view_to_cube(&self) -> Matrix44 {
        self.view_to_cube
    }

    /// Replace the view-to-cube matrix
    pub fn set_view_to_cube(&mut self, m: Matrix44) {
        self.view_to_cube = m;
    }

    /// Set a perspective projection
    ///
    /// # Errors
    /// Returns [`MathError::InvalidProjection`] for bad parameters.
    pub fn set_perspective(
        &mut self,
        fovy: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Result<(), MathError> {
        self.view_to_cube = Matrix44::perspective(fovy, aspect, near, far)?;
        Ok(())
    }

    /// Set an orthographic projection
    ///
    /// # Errors
    /// Returns [`MathError::InvalidProjection`] for bad parameters.
    pub fn set_ortho(
        &mut self,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Result<(), MathError> {
        self.view_to_cube = Matrix44::ortho(left, right, bottom, top, near, far)?;
        Ok(())
    }

    /// Point the camera at a world sphere with orbit parameters
    ///
    /// The sphere is centered, scaled to unit radius times `params.scale`,
    /// rotated by azimuth then elevation, and placed three normalized units
    /// down the view's -z axis. An empty or infinite world sphere frames
    /// the world origin at unit scale instead.
    pub fn set_orbit(&mut self, params: &OrbitParams, world_sphere: &BoundingSphere) {
        let (center, radius) =
            if world_sphere.is_empty() || world_sphere.is_infinite() || world_sphere.radius() == 0.0 {
                (Point3::origin(), 1.0)
            } else {
                (world_sphere.center(), world_sphere.radius())
            };
        let s = params.scale / radius;
        self.world_to_view = Matrix44::translate(0.0, 0.0, -EYE_DISTANCE)
            * Matrix44::rotate_x(params.elevation)
            * Matrix44::rotate_y(params.azimuth)
            * Matrix44::scale(s, s, s)
            * Matrix44::translate(-center.x, -center.y, -center.z);
    }

    /// Perspective projection framing the orbit sphere
    ///
    /// # Errors
    /// Returns [`MathError::InvalidProjection`] for a non-positive aspect.
    pub fn fit_perspective(&mut self, aspect: f64) -> Result<(), MathError> {
        let fovy = 2.0 * (1.0 / EYE_DISTANCE).asin();
        self.view_to_cube =
            Matrix44::perspective(fovy, aspect, EYE_DISTANCE - 1.5, EYE_DISTANCE + 1.5)?;
        Ok(())
    }

    /// Cull the scene against this view's frustum
    ///
    /// Returns the draw list of visible leaf paths, ready for
    /// [`draw`](Self::draw).
    #[must_use]
    pub fn cull(&self, scene: &SceneGraph, canvas: &Canvas) -> DrawList {
        let mut ctx =
            CullContext::new(self.world_to_view, self.view_to_cube, canvas.cube_to_pixel());
        cull(scene, scene.root(), &mut ctx);
        let list = ctx.into_draw_list();
        log::debug!("cull kept {} leaf paths", list.len());
        list
    }

    /// Replay a draw list against a backend
    pub fn draw(
        &self,
        scene: &SceneGraph,
        canvas: &Canvas,
        list: &DrawList,
        backend: &mut dyn RenderBackend,
    ) {
        let mut ctx = DrawContext::new(
            self.world_to_view,
            self.view_to_cube,
            canvas.cube_to_pixel(),
            backend,
        );
        draw(scene, list, &mut ctx);
    }

    /// Cull then draw, clearing the scene's redraw marks
    pub fn render(&self, scene: &SceneGraph, canvas: &Canvas, backend: &mut dyn RenderBackend) {
        let list = self.cull(scene, canvas);
        self.draw(scene, canvas, &list, backend);
        scene.clear_draw_dirty(scene.root());
    }

    /// Pick the scene at a pixel position
    ///
    /// Builds a segment under the pointer spanning pixel depths 0 to 1,
    /// runs a pick traversal, and returns the hit nearest the viewer.
    ///
    /// # Errors
    /// Returns [`MathError::SingularMatrix`] when the view chain or a
    /// transform group on a descended path cannot be inverted, and
    /// [`MathError::ZeroW`] when the pixel unprojects to infinity.
    pub fn pick_at(
        &self,
        scene: &SceneGraph,
        canvas: &Canvas,
        x: f64,
        y: f64,
    ) -> Result<Option<PickResult>, MathError> {
        let mut ctx = PickContext::new(
            self.world_to_view,
            self.view_to_cube,
            canvas.cube_to_pixel(),
            x,
            y,
        )?;
        pick(scene, scene.root(), &mut ctx)?;
        log::trace!("pick at ({x}, {y}) found {} hits", ctx.results().len());
        Ok(ctx.closest().cloned())
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::picking::geometry::intersect_segment_triangle;
    use crate::render::{RecordingBackend, RenderCall};
    use crate::scene::Leaf;
    use crate::traversal::{DrawContext, PickContext};

    /// Leaf with a fixed sphere, visible whenever its sphere survives
    #[derive(Debug)]
    struct SphereLeaf {
        sphere: BoundingSphere,
    }

    impl Leaf for SphereLeaf {
        fn compute_bounding_sphere(&self) -> BoundingSphere {
            self.sphere
        }

        fn draw(&self, _ctx: &mut DrawContext<'_>) {}
    }

    /// Leaf testing picks against one triangle in the z = 0 plane
    #[derive(Debug)]
    struct TriangleLeaf;

    impl TriangleLeaf {
        const V0: Point3 = Point3::new(-1.0, -1.0, 0.0);
        const V1: Point3 = Point3::new(1.0, -1.0, 0.0);
        const V2: Point3 = Point3::new(0.0, 1.0, 0.0);
    }

    impl Leaf for TriangleLeaf {
        fn compute_bounding_sphere(&self) -> BoundingSphere {
            BoundingSphere::empty()
                .expanded_by_point(Self::V0)
                .expanded_by_point(Self::V1)
                .expanded_by_point(Self::V2)
        }

        fn draw(&self, _ctx: &mut DrawContext<'_>) {}

        fn pick(&self, ctx: &mut PickContext) {
            let segment = *ctx.segment();
            if let Some((t, _, _)) =
                intersect_segment_triangle(&segment, Self::V0, Self::V1, Self::V2)
            {
                ctx.add_result(segment.point_at(t));
            }
        }
    }

    fn unit_sphere_leaf(center: Point3) -> SphereLeaf {
        SphereLeaf { sphere: BoundingSphere::new(center, 1.0) }
    }

    #[test]
    fn test_cube_to_pixel_orientation() {
        let canvas = Canvas::new(200, 100);
        let m = canvas.cube_to_pixel();

        // top-left of the cube lands at pixel (0, 0)
        assert_relative_eq!(
            m.transform_point(Point3::new(-1.0, 1.0, -1.0)),
            Point3::new(0.0, 0.0, 0.0)
        );
        // bottom-right lands at (width, height), far depth 1
        assert_relative_eq!(
            m.transform_point(Point3::new(1.0, -1.0, 1.0)),
            Point3::new(200.0, 100.0, 1.0)
        );
        assert_relative_eq!(
            m.transform_point(Point3::origin()),
            Point3::new(100.0, 50.0, 0.5)
        );
    }

    #[test]
    fn test_world_cube_pixel_round_trip() {
        let mut view = View::new();
        view.set_world_to_view(Matrix44::translate(0.0, 0.0, -EYE_DISTANCE));
        view.fit_perspective(2.0).unwrap();
        let canvas = Canvas::new(800, 400);

        let world_to_pixel =
            canvas.cube_to_pixel() * view.view_to_cube() * view.world_to_view();
        let pixel_to_world = world_to_pixel.inverse().unwrap();

        for p in [
            Point3::origin(),
            Point3::new(0.3, -0.2, 0.5),
            Point3::new(-0.5, 0.4, -0.6),
        ] {
            let pixel = world_to_pixel.transform_point_homogeneous(p).unwrap();
            // depth stays inside [0, 1] for points inside the framed sphere
            assert!(pixel.z > 0.0 && pixel.z < 1.0);
            let back = pixel_to_world.transform_point_homogeneous(pixel).unwrap();
            assert_relative_eq!(back, p, epsilon = 1.0e-9);
        }

        // the depth convention: near plane to 0, far plane to 1
        let near = world_to_pixel
            .transform_point_homogeneous(Point3::new(0.0, 0.0, 1.5))
            .unwrap();
        let far = world_to_pixel
            .transform_point_homogeneous(Point3::new(0.0, 0.0, -1.5))
            .unwrap();
        assert_relative_eq!(near.z, 0.0, epsilon = 1.0e-12);
        assert_relative_eq!(far.z, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn test_orbit_centers_the_world_sphere() {
        let mut view = View::new();
        let sphere = BoundingSphere::new(Point3::new(5.0, -3.0, 2.0), 2.0);
        view.set_orbit(&OrbitParams::default(), &sphere);

        // sphere center sits on the view axis at the orbit distance
        let center = view.world_to_view().transform_point(sphere.center());
        assert_relative_eq!(center, Point3::new(0.0, 0.0, -EYE_DISTANCE), epsilon = 1.0e-12);

        // a surface point ends up one normalized unit from the center
        let surface = view
            .world_to_view()
            .transform_point(sphere.center() + crate::foundation::math::Vector3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(surface.distance_to(&center), 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn test_cull_scenario_disjoint_spheres() {
        let mut scene = SceneGraph::new();
        let group = scene.insert_group();
        scene.add_child(scene.root(), group);
        let first = scene.insert_leaf(unit_sphere_leaf(Point3::origin()));
        let second = scene.insert_leaf(unit_sphere_leaf(Point3::new(10.0, 0.0, 0.0)));
        scene.add_child(group, first);
        scene.add_child(group, second);

        let mut view = View::new();
        view.set_ortho(-2.0, 2.0, -2.0, 2.0, -2.0, 2.0).unwrap();
        let canvas = Canvas::new(640, 480);

        let list = view.cull(&scene, &canvas);
        assert_eq!(list.len(), 1);
        assert_eq!(list.paths()[0], vec![scene.root(), group, first]);
    }

    #[test]
    fn test_pick_at_center_hits_triangle() {
        let mut scene = SceneGraph::new();
        let leaf = scene.insert_leaf(TriangleLeaf);
        scene.add_child(scene.root(), leaf);

        let mut view = View::new();
        view.set_ortho(-2.0, 2.0, -2.0, 2.0, -2.0, 2.0).unwrap();
        let canvas = Canvas::new(100, 100);

        let hit = view
            .pick_at(&scene, &canvas, 50.0, 50.0)
            .unwrap()
            .expect("center pixel is over the triangle");
        assert_eq!(hit.node(), Some(leaf));
        assert_relative_eq!(hit.world_point(), Point3::origin(), epsilon = 1.0e-9);
        assert_relative_eq!(hit.depth(), 0.5, epsilon = 1.0e-12);
    }

    #[test]
    fn test_pick_at_edge_misses_triangle() {
        let mut scene = SceneGraph::new();
        let leaf = scene.insert_leaf(TriangleLeaf);
        scene.add_child(scene.root(), leaf);

        let mut view = View::new();
        view.set_ortho(-2.0, 2.0, -2.0, 2.0, -2.0, 2.0).unwrap();
        let canvas = Canvas::new(100, 100);

        // pixel x = 10 is cube x = -1.6, left of the triangle
        assert!(view.pick_at(&scene, &canvas, 10.0, 50.0).unwrap().is_none());
    }

    #[test]
    fn test_render_draws_and_clears_dirty() {
        let mut scene = SceneGraph::new();
        let leaf = scene.insert_leaf(TriangleLeaf);
        scene.add_child(scene.root(), leaf);
        scene.dirty_draw(leaf);
        assert!(scene.is_draw_dirty(scene.root()));

        let mut view = View::new();
        view.set_ortho(-2.0, 2.0, -2.0, 2.0, -2.0, 2.0).unwrap();
        let canvas = Canvas::new(64, 64);
        let mut backend = RecordingBackend::new();
        view.render(&scene, &canvas, &mut backend);

        assert!(!scene.is_draw_dirty(scene.root()));
        assert_eq!(backend.matrix_depth(), 0);
        // TriangleLeaf::draw issues nothing, so no batch is recorded;
        // the replay itself must not have touched the matrix stack either
        assert!(!backend
            .calls()
            .iter()
            .any(|c| matches!(c, RenderCall::DrawBatch { .. })));
    }
}
