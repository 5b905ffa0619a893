//! Pick traversal: segment descent and hit accumulation

use crate::foundation::math::{MathError, Matrix44, Point3};
use crate::picking::geometry::segment_intersects_sphere;
use crate::picking::{PickResult, PickSegment};
use crate::scene::{NodeKey, NodeKind, SceneGraph};

use super::context::{handle_matrix, TransformContext};

/// Context of one pick traversal
///
/// Carries the transform state, the pick segment expressed in the current
/// local frame, and the results accumulated so far. The segment starts at
/// pixel depth 0 and ends at pixel depth 1 under the pointer position, both
/// unprojected into world coordinates; every local-to-world push re-maps it
/// through the pushed matrix's inverse so leaves always test geometry in
/// their own frame.
#[derive(Debug)]
pub struct PickContext {
    tc: TransformContext,
    segment: PickSegment,
    saved_segments: Vec<PickSegment>,
    results: Vec<PickResult>,
}

impl PickContext {
    /// Create a context for a pick at pixel position (x, y)
    ///
    /// # Errors
    /// Returns [`MathError::SingularMatrix`] when the combined
    /// world-to-pixel transform cannot be inverted, and
    /// [`MathError::ZeroW`] when the pixel unprojects to infinity.
    pub fn new(
        world_to_view: Matrix44,
        view_to_cube: Matrix44,
        cube_to_pixel: Matrix44,
        x: f64,
        y: f64,
    ) -> Result<Self, MathError> {
        let tc = TransformContext::new(world_to_view, view_to_cube, cube_to_pixel);
        let pixel_to_world = tc.world_to_pixel().inverse()?;
        let near = pixel_to_world.transform_point_homogeneous(Point3::new(x, y, 0.0))?;
        let far = pixel_to_world.transform_point_homogeneous(Point3::new(x, y, 1.0))?;
        Ok(Self {
            tc,
            segment: PickSegment::new(near, far),
            saved_segments: Vec::new(),
            results: Vec::new(),
        })
    }

    /// The shared transform state
    #[must_use]
    pub const fn transforms(&self) -> &TransformContext {
        &self.tc
    }

    /// The pick segment, in the current local frame
    #[must_use]
    pub const fn segment(&self) -> &PickSegment {
        &self.segment
    }

    /// Compose a transform and carry the segment into the new frame
    ///
    /// # Errors
    /// Returns [`MathError::SingularMatrix`] when `m` has no inverse; a
    /// collapsed transform admits no meaningful pick in its subtree, and
    /// the whole traversal unwinds.
    pub fn push_local_to_world(&mut self, m: &Matrix44) -> Result<(), MathError> {
        let inverse = m.inverse()?;
        self.tc.push_local_to_world(m);
        self.saved_segments.push(self.segment);
        self.segment = self.segment.transformed_by(&inverse);
        Ok(())
    }

    /// Restore the transform and segment of the matching push
    ///
    /// # Panics
    /// Panics on a pop with no outstanding push.
    pub fn pop_local_to_world(&mut self) {
        self.tc.pop_local_to_world();
        self.segment = self
            .saved_segments
            .pop()
            .expect("segment stack underflow: pop without matching push");
    }

    /// Record a hit at a point in the current local frame
    ///
    /// The world point and the pixel depth are derived from the current
    /// transform chain. A hit that projects to infinity is dropped with a
    /// warning; that means the caller's geometry intersection strayed
    /// outside the view volume.
    pub fn add_result(&mut self, local_point: Point3) {
        let world_point = self.tc.local_to_world().transform_point(local_point);
        let pixel = match self.tc.local_to_pixel().transform_point_homogeneous(local_point) {
            Ok(p) => p,
            Err(_) => {
                log::warn!("pick hit projects to infinity; dropped");
                return;
            }
        };
        self.results.push(PickResult::new(
            self.tc.path().to_vec(),
            local_point,
            world_point,
            pixel.z,
        ));
    }

    /// All hits recorded so far, in traversal order
    #[must_use]
    pub fn results(&self) -> &[PickResult] {
        &self.results
    }

    /// The hit nearest the viewer: minimum pixel depth, first found wins
    #[must_use]
    pub fn closest(&self) -> Option<&PickResult> {
        let mut best: Option<&PickResult> = None;
        for result in &self.results {
            match best {
                Some(b) if result.depth() >= b.depth() => {}
                _ => best = Some(result),
            }
        }
        best
    }
}

/// Pick a subtree, letting touched leaves record exact intersections
///
/// Descends only where the current segment touches a node's bounding
/// sphere; an empty sphere never intersects and prunes its subtree.
///
/// # Errors
/// Returns [`MathError::SingularMatrix`] when a non-invertible transform
/// group is met on a descended path.
pub fn pick(scene: &SceneGraph, key: NodeKey, ctx: &mut PickContext) -> Result<(), MathError> {
    let sphere = scene.bounding_sphere(key);
    if !segment_intersects_sphere(ctx.segment(), &sphere) {
        return Ok(());
    }

    ctx.tc.push_node(key);
    let node = scene.node(key);
    match node.kind() {
        NodeKind::Group(_) => {
            for &child in node.kind().children() {
                pick(scene, child, ctx)?;
            }
        }
        NodeKind::Transform(t) => {
            ctx.push_local_to_world(&t.matrix())?;
            for &child in node.kind().children() {
                pick(scene, child, ctx)?;
            }
            ctx.pop_local_to_world();
        }
        NodeKind::Handle(h) => {
            // a handle with no view scale this traversal is unpickable
            if let Some(m) = handle_matrix(h, &ctx.tc) {
                ctx.push_local_to_world(&m)?;
                for &child in node.kind().children() {
                    pick(scene, child, ctx)?;
                }
                ctx.pop_local_to_world();
            }
        }
        NodeKind::Leaf(leaf) => leaf.pick(ctx),
    }
    ctx.tc.pop_node();
    Ok(())
}
