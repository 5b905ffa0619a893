//! Cull traversal: frustum-plane testing over bounding spheres

use bitflags::bitflags;

use crate::foundation::bounds::BoundingSphere;
use crate::foundation::math::{Matrix44, Plane};
use crate::scene::{NodeKey, NodeKind, SceneGraph};

use super::context::{handle_matrix, TransformContext};
use super::draw_list::DrawList;

bitflags! {
    /// The set of frustum planes still active for the current subtree
    ///
    /// A plane drops out of the set once a subtree's bounding sphere is
    /// proven entirely on its inside; descendants then skip that plane's
    /// test. The set is saved and restored around each subtree so siblings
    /// are unaffected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PlaneSet: u8 {
        /// Left clip plane (x = -1 in cube space)
        const LEFT = 1;
        /// Right clip plane (x = +1)
        const RIGHT = 1 << 1;
        /// Bottom clip plane (y = -1)
        const BOTTOM = 1 << 2;
        /// Top clip plane (y = +1)
        const TOP = 1 << 3;
        /// Near clip plane (z = -1)
        const NEAR = 1 << 4;
        /// Far clip plane (z = +1)
        const FAR = 1 << 5;
    }
}

/// Plane flags in the order the plane array is stored
const PLANE_FLAGS: [PlaneSet; 6] = [
    PlaneSet::LEFT,
    PlaneSet::RIGHT,
    PlaneSet::BOTTOM,
    PlaneSet::TOP,
    PlaneSet::NEAR,
    PlaneSet::FAR,
];

/// Extract the six frustum planes from a world-to-cube matrix
///
/// Gribb-Hartmann: each clip plane is a sum or difference of the matrix's
/// fourth row with another row, read off without inverting anything. The
/// planes are normalized so signed distances compare against sphere radii,
/// and oriented so inside points measure non-negative.
fn frustum_planes(world_to_cube: &Matrix44) -> [Plane; 6] {
    let m = &world_to_cube.m;
    let row = |i: usize| [m[i], m[4 + i], m[8 + i], m[12 + i]];
    let r0 = row(0);
    let r1 = row(1);
    let r2 = row(2);
    let r3 = row(3);

    let sum = |a: [f64; 4], b: [f64; 4], sign: f64| {
        Plane::new(
            a[0] + sign * b[0],
            a[1] + sign * b[1],
            a[2] + sign * b[2],
            a[3] + sign * b[3],
        )
        .normalized()
    };

    [
        sum(r3, r0, 1.0),  // left
        sum(r3, r0, -1.0), // right
        sum(r3, r1, 1.0),  // bottom
        sum(r3, r1, -1.0), // top
        sum(r3, r2, 1.0),  // near
        sum(r3, r2, -1.0), // far
    ]
}

/// Context of one cull traversal
///
/// Carries the transform state, the six frustum planes expressed in the
/// current local frame (re-mapped on every push and pop, like the pick
/// segment), the set of planes still active, and the draw list being
/// built.
#[derive(Debug)]
pub struct CullContext {
    tc: TransformContext,
    planes: [Plane; 6],
    saved_planes: Vec<[Plane; 6]>,
    active: PlaneSet,
    draw_list: DrawList,
}

impl CullContext {
    /// Create a context from the fixed transform chain
    ///
    /// The frustum planes are extracted from the world-to-cube matrix; at
    /// the root the local frame is the world frame, so they start out in
    /// world coordinates.
    #[must_use]
    pub fn new(
        world_to_view: Matrix44,
        view_to_cube: Matrix44,
        cube_to_pixel: Matrix44,
    ) -> Self {
        let tc = TransformContext::new(world_to_view, view_to_cube, cube_to_pixel);
        let planes = frustum_planes(&tc.world_to_cube());
        Self {
            tc,
            planes,
            saved_planes: Vec::new(),
            active: PlaneSet::all(),
            draw_list: DrawList::new(),
        }
    }

    /// The shared transform state
    #[must_use]
    pub const fn transforms(&self) -> &TransformContext {
        &self.tc
    }

    /// Planes still active for the current subtree
    #[must_use]
    pub const fn active_planes(&self) -> PlaneSet {
        self.active
    }

    /// Compose a transform and carry the frustum planes into the new frame
    pub fn push_local_to_world(&mut self, m: &Matrix44) {
        self.tc.push_local_to_world(m);
        self.saved_planes.push(self.planes);
        for plane in &mut self.planes {
            *plane = plane.transformed_by(m).normalized();
        }
    }

    /// Restore the transform and plane coordinates of the matching push
    ///
    /// # Panics
    /// Panics on a pop with no outstanding push.
    pub fn pop_local_to_world(&mut self) {
        self.tc.pop_local_to_world();
        self.planes = self
            .saved_planes
            .pop()
            .expect("plane stack underflow: pop without matching push");
    }

    /// Record the current node path in the draw list
    ///
    /// Called by leaves that pass their visibility test; the path then ends
    /// at the calling leaf.
    pub fn append_to_draw_list(&mut self) {
        self.draw_list.append(self.tc.path());
    }

    /// The draw list built so far
    #[must_use]
    pub const fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Consume the context, keeping the draw list
    #[must_use]
    pub fn into_draw_list(self) -> DrawList {
        self.draw_list
    }

    /// Test a sphere against the active planes; false means fully outside
    ///
    /// Planes the sphere is entirely inside of are deactivated as a side
    /// effect; the caller saves and restores the active set around the
    /// subtree. An infinite sphere is never outside and never deactivates
    /// anything.
    fn test_sphere(&mut self, sphere: &BoundingSphere) -> bool {
        if sphere.is_infinite() {
            return true;
        }
        let center = sphere.center();
        let radius = sphere.radius();
        for (plane, flag) in self.planes.iter().zip(PLANE_FLAGS) {
            if !self.active.contains(flag) {
                continue;
            }
            let distance = plane.distance_to(center);
            if distance < -radius {
                return false;
            }
            if distance > radius {
                self.active.remove(flag);
            }
        }
        true
    }
}

/// Cull a subtree, appending visible leaf paths to the context's draw list
///
/// Before descending, the subtree's bounding sphere is tested against the
/// planes still active; an empty or fully outside sphere prunes the whole
/// subtree. Plane deactivations earned by this subtree's sphere are visible
/// to its descendants only.
pub fn cull(scene: &SceneGraph, key: NodeKey, ctx: &mut CullContext) {
    let sphere = scene.bounding_sphere(key);
    if sphere.is_empty() {
        return;
    }
    let saved_active = ctx.active;
    if !ctx.test_sphere(&sphere) {
        ctx.active = saved_active;
        return;
    }

    ctx.tc.push_node(key);
    let node = scene.node(key);
    match node.kind() {
        NodeKind::Group(_) => {
            for &child in node.kind().children() {
                cull(scene, child, ctx);
            }
        }
        NodeKind::Transform(t) => {
            ctx.push_local_to_world(&t.matrix());
            for &child in node.kind().children() {
                cull(scene, child, ctx);
            }
            ctx.pop_local_to_world();
        }
        NodeKind::Handle(h) => {
            // a handle that cannot compute its view scale draws nothing
            if let Some(m) = handle_matrix(h, &ctx.tc) {
                ctx.push_local_to_world(&m);
                for &child in node.kind().children() {
                    cull(scene, child, ctx);
                }
                ctx.pop_local_to_world();
            }
        }
        NodeKind::Leaf(leaf) => leaf.cull(ctx),
    }
    ctx.tc.pop_node();
    ctx.active = saved_active;
}
