//! Draw traversal: replay of a draw list against a render backend

use crate::foundation::math::Matrix44;
use crate::render::RenderBackend;
use crate::scene::{NodeKey, NodeKind, SceneGraph};

use super::context::{handle_matrix, TransformContext};
use super::draw_list::DrawList;

/// Context of one draw traversal
///
/// Couples the transform state with the backend so that matrix pushes land
/// on both in lock-step: the context's stack answers transform queries from
/// leaf hooks, the backend's stack positions the geometry actually drawn.
pub struct DrawContext<'a> {
    tc: TransformContext,
    backend: &'a mut dyn RenderBackend,
}

impl<'a> DrawContext<'a> {
    /// Create a context over a backend from the fixed transform chain
    pub fn new(
        world_to_view: Matrix44,
        view_to_cube: Matrix44,
        cube_to_pixel: Matrix44,
        backend: &'a mut dyn RenderBackend,
    ) -> Self {
        Self {
            tc: TransformContext::new(world_to_view, view_to_cube, cube_to_pixel),
            backend,
        }
    }

    /// The shared transform state
    #[must_use]
    pub const fn transforms(&self) -> &TransformContext {
        &self.tc
    }

    /// The backend draw calls are issued to
    pub fn backend(&mut self) -> &mut dyn RenderBackend {
        &mut *self.backend
    }

    /// Compose a transform onto context and backend stacks together
    pub fn push_local_to_world(&mut self, m: &Matrix44) {
        self.tc.push_local_to_world(m);
        self.backend.push_matrix(m);
    }

    /// Pop the transform from context and backend stacks together
    ///
    /// # Panics
    /// Panics on a pop with no outstanding push.
    pub fn pop_local_to_world(&mut self) {
        self.tc.pop_local_to_world();
        self.backend.pop_matrix();
    }
}

fn draw_begin(scene: &SceneGraph, key: NodeKey, ctx: &mut DrawContext<'_>) {
    ctx.tc.push_node(key);
    match scene.node(key).kind() {
        NodeKind::Group(_) => {}
        NodeKind::Transform(t) => ctx.push_local_to_world(&t.matrix()),
        NodeKind::Handle(h) => {
            // keep the bracket balanced even for a degenerate handle
            let m = handle_matrix(h, &ctx.tc).unwrap_or_else(Matrix44::identity);
            ctx.push_local_to_world(&m);
        }
        NodeKind::Leaf(leaf) => leaf.draw_begin(ctx),
    }
}

fn draw_visit(scene: &SceneGraph, key: NodeKey, ctx: &mut DrawContext<'_>) {
    if let NodeKind::Leaf(leaf) = scene.node(key).kind() {
        leaf.draw(ctx);
    }
}

fn draw_end(scene: &SceneGraph, key: NodeKey, ctx: &mut DrawContext<'_>) {
    match scene.node(key).kind() {
        NodeKind::Group(_) => {}
        NodeKind::Transform(_) | NodeKind::Handle(_) => ctx.pop_local_to_world(),
        NodeKind::Leaf(leaf) => leaf.draw_end(ctx),
    }
    ctx.tc.pop_node();
}

/// Replay a draw list, eliding begin/end work for shared path prefixes
///
/// Consecutive paths are diffed: nodes of the previous path beyond the
/// shared prefix are ended bottom-to-top, nodes of the current path beyond
/// it are begun top-to-bottom, and the terminal leaf is visited exactly
/// once per entry. Every begin is paired with exactly one end by the time
/// the replay returns, including the final unwinding of the last path.
pub fn draw(scene: &SceneGraph, list: &DrawList, ctx: &mut DrawContext<'_>) {
    let mut prev: &[NodeKey] = &[];
    for path in list.paths() {
        let shared = prev
            .iter()
            .zip(path.iter())
            .take_while(|(a, b)| a == b)
            .count();
        for &key in prev[shared..].iter().rev() {
            draw_end(scene, key, ctx);
        }
        for &key in &path[shared..] {
            draw_begin(scene, key, ctx);
        }
        if let Some(&leaf) = path.last() {
            draw_visit(scene, leaf, ctx);
        }
        prev = path;
    }
    for &key in prev.iter().rev() {
        draw_end(scene, key, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::bounds::BoundingSphere;
    use crate::foundation::math::Point3;
    use crate::render::{RecordingBackend, RenderCall, RenderStates, VertexBatch};
    use crate::scene::Leaf;
    use crate::traversal::{cull, CullContext};

    /// Leaf drawing one fixed triangle inside a color bracket
    #[derive(Debug)]
    struct TriangleLeaf;

    impl Leaf for TriangleLeaf {
        fn compute_bounding_sphere(&self) -> BoundingSphere {
            BoundingSphere::new(Point3::origin(), 1.0)
        }

        fn draw_begin(&self, ctx: &mut DrawContext<'_>) {
            ctx.backend().push_states(RenderStates::COLOR);
        }

        fn draw(&self, ctx: &mut DrawContext<'_>) {
            let vertices = [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]];
            let batch = VertexBatch {
                vertices: &vertices,
                indices: &[0, 1, 2],
                normals: None,
                colors: None,
            };
            if let Err(e) = ctx.backend().draw_batch(&batch) {
                log::warn!("triangle batch failed: {e}");
            }
        }

        fn draw_end(&self, ctx: &mut DrawContext<'_>) {
            ctx.backend().pop_states();
        }
    }

    fn identity_context(backend: &mut RecordingBackend) -> DrawContext<'_> {
        DrawContext::new(
            Matrix44::identity(),
            Matrix44::identity(),
            Matrix44::identity(),
            backend,
        )
    }

    #[test]
    fn test_shared_prefix_pushes_transform_once() {
        let mut scene = SceneGraph::new();
        let xform = scene.insert_transform(Matrix44::translate(0.0, 0.0, -1.0));
        scene.add_child(scene.root(), xform);
        let a = scene.insert_leaf(TriangleLeaf);
        let b = scene.insert_leaf(TriangleLeaf);
        scene.add_child(xform, a);
        scene.add_child(xform, b);

        let mut list = DrawList::new();
        list.append(&[scene.root(), xform, a]);
        list.append(&[scene.root(), xform, b]);

        let mut backend = RecordingBackend::new();
        let mut ctx = identity_context(&mut backend);
        draw(&scene, &list, &mut ctx);

        let pushes = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::PushMatrix(_)))
            .count();
        let draws = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::DrawBatch { .. }))
            .count();
        assert_eq!(pushes, 1); // both paths share the transform prefix
        assert_eq!(draws, 2);
        assert_eq!(backend.matrix_depth(), 0);
    }

    #[test]
    fn test_disjoint_paths_rebuild_their_prefixes() {
        let mut scene = SceneGraph::new();
        let x1 = scene.insert_transform(Matrix44::translate(1.0, 0.0, 0.0));
        let x2 = scene.insert_transform(Matrix44::translate(-1.0, 0.0, 0.0));
        scene.add_child(scene.root(), x1);
        scene.add_child(scene.root(), x2);
        let a = scene.insert_leaf(TriangleLeaf);
        let b = scene.insert_leaf(TriangleLeaf);
        scene.add_child(x1, a);
        scene.add_child(x2, b);

        let mut list = DrawList::new();
        list.append(&[scene.root(), x1, a]);
        list.append(&[scene.root(), x2, b]);

        let mut backend = RecordingBackend::new();
        let mut ctx = identity_context(&mut backend);
        draw(&scene, &list, &mut ctx);

        let pushes = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::PushMatrix(_)))
            .count();
        assert_eq!(pushes, 2); // prefixes diverge after the root
        assert_eq!(backend.matrix_depth(), 0);
    }

    #[test]
    fn test_leaf_state_bracket_balances() {
        let mut scene = SceneGraph::new();
        let leaf = scene.insert_leaf(TriangleLeaf);
        scene.add_child(scene.root(), leaf);

        let mut list = DrawList::new();
        list.append(&[scene.root(), leaf]);

        let mut backend = RecordingBackend::new();
        let mut ctx = identity_context(&mut backend);
        draw(&scene, &list, &mut ctx);

        assert_eq!(
            backend.calls(),
            &[
                RenderCall::PushStates(RenderStates::COLOR),
                RenderCall::DrawBatch { vertices: 3, indices: 3 },
                RenderCall::PopStates,
            ]
        );
    }

    #[test]
    fn test_empty_list_issues_nothing() {
        let scene = SceneGraph::new();
        let mut backend = RecordingBackend::new();
        let mut ctx = identity_context(&mut backend);
        draw(&scene, &DrawList::new(), &mut ctx);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_cull_then_draw_round_trip() {
        let mut scene = SceneGraph::new();
        let group = scene.insert_group();
        scene.add_child(scene.root(), group);
        let leaf = scene.insert_leaf(TriangleLeaf);
        scene.add_child(group, leaf);

        let mut cull_ctx = CullContext::new(
            Matrix44::identity(),
            Matrix44::ortho(-2.0, 2.0, -2.0, 2.0, -2.0, 2.0).unwrap(),
            Matrix44::identity(),
        );
        cull(&scene, scene.root(), &mut cull_ctx);
        let list = cull_ctx.into_draw_list();
        assert_eq!(list.len(), 1);

        let mut backend = RecordingBackend::new();
        let mut ctx = identity_context(&mut backend);
        draw(&scene, &list, &mut ctx);

        let draws = backend
            .calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::DrawBatch { .. }))
            .count();
        assert_eq!(draws, 1);
        assert_eq!(backend.matrix_depth(), 0);
    }
}
