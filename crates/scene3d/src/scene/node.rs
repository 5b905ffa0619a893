//! Node storage and the closed set of node kinds

use std::cell::Cell;
use std::fmt;

use slotmap::new_key_type;

use crate::foundation::bounds::BoundingSphere;
use crate::foundation::math::{Matrix44, Point3};
use crate::traversal::{CullContext, DrawContext, PickContext};

new_key_type! {
    /// Stable key of a node in a [`SceneGraph`](super::SceneGraph) arena
    pub struct NodeKey;
}

/// Extension surface for terminal geometry nodes
///
/// A leaf is the only open-ended node kind; groups, transform groups, and
/// handles are built in. Implementers supply a bounding sphere and the
/// per-traversal visit hooks. The defaults make a leaf visible whenever its
/// sphere survives culling, and transparent to picking.
pub trait Leaf: fmt::Debug {
    /// Bounding sphere in the leaf's own coordinates
    ///
    /// Called only when the cached sphere is dirty. Return
    /// [`BoundingSphere::infinite`] for geometry whose local extent depends
    /// on the view.
    fn compute_bounding_sphere(&self) -> BoundingSphere;

    /// Cull visit: decide visibility beyond the sphere test
    ///
    /// The traversal has already tested this leaf's bounding sphere against
    /// the view frustum; the default records the current path in the draw
    /// list unconditionally.
    fn cull(&self, ctx: &mut CullContext) {
        ctx.append_to_draw_list();
    }

    /// Draw replay is entering this leaf; set leaf-local render state here
    fn draw_begin(&self, _ctx: &mut DrawContext<'_>) {}

    /// Draw visit: issue render calls for this leaf's geometry
    fn draw(&self, ctx: &mut DrawContext<'_>);

    /// Draw replay is leaving this leaf; restore state set in `draw_begin`
    fn draw_end(&self, _ctx: &mut DrawContext<'_>) {}

    /// Pick visit: intersect geometry with the context's segment
    ///
    /// The segment is expressed in this leaf's local coordinates. Record
    /// hits with [`PickContext::add_result`]; the default makes the leaf
    /// transparent to picking.
    fn pick(&self, _ctx: &mut PickContext) {}
}

/// Ordered children of a group node
///
/// Order matters for draw semantics: later children draw over earlier ones;
/// no depth sort is performed.
#[derive(Debug, Default)]
pub struct Group {
    children: Vec<NodeKey>,
}

impl Group {
    /// Create a group with no children
    #[must_use]
    pub const fn new() -> Self {
        Self { children: Vec::new() }
    }

    /// The children, in draw order
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeKey> {
        &mut self.children
    }
}

/// A group that pushes a fixed matrix around its children
///
/// The matrix carries child-local points into this node's own frame, so the
/// node's bounding sphere is the children's union mapped through it.
#[derive(Debug)]
pub struct TransformGroup {
    pub(crate) matrix: Matrix44,
    pub(crate) group: Group,
}

impl TransformGroup {
    /// Create a transform group with the given matrix and no children
    #[must_use]
    pub const fn new(matrix: Matrix44) -> Self {
        Self { matrix, group: Group::new() }
    }

    /// The transform applied to children
    #[must_use]
    pub const fn matrix(&self) -> Matrix44 {
        self.matrix
    }
}

/// A group whose children keep a constant on-screen size
///
/// Used for drag handles: at traversal time a scale about `center` is
/// computed from the current local-to-pixel transform so that one local
/// unit spans `pixel_size` pixels. The view dependence makes the local
/// extent unboundable, so the bounding sphere is infinite.
#[derive(Debug)]
pub struct HandleGroup {
    pub(crate) center: Point3,
    pub(crate) pixel_size: f64,
    pub(crate) group: Group,
}

impl HandleGroup {
    /// Create a handle group scaling about `center`
    ///
    /// `pixel_size` is the on-screen span, in pixels, of one local unit.
    #[must_use]
    pub const fn new(center: Point3, pixel_size: f64) -> Self {
        Self { center, pixel_size, group: Group::new() }
    }

    /// The point the view-dependent scale pivots on
    #[must_use]
    pub const fn center(&self) -> Point3 {
        self.center
    }

    /// On-screen span of one local unit, in pixels
    #[must_use]
    pub const fn pixel_size(&self) -> f64 {
        self.pixel_size
    }
}

/// The closed set of node kinds
///
/// Traversals dispatch on the kind once per step; only [`Leaf`] is open for
/// extension by applications.
#[derive(Debug)]
pub enum NodeKind {
    /// Plain ordered container of children
    Group(Group),
    /// Group that pushes a fixed matrix around its children
    Transform(TransformGroup),
    /// Group whose children keep a constant on-screen size
    Handle(HandleGroup),
    /// Terminal geometry supplied by the application
    Leaf(Box<dyn Leaf>),
}

impl NodeKind {
    /// Children of this node, in draw order; empty for leaves
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        match self {
            Self::Group(g) => g.children(),
            Self::Transform(t) => t.group.children(),
            Self::Handle(h) => h.group.children(),
            Self::Leaf(_) => &[],
        }
    }

    /// True for the three group-like kinds
    #[must_use]
    pub const fn is_group(&self) -> bool {
        !matches!(self, Self::Leaf(_))
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeKey>> {
        match self {
            Self::Group(g) => Some(g.children_mut()),
            Self::Transform(t) => Some(t.group.children_mut()),
            Self::Handle(h) => Some(h.group.children_mut()),
            Self::Leaf(_) => None,
        }
    }
}

/// A vertex of the scene DAG
///
/// Besides its kind, a node carries parent back-references and the
/// per-node cache state: the lazily computed bounding sphere with its dirty
/// flag, and a draw-dirty flag for repaint marking. The caches are `Cell`s
/// so that read paths (`&self`) can fill them; they are plain observable
/// state, reachable through [`is_bounding_sphere_dirty`](Self::is_bounding_sphere_dirty)
/// and friends.
#[derive(Debug)]
pub struct Node {
    kind: NodeKind,
    parents: Vec<NodeKey>,
    sphere: Cell<Option<BoundingSphere>>,
    sphere_dirty: Cell<bool>,
    draw_dirty: Cell<bool>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parents: Vec::new(),
            sphere: Cell::new(None),
            sphere_dirty: Cell::new(true),
            draw_dirty: Cell::new(false),
        }
    }

    /// This node's kind
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Keys of the groups currently holding this node as a child
    ///
    /// One entry per distinct parent; maintained exactly by
    /// [`SceneGraph::add_child`](super::SceneGraph::add_child) and
    /// [`remove_child`](super::SceneGraph::remove_child).
    #[must_use]
    pub fn parents(&self) -> &[NodeKey] {
        &self.parents
    }

    /// Whether the next bounding-sphere query will recompute
    #[must_use]
    pub fn is_bounding_sphere_dirty(&self) -> bool {
        self.sphere_dirty.get()
    }

    /// The cached bounding sphere, if present and clean
    #[must_use]
    pub fn cached_bounding_sphere(&self) -> Option<BoundingSphere> {
        if self.sphere_dirty.get() {
            None
        } else {
            self.sphere.get()
        }
    }

    /// Whether this node or a descendant was marked for redraw
    #[must_use]
    pub fn is_draw_dirty(&self) -> bool {
        self.draw_dirty.get()
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub(crate) fn parents_mut(&mut self) -> &mut Vec<NodeKey> {
        &mut self.parents
    }

    /// Mark the sphere cache dirty; true only on the false→true transition
    pub(crate) fn mark_sphere_dirty(&self) -> bool {
        !self.sphere_dirty.replace(true)
    }

    /// Mark the draw flag; true only on the false→true transition
    pub(crate) fn mark_draw_dirty(&self) -> bool {
        !self.draw_dirty.replace(true)
    }

    /// Clear the draw flag; true when it was set
    pub(crate) fn clear_draw_dirty(&self) -> bool {
        self.draw_dirty.replace(false)
    }

    pub(crate) fn store_bounding_sphere(&self, sphere: BoundingSphere) {
        self.sphere.set(Some(sphere));
        self.sphere_dirty.set(false);
    }
}
