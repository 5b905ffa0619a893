//! The scene-graph arena and its operations

use slotmap::SlotMap;

use crate::foundation::bounds::BoundingSphere;
use crate::foundation::math::{Matrix44, Point3};

use super::node::{Group, HandleGroup, Leaf, Node, NodeKey, NodeKind, TransformGroup};

/// Arena of scene nodes plus a root group
///
/// All structural mutation goes through the graph so that parent
/// back-references stay exact and cache invalidation propagates. Node keys
/// are stable across unrelated insertions and removals; passing a key whose
/// node was removed to an accessor that indexes (rather than the `dirty_*`
/// methods, which warn and ignore) is a caller bug and panics.
///
/// Traversals borrow the graph immutably and run to completion; mutation
/// requires `&mut self`, so interleaving a mutation with a running
/// traversal is rejected at compile time. The cache cells additionally make
/// the type `!Sync` — traversal and mutation belong to one thread.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
}

impl SceneGraph {
    /// Create a graph containing only an empty root group
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(NodeKind::Group(Group::new())));
        Self { nodes, root }
    }

    /// Key of the root group every traversal starts from
    #[must_use]
    pub const fn root(&self) -> NodeKey {
        self.root
    }

    /// Insert a node of the given kind, detached from the graph
    pub fn insert(&mut self, kind: NodeKind) -> NodeKey {
        self.nodes.insert(Node::new(kind))
    }

    /// Insert an empty plain group
    pub fn insert_group(&mut self) -> NodeKey {
        self.insert(NodeKind::Group(Group::new()))
    }

    /// Insert an empty transform group with the given matrix
    pub fn insert_transform(&mut self, matrix: Matrix44) -> NodeKey {
        self.insert(NodeKind::Transform(TransformGroup::new(matrix)))
    }

    /// Insert an empty handle group scaling about `center`
    pub fn insert_handle(&mut self, center: Point3, pixel_size: f64) -> NodeKey {
        self.insert(NodeKind::Handle(HandleGroup::new(center, pixel_size)))
    }

    /// Insert a leaf node
    pub fn insert_leaf(&mut self, leaf: impl Leaf + 'static) -> NodeKey {
        self.insert(NodeKind::Leaf(Box::new(leaf)))
    }

    /// Borrow a node
    ///
    /// # Panics
    /// Panics when the key's node was removed.
    #[must_use]
    pub fn node(&self, key: NodeKey) -> &Node {
        &self.nodes[key]
    }

    /// Whether the key refers to a live node
    #[must_use]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of live nodes, root included
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Append `child` to `parent`'s children
    ///
    /// Adding a child that is already present is a silent no-op. A child
    /// may be added under several parents; the sub-graph is then shared.
    ///
    /// # Panics
    /// Panics when `parent` is a leaf or either key is stale.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) {
        assert!(self.nodes.contains_key(child), "add_child: stale child key");
        let Some(children) = self.nodes[parent].kind_mut().children_mut() else {
            panic!("add_child: parent node is not a group");
        };
        if children.contains(&child) {
            return;
        }
        children.push(child);
        self.nodes[child].parents_mut().push(parent);
        self.dirty_bounding_sphere(parent);
        self.dirty_draw(parent);
    }

    /// Remove `child` from `parent`'s children
    ///
    /// Removing a node that is not a child is a silent no-op. Detaching
    /// never frees the child; it stays in the arena for re-attachment or
    /// [`remove`](Self::remove).
    ///
    /// # Panics
    /// Panics when `parent` is a leaf or its key is stale.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) {
        let Some(children) = self.nodes[parent].kind_mut().children_mut() else {
            panic!("remove_child: parent node is not a group");
        };
        let Some(pos) = children.iter().position(|&k| k == child) else {
            return;
        };
        children.remove(pos);
        if let Some(node) = self.nodes.get_mut(child) {
            let parents = node.parents_mut();
            if let Some(pos) = parents.iter().position(|&k| k == parent) {
                parents.remove(pos);
            }
        }
        self.dirty_bounding_sphere(parent);
        self.dirty_draw(parent);
    }

    /// Number of children of a node; zero for leaves
    #[must_use]
    pub fn child_count(&self, key: NodeKey) -> usize {
        self.nodes[key].kind().children().len()
    }

    /// Children of a node, in draw order; empty for leaves
    #[must_use]
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes[key].kind().children()
    }

    /// Remove a node from the arena entirely
    ///
    /// The node is detached from every parent and its children lose their
    /// back-reference to it. Children with no other parent stay alive but
    /// unreachable until removed themselves. Removing an already-removed
    /// key is ignored with a warning.
    ///
    /// # Panics
    /// Panics when asked to remove the root group.
    pub fn remove(&mut self, key: NodeKey) {
        assert!(key != self.root, "cannot remove the root group");
        let Some(node) = self.nodes.remove(key) else {
            log::warn!("remove called with a stale node key");
            return;
        };
        for &parent in node.parents() {
            if let Some(p) = self.nodes.get_mut(parent) {
                if let Some(children) = p.kind_mut().children_mut() {
                    children.retain(|&k| k != key);
                }
            }
            self.dirty_bounding_sphere(parent);
            self.dirty_draw(parent);
        }
        for &child in node.kind().children() {
            if let Some(c) = self.nodes.get_mut(child) {
                c.parents_mut().retain(|&k| k != key);
            }
        }
    }

    /// Replace the matrix of a transform group
    ///
    /// Invalidates bounding spheres and marks the node for redraw.
    ///
    /// # Panics
    /// Panics when the node is not a transform group or the key is stale.
    pub fn set_transform(&mut self, key: NodeKey, matrix: Matrix44) {
        match self.nodes[key].kind_mut() {
            NodeKind::Transform(t) => t.matrix = matrix,
            _ => panic!("set_transform: node is not a transform group"),
        }
        self.dirty_bounding_sphere(key);
        self.dirty_draw(key);
    }

    /// Move the pivot of a handle group
    ///
    /// The handle's sphere is infinite regardless, so only a redraw is
    /// marked.
    ///
    /// # Panics
    /// Panics when the node is not a handle group or the key is stale.
    pub fn set_handle_center(&mut self, key: NodeKey, center: Point3) {
        match self.nodes[key].kind_mut() {
            NodeKind::Handle(h) => h.center = center,
            _ => panic!("set_handle_center: node is not a handle group"),
        }
        self.dirty_draw(key);
    }

    /// The node's bounding sphere, in its own coordinates
    ///
    /// Returns the cached sphere when clean; otherwise recomputes — a group
    /// unions its children (each child consulting its own cache, so clean
    /// sub-graphs are not revisited), a transform group maps the union
    /// through its matrix, a handle is infinite, a leaf asks its
    /// [`Leaf::compute_bounding_sphere`] — and caches the result.
    ///
    /// # Panics
    /// Panics when the key is stale.
    #[must_use]
    pub fn bounding_sphere(&self, key: NodeKey) -> BoundingSphere {
        let node = &self.nodes[key];
        if let Some(sphere) = node.cached_bounding_sphere() {
            return sphere;
        }
        let sphere = match node.kind() {
            NodeKind::Group(g) => self.union_of(g.children()),
            NodeKind::Transform(t) => {
                self.union_of(t.group.children()).transformed_by(&t.matrix)
            }
            NodeKind::Handle(_) => BoundingSphere::infinite(),
            NodeKind::Leaf(leaf) => leaf.compute_bounding_sphere(),
        };
        node.store_bounding_sphere(sphere);
        sphere
    }

    /// Invalidate the bounding-sphere cache of a node and its ancestors
    ///
    /// Propagation stops at nodes already marked dirty: when a node was
    /// dirtied, so were all its ancestors, so re-walking them is redundant.
    /// That guard makes repeated calls O(1) amortized and bounds the walk
    /// even on (forbidden) cyclic graphs. A stale key is ignored with a
    /// warning.
    pub fn dirty_bounding_sphere(&self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else {
            log::warn!("dirty_bounding_sphere called with a stale node key");
            return;
        };
        if !node.mark_sphere_dirty() {
            return;
        }
        for &parent in node.parents() {
            self.dirty_bounding_sphere(parent);
        }
    }

    /// Mark a node and its ancestors as needing redraw
    ///
    /// Same transition-guarded propagation as
    /// [`dirty_bounding_sphere`](Self::dirty_bounding_sphere). The flag is
    /// consumed by whoever schedules repaints, typically via
    /// [`is_draw_dirty`](Self::is_draw_dirty) on the root.
    pub fn dirty_draw(&self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else {
            log::warn!("dirty_draw called with a stale node key");
            return;
        };
        if !node.mark_draw_dirty() {
            return;
        }
        for &parent in node.parents() {
            self.dirty_draw(parent);
        }
    }

    /// Whether the node or any descendant was marked for redraw
    ///
    /// # Panics
    /// Panics when the key is stale.
    #[must_use]
    pub fn is_draw_dirty(&self, key: NodeKey) -> bool {
        self.nodes[key].is_draw_dirty()
    }

    /// Clear redraw marks on a node and all descendants
    ///
    /// Marks satisfy "child dirty implies parent dirty", so the downward
    /// walk can stop at the first clean node.
    pub fn clear_draw_dirty(&self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        if !node.clear_draw_dirty() {
            return;
        }
        for &child in node.kind().children() {
            self.clear_draw_dirty(child);
        }
    }

    fn union_of(&self, children: &[NodeKey]) -> BoundingSphere {
        let mut sphere = BoundingSphere::empty();
        for &child in children {
            sphere = sphere.expanded_by_sphere(&self.bounding_sphere(child));
        }
        sphere
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
