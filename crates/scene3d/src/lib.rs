//! # scene3d
//!
//! A retained-mode 3D scene graph layered over an immediate-mode renderer.
//!
//! The library centers on a node/group DAG with lazily cached bounding
//! spheres and three traversal protocols that walk it:
//!
//! - **Cull**: selects the visible subset of the graph by testing bounding
//!   spheres against the view frustum, producing a [`DrawList`](traversal::DrawList).
//! - **Draw**: replays a draw list against a [`RenderBackend`](render::RenderBackend),
//!   eliding redundant state changes for shared path prefixes.
//! - **Pick**: intersects a 3D segment, derived from a 2D pointer position,
//!   with scene geometry and reports the closest hit.
//!
//! Five chained coordinate systems connect a node's own space to screen
//! pixels: local → world → view → cube (clip) → pixel. Traversals carry the
//! chain in a [`TransformContext`](traversal::TransformContext) whose
//! local-to-world stack is pushed and popped as transform groups are entered
//! and left.
//!
//! ## Quick Start
//!
//! ```rust
//! use scene3d::prelude::*;
//!
//! let mut scene = SceneGraph::new();
//! let group = scene.insert_group();
//! scene.add_child(scene.root(), group);
//!
//! let view = View::new();
//! let canvas = Canvas::new(640, 480);
//! let draw_list = view.cull(&scene, &canvas);
//! assert!(draw_list.is_empty()); // nothing but empty groups so far
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod picking;
pub mod render;
pub mod scene;
pub mod traversal;
pub mod view;

/// Common imports for library users
pub mod prelude {
    pub use crate::foundation::{
        bounds::{BoundingBox, BoundingSphere},
        math::{Matrix44, Plane, Point3, Point4, Vector3},
    };
    pub use crate::picking::{PickResult, PickSegment};
    pub use crate::render::{RenderBackend, RenderStates, VertexBatch};
    pub use crate::scene::{Leaf, NodeKey, NodeKind, SceneGraph};
    pub use crate::traversal::{
        CullContext, DrawContext, DrawList, PickContext, TransformContext,
    };
    pub use crate::view::{Canvas, OrbitParams, View};
}
