//! Depth-first traversal of the scene graph
//!
//! Three traversal protocols share one skeleton: a depth-first walk where
//! group-like nodes get begin/end treatment (pushing and popping their
//! local transform) and leaves get a visit. Each protocol carries its own
//! context over a common [`TransformContext`]:
//!
//! - [`cull`](cull::cull) tests bounding spheres against the view frustum
//!   and records surviving leaf paths in a [`DrawList`]
//! - [`draw`](draw::draw) replays a draw list against a render backend,
//!   skipping begin/end work for path prefixes shared between consecutive
//!   entries
//! - [`pick`](pick::pick) descends wherever the pick segment touches a
//!   bounding sphere and lets leaves record exact intersections
//!
//! # Module Organization
//!
//! - [`context`] - The node-path and transform stacks every traversal carries
//! - [`cull`] - Frustum-plane culling with per-subtree plane deactivation
//! - [`draw_list`] - The flattened record cull produces and draw consumes
//! - [`draw`] - Draw-list replay with shared-prefix elision
//! - [`pick`] - Segment traversal and hit accumulation

pub mod context;
pub mod cull;
pub mod draw;
pub mod draw_list;
pub mod pick;

pub use context::TransformContext;
pub use cull::{cull, CullContext, PlaneSet};
pub use draw::{draw, DrawContext};
pub use draw_list::DrawList;
pub use pick::{pick, PickContext};
