//! The retained scene graph
//!
//! Nodes form a directed acyclic graph, not a tree: a node may sit under
//! several parents, so shared sub-graphs draw once per path. The graph is an
//! arena keyed by stable [`NodeKey`]s — groups own keys to their children,
//! nodes keep non-owning keys back to their parents for upward dirty
//! propagation.
//!
//! - [`node`] - Node storage, the closed set of node kinds, and the [`Leaf`]
//!   extension trait
//! - [`graph`] - The [`SceneGraph`] arena and its membership, cache, and
//!   dirty-flag operations

pub mod graph;
pub mod node;

pub use graph::SceneGraph;
pub use node::{Group, HandleGroup, Leaf, Node, NodeKey, NodeKind, TransformGroup};
