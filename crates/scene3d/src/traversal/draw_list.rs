//! The flattened draw record built by cull and replayed by draw

use crate::scene::NodeKey;

/// An ordered sequence of node paths to draw
///
/// Each entry is the full path from the traversal root to one visible
/// leaf, in the order cull encountered them — which is the draw order.
/// Consecutive entries usually share a long prefix of group nodes; the
/// replay in [`draw`](super::draw::draw) diffs neighbors so shared
/// prefixes are entered once, not once per leaf. That elision is an
/// optimization invariant: replaying without it would render the same
/// image, just with redundant state changes.
#[derive(Debug, Default)]
pub struct DrawList {
    paths: Vec<Vec<NodeKey>>,
}

impl DrawList {
    /// Create an empty draw list
    #[must_use]
    pub const fn new() -> Self {
        Self { paths: Vec::new() }
    }

    /// Record one leaf path; the slice is copied
    pub fn append(&mut self, path: &[NodeKey]) {
        self.paths.push(path.to_vec());
    }

    /// The recorded paths, in draw order
    #[must_use]
    pub fn paths(&self) -> &[Vec<NodeKey>] {
        &self.paths
    }

    /// Number of recorded paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// True when nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Drop all recorded paths, keeping the allocation
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}
