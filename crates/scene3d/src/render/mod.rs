//! Backend abstraction for the immediate-mode renderer
//!
//! The traversal core never talks to a graphics API directly; it consumes
//! the minimal capability set below. A backend owns an implicit matrix
//! stack and an attribute stack, mirroring how immediate-mode APIs bracket
//! state: every push issued during a draw replay is paired with exactly one
//! pop.

use bitflags::bitflags;
use thiserror::Error;

use crate::foundation::math::Matrix44;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Errors surfaced by a rendering backend
#[derive(Error, Debug)]
pub enum RenderError {
    /// The backend rejected or failed a draw call.
    #[error("backend draw failed: {0}")]
    Draw(String),
}

bitflags! {
    /// Named render states a draw bracket may enable
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RenderStates: u32 {
        /// Per-vertex or constant color
        const COLOR = 1;
        /// Lighting material parameters
        const MATERIAL = 1 << 1;
        /// Alpha blending
        const BLEND = 1 << 2;
        /// Polygon depth offset
        const POLYGON_OFFSET = 1 << 3;
    }
}

/// An indexed vertex batch with optional per-vertex attributes
///
/// Attribute slices, when present, run parallel to `vertices`.
#[derive(Debug, Clone, Copy)]
pub struct VertexBatch<'a> {
    /// Vertex positions, in the current local frame
    pub vertices: &'a [[f32; 3]],
    /// Triangle indices into `vertices`
    pub indices: &'a [u32],
    /// Optional per-vertex normals
    pub normals: Option<&'a [[f32; 3]]>,
    /// Optional per-vertex RGBA colors
    pub colors: Option<&'a [[f32; 4]]>,
}

/// Capability set the draw traversal consumes
///
/// Implementations translate these calls into their graphics API. The core
/// guarantees stack discipline: matrix and state pushes arrive properly
/// nested and are always popped.
pub trait RenderBackend {
    /// Push a matrix onto the implicit transform stack
    ///
    /// The new matrix composes with, not replaces, the current one.
    fn push_matrix(&mut self, matrix: &Matrix44);

    /// Pop the most recently pushed matrix
    fn pop_matrix(&mut self);

    /// Enable states for the current bracket, saving the previous values
    fn push_states(&mut self, states: RenderStates);

    /// Restore the states saved by the matching `push_states`
    fn pop_states(&mut self);

    /// Issue an indexed vertex batch
    ///
    /// # Errors
    /// Backend-specific; a failed batch does not abort the traversal.
    fn draw_batch(&mut self, batch: &VertexBatch<'_>) -> BackendResult<()>;
}

/// One call recorded by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    /// A matrix was pushed
    PushMatrix(Matrix44),
    /// A matrix was popped
    PopMatrix,
    /// States were enabled
    PushStates(RenderStates),
    /// States were restored
    PopStates,
    /// A batch was drawn, with its vertex and index counts
    DrawBatch {
        /// Number of vertices in the batch
        vertices: usize,
        /// Number of indices in the batch
        indices: usize,
    },
}

/// Backend that records calls instead of rendering
///
/// Useful for tests and for diagnosing draw-list replay; the recorded
/// sequence shows exactly which state changes a replay elided.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<RenderCall>,
}

impl RecordingBackend {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The calls recorded so far, in issue order
    #[must_use]
    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    /// Current matrix stack depth; zero when balanced
    #[must_use]
    pub fn matrix_depth(&self) -> isize {
        self.calls.iter().fold(0, |depth, call| match call {
            RenderCall::PushMatrix(_) => depth + 1,
            RenderCall::PopMatrix => depth - 1,
            _ => depth,
        })
    }
}

impl RenderBackend for RecordingBackend {
    fn push_matrix(&mut self, matrix: &Matrix44) {
        self.calls.push(RenderCall::PushMatrix(*matrix));
    }

    fn pop_matrix(&mut self) {
        self.calls.push(RenderCall::PopMatrix);
    }

    fn push_states(&mut self, states: RenderStates) {
        self.calls.push(RenderCall::PushStates(states));
    }

    fn pop_states(&mut self) {
        self.calls.push(RenderCall::PopStates);
    }

    fn draw_batch(&mut self, batch: &VertexBatch<'_>) -> BackendResult<()> {
        self.calls.push(RenderCall::DrawBatch {
            vertices: batch.vertices.len(),
            indices: batch.indices.len(),
        });
        Ok(())
    }
}
