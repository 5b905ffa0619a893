//! Foundational value types with no scene-graph dependencies
//!
//! - [`math`] - Points, vectors, 4x4 matrices, and planes
//! - [`bounds`] - Bounding spheres and axis-aligned bounding boxes

pub mod bounds;
pub mod math;
