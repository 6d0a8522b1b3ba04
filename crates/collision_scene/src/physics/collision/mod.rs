//! Collision detection primitives
//!
//! Detection only; there is no collision response here.
//!
//! # Module Organization
//!
//! - [`primitives`] - Basic bounding volumes and triangles with overlap tests
//! - [`bvh`] - Bounding volume hierarchy over a mesh's triangles
//!
//! All shapes are stored in model space; callers transform them to world
//! space on demand.

pub mod primitives;
pub mod bvh;

// Re-export commonly used types
pub use primitives::{Aabb, BoundingSphere, Triangle};
pub use bvh::BvhNode;
