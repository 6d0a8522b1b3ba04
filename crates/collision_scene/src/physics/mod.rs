//! Physics module for collision detection
//!
//! Provides bounding volumes, triangle tests and per-mesh bounding volume
//! hierarchies.

pub mod collision;

pub use collision::{Aabb, BoundingSphere, BvhNode, Triangle};
