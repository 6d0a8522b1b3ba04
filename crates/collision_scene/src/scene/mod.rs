//! Scene management system
//!
//! A hierarchy of transformable nodes, each optionally carrying a shared
//! [`Model`](crate::assets::Model). The graph provides:
//!
//! - lazily cached world transforms with dirty propagation down the tree
//! - model-space and world-space bounding volume queries
//! - frustum-gated single-pass rendering, at most once per node per frame
//! - full-subtree traversals drawing meshes, BVH boxes or debug volumes
//!
//! ## Frame flow
//!
//! ```text
//! reset_render_flags()
//!      ↓
//! non_recursive_render(node, frustum) for each node
//!      ↓
//! render / render_bvh / debug_render (optional, unculled)
//! ```

mod culling;
mod frustum;
mod node;
mod scene_graph;
mod traversal;

#[cfg(test)]
mod tests;

pub use culling::RadiusEstimate;
pub use frustum::{Frustum, Plane};
pub use node::{NodeId, SceneNode, TransformCache};
pub use scene_graph::{SceneError, SceneGraph, SceneResult};
pub use traversal::TraversalMode;
