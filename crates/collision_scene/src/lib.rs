//! # Collision Scene
//!
//! A hierarchical scene of transformable nodes, each optionally carrying a
//! triangle mesh with a precomputed bounding volume hierarchy.
//!
//! ## Features
//!
//! - **Cached World Transforms**: lazy recompute with dirty propagation
//! - **Frustum Culling**: world bounding spheres tested against plane sets
//! - **BVH Queries**: pruned triangle queries in world space
//! - **Backend Agnostic Drawing**: everything draws through [`render::RenderBackend`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use collision_scene::prelude::*;
//!
//! let cube = Arc::new(Model::cube(1.0, &BvhConfig::default()));
//!
//! let mut scene = SceneGraph::new();
//! let root = scene.create_named_node("root", None);
//! let child = scene.create_named_node("cube", Some(cube));
//! scene.add_child(root, child).unwrap();
//! scene.set_position(child, Vec3::new(0.0, 0.0, -5.0)).unwrap();
//!
//! let mut recorder = CommandRecorder::new();
//! assert_eq!(scene.render(root, &mut recorder), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod physics;
pub mod assets;
pub mod render;
pub mod scene;

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        assets::Model,
        config::{BvhConfig, Config, ConfigError, CullingConfig, SceneConfig},
        foundation::math::{EulerTransform, Mat4, Mat4Ext, Vec3},
        physics::collision::{Aabb, BoundingSphere, BvhNode, Triangle},
        render::{CommandRecorder, DrawCommand, RenderBackend},
        scene::{
            Frustum, NodeId, Plane, RadiusEstimate, SceneError, SceneGraph, SceneResult,
            TraversalMode,
        },
    };
}
