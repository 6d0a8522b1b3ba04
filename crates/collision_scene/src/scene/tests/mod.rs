//! Integration tests across the scene graph, models and the recording backend


use std::sync::Arc;

use crate::assets::Model;
use crate::config::BvhConfig;

/// Cube whose bounding sphere has the given radius
fn cube_with_radius(radius: f32) -> Arc<Model> {
    Arc::new(Model::cube(radius / 3.0f32.sqrt(), &BvhConfig::default()))
}

/// Cube with the given half extent and a BVH deep enough to have inner nodes
fn cube(half_extent: f32) -> Arc<Model> {
    let config = BvhConfig {
        max_triangles_per_leaf: 2,
        ..BvhConfig::default()
    };
    Arc::new(Model::cube(half_extent, &config))
}
