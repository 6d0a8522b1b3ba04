//! Model handle: a triangle mesh with its precomputed bounding volumes
//!
//! Everything is stored in MODEL SPACE and never modified after
//! construction. Scene nodes share models through `Arc` and apply their own
//! world transform when drawing or querying.

use std::fmt;

use crate::config::BvhConfig;
use crate::foundation::math::Vec3;
use crate::physics::collision::{Aabb, BoundingSphere, BvhNode, Triangle};
use crate::render::RenderBackend;

/// Immutable mesh plus bounding box, bounding sphere and BVH
#[derive(Debug, Clone)]
pub struct Model {
    /// Triangles in model space
    triangles: Vec<Triangle>,
    /// Box around every vertex
    bounding_box: Aabb,
    /// Sphere centred on the box centre reaching the farthest vertex
    bounding_sphere: BoundingSphere,
    /// Hierarchy whose leaves index into `triangles`
    bvh: BvhNode,
}

impl Model {
    /// Build a model from model-space triangles
    pub fn from_triangles(triangles: Vec<Triangle>, config: &BvhConfig) -> Self {
        let bounding_box = Aabb::from_triangles(&triangles).unwrap_or_default();
        let bounding_sphere = BoundingSphere::around_points(
            bounding_box.center(),
            triangles.iter().flat_map(Triangle::vertices),
        );
        let bvh = BvhNode::build(&triangles, config);

        log::debug!(
            "Created model: {} triangles, sphere radius {:.3}",
            triangles.len(),
            bounding_sphere.radius
        );

        Self {
            triangles,
            bounding_box,
            bounding_sphere,
            bvh,
        }
    }

    /// Build a model from an indexed vertex list
    ///
    /// Every three indices form one triangle; a trailing incomplete group
    /// and indices outside `vertices` are skipped with a warning.
    pub fn from_indexed(vertices: &[Vec3], indices: &[u32], config: &BvhConfig) -> Self {
        let mut triangles = Vec::with_capacity(indices.len() / 3);

        for chunk in indices.chunks(3) {
            if chunk.len() != 3 {
                log::warn!("Ignoring {} trailing indices that do not form a triangle", chunk.len());
                continue;
            }
            let corners: Option<Vec<Vec3>> = chunk
                .iter()
                .map(|&index| vertices.get(index as usize).copied())
                .collect();
            match corners.as_deref() {
                Some(&[v0, v1, v2]) => triangles.push(Triangle::new(v0, v1, v2)),
                _ => log::warn!("Skipping triangle with out-of-range index in {:?}", chunk),
            }
        }

        Self::from_triangles(triangles, config)
    }

    /// Axis-aligned cube centred on the origin with the given half extent
    pub fn cube(half_extent: f32, config: &BvhConfig) -> Self {
        let h = half_extent;
        let vertices = [
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        #[rustfmt::skip]
        let indices = [
            0, 2, 1, 0, 3, 2, // -Z
            4, 5, 6, 4, 6, 7, // +Z
            0, 1, 5, 0, 5, 4, // -Y
            3, 7, 6, 3, 6, 2, // +Y
            0, 4, 7, 0, 7, 3, // -X
            1, 2, 6, 1, 6, 5, // +X
        ];
        Self::from_indexed(&vertices, &indices, config)
    }

    /// Model-space bounding box
    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    /// Model-space bounding sphere
    pub fn bounding_sphere(&self) -> &BoundingSphere {
        &self.bounding_sphere
    }

    /// Model-space triangles
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Root of the BVH; its leaf indices refer to [`Model::triangles`]
    pub fn bvh_root(&self) -> &BvhNode {
        &self.bvh
    }

    /// Number of collision triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Draw the mesh with the backend's active transform
    pub fn render(&self, backend: &mut dyn RenderBackend) {
        backend.draw_triangles(&self.triangles);
    }

    /// Draw the bounding box and bounding sphere with the backend's active transform
    pub fn debug_render(&self, backend: &mut dyn RenderBackend) {
        backend.draw_box(&self.bounding_box);
        backend.draw_sphere(&self.bounding_sphere);
    }

    /// Draw every BVH box with the backend's active transform
    pub fn render_bvh(&self, backend: &mut dyn RenderBackend) {
        self.bvh.render_bounds(backend);
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Triangle count: {}", self.triangle_count())
    }
}
