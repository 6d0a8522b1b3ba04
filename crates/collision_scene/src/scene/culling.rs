//! Frustum-gated single-pass rendering
//!
//! The frame driver walks the nodes itself and calls
//! [`SceneGraph::non_recursive_render`] per node. Each node is drawn at most
//! once between resets and only if its world bounding sphere survives the
//! frustum test.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::assets::Model;
use crate::foundation::math::{utils, Mat4, Mat4Ext};
use crate::physics::collision::BoundingSphere;
use crate::render::{with_transform, RenderBackend};

use super::frustum::Frustum;
use super::node::NodeId;
use super::scene_graph::{SceneGraph, SceneResult};

/// How a world transform scales a model-space bounding sphere radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RadiusEstimate {
    /// Largest absolute diagonal entry of the linear block
    ///
    /// Correct for axis-aligned scale. Under rotation combined with
    /// non-uniform scale it can underestimate the radius.
    #[default]
    MaxDiagonal,

    /// Length of the longest transformed basis axis
    MaxColumnNorm,
}

impl RadiusEstimate {
    /// Factor applied to a model-space radius under `world`
    pub fn scale_factor(self, world: &Mat4) -> f32 {
        let linear = world.linear_block();
        match self {
            RadiusEstimate::MaxDiagonal => linear
                .diagonal()
                .iter()
                .fold(0.0_f32, |max, value| max.max(value.abs())),
            RadiusEstimate::MaxColumnNorm => linear
                .column_iter()
                .fold(0.0_f32, |max, column| max.max(column.norm())),
        }
    }
}

impl SceneGraph {
    /// Model bounding sphere moved to world space
    ///
    /// The centre is transformed as a point; the radius is scaled by the
    /// configured [`RadiusEstimate`].
    pub fn world_bounding_sphere(&self, id: NodeId) -> SceneResult<BoundingSphere> {
        let model = self.model_of(id)?;
        Ok(self.sphere_in_world(model, &self.world_transform(id)))
    }

    fn sphere_in_world(&self, model: &Model, world: &Mat4) -> BoundingSphere {
        let sphere = model.bounding_sphere();
        let center = utils::transform_point(world, &sphere.center);
        let radius = sphere.radius * self.culling.radius_estimate.scale_factor(world);
        BoundingSphere::new(center, radius)
    }

    /// Draw `id` once per frame if its world bounding sphere touches `frustum`
    ///
    /// Children are not visited. Returns `false` without touching any state
    /// when the node has no model, was already drawn since the last reset, or
    /// lies entirely outside the frustum.
    pub fn non_recursive_render(&self, id: NodeId, frustum: &Frustum, backend: &mut dyn RenderBackend) -> bool {
        let node = &self[id];
        let Some(model) = node.model.as_ref() else {
            return false;
        };
        if node.was_rendered() {
            return false;
        }

        let world = self.world_transform(id);
        let sphere = self.sphere_in_world(model, &world);
        if !frustum.intersects_sphere(&sphere) {
            trace!("Culled {:?} (centre {:?}, radius {:.3})", id, sphere.center, sphere.radius);
            return false;
        }

        node.set_rendered(true);
        with_transform(backend, &world, |backend| model.render(backend));
        true
    }

    /// Clear the render marker of one node
    pub fn reset_render_flag(&self, id: NodeId) {
        self[id].set_rendered(false);
    }

    /// Clear every render marker; call once per frame before culling
    pub fn reset_render_flags(&self) {
        for (_, node) in self.nodes.iter() {
            node.set_rendered(false);
        }
    }

    /// True if `id` was drawn by [`SceneGraph::non_recursive_render`] since the last reset
    pub fn was_rendered(&self, id: NodeId) -> bool {
        self[id].was_rendered()
    }
}
