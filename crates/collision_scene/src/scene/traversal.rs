//! Full-subtree traversals: mesh, BVH boxes and debug volumes
//!
//! No culling happens here. Each node applies its own world transform in a
//! scoped push/pop before its children are visited, so nothing a node does
//! to the backend's transform leaks into its siblings or children.

use crate::render::{with_transform, RenderBackend};

use super::node::NodeId;
use super::scene_graph::SceneGraph;

/// What a subtree traversal draws for each model-bearing node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalMode {
    /// The triangle mesh
    Normal,
    /// Every box of the model's BVH
    Bvh,
    /// Model bounding box and bounding sphere
    Debug,
}

impl SceneGraph {
    /// Draw `id` and every descendant in `mode`, depth-first in child order
    ///
    /// Returns how many of the visited nodes carried a model.
    pub fn render_subtree(&self, id: NodeId, mode: TraversalMode, backend: &mut dyn RenderBackend) -> usize {
        let node = &self[id];

        let drawn = with_transform(backend, &self.world_transform(id), |backend| match &node.model {
            Some(model) => {
                match mode {
                    TraversalMode::Normal => model.render(backend),
                    TraversalMode::Bvh => model.render_bvh(backend),
                    TraversalMode::Debug => model.debug_render(backend),
                }
                1
            }
            None => 0,
        });

        drawn
            + node
                .children
                .iter()
                .map(|&child| self.render_subtree(child, mode, backend))
                .sum::<usize>()
    }

    /// Draw the meshes of the subtree rooted at `id`
    pub fn render(&self, id: NodeId, backend: &mut dyn RenderBackend) -> usize {
        self.render_subtree(id, TraversalMode::Normal, backend)
    }

    /// Draw the BVH boxes of the subtree rooted at `id`
    pub fn render_bvh(&self, id: NodeId, backend: &mut dyn RenderBackend) -> usize {
        self.render_subtree(id, TraversalMode::Bvh, backend)
    }

    /// Draw bounding boxes and spheres of the subtree rooted at `id`
    pub fn debug_render(&self, id: NodeId, backend: &mut dyn RenderBackend) -> usize {
        self.render_subtree(id, TraversalMode::Debug, backend)
    }

    /// Draw every root subtree in `mode`
    pub fn render_all(&self, mode: TraversalMode, backend: &mut dyn RenderBackend) -> usize {
        self.roots()
            .into_iter()
            .map(|root| self.render_subtree(root, mode, backend))
            .sum()
    }
}
