//! Scene node: local transform, cached world transform and optional model
//!
//! Nodes live in a [`SceneGraph`](super::SceneGraph) arena and refer to each
//! other by [`NodeId`]. The graph owns all structural edits and dirty
//! propagation; a node on its own only knows how to build its local matrix
//! and store its cache.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use slotmap::new_key_type;

use crate::assets::Model;
use crate::foundation::math::{EulerTransform, Mat4, Vec3};

new_key_type! {
    /// Handle to a node stored in a [`SceneGraph`](super::SceneGraph)
    pub struct NodeId;
}

/// Cached world transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformCache {
    /// Must be recomputed before use
    Dirty,
    /// Valid world transform
    Clean(Mat4),
}

impl TransformCache {
    /// True when a recompute is required
    pub fn is_dirty(&self) -> bool {
        matches!(self, TransformCache::Dirty)
    }
}

/// A node in the scene hierarchy
#[derive(Debug)]
pub struct SceneNode {
    /// Optional label used in logs
    pub(super) name: Option<String>,

    // Hierarchy
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,

    // Local transform relative to the parent
    pub(super) local: EulerTransform,

    // Cached world transform
    world: Cell<TransformCache>,

    // Content: grouping nodes carry no model
    pub(super) model: Option<Arc<Model>>,

    // Frame marker for the frustum-gated render path
    was_rendered: Cell<bool>,
}

impl SceneNode {
    /// Creates a detached node with an identity local transform
    pub(super) fn new(name: Option<String>, model: Option<Arc<Model>>) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            local: EulerTransform::identity(),
            world: Cell::new(TransformCache::Dirty),
            model,
            was_rendered: Cell::new(false),
        }
    }

    /// Label given at creation, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Owning parent, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in draw order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local position
    pub fn position(&self) -> Vec3 {
        self.local.position
    }

    /// Local Euler rotation in radians
    pub fn rotation(&self) -> Vec3 {
        self.local.rotation
    }

    /// Local scale
    pub fn scale(&self) -> Vec3 {
        self.local.scale
    }

    /// Position, rotation and scale together
    pub fn local(&self) -> &EulerTransform {
        &self.local
    }

    /// `Translation * (Roll * Pitch * Yaw) * Scaling`
    pub fn local_transform(&self) -> Mat4 {
        self.local.to_matrix()
    }

    /// Attached model, `None` for grouping nodes
    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    /// True if this node carries no model
    pub fn is_empty(&self) -> bool {
        self.model.is_none()
    }

    /// True if the cached world transform must be recomputed before use
    pub fn is_dirty(&self) -> bool {
        self.world.get().is_dirty()
    }

    /// Current cache state
    pub fn transform_cache(&self) -> TransformCache {
        self.world.get()
    }

    pub(super) fn mark_dirty(&self) {
        self.world.set(TransformCache::Dirty);
        debug_assert!(self.is_dirty());
    }

    pub(super) fn store_world(&self, world: Mat4) {
        self.world.set(TransformCache::Clean(world));
        debug_assert!(!self.is_dirty());
    }

    /// True if the node was drawn by the frustum-gated path this frame
    pub fn was_rendered(&self) -> bool {
        self.was_rendered.get()
    }

    pub(super) fn set_rendered(&self, rendered: bool) {
        self.was_rendered.set(rendered);
    }
}

impl fmt::Display for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name().unwrap_or("<unnamed>");
        match &self.model {
            Some(model) => write!(f, "{}: {}", name, model),
            None => write!(f, "{}: empty", name),
        }
    }
}
