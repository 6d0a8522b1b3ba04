//! Arena-backed scene graph
//!
//! Nodes are stored in a `SlotMap` and refer to their parent and children by
//! [`NodeId`]. Stale ids are detected by the slot map's generation counter:
//! indexing with one panics, fallible operations return
//! [`SceneError::NodeNotFound`].
//!
//! World transforms are cached per node and recomputed lazily. Structural
//! edits and transform setters only invalidate; the next
//! [`SceneGraph::world_transform`] read pays for the recompute.

use std::ops::Index;
use std::sync::Arc;

use log::{debug, trace};
use slotmap::SlotMap;

use crate::assets::Model;
use crate::config::CullingConfig;
use crate::foundation::math::{EulerTransform, Mat4, Vec3};
use crate::physics::collision::{Aabb, BoundingSphere, BvhNode, Triangle};

use super::node::{NodeId, SceneNode, TransformCache};

/// Scene graph errors
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The node carries no model, so it has no bounding volumes or mesh
    #[error("Node {0:?} has no model")]
    MissingModel(NodeId),

    /// The id does not refer to a live node
    #[error("Node {0:?} not found")]
    NodeNotFound(NodeId),

    /// The node already has a parent
    #[error("Node {0:?} is already attached to a parent")]
    AlreadyAttached(NodeId),

    /// Attaching would make a node its own ancestor
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// Requested parent
        parent: NodeId,
        /// Requested child
        child: NodeId,
    },
}

/// Result type for scene graph operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Hierarchy of transformable nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    pub(super) nodes: SlotMap<NodeId, SceneNode>,
    pub(super) culling: CullingConfig,
}

impl SceneGraph {
    /// Create an empty scene with default culling settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scene with the given culling settings
    pub fn with_config(culling: CullingConfig) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            culling,
        }
    }

    /// Active culling settings
    pub fn culling_config(&self) -> &CullingConfig {
        &self.culling
    }

    /// Replace the culling settings
    pub fn set_culling_config(&mut self, culling: CullingConfig) {
        self.culling = culling;
    }

    // ------------------------------------------------------------------
    // Tree structure
    // ------------------------------------------------------------------

    /// Create a detached root node
    pub fn create_node(&mut self, model: Option<Arc<Model>>) -> NodeId {
        let id = self.nodes.insert(SceneNode::new(None, model));
        trace!("Created node {:?}", id);
        id
    }

    /// Create a detached root node with a diagnostic label
    pub fn create_named_node(&mut self, name: impl Into<String>, model: Option<Arc<Model>>) -> NodeId {
        let name = name.into();
        trace!("Created node '{}'", name);
        self.nodes.insert(SceneNode::new(Some(name), model))
    }

    /// Attach a detached `child` as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.node(parent)?;
        if self.node(child)?.parent.is_some() {
            return Err(SceneError::AlreadyAttached(child));
        }

        // `child` must not be `parent` or one of its ancestors
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(SceneError::CycleDetected { parent, child });
            }
            cursor = self.nodes[current].parent;
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        self.mark_dirty(child);

        debug!("Attached {:?} under {:?}", child, parent);
        Ok(())
    }

    /// Remove the parent edge; the node becomes a root
    pub fn detach(&mut self, id: NodeId) -> SceneResult<()> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };

        self.nodes[parent].children.retain(|&child| child != id);
        self.nodes[id].parent = None;
        self.mark_dirty(id);

        debug!("Detached {:?} from {:?}", id, parent);
        Ok(())
    }

    /// Drop a node and its whole subtree, returning how many nodes were removed
    pub fn remove(&mut self, id: NodeId) -> SceneResult<usize> {
        self.detach(id)?;

        let doomed = self.subtree(id);
        for node in &doomed {
            self.nodes.remove(*node);
        }

        debug!("Removed {} nodes rooted at {:?}", doomed.len(), id);
        Ok(doomed.len())
    }

    /// Nodes without a parent
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Children of `id` in draw order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self[id].children
    }

    /// Parent of `id`, `None` for roots
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    /// Every node below `id`, depth-first pre-order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut nodes = self.subtree(id);
        nodes.remove(0);
        nodes
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node lookup that tolerates stale ids
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// All live nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter()
    }

    /// `id` followed by its descendants, depth-first pre-order
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.nodes[current].children.iter().rev());
        }
        order
    }

    pub(super) fn node(&self, id: NodeId) -> SceneResult<&SceneNode> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut SceneNode> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    // ------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------

    /// Local position of `id`
    pub fn position(&self, id: NodeId) -> Vec3 {
        self[id].position()
    }

    /// Local Euler rotation of `id` in radians
    pub fn rotation(&self, id: NodeId) -> Vec3 {
        self[id].rotation()
    }

    /// Local scale of `id`
    pub fn scale(&self, id: NodeId) -> Vec3 {
        self[id].scale()
    }

    /// Set the local position and invalidate the subtree
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> SceneResult<()> {
        self.node_mut(id)?.local.position = position;
        self.mark_dirty(id);
        Ok(())
    }

    /// Set the local Euler rotation (radians) and invalidate the subtree
    pub fn set_rotation(&mut self, id: NodeId, rotation: Vec3) -> SceneResult<()> {
        self.node_mut(id)?.local.rotation = rotation;
        self.mark_dirty(id);
        Ok(())
    }

    /// Set the local scale and invalidate the subtree
    pub fn set_scale(&mut self, id: NodeId, scale: Vec3) -> SceneResult<()> {
        self.node_mut(id)?.local.scale = scale;
        self.mark_dirty(id);
        Ok(())
    }

    /// Replace position, rotation and scale at once
    pub fn set_local_transform(&mut self, id: NodeId, local: EulerTransform) -> SceneResult<()> {
        self.node_mut(id)?.local = local;
        self.mark_dirty(id);
        Ok(())
    }

    /// Local transform of `id`
    pub fn local_transform(&self, id: NodeId) -> Mat4 {
        self[id].local_transform()
    }

    /// True if the cached world transform of `id` is stale
    pub fn is_dirty(&self, id: NodeId) -> bool {
        self[id].is_dirty()
    }

    /// World transform of `id`, recomputed only if the cache is stale
    ///
    /// The parent's value comes from its own lazy getter, so a chain of
    /// dirty ancestors is recomputed once each, top-down.
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let node = &self[id];
        if let TransformCache::Clean(world) = node.transform_cache() {
            return world;
        }

        let local = node.local_transform();
        let world = match node.parent {
            Some(parent) => self.world_transform(parent) * local,
            None => local,
        };

        trace!("Recomputed world transform for {:?}", id);
        node.store_world(world);
        world
    }

    /// Invalidate `id` and everything below it
    fn mark_dirty(&self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            // Nothing below a dirty node can be clean
            if node.is_dirty() && current != id {
                continue;
            }
            node.mark_dirty();
            stack.extend(node.children.iter().copied());
        }
    }

    // ------------------------------------------------------------------
    // Bounding volumes
    // ------------------------------------------------------------------

    pub(super) fn model_of(&self, id: NodeId) -> SceneResult<&Arc<Model>> {
        self.node(id)?.model.as_ref().ok_or(SceneError::MissingModel(id))
    }

    /// Attached model
    pub fn model(&self, id: NodeId) -> SceneResult<&Arc<Model>> {
        self.model_of(id)
    }

    /// Model-space bounding box
    pub fn bounding_box(&self, id: NodeId) -> SceneResult<&Aabb> {
        Ok(self.model_of(id)?.bounding_box())
    }

    /// Model-space bounding sphere
    pub fn bounding_sphere(&self, id: NodeId) -> SceneResult<&BoundingSphere> {
        Ok(self.model_of(id)?.bounding_sphere())
    }

    /// Model-space triangles
    pub fn mesh(&self, id: NodeId) -> SceneResult<&[Triangle]> {
        Ok(self.model_of(id)?.triangles())
    }

    /// Root of the model's BVH
    pub fn bvh_root(&self, id: NodeId) -> SceneResult<&BvhNode> {
        Ok(self.model_of(id)?.bvh_root())
    }

    /// Number of triangles in the model
    pub fn triangle_count(&self, id: NodeId) -> SceneResult<usize> {
        Ok(self.model_of(id)?.triangle_count())
    }

    /// Model box with its corners moved to world space, re-boxed
    pub fn world_bounding_box(&self, id: NodeId) -> SceneResult<Aabb> {
        let model = self.model_of(id)?;
        Ok(model.bounding_box().transformed(&self.world_transform(id)))
    }

    /// World-space triangles of `id` touching a world-space sphere
    ///
    /// BVH boxes are moved to world space as the hierarchy is walked and
    /// subtrees whose box misses the sphere are skipped.
    pub fn triangles_in_sphere(&self, id: NodeId, sphere: &BoundingSphere) -> SceneResult<Vec<Triangle>> {
        let model = self.model_of(id)?;
        let world = self.world_transform(id);

        let hits = model.bvh_root().query(
            model.triangles(),
            &mut |bounds| bounds.transformed(&world).intersects_sphere(sphere),
            &mut |tri| sphere.intersects_triangle(&tri.transformed(&world)),
        );

        Ok(hits.into_iter().map(|tri| tri.transformed(&world)).collect())
    }

    /// Broad phase: true if the world bounding spheres of `a` and `b` overlap
    pub fn nodes_overlapping(&self, a: NodeId, b: NodeId) -> SceneResult<bool> {
        let first = self.world_bounding_sphere(a)?;
        let second = self.world_bounding_sphere(b)?;
        Ok(first.intersects(&second))
    }
}

impl Index<NodeId> for SceneGraph {
    type Output = SceneNode;

    fn index(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(graph: &mut SceneGraph) -> (NodeId, NodeId, NodeId) {
        let root = graph.create_named_node("root", None);
        let middle = graph.create_named_node("middle", None);
        let leaf = graph.create_named_node("leaf", None);
        graph.add_child(root, middle).unwrap();
        graph.add_child(middle, leaf).unwrap();
        (root, middle, leaf)
    }

    #[test]
    fn test_create_node_is_detached_root() {
        let mut graph = SceneGraph::new();
        let id = graph.create_node(None);

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.parent(id), None);
        assert!(graph.children(id).is_empty());
        assert_eq!(graph.roots(), vec![id]);
        assert!(graph.is_dirty(id));
        assert_eq!(graph.scale(id), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_add_child_links_both_sides() {
        let mut graph = SceneGraph::new();
        let (root, middle, leaf) = chain(&mut graph);

        assert_eq!(graph.children(root), &[middle]);
        assert_eq!(graph.parent(leaf), Some(middle));
        assert_eq!(graph.roots(), vec![root]);
        assert_eq!(graph.descendants(root), vec![middle, leaf]);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node(None);
        let kids: Vec<_> = (0..4).map(|_| graph.create_node(None)).collect();
        for &kid in &kids {
            graph.add_child(root, kid).unwrap();
        }
        assert_eq!(graph.children(root), kids.as_slice());
    }

    #[test]
    fn test_add_child_rejects_second_parent() {
        let mut graph = SceneGraph::new();
        let (root, _, leaf) = chain(&mut graph);
        assert_eq!(graph.add_child(root, leaf), Err(SceneError::AlreadyAttached(leaf)));
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let (root, _, leaf) = chain(&mut graph);

        assert_eq!(
            graph.add_child(leaf, root),
            Err(SceneError::CycleDetected { parent: leaf, child: root })
        );
        assert_eq!(
            graph.add_child(root, root),
            Err(SceneError::CycleDetected { parent: root, child: root })
        );
    }

    #[test]
    fn test_detach_makes_root() {
        let mut graph = SceneGraph::new();
        let (root, middle, leaf) = chain(&mut graph);
        graph.world_transform(leaf);

        graph.detach(middle).unwrap();

        assert!(graph.children(root).is_empty());
        assert_eq!(graph.parent(middle), None);
        assert!(graph.is_dirty(middle));
        assert!(graph.is_dirty(leaf));
        assert_eq!(graph.roots().len(), 2);
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut graph = SceneGraph::new();
        let (root, middle, leaf) = chain(&mut graph);
        let sibling = graph.create_node(None);
        graph.add_child(root, sibling).unwrap();

        assert_eq!(graph.remove(middle), Ok(2));

        assert_eq!(graph.len(), 2);
        assert!(!graph.contains(middle));
        assert!(!graph.contains(leaf));
        assert_eq!(graph.children(root), &[sibling]);
        assert_eq!(graph.remove(middle), Err(SceneError::NodeNotFound(middle)));
    }

    #[test]
    fn test_stale_id_errors() {
        let mut graph = SceneGraph::new();
        let id = graph.create_node(None);
        graph.remove(id).unwrap();

        assert!(graph.get(id).is_none());
        assert_eq!(graph.set_position(id, Vec3::x()), Err(SceneError::NodeNotFound(id)));
        assert_eq!(graph.bounding_box(id).err(), Some(SceneError::NodeNotFound(id)));
    }

    #[test]
    #[should_panic]
    fn test_stale_id_index_panics() {
        let mut graph = SceneGraph::new();
        let id = graph.create_node(None);
        graph.remove(id).unwrap();
        let _ = &graph[id];
    }

    #[test]
    fn test_missing_model_accessors() {
        let mut graph = SceneGraph::new();
        let id = graph.create_node(None);

        assert_eq!(graph.bounding_box(id).err(), Some(SceneError::MissingModel(id)));
        assert_eq!(graph.bounding_sphere(id).err(), Some(SceneError::MissingModel(id)));
        assert_eq!(graph.mesh(id).err(), Some(SceneError::MissingModel(id)));
        assert!(graph.bvh_root(id).is_err());
        assert!(graph.triangle_count(id).is_err());
        assert!(graph.world_bounding_box(id).is_err());
    }

    #[test]
    fn test_display_node() {
        let mut graph = SceneGraph::new();
        let group = graph.create_named_node("group", None);
        let model = Arc::new(Model::cube(1.0, &crate::config::BvhConfig::default()));
        let cube = graph.create_named_node("cube", Some(model));

        assert_eq!(graph[group].to_string(), "group: empty");
        assert_eq!(graph[cube].to_string(), "cube: Triangle count: 12");
    }
}
