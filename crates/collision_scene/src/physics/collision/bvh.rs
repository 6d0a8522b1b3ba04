//! Bounding volume hierarchy over a mesh's triangles
//!
//! Binary tree of axis-aligned boxes. Branch nodes split their triangles at
//! the centroid median along the longest box axis. Leaves hold indices into
//! the triangle slice the tree was built from, so every query takes that same
//! slice. All coordinates are in the mesh's model space.

use crate::config::BvhConfig;
use crate::render::RenderBackend;
use super::primitives::{Aabb, BoundingSphere, Triangle};

/// Single node in the BVH
#[derive(Debug, Clone)]
pub struct BvhNode {
    /// Model-space bounds of every triangle below this node
    pub bounds: Aabb,

    /// Indices of the triangles bounded by this leaf (empty for branches)
    pub indices: Vec<usize>,

    /// Child nodes, None if this is a leaf
    pub children: Option<Box<[BvhNode; 2]>>,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl BvhNode {
    /// Build a hierarchy over `triangles`
    ///
    /// An empty triangle list produces a single empty leaf with a degenerate
    /// box at the origin.
    pub fn build(triangles: &[Triangle], config: &BvhConfig) -> Self {
        let root = Self::build_node(triangles, (0..triangles.len()).collect(), 0, config);
        log::debug!(
            "Built BVH: {} nodes, {} leaves, depth {}",
            root.node_count(),
            root.leaf_count(),
            root.height()
        );
        root
    }

    fn build_node(
        triangles: &[Triangle],
        mut indices: Vec<usize>,
        depth: u32,
        config: &BvhConfig,
    ) -> Self {
        let bounds = Aabb::from_points(indices.iter().flat_map(|&i| triangles[i].vertices()))
            .unwrap_or_default();

        let should_split = indices.len() > config.max_triangles_per_leaf.max(1)
            && depth < config.max_depth;
        if !should_split {
            return Self {
                bounds,
                indices,
                children: None,
                depth,
            };
        }

        let axis = bounds.longest_axis();
        indices.sort_by(|&a, &b| {
            triangles[a].centroid()[axis].total_cmp(&triangles[b].centroid()[axis])
        });
        let right = indices.split_off(indices.len() / 2);

        let left_node = Self::build_node(triangles, indices, depth + 1, config);
        let right_node = Self::build_node(triangles, right, depth + 1, config);

        Self {
            bounds,
            indices: Vec::new(),
            children: Some(Box::new([left_node, right_node])),
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Child nodes as a slice (empty for leaves)
    pub fn child_nodes(&self) -> &[BvhNode] {
        match &self.children {
            Some(children) => &children[..],
            None => &[],
        }
    }

    /// Depth-first pre-order walk. Returning `false` from `visitor` skips
    /// that node's children.
    pub fn visit<F>(&self, visitor: &mut F)
    where
        F: FnMut(&BvhNode) -> bool,
    {
        if visitor(self) {
            for child in self.child_nodes() {
                child.visit(visitor);
            }
        }
    }

    /// Pruned query: descends only into nodes whose bounds pass `accept_bounds`
    /// and reports every triangle of the reached leaves that passes
    /// `accept_triangle`. `triangles` must be the slice the tree was built from.
    pub fn query<'a, B, T>(
        &self,
        triangles: &'a [Triangle],
        accept_bounds: &mut B,
        accept_triangle: &mut T,
    ) -> Vec<&'a Triangle>
    where
        B: FnMut(&Aabb) -> bool,
        T: FnMut(&Triangle) -> bool,
    {
        let mut hits = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if !accept_bounds(&node.bounds) {
                continue;
            }
            if node.is_leaf() {
                hits.extend(
                    node.indices
                        .iter()
                        .map(|&i| &triangles[i])
                        .filter(|tri| accept_triangle(tri)),
                );
            } else {
                // Push right first so the left subtree is reported first
                stack.extend(node.child_nodes().iter().rev());
            }
        }
        hits
    }

    /// Model-space triangles touching `sphere`
    pub fn triangles_in_sphere<'a>(
        &self,
        triangles: &'a [Triangle],
        sphere: &BoundingSphere,
    ) -> Vec<&'a Triangle> {
        self.query(
            triangles,
            &mut |bounds| bounds.intersects_sphere(sphere),
            &mut |tri| sphere.intersects_triangle(tri),
        )
    }

    /// Model-space triangles touching `aabb`
    pub fn triangles_in_aabb<'a>(
        &self,
        triangles: &'a [Triangle],
        aabb: &Aabb,
    ) -> Vec<&'a Triangle> {
        self.query(
            triangles,
            &mut |bounds| bounds.intersects(aabb),
            &mut |tri| tri.intersects_aabb(aabb),
        )
    }

    /// True if any triangle of this hierarchy intersects any triangle of
    /// `other`; both hierarchies must be expressed in the same space.
    /// `mine` and `theirs` are the slices each tree was built from.
    pub fn intersects(&self, mine: &[Triangle], other: &BvhNode, theirs: &[Triangle]) -> bool {
        if !self.bounds.intersects(&other.bounds) {
            return false;
        }

        match (self.is_leaf(), other.is_leaf()) {
            (true, true) => self.indices.iter().map(|&i| &mine[i]).any(|a| {
                a.intersects_aabb(&other.bounds)
                    && other.indices.iter().any(|&j| a.intersects_triangle(&theirs[j]))
            }),
            (false, true) => self
                .child_nodes()
                .iter()
                .any(|child| child.intersects(mine, other, theirs)),
            (true, false) => other
                .child_nodes()
                .iter()
                .any(|child| self.intersects(mine, child, theirs)),
            (false, false) => self.child_nodes().iter().any(|left| {
                other
                    .child_nodes()
                    .iter()
                    .any(|right| left.intersects(mine, right, theirs))
            }),
        }
    }

    /// Draw the box of every node through the backend
    pub fn render_bounds(&self, backend: &mut dyn RenderBackend) {
        self.visit(&mut |node| {
            backend.draw_box(&node.bounds);
            true
        });
    }

    /// Number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self.child_nodes().iter().map(BvhNode::node_count).sum::<usize>()
    }

    /// Number of leaves in this subtree
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.child_nodes().iter().map(BvhNode::leaf_count).sum()
        }
    }

    /// Number of triangle indices held by the leaves of this subtree
    pub fn triangle_count(&self) -> usize {
        self.indices.len() + self.child_nodes().iter().map(BvhNode::triangle_count).sum::<usize>()
    }

    /// Number of levels in this subtree (a lone leaf has height 1)
    pub fn height(&self) -> u32 {
        1 + self.child_nodes().iter().map(BvhNode::height).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    /// Strip of `count` unit right triangles laid along +X
    fn strip(count: usize) -> Vec<Triangle> {
        (0..count)
            .map(|i| {
                let x = i as f32 * 2.0;
                Triangle::new(
                    Vec3::new(x, 0.0, 0.0),
                    Vec3::new(x + 1.0, 0.0, 0.0),
                    Vec3::new(x, 1.0, 0.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_small_mesh_is_single_leaf() {
        let bvh = BvhNode::build(&strip(3), &BvhConfig::default());
        assert!(bvh.is_leaf());
        assert_eq!(bvh.triangle_count(), 3);
        assert_eq!(bvh.height(), 1);
    }

    #[test]
    fn test_empty_mesh() {
        let bvh = BvhNode::build(&[], &BvhConfig::default());
        assert!(bvh.is_leaf());
        assert_eq!(bvh.triangle_count(), 0);
        assert_eq!(bvh.bounds, Aabb::default());
        assert!(bvh.triangles_in_sphere(&[], &BoundingSphere::new(Vec3::zeros(), 10.0)).is_empty());
    }

    #[test]
    fn test_every_triangle_in_exactly_one_leaf() {
        let triangles = strip(37);
        let bvh = BvhNode::build(&triangles, &BvhConfig { max_triangles_per_leaf: 2, max_depth: 32 });

        let mut leaf_indices = Vec::new();
        bvh.visit(&mut |node| {
            if node.is_leaf() {
                assert!(node.indices.len() <= 2);
                for &i in &node.indices {
                    assert!(node.bounds.contains_aabb(&Aabb::from_triangles(&triangles[i..=i]).unwrap()));
                }
                leaf_indices.extend(node.indices.iter().copied());
            } else {
                assert!(node.indices.is_empty());
            }
            true
        });

        leaf_indices.sort_unstable();
        assert_eq!(leaf_indices, (0..triangles.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_children_are_inside_parent_bounds() {
        let bvh = BvhNode::build(&strip(20), &BvhConfig { max_triangles_per_leaf: 1, max_depth: 32 });
        bvh.visit(&mut |node| {
            for child in node.child_nodes() {
                assert!(node.bounds.contains_aabb(&child.bounds));
                assert_eq!(child.depth, node.depth + 1);
            }
            true
        });
        assert_eq!(bvh.leaf_count(), 20);
        assert_eq!(bvh.node_count(), 39);
    }

    #[test]
    fn test_max_depth_limits_height() {
        let bvh = BvhNode::build(&strip(64), &BvhConfig { max_triangles_per_leaf: 1, max_depth: 2 });
        assert_eq!(bvh.height(), 3);
        assert_eq!(bvh.leaf_count(), 4);
        assert_eq!(bvh.triangle_count(), 64);
    }

    #[test]
    fn test_sphere_query_matches_brute_force() {
        let triangles = strip(50);
        let bvh = BvhNode::build(&triangles, &BvhConfig { max_triangles_per_leaf: 3, max_depth: 32 });
        let sphere = BoundingSphere::new(Vec3::new(31.0, 0.5, 0.2), 4.0);

        let mut from_bvh: Vec<Triangle> = bvh.triangles_in_sphere(&triangles, &sphere).into_iter().copied().collect();
        let mut brute: Vec<Triangle> = triangles.iter().copied().filter(|t| sphere.intersects_triangle(t)).collect();

        let key = |t: &Triangle| t.v0.x;
        from_bvh.sort_by(|a, b| key(a).total_cmp(&key(b)));
        brute.sort_by(|a, b| key(a).total_cmp(&key(b)));

        assert!(!brute.is_empty());
        assert_eq!(from_bvh, brute);
    }

    #[test]
    fn test_query_prunes_missed_subtrees() {
        let triangles = strip(32);
        let bvh = BvhNode::build(&triangles, &BvhConfig { max_triangles_per_leaf: 1, max_depth: 32 });
        let sphere = BoundingSphere::new(Vec3::new(0.2, 0.2, 0.0), 0.1);

        let mut boxes_tested = 0;
        let hits = bvh.query(
            &triangles,
            &mut |bounds| {
                boxes_tested += 1;
                bounds.intersects_sphere(&sphere)
            },
            &mut |tri| sphere.intersects_triangle(tri),
        );

        assert_eq!(hits.len(), 1);
        assert!(boxes_tested < bvh.node_count());
    }

    #[test]
    fn test_aabb_query() {
        let triangles = strip(10);
        let bvh = BvhNode::build(&triangles, &BvhConfig { max_triangles_per_leaf: 2, max_depth: 32 });
        let hits = bvh.triangles_in_aabb(&triangles, &Aabb::new(Vec3::new(3.9, -1.0, -1.0), Vec3::new(6.1, 0.1, 1.0)));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_bvh_bvh_intersection() {
        let config = BvhConfig { max_triangles_per_leaf: 2, max_depth: 32 };
        let base = strip(10);
        let a = BvhNode::build(&base, &config);

        let crossing = [Triangle::new(
            Vec3::new(10.2, 0.2, -1.0),
            Vec3::new(10.2, 0.2, 1.0),
            Vec3::new(10.3, -0.5, 0.0),
        )];
        let b = BvhNode::build(&crossing, &config);
        assert!(a.intersects(&base, &b, &crossing));
        assert!(b.intersects(&crossing, &a, &base));

        let above: Vec<Triangle> = base
            .iter()
            .map(|t| Triangle::new(t.v0 + Vec3::z(), t.v1 + Vec3::z(), t.v2 + Vec3::z()))
            .collect();
        let c = BvhNode::build(&above, &config);
        assert!(!a.intersects(&base, &c, &above));
    }
}
