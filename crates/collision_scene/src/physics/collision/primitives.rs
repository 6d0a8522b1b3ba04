//! Primitive collision shapes and intersection algorithms
//!
//! Provides the basic bounding volumes (axis-aligned boxes, spheres) and
//! triangles with the overlap tests the BVH and scene queries are built from.

use crate::foundation::math::{utils, Mat4, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point, `None` for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self::new(first, first);
        for point in points {
            bounds.expand_to_include(point);
        }
        Some(bounds)
    }

    /// Smallest box containing every triangle vertex
    pub fn from_triangles(triangles: &[Triangle]) -> Option<Self> {
        Self::from_points(triangles.iter().flat_map(Triangle::vertices))
    }

    /// Grow the box so that it contains `point`
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Index (0 = x, 1 = y, 2 = z) of the longest side
    pub fn longest_axis(&self) -> usize {
        let size = self.max - self.min;
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Box around this box after an affine transform (corners re-boxed)
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = self.corners().map(|corner| utils::transform_point(matrix, &corner));
        let mut bounds = Aabb::new(corners[0], corners[0]);
        for corner in &corners[1..] {
            bounds.expand_to_include(*corner);
        }
        bounds
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if `other` lies entirely inside this box
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Closest point inside the box to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.sup(&self.min).inf(&self.max)
    }

    /// Check if this AABB intersects a sphere
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        let closest = self.closest_point(sphere.center);
        (closest - sphere.center).magnitude_squared() <= sphere.radius * sphere.radius
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere centred on the box centre reaching the farthest point
    pub fn around_points<I>(center: Vec3, points: I) -> Self
    where
        I: IntoIterator<Item = Vec3>,
    {
        let max_distance_sq = points
            .into_iter()
            .map(|point| (point - center).magnitude_squared())
            .fold(0.0f32, f32::max);
        Self::new(center, max_distance_sq.sqrt())
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Check if this sphere touches a triangle
    pub fn intersects_triangle(&self, triangle: &Triangle) -> bool {
        let closest = triangle.closest_point(self.center);
        (closest - self.center).magnitude_squared() <= self.radius * self.radius
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::new(Vec3::zeros(), 0.0)
    }
}

/// A triangle for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// The three vertices in winding order
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Calculates the normal of the triangle (right-hand rule)
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).normalize()
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Triangle with every vertex transformed by an affine matrix
    pub fn transformed(&self, matrix: &Mat4) -> Triangle {
        let [v0, v1, v2] = self.vertices().map(|v| utils::transform_point(matrix, &v));
        Triangle::new(v0, v1, v2)
    }

    /// Get the closest point on the triangle to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let v0_to_point = point - self.v0;

        let d1 = edge1.dot(&v0_to_point);
        let d2 = edge2.dot(&v0_to_point);

        // Vertex region outside v0
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.v0;
        }

        // Vertex region outside v1
        let v1_to_point = point - self.v1;
        let d3 = edge1.dot(&v1_to_point);
        let d4 = edge2.dot(&v1_to_point);
        if d3 >= 0.0 && d4 <= d3 {
            return self.v1;
        }

        // Edge region v0-v1
        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v_val = d1 / (d1 - d3);
            return self.v0 + edge1 * v_val;
        }

        // Vertex region outside v2
        let v2_to_point = point - self.v2;
        let d5 = edge1.dot(&v2_to_point);
        let d6 = edge2.dot(&v2_to_point);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        // Edge region v0-v2
        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.v0 + edge2 * w;
        }

        // Edge region v1-v2
        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * w;
        }

        // Inside the face
        let denom = 1.0 / (va + vb + vc);
        let v_val = vb * denom;
        let w = vc * denom;
        self.v0 + edge1 * v_val + edge2 * w
    }

    /// Test if this triangle intersects another triangle
    ///
    /// Separating Axis Theorem over 11 candidate axes: the two face normals
    /// and the 9 edge-edge cross products. Coplanar triangles have no usable
    /// edge-edge axes, so the in-plane edge normals of both are tested instead.
    pub fn intersects_triangle(&self, other: &Triangle) -> bool {
        const EPSILON: f32 = 0.000001;

        fn project_triangle(tri: &Triangle, axis: Vec3) -> (f32, f32) {
            let p0 = axis.dot(&tri.v0);
            let p1 = axis.dot(&tri.v1);
            let p2 = axis.dot(&tri.v2);
            (p0.min(p1).min(p2), p0.max(p1).max(p2))
        }

        // Returns false if `axis` separates the two triangles
        fn test_axis(tri1: &Triangle, tri2: &Triangle, axis: Vec3) -> bool {
            if axis.magnitude_squared() < EPSILON {
                return true; // Degenerate axis, skip
            }

            let (min1, max1) = project_triangle(tri1, axis);
            let (min2, max2) = project_triangle(tri2, axis);
            max1 >= min2 && max2 >= min1
        }

        let edges1 = [self.v1 - self.v0, self.v2 - self.v1, self.v0 - self.v2];
        let edges2 = [other.v1 - other.v0, other.v2 - other.v1, other.v0 - other.v2];

        let n1 = edges1[0].cross(&edges1[1]);
        let n2 = edges2[0].cross(&edges2[1]);
        if !test_axis(self, other, n1) || !test_axis(self, other, n2) {
            return false;
        }

        if n1.cross(&n2).magnitude_squared() < EPSILON {
            return edges1
                .iter()
                .chain(edges2.iter())
                .all(|edge| test_axis(self, other, n1.cross(edge)));
        }

        edges1
            .iter()
            .all(|e1| edges2.iter().all(|e2| test_axis(self, other, e1.cross(e2))))
    }

    /// Test if this triangle touches an AABB
    ///
    /// Separating Axis Theorem over the box face normals, the triangle normal
    /// and the 9 box-edge / triangle-edge cross products.
    pub fn intersects_aabb(&self, bounds: &Aabb) -> bool {
        let center = bounds.center();
        let extents = bounds.extents();
        let [a, b, c] = self.vertices().map(|v| v - center);

        let separated = |axis: Vec3| {
            if axis.magnitude_squared() < 1e-12 {
                return false;
            }
            let (pa, pb, pc) = (a.dot(&axis), b.dot(&axis), c.dot(&axis));
            let radius = extents.x * axis.x.abs() + extents.y * axis.y.abs() + extents.z * axis.z.abs();
            pa.min(pb).min(pc) > radius || pa.max(pb).max(pc) < -radius
        };

        let box_axes = [Vec3::x(), Vec3::y(), Vec3::z()];
        if box_axes.iter().any(|axis| separated(*axis)) {
            return false;
        }

        let edges = [b - a, c - b, a - c];
        if separated(edges[0].cross(&edges[1])) {
            return false;
        }

        !box_axes
            .iter()
            .any(|axis| edges.iter().any(|edge| separated(axis.cross(edge))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_aabb_contains_point() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        assert!(aabb.contains_point(Vec3::zeros()));
        assert!(aabb.contains_point(Vec3::new(0.5, 0.5, 0.5)));
        assert!(!aabb.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_intersects() {
        let aabb1 = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let aabb2 = Aabb::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let aabb3 = Aabb::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));

        assert!(aabb1.intersects(&aabb2));
        assert!(!aabb1.intersects(&aabb3));
    }

    #[test]
    fn test_aabb_from_points() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());

        let bounds = Aabb::from_points([
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-1.0, 3.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
        ])
        .unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 3.0, 4.0));
        assert_eq!(bounds.longest_axis(), 1);
    }

    #[test]
    fn test_aabb_transformed_under_rotation() {
        let aabb = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let rotated = aabb.transformed(&Mat4::rotation_z(std::f32::consts::FRAC_PI_2));

        assert_relative_eq!(rotated.min, Vec3::new(-2.0, -1.0, -3.0), epsilon = 1e-5);
        assert_relative_eq!(rotated.max, Vec3::new(2.0, 1.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_aabb_sphere_overlap() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        assert!(aabb.intersects_sphere(&BoundingSphere::new(Vec3::new(1.5, 0.5, 0.5), 0.6)));
        assert!(!aabb.intersects_sphere(&BoundingSphere::new(Vec3::new(2.0, 2.0, 2.0), 1.0)));
    }

    #[test]
    fn test_sphere_intersects() {
        let a = BoundingSphere::new(Vec3::zeros(), 1.0);
        let b = BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0);
        let c = BoundingSphere::new(Vec3::new(3.0, 0.0, 0.0), 0.5);

        assert!(a.intersects(&b)); // Touching counts
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_sphere_around_points() {
        let sphere = BoundingSphere::around_points(
            Vec3::zeros(),
            [Vec3::new(3.0, 4.0, 0.0), Vec3::new(1.0, 0.0, 0.0)],
        );
        assert_relative_eq!(sphere.radius, 5.0);
    }

    #[test]
    fn test_triangle_closest_point_regions() {
        let tri = unit_triangle();

        assert_relative_eq!(tri.closest_point(Vec3::new(-1.0, -1.0, 0.0)), tri.v0);
        assert_relative_eq!(tri.closest_point(Vec3::new(2.0, -0.5, 0.0)), tri.v1);
        assert_relative_eq!(tri.closest_point(Vec3::new(0.5, -1.0, 0.0)), Vec3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(tri.closest_point(Vec3::new(0.25, 0.25, 2.0)), Vec3::new(0.25, 0.25, 0.0));
        assert_relative_eq!(tri.closest_point(Vec3::new(1.0, 1.0, 0.0)), Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_sphere_triangle_overlap() {
        let tri = unit_triangle();
        assert!(BoundingSphere::new(Vec3::new(0.25, 0.25, 0.5), 0.6).intersects_triangle(&tri));
        assert!(!BoundingSphere::new(Vec3::new(0.25, 0.25, 0.5), 0.4).intersects_triangle(&tri));
    }

    #[test]
    fn test_triangle_triangle_sat() {
        let tri = unit_triangle();
        let crossing = Triangle::new(
            Vec3::new(0.2, 0.2, -1.0),
            Vec3::new(0.2, 0.2, 1.0),
            Vec3::new(0.3, -0.5, 0.0),
        );
        let far = Triangle::new(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(6.0, 5.0, 5.0),
            Vec3::new(5.0, 6.0, 5.0),
        );

        assert!(tri.intersects_triangle(&crossing));
        assert!(!tri.intersects_triangle(&far));
    }

    #[test]
    fn test_coplanar_triangles() {
        let tri = unit_triangle();
        // Same plane, past the hypotenuse
        let beside = Triangle::new(
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
        );
        let overlapping = Triangle::new(
            Vec3::new(0.2, 0.2, 0.0),
            Vec3::new(1.2, 0.2, 0.0),
            Vec3::new(0.2, 1.2, 0.0),
        );
        // Opposite winding, sharing only the v0 corner region
        let flipped = Triangle::new(
            Vec3::new(0.1, 0.1, 0.0),
            Vec3::new(-1.0, 0.1, 0.0),
            Vec3::new(0.1, -1.0, 0.0),
        );

        assert!(!tri.intersects_triangle(&beside));
        assert!(!beside.intersects_triangle(&tri));
        assert!(tri.intersects_triangle(&overlapping));
        assert!(tri.intersects_triangle(&flipped));
    }

    #[test]
    fn test_triangle_aabb_sat() {
        let tri = unit_triangle();
        assert!(tri.intersects_aabb(&Aabb::new(Vec3::new(0.1, 0.1, -0.1), Vec3::new(0.2, 0.2, 0.1))));
        assert!(!tri.intersects_aabb(&Aabb::new(Vec3::new(0.1, 0.1, 0.5), Vec3::new(0.2, 0.2, 0.6))));
        // Box near the hypotenuse but on the far side of it
        assert!(!tri.intersects_aabb(&Aabb::new(Vec3::new(0.8, 0.8, -0.1), Vec3::new(1.0, 1.0, 0.1))));
    }

    #[test]
    fn test_triangle_transformed() {
        let moved = unit_triangle().transformed(&Mat4::new_translation(&Vec3::new(0.0, 0.0, 2.0)));
        assert_relative_eq!(moved.v1, Vec3::new(1.0, 0.0, 2.0));
        assert_relative_eq!(moved.normal(), Vec3::new(0.0, 0.0, 1.0));
    }
}
