//! View frustum and plane types for visibility culling

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::physics::collision::{Aabb, BoundingSphere};

/// Plane defined by normal and distance from origin
///
/// The normal faces out of the bounded region: points with a positive signed
/// distance are outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    ///
    /// The normal is normalized and the distance rescaled to match, so the
    /// plane keeps describing the same set of points.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.magnitude();
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Plane through `point` whose outer side is the one `normal` points to
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: -normal.dot(&point),
        }
    }

    /// Plane from the `(a, b, c, d)` coefficients of `a*x + b*y + c*z + d = 0`
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        Self::new(coefficients.xyz(), coefficients.w)
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// True unless the sphere lies entirely on the outer side
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.distance_to_point(sphere.center) <= sphere.radius
    }
}

/// Frustum for visibility culling
///
/// An ordered set of outward-facing half-spaces bounding the visible region.
/// An empty plane set culls nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frustum {
    /// Planes bounding the visible region
    pub planes: Vec<Plane>,
}

impl Frustum {
    /// Create a frustum from a list of planes
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for clip volumes with `-w <= x, y <= w` and
    /// `0 <= z <= w`. The extracted rows face inward, so they are negated.
    /// Planes come out as left, right, bottom, top, near, far.
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { vp_matrix.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2]
            .into_iter()
            .map(|inward| Plane::from_coefficients(-inward))
            .collect();

        Self { planes }
    }

    /// Axis-aligned box volume (six planes facing outward)
    pub fn from_aabb(bounds: &Aabb) -> Self {
        let planes = vec![
            Plane::from_point_normal(bounds.min, -Vec3::x()),
            Plane::from_point_normal(bounds.max, Vec3::x()),
            Plane::from_point_normal(bounds.min, -Vec3::y()),
            Plane::from_point_normal(bounds.max, Vec3::y()),
            Plane::from_point_normal(bounds.min, -Vec3::z()),
            Plane::from_point_normal(bounds.max, Vec3::z()),
        ];
        Self { planes }
    }

    /// Check if a sphere is inside or intersects the frustum
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes.iter().all(|plane| plane.intersects_sphere(sphere))
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        // For each plane, check if the AABB is completely outside
        for plane in &self.planes {
            // Corner furthest against the plane normal
            let mut p = aabb.max;
            if plane.normal.x >= 0.0 {
                p.x = aabb.min.x;
            }
            if plane.normal.y >= 0.0 {
                p.y = aabb.min.y;
            }
            if plane.normal.z >= 0.0 {
                p.z = aabb.min.z;
            }

            // If even that corner is outside, the entire AABB is outside
            if plane.distance_to_point(p) > 0.0 {
                return false;
            }
        }

        true
    }
}
