//! Backend abstraction for the rendering system
//!
//! The scene never talks to a graphics API directly. Models draw through a
//! `RenderBackend` using whatever transform is currently active, and scene
//! nodes set that transform with a strictly nested
//! push → multiply → draw → pop sequence.

use crate::foundation::math::Mat4;
use crate::physics::collision::{Aabb, BoundingSphere, Triangle};

/// Main rendering backend trait
///
/// Implementations keep a transform stack. `multiply_transform` post-multiplies
/// the active transform; `pop_transform` restores the value saved by the
/// matching `push_transform`.
pub trait RenderBackend {
    /// Save the active transform
    fn push_transform(&mut self);

    /// Post-multiply the active transform by `matrix`
    fn multiply_transform(&mut self, matrix: &Mat4);

    /// Restore the most recently saved transform
    fn pop_transform(&mut self);

    /// Draw a triangle mesh with the active transform
    fn draw_triangles(&mut self, triangles: &[Triangle]);

    /// Draw a wireframe box with the active transform
    fn draw_box(&mut self, bounds: &Aabb);

    /// Draw a wireframe sphere with the active transform
    fn draw_sphere(&mut self, sphere: &BoundingSphere);
}

/// Run `draw` with `matrix` applied on top of the active transform, restoring
/// the previous transform afterwards
pub fn with_transform<R>(
    backend: &mut dyn RenderBackend,
    matrix: &Mat4,
    draw: impl FnOnce(&mut dyn RenderBackend) -> R,
) -> R {
    backend.push_transform();
    backend.multiply_transform(matrix);
    let result = draw(&mut *backend);
    backend.pop_transform();
    result
}
