//! Headless backend that records draw commands
//!
//! Keeps a real transform stack and stamps every draw with the transform
//! active at the time of the call. Used for testing traversal order and
//! transform nesting, and by tools that want draw statistics without a GPU.

use log::warn;

use crate::foundation::math::Mat4;
use crate::physics::collision::{Aabb, BoundingSphere, Triangle};
use super::backend::RenderBackend;

/// Draw primitives recorded by [`CommandRecorder`]
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Triangle mesh
    Triangles {
        /// Transform active when the mesh was drawn
        transform: Mat4,
        /// Number of triangles drawn
        count: usize,
    },

    /// Wireframe box
    Box {
        /// Transform active when the box was drawn
        transform: Mat4,
        /// Box in the space of `transform`
        bounds: Aabb,
    },

    /// Wireframe sphere
    Sphere {
        /// Transform active when the sphere was drawn
        transform: Mat4,
        /// Sphere in the space of `transform`
        sphere: BoundingSphere,
    },
}

impl DrawCommand {
    /// Transform that was active for this command
    pub fn transform(&self) -> &Mat4 {
        match self {
            DrawCommand::Triangles { transform, .. }
            | DrawCommand::Box { transform, .. }
            | DrawCommand::Sphere { transform, .. } => transform,
        }
    }
}

/// Recording render backend
#[derive(Debug, Clone)]
pub struct CommandRecorder {
    /// Saved transforms
    stack: Vec<Mat4>,

    /// Active transform
    current: Mat4,

    /// Commands in submission order
    commands: Vec<DrawCommand>,

    /// Deepest stack depth reached since the last clear
    max_depth: usize,
}

impl CommandRecorder {
    /// Create a recorder whose base transform is the identity
    pub fn new() -> Self {
        Self::with_base_transform(Mat4::identity())
    }

    /// Create a recorder starting from `base` (typically a view-projection matrix)
    pub fn with_base_transform(base: Mat4) -> Self {
        Self {
            stack: Vec::new(),
            current: base,
            commands: Vec::new(),
            max_depth: 0,
        }
    }

    /// Active transform
    pub fn current_transform(&self) -> &Mat4 {
        &self.current
    }

    /// Number of saved transforms
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Deepest stack depth reached since the last clear
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Commands in submission order
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of triangle-mesh draws
    pub fn mesh_draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCommand::Triangles { .. }))
            .count()
    }

    /// Total triangles submitted across every mesh draw
    pub fn triangle_total(&self) -> usize {
        self.commands
            .iter()
            .map(|cmd| match cmd {
                DrawCommand::Triangles { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }

    /// Drop recorded commands, keeping the transform state
    pub fn clear(&mut self) {
        self.commands.clear();
        self.max_depth = self.stack.len();
    }
}

impl Default for CommandRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for CommandRecorder {
    fn push_transform(&mut self) {
        self.stack.push(self.current);
        self.max_depth = self.max_depth.max(self.stack.len());
    }

    fn multiply_transform(&mut self, matrix: &Mat4) {
        self.current *= matrix;
    }

    fn pop_transform(&mut self) {
        match self.stack.pop() {
            Some(previous) => self.current = previous,
            None => warn!("pop_transform called with an empty transform stack"),
        }
    }

    fn draw_triangles(&mut self, triangles: &[Triangle]) {
        self.commands.push(DrawCommand::Triangles {
            transform: self.current,
            count: triangles.len(),
        });
    }

    fn draw_box(&mut self, bounds: &Aabb) {
        self.commands.push(DrawCommand::Box {
            transform: self.current,
            bounds: *bounds,
        });
    }

    fn draw_sphere(&mut self, sphere: &BoundingSphere) {
        self.commands.push(DrawCommand::Sphere {
            transform: self.current,
            sphere: *sphere,
        });
    }
}
