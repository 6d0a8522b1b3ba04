//! Rendering contract used by models and scene traversal
//!
//! Only the transform-stack protocol and a handful of draw entry points live
//! here; actual rasterization belongs to whatever implements
//! [`RenderBackend`].

mod backend;
mod recorder;

pub use backend::{RenderBackend, with_transform};
pub use recorder::{CommandRecorder, DrawCommand};
