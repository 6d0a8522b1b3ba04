//! Model assets
//!
//! Models are built from in-memory triangle data; reading model files is left
//! to the caller.

mod model;

pub use model::Model;
