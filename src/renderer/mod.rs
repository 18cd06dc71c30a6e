//! WebGPU rendering module
//!
//! CPU-side transform and lighting into a single rebuilt vertex buffer per
//! frame; shapes double as the source of collider sample clouds.

pub mod camera;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use pipeline::{Placement, RenderState};
