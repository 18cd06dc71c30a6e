//! Vertex types and render attributes for 3D rendering

use bytemuck::{Pod, Zeroable};

/// Clip-space vertex with pre-lit color; all transform and lighting work
/// happens CPU-side before upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(position: [f32; 4], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Opaque render attributes shared read-only between bodies. The simulation
/// never looks inside; only the renderer resolves it.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub color: [f32; 4],
    /// Emissive surfaces skip the lambert term (laser walls, the relic glow)
    pub emissive: bool,
}

impl Material {
    pub const fn new(color: [f32; 4]) -> Self {
        Self {
            color,
            emissive: false,
        }
    }

    pub const fn emissive(color: [f32; 4]) -> Self {
        Self {
            color,
            emissive: true,
        }
    }
}

/// Colors for scene elements
pub mod palette {
    pub const PLAYER: [f32; 4] = [0.35, 0.75, 1.0, 1.0];
    pub const SENTRY: [f32; 4] = [0.85, 0.3, 0.25, 1.0];
    pub const WALL: [f32; 4] = [1.0, 0.25, 0.35, 0.85];
    pub const RELIC: [f32; 4] = [1.0, 0.85, 0.3, 1.0];
    pub const FLOOR: [f32; 4] = [0.16, 0.17, 0.22, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];
}
