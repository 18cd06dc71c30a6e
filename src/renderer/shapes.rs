//! Shape tessellation for 3D primitives
//!
//! Each shape is built once in local unit space and shared behind `Rc`. A
//! shape carries two things: a triangle list for rendering, and boundary
//! sample clouds at two densities that collider profiles borrow for the
//! point-sampling overlap test. Denser clouds cost more per query and miss
//! fewer shallow overlaps.

use std::f32::consts::{PI, TAU};
use std::rc::Rc;

use glam::Vec3;

/// Mesh vertex in shape-local unit space.
#[derive(Debug, Clone, Copy)]
pub struct ShapeVertex {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Boundary sampling density for collision queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDensity {
    Coarse,
    Fine,
}

/// A renderable boundary descriptor: triangle list plus sample clouds.
pub struct Shape {
    pub vertices: Vec<ShapeVertex>,
    cloud_coarse: Rc<[Vec3]>,
    cloud_fine: Rc<[Vec3]>,
}

impl Shape {
    /// Shared handle to the boundary cloud at the requested density.
    pub fn sample_cloud(&self, density: SampleDensity) -> Rc<[Vec3]> {
        match density {
            SampleDensity::Coarse => self.cloud_coarse.clone(),
            SampleDensity::Fine => self.cloud_fine.clone(),
        }
    }
}

/// Unit sphere (radius 1) as a lat-long mesh.
pub fn unit_sphere(stacks: u32, slices: u32) -> Shape {
    let mut vertices = Vec::with_capacity((stacks * slices * 6) as usize);

    for stack in 0..stacks {
        let theta0 = PI * stack as f32 / stacks as f32;
        let theta1 = PI * (stack + 1) as f32 / stacks as f32;

        for slice in 0..slices {
            let phi0 = TAU * slice as f32 / slices as f32;
            let phi1 = TAU * (slice + 1) as f32 / slices as f32;

            let p00 = spherical(theta0, phi0);
            let p01 = spherical(theta0, phi1);
            let p10 = spherical(theta1, phi0);
            let p11 = spherical(theta1, phi1);

            // Degenerate quads at the poles collapse to single triangles
            if stack != 0 {
                vertices.push(sphere_vertex(p00));
                vertices.push(sphere_vertex(p10));
                vertices.push(sphere_vertex(p01));
            }
            if stack != stacks - 1 {
                vertices.push(sphere_vertex(p01));
                vertices.push(sphere_vertex(p10));
                vertices.push(sphere_vertex(p11));
            }
        }
    }

    Shape {
        vertices,
        cloud_coarse: sphere_cloud(6, 8),
        cloud_fine: sphere_cloud(12, 16),
    }
}

fn spherical(theta: f32, phi: f32) -> Vec3 {
    Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin())
}

fn sphere_vertex(p: Vec3) -> ShapeVertex {
    ShapeVertex {
        position: p,
        normal: p,
    }
}

/// Boundary points on the unit sphere: both poles plus lat-long rings.
fn sphere_cloud(stacks: u32, slices: u32) -> Rc<[Vec3]> {
    let mut points = Vec::with_capacity((stacks * slices) as usize + 2);
    points.push(Vec3::Y);
    for stack in 1..stacks {
        let theta = PI * stack as f32 / stacks as f32;
        for slice in 0..slices {
            points.push(spherical(theta, TAU * slice as f32 / slices as f32));
        }
    }
    points.push(-Vec3::Y);
    points.into()
}

/// Cube faces as (outward normal, in-face u axis, in-face v axis).
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

/// Unit cube spanning [-1, 1] on every axis.
pub fn unit_cube() -> Shape {
    let mut vertices = Vec::with_capacity(36);
    for (normal, u, v) in CUBE_FACES {
        let corner = |su: f32, sv: f32| ShapeVertex {
            position: normal + u * su + v * sv,
            normal,
        };
        // Two CCW triangles per face, seen from outside
        vertices.push(corner(-1.0, -1.0));
        vertices.push(corner(1.0, -1.0));
        vertices.push(corner(1.0, 1.0));
        vertices.push(corner(-1.0, -1.0));
        vertices.push(corner(1.0, 1.0));
        vertices.push(corner(-1.0, 1.0));
    }

    Shape {
        vertices,
        cloud_coarse: cube_cloud(6),
        cloud_fine: cube_cloud(12),
    }
}

/// Boundary points on the unit cube: a k-by-k grid on each face.
fn cube_cloud(k: u32) -> Rc<[Vec3]> {
    let mut points = Vec::with_capacity((6 * k * k) as usize);
    for (normal, u, v) in CUBE_FACES {
        for iu in 0..k {
            for iv in 0..k {
                let su = -1.0 + 2.0 * iu as f32 / (k - 1) as f32;
                let sv = -1.0 + 2.0 * iv as f32 / (k - 1) as f32;
                points.push(normal + u * su + v * sv);
            }
        }
    }
    points.into()
}

/// Unit cone: apex at +Y, unit-radius base disk at -Y.
pub fn unit_cone(segments: u32) -> Shape {
    let apex = Vec3::Y;
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for segment in 0..segments {
        let phi0 = TAU * segment as f32 / segments as f32;
        let phi1 = TAU * (segment + 1) as f32 / segments as f32;
        let rim0 = Vec3::new(phi0.cos(), -1.0, phi0.sin());
        let rim1 = Vec3::new(phi1.cos(), -1.0, phi1.sin());

        // Slant normal at the segment midpoint; unit cone slope is 1:2
        let mid = 0.5 * (phi0 + phi1);
        let slant = Vec3::new(2.0 * mid.cos(), 1.0, 2.0 * mid.sin()).normalize();

        vertices.push(ShapeVertex {
            position: apex,
            normal: slant,
        });
        vertices.push(ShapeVertex {
            position: rim1,
            normal: slant,
        });
        vertices.push(ShapeVertex {
            position: rim0,
            normal: slant,
        });

        // Base disk fan
        vertices.push(ShapeVertex {
            position: Vec3::NEG_Y,
            normal: Vec3::NEG_Y,
        });
        vertices.push(ShapeVertex {
            position: rim0,
            normal: Vec3::NEG_Y,
        });
        vertices.push(ShapeVertex {
            position: rim1,
            normal: Vec3::NEG_Y,
        });
    }

    Shape {
        vertices,
        cloud_coarse: cone_cloud(8),
        cloud_fine: cone_cloud(16),
    }
}

/// Boundary points on the unit cone: apex, rim, and a mid-height ring.
fn cone_cloud(segments: u32) -> Rc<[Vec3]> {
    let mut points = Vec::with_capacity((segments * 2) as usize + 2);
    points.push(Vec3::Y);
    for segment in 0..segments {
        let phi = TAU * segment as f32 / segments as f32;
        points.push(Vec3::new(phi.cos(), -1.0, phi.sin()));
        points.push(Vec3::new(0.5 * phi.cos(), 0.0, 0.5 * phi.sin()));
    }
    points.push(Vec3::NEG_Y);
    points.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_clouds_lie_on_the_unit_sphere() {
        let shape = unit_sphere(12, 18);
        for density in [SampleDensity::Coarse, SampleDensity::Fine] {
            for p in shape.sample_cloud(density).iter() {
                assert!((p.length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn fine_clouds_are_denser_than_coarse() {
        for shape in [unit_sphere(8, 12), unit_cube(), unit_cone(16)] {
            assert!(
                shape.sample_cloud(SampleDensity::Fine).len()
                    > shape.sample_cloud(SampleDensity::Coarse).len()
            );
        }
    }

    #[test]
    fn cube_cloud_stays_on_the_surface() {
        for p in unit_cube().sample_cloud(SampleDensity::Fine).iter() {
            let m = p.abs().max_element();
            assert!((m - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn sphere_mesh_vertices_are_unit_length() {
        let shape = unit_sphere(8, 12);
        assert!(!shape.vertices.is_empty());
        for v in &shape.vertices {
            assert!((v.position.length() - 1.0).abs() < 1e-5);
            assert!((v.normal.length() - 1.0).abs() < 1e-5);
        }
    }
}
