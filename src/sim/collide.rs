//! Point-sample collision testing
//!
//! Overlap between two bodies is decided by re-expressing one body's boundary
//! samples in the other's local frame, where the reference body occupies a
//! canonical unit volume. This trades the exact ellipsoid-ellipsoid test for
//! an O(|points|) membership scan: accuracy is bounded by sampling density,
//! and only the non-reference body is ever sampled, so the test is one-sided.
//! No broad-phase culling happens here; the scene owns any partitioning.

use std::rc::Rc;

use glam::Vec3;

use super::body::RigidBody;

/// Canonical unit volume a reference body is reduced to during a test.
///
/// The test is agnostic to the body's actual mesh: a body checked as `Sphere`
/// is a unit sphere for collision purposes regardless of what it draws as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitVolume {
    Sphere,
    Cube,
}

impl UnitVolume {
    /// Membership of a point in the unit volume expanded outward by `leeway`.
    #[inline]
    pub fn contains(self, p: Vec3, leeway: f32) -> bool {
        match self {
            UnitVolume::Sphere => p.length_squared() < 1.0 + leeway,
            UnitVolume::Cube => {
                p.x.abs() <= 1.0 + leeway && p.y.abs() <= 1.0 + leeway && p.z.abs() <= 1.0 + leeway
            }
        }
    }
}

/// How a pair of bodies is checked for overlap: the reference body's
/// canonical volume, the boundary samples drawn from the *other* body's
/// local-space cloud, and a tolerance margin.
///
/// Profiles are cheap to clone (the cloud is shared) and several coexist:
/// coarse sampling for fast hit checks, fine sampling where misses near edges
/// would be visible, a generous leeway for the grab volume.
#[derive(Debug, Clone)]
pub struct ColliderProfile {
    pub volume: UnitVolume,
    pub points: Rc<[Vec3]>,
    pub leeway: f32,
}

impl ColliderProfile {
    pub fn new(volume: UnitVolume, points: Rc<[Vec3]>, leeway: f32) -> Self {
        Self {
            volume,
            points,
            leeway,
        }
    }
}

/// Core overlap test; exposed on `RigidBody::check_if_colliding`.
///
/// `reference.inverse_transform` must have been refreshed from this tick's
/// `drawn_location` before the call.
pub(super) fn check(reference: &RigidBody, other: &RigidBody, profile: &ColliderProfile) -> bool {
    // Identity, not value: a body never collides with itself.
    if std::ptr::eq(reference, other) {
        return false;
    }

    // Re-express the other body's placement in the reference's unit frame.
    let to_reference = reference.inverse_transform() * other.drawn_location();

    profile
        .points
        .iter()
        .any(|p| profile.volume.contains(to_reference.transform_point3(*p), profile.leeway))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use crate::renderer::shapes::{self, SampleDensity, Shape};
    use crate::renderer::vertex::{Material, palette};

    fn sphere_shape() -> Rc<Shape> {
        Rc::new(shapes::unit_sphere(12, 18))
    }

    fn body_at(shape: &Rc<Shape>, center: Vec3, size: f32) -> RigidBody {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut body = RigidBody::new(
            shape.clone(),
            Rc::new(Material::new(palette::SENTRY)),
            Vec3::splat(size),
        );
        body.place(
            Mat4::from_translation(center),
            Vec3::ZERO,
            0.0,
            Some(Vec3::Y),
            &mut rng,
        );
        body.blend_state(1.0);
        body.refresh_inverse();
        body
    }

    fn sphere_profile(shape: &Rc<Shape>, leeway: f32) -> ColliderProfile {
        ColliderProfile::new(
            UnitVolume::Sphere,
            shape.sample_cloud(SampleDensity::Fine),
            leeway,
        )
    }

    #[test]
    fn a_body_never_collides_with_itself() {
        let shape = sphere_shape();
        let body = body_at(&shape, Vec3::ZERO, 1.0);
        let profile = sphere_profile(&shape, 0.5);
        assert!(!body.check_if_colliding(&body, &profile));
    }

    #[test]
    fn separated_spheres_do_not_collide() {
        let shape = sphere_shape();
        let a = body_at(&shape, Vec3::ZERO, 1.0);
        let b = body_at(&shape, Vec3::new(5.0, 0.0, 0.0), 1.0);
        let profile = sphere_profile(&shape, 0.5);
        assert!(!a.check_if_colliding(&b, &profile));
    }

    #[test]
    fn overlapping_spheres_collide() {
        let shape = sphere_shape();
        let a = body_at(&shape, Vec3::ZERO, 1.0);
        let b = body_at(&shape, Vec3::new(0.3, 0.0, 0.0), 1.0);
        let profile = sphere_profile(&shape, 0.5);
        assert!(a.check_if_colliding(&b, &profile));
    }

    #[test]
    fn sampling_is_one_sided_so_containment_is_asymmetric() {
        // A tiny body deep inside a huge one: the huge body's boundary
        // samples all land far outside the tiny body's unit frame, while the
        // tiny body's samples are all well inside the huge one.
        let shape = sphere_shape();
        let small = body_at(&shape, Vec3::ZERO, 0.1);
        let big = body_at(&shape, Vec3::ZERO, 10.0);
        let profile = sphere_profile(&shape, 0.0);

        assert!(!small.check_if_colliding(&big, &profile));
        assert!(big.check_if_colliding(&small, &profile));
    }

    #[test]
    fn cube_volume_uses_per_axis_extents() {
        let sphere = sphere_shape();
        let cube = Rc::new(shapes::unit_cube());
        // Reference is a unit cube; a sphere just past the face along x is
        // outside, but the same offset along a diagonal still overlaps the
        // corner region where the cube reaches sqrt(3).
        let a = body_at(&cube, Vec3::ZERO, 1.0);
        let past_face = body_at(&sphere, Vec3::new(2.2, 0.0, 0.0), 1.0);
        let at_corner = body_at(&sphere, Vec3::new(1.2, 1.2, 1.2), 1.0);
        let profile = ColliderProfile::new(
            UnitVolume::Cube,
            sphere.sample_cloud(SampleDensity::Fine),
            0.05,
        );

        assert!(!a.check_if_colliding(&past_face, &profile));
        assert!(a.check_if_colliding(&at_corner, &profile));
    }

    #[test]
    fn leeway_expands_the_hit_volume() {
        let shape = sphere_shape();
        let a = body_at(&shape, Vec3::ZERO, 1.0);
        // Just outside a strict sum-of-radii contact along x.
        let b = body_at(&shape, Vec3::new(2.05, 0.0, 0.0), 1.0);
        let strict = sphere_profile(&shape, 0.0);
        let loose = sphere_profile(&shape, 0.5);

        assert!(!a.check_if_colliding(&b, &strict));
        assert!(a.check_if_colliding(&b, &loose));
    }

    #[test]
    fn coarse_sampling_misses_a_shallow_graze_that_fine_sampling_finds() {
        let shape = sphere_shape();
        let a = body_at(&shape, Vec3::ZERO, 1.0);
        // Shallow graze along a direction that falls exactly between the
        // coarse cloud's equatorial samples but on one of the fine cloud's.
        let dir = Vec3::new(
            (std::f32::consts::PI / 8.0).cos(),
            0.0,
            (std::f32::consts::PI / 8.0).sin(),
        );
        let b = body_at(&shape, dir * 1.98, 1.0);
        let fine = sphere_profile(&shape, 0.0);
        let coarse = ColliderProfile::new(
            UnitVolume::Sphere,
            shape.sample_cloud(SampleDensity::Coarse),
            0.0,
        );

        assert!(a.check_if_colliding(&b, &fine));
        assert!(!a.check_if_colliding(&b, &coarse));
    }
}
