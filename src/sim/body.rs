//! Rigid body kinematics
//!
//! A body owns its kinematic state and nothing else: shape and material are
//! shared read-only handles resolved by the renderer. State advances on the
//! fixed tick; rendering blends between the last two ticks at an arbitrary
//! alpha, so a variable frame rate never touches authoritative state.

use std::rc::Rc;

use glam::{Mat3, Mat4, Vec3};
use rand_pcg::Pcg32;

use crate::renderer::shapes::Shape;
use crate::renderer::vertex::Material;

use super::collide::{self, ColliderProfile};
use super::random_unit_vector;

const NOT_PLACED: &str = "rigid body used before place()";

/// Kinematic state, absent until the body is placed.
#[derive(Debug, Clone)]
struct Kinematics {
    center: Vec3,
    rotation: Mat3,
    previous_center: Vec3,
    previous_rotation: Mat3,
    linear_velocity: Vec3,
    angular_velocity: f32,
    spin_axis: Vec3,
    /// Blended transform for the current render frame. A cache, rebuilt by
    /// `blend_state` every frame, never carried across frames as truth.
    drawn_location: Mat4,
    /// Inverse of `drawn_location`, refreshed before collision queries that
    /// use this body as the reference frame.
    inverse_transform: Mat4,
}

/// A moving object's kinematic and renderable state.
pub struct RigidBody {
    shape: Rc<Shape>,
    material: Rc<Material>,
    size: Vec3,
    kinematics: Option<Kinematics>,
}

impl RigidBody {
    /// A body starts un-placed; `advance`/`blend_state`/collision calls
    /// before `place` panic rather than computing from zeroed state.
    pub fn new(shape: Rc<Shape>, material: Rc<Material>, size: Vec3) -> Self {
        Self {
            shape,
            material,
            size,
            kinematics: None,
        }
    }

    pub fn shape(&self) -> &Rc<Shape> {
        &self.shape
    }

    pub fn material(&self) -> &Rc<Material> {
        &self.material
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Initialize (or re-initialize, on respawn) the kinematic state.
    ///
    /// `center` takes the transform's translation and `rotation` its linear
    /// part; the previous-state pair starts equal to the new state so the
    /// first blended frame shows no motion. `spin_axis: None` draws a uniform
    /// random unit axis from the caller's RNG.
    pub fn place(
        &mut self,
        transform: Mat4,
        linear_velocity: Vec3,
        angular_velocity: f32,
        spin_axis: Option<Vec3>,
        rng: &mut Pcg32,
    ) {
        let center = transform.w_axis.truncate();
        let rotation = Mat3::from_mat4(transform);
        let spin_axis = spin_axis.unwrap_or_else(|| random_unit_vector(rng));

        let drawn_location =
            Mat4::from_translation(center) * Mat4::from_mat3(rotation) * Mat4::from_scale(self.size);

        self.kinematics = Some(Kinematics {
            center,
            rotation,
            previous_center: center,
            previous_rotation: rotation,
            linear_velocity,
            angular_velocity,
            spin_axis,
            drawn_location,
            inverse_transform: drawn_location.inverse(),
        });
    }

    /// One explicit-Euler step at the fixed tick rate.
    ///
    /// The new spin is applied in world space, left of the accumulated
    /// orientation. Deterministic for a given starting state and `dt`.
    pub fn advance(&mut self, dt: f32) {
        let kin = self.kinematics.as_mut().expect(NOT_PLACED);
        kin.previous_center = kin.center;
        kin.previous_rotation = kin.rotation;
        kin.center += kin.linear_velocity * dt;
        kin.rotation = Mat3::from_axis_angle(kin.spin_axis, kin.angular_velocity * dt) * kin.rotation;
    }

    /// Component-wise lerp between the previous and current orientation.
    ///
    /// Not a proper rotation interpolation: large angular steps shear. Fine
    /// for the slow spins in this scene; a slerp upgrade would keep this
    /// signature.
    pub fn blend_rotation(&self, alpha: f32) -> Mat3 {
        let kin = self.kinematics.as_ref().expect(NOT_PLACED);
        kin.previous_rotation * (1.0 - alpha) + kin.rotation * alpha
    }

    /// Build and cache the renderable transform at `alpha` between the last
    /// two physics states. The only way to obtain a drawable placement.
    pub fn blend_state(&mut self, alpha: f32) -> Mat4 {
        let rotation = self.blend_rotation(alpha);
        let size = self.size;
        let kin = self.kinematics.as_mut().expect(NOT_PLACED);
        let center = kin.previous_center.lerp(kin.center, alpha);
        let drawn =
            Mat4::from_translation(center) * Mat4::from_mat3(rotation) * Mat4::from_scale(size);
        kin.drawn_location = drawn;
        drawn
    }

    /// Recompute the cached inverse from the current `drawn_location`.
    ///
    /// Must run after this tick's motion update and before any collision
    /// query that treats this body as the reference frame; a stale inverse is
    /// a correctness bug, not a tolerance.
    pub fn refresh_inverse(&mut self) {
        let kin = self.kinematics.as_mut().expect(NOT_PLACED);
        kin.inverse_transform = kin.drawn_location.inverse();
    }

    /// True if any of `other`'s boundary samples falls inside this body's
    /// canonical unit volume under `profile`. See `sim::collide`.
    pub fn check_if_colliding(&self, other: &RigidBody, profile: &ColliderProfile) -> bool {
        collide::check(self, other, profile)
    }

    pub fn center(&self) -> Vec3 {
        self.kinematics.as_ref().expect(NOT_PLACED).center
    }

    pub fn rotation(&self) -> Mat3 {
        self.kinematics.as_ref().expect(NOT_PLACED).rotation
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.kinematics.as_ref().expect(NOT_PLACED).linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.kinematics.as_mut().expect(NOT_PLACED).linear_velocity = velocity;
    }

    pub fn drawn_location(&self) -> Mat4 {
        self.kinematics.as_ref().expect(NOT_PLACED).drawn_location
    }

    pub fn inverse_transform(&self) -> Mat4 {
        self.kinematics.as_ref().expect(NOT_PLACED).inverse_transform
    }
}
