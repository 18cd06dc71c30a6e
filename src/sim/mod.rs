//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Fresh per-tick body collections, no retained references
//! - No rendering or platform dependencies beyond shape sample clouds

pub mod body;
pub mod collide;
pub mod phase;
pub mod scene;

pub use body::RigidBody;
pub use collide::{ColliderProfile, UnitVolume};
pub use phase::{EvaluationProfiles, GamePhase, PhaseController, PhaseReport};
pub use scene::{Scene, TickInput};

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

/// Uniform random unit vector; the default spin axis source for `place`.
///
/// Takes the caller's RNG so tests can inject a fixed seed.
pub fn random_unit_vector(rng: &mut Pcg32) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..=1.0);
    let phi: f32 = rng.random_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}
