//! Camera poses
//!
//! Two viewpoints: a slow presentation orbit around the relic while waiting
//! on the start screen, and a raised chase view over the player during a run.
//! Terminal phases keep the gameplay pose so the losing/winning moment stays
//! on screen.

use glam::{Mat4, Vec3};

use crate::sim::GamePhase;

const FOV_Y: f32 = 55.0 * std::f32::consts::PI / 180.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 220.0;

/// Presentation orbit parameters
const ORBIT_RADIUS: f32 = 15.0;
const ORBIT_HEIGHT: f32 = 7.5;
const ORBIT_RATE: f32 = 0.25;

/// Gameplay chase offset from the player
const CHASE_OFFSET: Vec3 = Vec3::new(0.0, 15.0, 12.0);

/// Combined view-projection for the frame.
pub fn view_proj(
    phase: GamePhase,
    time_secs: f32,
    player_center: Vec3,
    relic_anchor: Vec3,
    aspect: f32,
) -> Mat4 {
    let (eye, target) = match phase {
        GamePhase::Start => {
            let angle = time_secs * ORBIT_RATE;
            let eye = relic_anchor
                + Vec3::new(angle.cos() * ORBIT_RADIUS, ORBIT_HEIGHT, angle.sin() * ORBIT_RADIUS);
            (eye, relic_anchor)
        }
        _ => (player_center + CHASE_OFFSET, player_center),
    };

    Mat4::perspective_rh(FOV_Y, aspect, Z_NEAR, Z_FAR) * Mat4::look_at_rh(eye, target, Vec3::Y)
}
