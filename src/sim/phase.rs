//! Game phase state machine
//!
//! Start -> Playing -> {Win, Lose}. Loss is automatic on contact; the win
//! needs relic proximity plus an explicit grab. Triggers arriving from the
//! platform layer are latched and consumed atomically between ticks.

use serde::{Deserialize, Serialize};

use super::body::RigidBody;
use super::collide::ColliderProfile;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GamePhase {
    /// Presentation orbit, waiting for the run to begin
    #[default]
    Start,
    /// Active gameplay
    Playing,
    /// Relic grabbed
    Win,
    /// Caught by a sentry or wall, or forfeited
    Lose,
}

/// Designated profiles for one tick's evaluation, chosen by the scene.
pub struct EvaluationProfiles {
    pub sentry: ColliderProfile,
    pub wall: ColliderProfile,
    pub grab: ColliderProfile,
}

/// What one tick's evaluation decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: GamePhase,
    /// Player is inside the grab volume this tick
    pub relic_touch: bool,
}

/// The state machine. Holds no body references between ticks; every
/// `evaluate` call receives fresh collections from the scene.
#[derive(Debug, Default)]
pub struct PhaseController {
    phase: GamePhase,
    relic_touch: bool,
    begin_queued: bool,
    grab_queued: bool,
    forfeit_queued: bool,
}

impl PhaseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn relic_touch(&self) -> bool {
        self.relic_touch
    }

    /// Begin (or, from a terminal phase, restart) the run.
    pub fn on_begin_trigger(&mut self) {
        self.begin_queued = true;
    }

    /// Attempt the relic grab; only wins if proximity holds this tick.
    pub fn on_grab_trigger(&mut self) {
        self.grab_queued = true;
    }

    /// Manual forfeit; loses regardless of collision state.
    pub fn on_forfeit_trigger(&mut self) {
        self.forfeit_queued = true;
    }

    /// Run one tick's phase evaluation.
    ///
    /// Caller contract, in order: every sentry/wall body has been advanced
    /// and re-blended for this tick before this call. `evaluate` then
    /// refreshes the player's inverse, runs loss checks (sentries before
    /// walls, first match wins), runs the grab-proximity check, and applies
    /// at most one transition.
    pub fn evaluate(
        &mut self,
        player: &mut RigidBody,
        sentries: &[&RigidBody],
        walls: &[&RigidBody],
        grab_volume: &RigidBody,
        profiles: &EvaluationProfiles,
    ) -> PhaseReport {
        let begin = std::mem::take(&mut self.begin_queued);
        let grab = std::mem::take(&mut self.grab_queued);
        let forfeit = std::mem::take(&mut self.forfeit_queued);

        if begin && self.phase != GamePhase::Playing {
            self.relic_touch = false;
            self.set_phase(GamePhase::Playing);
        }

        if self.phase == GamePhase::Playing {
            player.refresh_inverse();

            let caught = sentries
                .iter()
                .any(|sentry| player.check_if_colliding(sentry, &profiles.sentry))
                || walls
                    .iter()
                    .any(|wall| player.check_if_colliding(wall, &profiles.wall));

            self.relic_touch = player.check_if_colliding(grab_volume, &profiles.grab);

            if caught || forfeit {
                self.set_phase(GamePhase::Lose);
            } else if grab && self.relic_touch {
                self.set_phase(GamePhase::Win);
            }
        }

        PhaseReport {
            phase: self.phase,
            relic_touch: self.relic_touch,
        }
    }

    fn set_phase(&mut self, next: GamePhase) {
        if self.phase != next {
            log::info!("Phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::rc::Rc;

    use crate::renderer::shapes::{self, SampleDensity, Shape};
    use crate::renderer::vertex::{Material, palette};
    use crate::sim::collide::UnitVolume;

    struct Rig {
        controller: PhaseController,
        player: RigidBody,
        sentry: RigidBody,
        wall: RigidBody,
        grab_volume: RigidBody,
        profiles: EvaluationProfiles,
    }

    fn body(shape: &Rc<Shape>, center: Vec3, size: Vec3) -> RigidBody {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut body = RigidBody::new(shape.clone(), Rc::new(Material::new(palette::SENTRY)), size);
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

    /// Player at origin; sentry, wall and relic start far away.
    fn rig() -> Rig {
        let sphere: Rc<Shape> = Rc::new(shapes::unit_sphere(12, 18));
        let cube: Rc<Shape> = Rc::new(shapes::unit_cube());

        let sphere_points = sphere.sample_cloud(SampleDensity::Fine);
        let cube_points = cube.sample_cloud(SampleDensity::Fine);

        Rig {
            controller: PhaseController::new(),
            player: body(&sphere, Vec3::ZERO, Vec3::ONE),
            sentry: body(&sphere, Vec3::new(20.0, 0.0, 0.0), Vec3::ONE),
            wall: body(&cube, Vec3::new(-20.0, 0.0, 0.0), Vec3::ONE),
            grab_volume: body(&sphere, Vec3::new(0.0, 20.0, 0.0), Vec3::splat(0.4)),
            profiles: EvaluationProfiles {
                sentry: ColliderProfile::new(UnitVolume::Sphere, sphere_points.clone(), 0.05),
                wall: ColliderProfile::new(UnitVolume::Sphere, cube_points, 0.05),
                grab: ColliderProfile::new(UnitVolume::Sphere, sphere_points, 11.0),
            },
        }
    }

    fn move_body(body: &mut RigidBody, center: Vec3) {
        let mut rng = Pcg32::seed_from_u64(1);
        body.place(
            Mat4::from_translation(center),
            Vec3::ZERO,
            0.0,
            Some(Vec3::Y),
            &mut rng,
        );
        body.blend_state(1.0);
    }

    fn evaluate(rig: &mut Rig) -> PhaseReport {
        rig.controller.evaluate(
            &mut rig.player,
            &[&rig.sentry],
            &[&rig.wall],
            &rig.grab_volume,
            &rig.profiles,
        )
    }

    #[test]
    fn begin_moves_start_to_playing_with_flags_clear() {
        let mut rig = rig();
        assert_eq!(rig.controller.phase(), GamePhase::Start);

        rig.controller.on_begin_trigger();
        let report = evaluate(&mut rig);
        assert_eq!(report.phase, GamePhase::Playing);
        assert!(!report.relic_touch);
    }

    #[test]
    fn nothing_happens_before_begin() {
        let mut rig = rig();
        move_body(&mut rig.sentry, Vec3::new(0.5, 0.0, 0.0));
        let report = evaluate(&mut rig);
        assert_eq!(report.phase, GamePhase::Start);
    }

    #[test]
    fn sentry_contact_loses_even_when_relic_touch_is_simultaneous() {
        let mut rig = rig();
        rig.controller.on_begin_trigger();
        evaluate(&mut rig);

        move_body(&mut rig.sentry, Vec3::new(0.5, 0.0, 0.0));
        move_body(&mut rig.grab_volume, Vec3::ZERO);
        let report = evaluate(&mut rig);

        assert_eq!(report.phase, GamePhase::Lose);
        assert!(report.relic_touch);
    }

    #[test]
    fn wall_contact_loses() {
        let mut rig = rig();
        rig.controller.on_begin_trigger();
        evaluate(&mut rig);

        move_body(&mut rig.wall, Vec3::new(0.0, 0.0, 0.8));
        assert_eq!(evaluate(&mut rig).phase, GamePhase::Lose);
    }

    #[test]
    fn grab_without_proximity_does_not_win() {
        let mut rig = rig();
        rig.controller.on_begin_trigger();
        evaluate(&mut rig);

        rig.controller.on_grab_trigger();
        let report = evaluate(&mut rig);
        assert_eq!(report.phase, GamePhase::Playing);
        assert!(!report.relic_touch);
    }

    #[test]
    fn proximity_without_grab_does_not_win() {
        let mut rig = rig();
        rig.controller.on_begin_trigger();
        evaluate(&mut rig);

        move_body(&mut rig.grab_volume, Vec3::ZERO);
        let report = evaluate(&mut rig);
        assert_eq!(report.phase, GamePhase::Playing);
        assert!(report.relic_touch);
    }

    #[test]
    fn proximity_plus_grab_wins_when_nothing_hit() {
        let mut rig = rig();
        rig.controller.on_begin_trigger();
        evaluate(&mut rig);

        move_body(&mut rig.grab_volume, Vec3::ZERO);
        rig.controller.on_grab_trigger();
        assert_eq!(evaluate(&mut rig).phase, GamePhase::Win);
    }

    #[test]
    fn forfeit_loses_unconditionally() {
        let mut rig = rig();
        rig.controller.on_begin_trigger();
        evaluate(&mut rig);

        rig.controller.on_forfeit_trigger();
        assert_eq!(evaluate(&mut rig).phase, GamePhase::Lose);
    }

    #[test]
    fn terminal_phases_only_leave_via_begin() {
        let mut rig = rig();
        rig.controller.on_begin_trigger();
        evaluate(&mut rig);
        rig.controller.on_forfeit_trigger();
        evaluate(&mut rig);
        assert_eq!(rig.controller.phase(), GamePhase::Lose);

        // Grab/forfeit do nothing from Lose
        rig.controller.on_grab_trigger();
        rig.controller.on_forfeit_trigger();
        assert_eq!(evaluate(&mut rig).phase, GamePhase::Lose);

        // Begin returns straight to Playing with flags cleared
        rig.controller.on_begin_trigger();
        let report = evaluate(&mut rig);
        assert_eq!(report.phase, GamePhase::Playing);
        assert!(!report.relic_touch);
    }
}
