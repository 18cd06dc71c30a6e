//! Scene driver
//!
//! Owns every body in the vault, scripts the patrol and sweep motion, and
//! runs the per-tick order the phase machine depends on: advance and
//! re-blend all bodies first, then evaluate. Collision queries always see
//! this tick's placements, never last frame's.

use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::renderer::shapes::{self, SampleDensity, Shape};
use crate::renderer::vertex::{Material, palette};
use crate::renderer::Placement;
use crate::settings::QualityPreset;

use super::body::RigidBody;
use super::collide::{ColliderProfile, UnitVolume};
use super::phase::{EvaluationProfiles, GamePhase, PhaseController, PhaseReport};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Steering on the floor plane: x = right, y = toward the relic
    pub steer: Vec2,
    /// Begin (or restart) the run
    pub begin: bool,
    /// Attempt the relic grab
    pub grab: bool,
    /// Forfeit the run
    pub forfeit: bool,
}

/// A patrolling sentry: shuttles between two posts, tumbling as it goes.
struct Sentry {
    body: RigidBody,
    post_a: Vec3,
    post_b: Vec3,
    heading_to_b: bool,
}

/// The vault: player, sentries, laser walls, relic, and the invisible grab
/// marker, plus the phase controller that consumes their collision results.
pub struct Scene {
    pub seed: u64,
    rng: Pcg32,
    controller: PhaseController,
    profiles: EvaluationProfiles,
    player: RigidBody,
    sentries: Vec<Sentry>,
    walls: Vec<RigidBody>,
    relic: RigidBody,
    grab_volume: RigidBody,
    floor: RigidBody,
    relic_anchor: Vec3,
    player_spawn: Vec3,
    time_ticks: u64,
}

impl Scene {
    pub fn new(seed: u64, quality: QualityPreset) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);

        let (stacks, slices) = quality.sphere_segments();
        let sphere: Rc<Shape> = Rc::new(shapes::unit_sphere(stacks, slices));
        let cube: Rc<Shape> = Rc::new(shapes::unit_cube());
        let cone: Rc<Shape> = Rc::new(shapes::unit_cone(24));

        let density = quality.sample_density();
        let profiles = EvaluationProfiles {
            sentry: ColliderProfile::new(UnitVolume::Sphere, cube.sample_cloud(density), HIT_LEEWAY),
            wall: ColliderProfile::new(UnitVolume::Sphere, cube.sample_cloud(density), HIT_LEEWAY),
            grab: ColliderProfile::new(
                UnitVolume::Sphere,
                sphere.sample_cloud(SampleDensity::Coarse),
                GRAB_LEEWAY,
            ),
        };

        let relic_anchor = Vec3::new(0.0, 1.2, -(FLOOR_HALF_EXTENT - 6.0));
        let player_spawn = Vec3::new(0.0, PLAYER_RADIUS, FLOOR_HALF_EXTENT - 6.0);

        let mut player = RigidBody::new(
            sphere.clone(),
            Rc::new(Material::new(palette::PLAYER)),
            Vec3::splat(PLAYER_RADIUS),
        );
        player.place(
            Mat4::from_translation(player_spawn),
            Vec3::ZERO,
            0.0,
            Some(Vec3::Y),
            &mut rng,
        );

        let sentry_material = Rc::new(Material::new(palette::SENTRY));
        let lane = FLOOR_HALF_EXTENT - 8.0;
        let posts = [
            (Vec3::new(-lane, SENTRY_RADIUS, -8.0), Vec3::new(lane, SENTRY_RADIUS, -8.0)),
            (Vec3::new(lane, SENTRY_RADIUS, 2.0), Vec3::new(-lane, SENTRY_RADIUS, 2.0)),
            (Vec3::new(-10.0, SENTRY_RADIUS, 12.0), Vec3::new(10.0, SENTRY_RADIUS, 12.0)),
        ];
        let mut sentries = Vec::with_capacity(posts.len());
        for (post_a, post_b) in posts {
            let mut body = RigidBody::new(
                cube.clone(),
                sentry_material.clone(),
                Vec3::splat(SENTRY_RADIUS),
            );
            place_sentry(&mut body, post_a, post_b, &mut rng);
            sentries.push(Sentry {
                body,
                post_a,
                post_b,
                heading_to_b: true,
            });
        }

        let wall_material = Rc::new(Material::emissive(palette::WALL));
        let wall_size = Vec3::new(WALL_HALF_LENGTH, WALL_HALF_HEIGHT, WALL_HALF_THICKNESS);
        let wall_spots = [
            (Vec3::new(-8.0, WALL_HALF_HEIGHT, -12.0), WALL_SWEEP_RATE),
            (Vec3::new(8.0, WALL_HALF_HEIGHT, 6.0), -WALL_SWEEP_RATE),
        ];
        let mut walls = Vec::with_capacity(wall_spots.len());
        for (center, sweep) in wall_spots {
            let mut body = RigidBody::new(cube.clone(), wall_material.clone(), wall_size);
            place_wall(&mut body, center, sweep, &mut rng);
            walls.push(body);
        }

        let mut relic = RigidBody::new(
            cone,
            Rc::new(Material::emissive(palette::RELIC)),
            Vec3::splat(RELIC_SIZE),
        );
        relic.place(
            Mat4::from_translation(relic_anchor),
            Vec3::ZERO,
            RELIC_SPIN_RATE,
            Some(Vec3::Y),
            &mut rng,
        );

        let mut grab_volume = RigidBody::new(
            sphere,
            Rc::new(Material::new(palette::RELIC)),
            Vec3::splat(GRAB_MARKER_SIZE),
        );
        grab_volume.place(
            Mat4::from_translation(relic_anchor),
            Vec3::ZERO,
            0.0,
            Some(Vec3::Y),
            &mut rng,
        );
        grab_volume.blend_state(1.0);

        let mut floor = RigidBody::new(
            cube,
            Rc::new(Material::new(palette::FLOOR)),
            Vec3::new(FLOOR_HALF_EXTENT, 0.2, FLOOR_HALF_EXTENT),
        );
        floor.place(
            Mat4::from_translation(Vec3::new(0.0, -0.2, 0.0)),
            Vec3::ZERO,
            0.0,
            Some(Vec3::Y),
            &mut rng,
        );
        floor.blend_state(1.0);

        Self {
            seed,
            rng,
            controller: PhaseController::new(),
            profiles,
            player,
            sentries,
            walls,
            relic,
            grab_volume,
            floor,
            relic_anchor,
            player_spawn,
            time_ticks: 0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.controller.phase()
    }

    pub fn relic_touch(&self) -> bool {
        self.controller.relic_touch()
    }

    pub fn player_center(&self) -> Vec3 {
        self.player.center()
    }

    pub fn relic_anchor(&self) -> Vec3 {
        self.relic_anchor
    }

    pub fn time_secs(&self) -> f32 {
        self.time_ticks as f32 * SIM_DT
    }

    /// Advance the scene by one fixed timestep.
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> PhaseReport {
        if input.begin {
            if self.controller.phase() != GamePhase::Playing {
                self.respawn();
            }
            self.controller.on_begin_trigger();
        }
        if input.grab {
            self.controller.on_grab_trigger();
        }
        if input.forfeit {
            self.controller.on_forfeit_trigger();
        }

        self.time_ticks += 1;

        // The relic keeps bobbing and spinning on the start screen too
        self.drive_relic(dt);

        if self.controller.phase() == GamePhase::Playing {
            self.steer_player(input.steer);
            self.player.advance(dt);
            for sentry in &mut self.sentries {
                patrol(sentry, dt);
            }
            for wall in &mut self.walls {
                wall.advance(dt);
            }

            // Queries below must see this tick's end-of-step placements
            self.player.blend_state(1.0);
            for sentry in &mut self.sentries {
                sentry.body.blend_state(1.0);
            }
            for wall in &mut self.walls {
                wall.blend_state(1.0);
            }
            self.grab_volume.blend_state(1.0);
        }

        let sentries: Vec<&RigidBody> = self.sentries.iter().map(|s| &s.body).collect();
        let walls: Vec<&RigidBody> = self.walls.iter().collect();
        self.controller.evaluate(
            &mut self.player,
            &sentries,
            &walls,
            &self.grab_volume,
            &self.profiles,
        )
    }

    /// Drawable placements for this frame, blended at `alpha` between the
    /// last two ticks. The grab marker is not drawn; translucent walls go
    /// last so they blend over the rest.
    pub fn placements(&mut self, alpha: f32) -> Vec<Placement> {
        let mut out = Vec::with_capacity(4 + self.sentries.len() + self.walls.len());
        out.push(placement_of(&mut self.floor, alpha));
        out.push(placement_of(&mut self.relic, alpha));
        out.push(placement_of(&mut self.player, alpha));
        for sentry in &mut self.sentries {
            out.push(placement_of(&mut sentry.body, alpha));
        }
        for wall in &mut self.walls {
            out.push(placement_of(wall, alpha));
        }
        out
    }

    /// Re-place the movable bodies for a fresh run.
    fn respawn(&mut self) {
        log::info!("Respawning run (seed {})", self.seed);
        self.player.place(
            Mat4::from_translation(self.player_spawn),
            Vec3::ZERO,
            0.0,
            Some(Vec3::Y),
            &mut self.rng,
        );
        self.player.blend_state(1.0);

        for sentry in &mut self.sentries {
            sentry.heading_to_b = true;
            place_sentry(&mut sentry.body, sentry.post_a, sentry.post_b, &mut self.rng);
            sentry.body.blend_state(1.0);
        }

        let rates = [WALL_SWEEP_RATE, -WALL_SWEEP_RATE];
        for (wall, rate) in self.walls.iter_mut().zip(rates) {
            let center = wall.center();
            place_wall(wall, center, rate, &mut self.rng);
            wall.blend_state(1.0);
        }
    }

    fn steer_player(&mut self, steer: Vec2) {
        let dir = Vec3::new(steer.x, 0.0, -steer.y).normalize_or_zero();
        let mut velocity = dir * PLAYER_SPEED;

        // Stop at the floor edge instead of advancing off it
        let bound = FLOOR_HALF_EXTENT - PLAYER_RADIUS;
        let center = self.player.center();
        if (center.x <= -bound && velocity.x < 0.0) || (center.x >= bound && velocity.x > 0.0) {
            velocity.x = 0.0;
        }
        if (center.z <= -bound && velocity.z < 0.0) || (center.z >= bound && velocity.z > 0.0) {
            velocity.z = 0.0;
        }
        self.player.set_linear_velocity(velocity);
    }

    fn drive_relic(&mut self, dt: f32) {
        let t = self.time_ticks as f32 * SIM_DT;
        let bob = RELIC_BOB_AMPLITUDE * RELIC_BOB_RATE * (RELIC_BOB_RATE * t).cos();
        self.relic.set_linear_velocity(Vec3::Y * bob);
        self.relic.advance(dt);
    }
}

fn placement_of(body: &mut RigidBody, alpha: f32) -> Placement {
    Placement {
        transform: body.blend_state(alpha),
        shape: body.shape().clone(),
        material: **body.material(),
    }
}

fn place_sentry(body: &mut RigidBody, post_a: Vec3, post_b: Vec3, rng: &mut Pcg32) {
    let velocity = (post_b - post_a).normalize_or_zero() * SENTRY_SPEED;
    body.place(
        Mat4::from_translation(post_a),
        velocity,
        SENTRY_TUMBLE_RATE,
        None,
        rng,
    );
}

fn place_wall(body: &mut RigidBody, center: Vec3, sweep_rate: f32, rng: &mut Pcg32) {
    body.place(
        Mat4::from_translation(center),
        Vec3::ZERO,
        sweep_rate,
        Some(Vec3::Y),
        rng,
    );
}

/// Shuttle between the two posts, flipping at each end.
fn patrol(sentry: &mut Sentry, dt: f32) {
    sentry.body.advance(dt);
    let target = if sentry.heading_to_b {
        sentry.post_b
    } else {
        sentry.post_a
    };
    if (target - sentry.body.center()).dot(sentry.body.linear_velocity()) <= 0.0 {
        sentry.heading_to_b = !sentry.heading_to_b;
        let next = if sentry.heading_to_b {
            sentry.post_b
        } else {
            sentry.post_a
        };
        let direction = (next - sentry.body.center()).normalize_or_zero();
        sentry.body.set_linear_velocity(direction * SENTRY_SPEED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAR: Vec3 = Vec3::new(1000.0, 0.0, 1000.0);

    fn scene() -> Scene {
        Scene::new(0x5EED, QualityPreset::Medium)
    }

    /// Push all hazards out of the vault so a straight run is safe.
    fn clear_hazards(scene: &mut Scene) {
        let mut rng = Pcg32::seed_from_u64(9);
        for (i, sentry) in scene.sentries.iter_mut().enumerate() {
            let offset = FAR + Vec3::X * (i as f32 * 50.0);
            sentry.post_a = offset;
            sentry.post_b = offset + Vec3::X * 4.0;
            place_sentry(&mut sentry.body, sentry.post_a, sentry.post_b, &mut rng);
            sentry.body.blend_state(1.0);
        }
        for (i, wall) in scene.walls.iter_mut().enumerate() {
            place_wall(wall, FAR + Vec3::Z * (i as f32 * 50.0), WALL_SWEEP_RATE, &mut rng);
            wall.blend_state(1.0);
        }
    }

    fn steer_toward_relic(scene: &Scene) -> TickInput {
        let to_relic = scene.relic_anchor() - scene.player_center();
        TickInput {
            steer: Vec2::new(to_relic.x, -to_relic.z).normalize_or_zero(),
            ..TickInput::default()
        }
    }

    #[test]
    fn begin_starts_the_run() {
        let mut scene = scene();
        assert_eq!(scene.phase(), GamePhase::Start);

        let begin = TickInput {
            begin: true,
            ..TickInput::default()
        };
        let report = scene.tick(&begin, SIM_DT);
        assert_eq!(report.phase, GamePhase::Playing);
        assert!(!report.relic_touch);
    }

    #[test]
    fn clear_run_to_the_relic_wins_on_grab() {
        let mut scene = scene();
        clear_hazards(&mut scene);
        scene.tick(
            &TickInput {
                begin: true,
                ..TickInput::default()
            },
            SIM_DT,
        );

        let mut touched_at = None;
        for tick in 0..10_000 {
            let input = steer_toward_relic(&scene);
            let report = scene.tick(&input, SIM_DT);
            assert_eq!(report.phase, GamePhase::Playing);
            if report.relic_touch {
                touched_at = Some(tick);
                break;
            }
        }
        assert!(touched_at.is_some(), "player never reached the relic");

        let grab = TickInput {
            grab: true,
            ..TickInput::default()
        };
        assert_eq!(scene.tick(&grab, SIM_DT).phase, GamePhase::Win);
    }

    #[test]
    fn walking_into_a_wall_center_loses() {
        let mut scene = scene();
        scene.tick(
            &TickInput {
                begin: true,
                ..TickInput::default()
            },
            SIM_DT,
        );

        // The sweep never moves a wall's own center, so homing on it must
        // end the run no matter the sweep angle (unless a sentry gets us
        // first, which is a loss all the same).
        let wall_center = scene.walls[0].center();
        let mut lost = false;
        for _ in 0..10_000 {
            let to_wall = wall_center - scene.player_center();
            let input = TickInput {
                steer: Vec2::new(to_wall.x, -to_wall.z).normalize_or_zero(),
                ..TickInput::default()
            };
            if scene.tick(&input, SIM_DT).phase == GamePhase::Lose {
                lost = true;
                break;
            }
        }
        assert!(lost, "player crossed a laser wall unharmed");
    }

    #[test]
    fn begin_after_a_loss_respawns_at_the_start() {
        let mut scene = scene();
        scene.tick(
            &TickInput {
                begin: true,
                ..TickInput::default()
            },
            SIM_DT,
        );
        scene.tick(
            &TickInput {
                forfeit: true,
                ..TickInput::default()
            },
            SIM_DT,
        );
        assert_eq!(scene.phase(), GamePhase::Lose);

        let report = scene.tick(
            &TickInput {
                begin: true,
                ..TickInput::default()
            },
            SIM_DT,
        );
        assert_eq!(report.phase, GamePhase::Playing);
        assert!((scene.player_center() - scene.player_spawn).length() < 0.5);
    }

    #[test]
    fn sentries_stay_between_their_posts() {
        let mut scene = scene();
        scene.tick(
            &TickInput {
                begin: true,
                ..TickInput::default()
            },
            SIM_DT,
        );

        // Long enough for several patrol round trips
        for _ in 0..20_000 {
            scene.tick(&TickInput::default(), SIM_DT);
            if scene.phase() != GamePhase::Playing {
                break;
            }
            for sentry in &scene.sentries {
                let along = sentry.post_b - sentry.post_a;
                let t = (sentry.body.center() - sentry.post_a).dot(along) / along.length_squared();
                assert!((-0.05..=1.05).contains(&t));
            }
        }
    }
}
