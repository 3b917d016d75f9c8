use glam::Vec3;
use gravclog::engine::{
    collision::Collider,
    error::GravityResult,
    physics::{Axis, BodyId, GravitySourceConfig, GravitySystem, PhysicsWorld, RigidBody, SourceId},
    SceneConfig,
};
use rand::Rng;
use tracing::{debug, info};

const SATELLITE_COUNT: usize = 12;
const PLANET_RADIUS: f32 = 60.0;
const REPORT_INTERVAL: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitDemoState {
    Setup,
    Running,
}

/// Headless scene: a planet with a spherical field, a directional "wind" band
/// and a few satellites scattered around them.
pub struct OrbitDemo {
    state: OrbitDemoState,
    physics: PhysicsWorld,
    gravity: GravitySystem,
    sources: Vec<SourceId>,
    satellites: Vec<BodyId>,
    elapsed: f32,
    report_timer: f32,
}

impl OrbitDemo {
    pub fn new() -> Self {
        Self {
            state: OrbitDemoState::Setup,
            physics: PhysicsWorld::new(),
            gravity: GravitySystem::new(),
            sources: Vec::new(),
            satellites: Vec::new(),
            elapsed: 0.0,
            report_timer: REPORT_INTERVAL,
        }
    }

    /// Load a scene, or build the default one when none is given
    pub fn init(&mut self, scene: Option<SceneConfig>) -> GravityResult<()> {
        match scene {
            Some(scene) => {
                let spawned = scene.spawn(&mut self.physics, &mut self.gravity)?;
                self.sources = spawned.sources;
                self.satellites = spawned.bodies;
            }
            None => self.build_default_scene()?,
        }

        info!(sources = self.sources.len(), satellites = self.satellites.len(), "demo initialized");
        self.state = OrbitDemoState::Running;
        Ok(())
    }

    fn build_default_scene(&mut self) -> GravityResult<()> {
        self.physics.set_global_gravity(Vec3::new(0.0, -9.81, 0.0));
        self.physics.set_substeps(4);

        let planet = GravitySourceConfig::spherical(PLANET_RADIUS)
            .with_force(-400.0)
            .with_fall_off(true)
            .with_rotational_correction_speed(2.0);
        self.sources.push(self.gravity.add_source(planet, Vec3::ZERO, &mut self.physics));

        let band = GravitySourceConfig::directional(Axis::X, Vec3::new(40.0, 200.0, 200.0))
            .with_bidirectional(true)
            .with_force(-3.0);
        self.sources.push(self.gravity.add_source(band, Vec3::new(100.0, 0.0, 0.0), &mut self.physics));

        let mut rng = rand::rng();
        for _ in 0..SATELLITE_COUNT {
            let direction = Vec3::new(
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            )
            .normalize_or(Vec3::Y);
            let position = direction * rng.random_range(10.0..PLANET_RADIUS);

            // Roughly tangential start so satellites swing around instead of dropping straight in
            let tangent = direction.any_orthonormal_vector();
            let velocity = tangent * rng.random_range(2.0..8.0);

            let collider = Collider::new_sphere(position, rng.random_range(0.5..2.0));
            let body = RigidBody::new_dynamic(BodyId(0), position, collider, rng.random_range(1.0..5.0))
                .with_velocity(velocity);

            let id = self.physics.add_body(body);
            self.gravity.add_body(id, &mut self.physics)?;
            self.satellites.push(id);
        }

        Ok(())
    }

    pub fn update(&mut self, dt: f32) {
        if self.state != OrbitDemoState::Running {
            return;
        }

        self.gravity.frame(&mut self.physics, dt);
        self.elapsed += dt;

        self.report_timer -= dt;
        if self.report_timer <= 0.0 {
            self.report_timer = REPORT_INTERVAL;
            let stats = self.physics.stats();
            info!(
                elapsed = self.elapsed,
                bodies = stats.total_bodies,
                kinetic_energy = stats.total_kinetic_energy,
                "simulation running"
            );
        }
    }

    /// Log where every satellite ended up and what is pulling on it
    pub fn report(&self) {
        for &satellite in &self.satellites {
            let Some(body) = self.physics.get_body(satellite) else {
                continue;
            };
            let sources: Vec<SourceId> = self
                .gravity
                .body(satellite)
                .map(|b| b.sources().collect())
                .unwrap_or_default();

            debug!(?satellite, up = ?body.up(), "satellite orientation");
            info!(
                ?satellite,
                position = ?body.position,
                speed = body.velocity.length(),
                ?sources,
                "satellite"
            );
        }
    }
}

impl Default for OrbitDemo {
    fn default() -> Self {
        Self::new()
    }
}
