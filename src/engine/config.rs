use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::{
    collision::{Collider, CollisionShape},
    error::GravityResult,
    physics::{BodyId, GravitySourceConfig, GravitySystem, PhysicsWorld, RigidBody, SourceId},
};

/// A gravity source to create when a scene is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpawn {
    #[serde(default)]
    pub position: Vec3,
    #[serde(flatten)]
    pub config: GravitySourceConfig,
}

/// A dynamic, gravity-affected body to create when a scene is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySpawn {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    pub shape: CollisionShape,
    pub gravity_enabled: bool,
}

impl Default for BodySpawn {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mass: 1.0,
            shape: CollisionShape::Sphere { radius: 0.5 },
            gravity_enabled: true,
        }
    }
}

/// Serializable description of a whole simulation setup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Built-in world gravity. Gravity bodies opt out of it.
    pub global_gravity: Vec3,
    pub substeps: u32,
    pub sources: Vec<SourceSpawn>,
    pub bodies: Vec<BodySpawn>,
}

/// Ids handed out while spawning a scene, in config order
#[derive(Debug, Clone, Default)]
pub struct SpawnedScene {
    pub sources: Vec<SourceId>,
    pub bodies: Vec<BodyId>,
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> GravityResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> GravityResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        info!(path = %path.as_ref().display(), "loading scene");
        Self::from_json_str(&json)
    }

    /// Create every source and body of the scene
    pub fn spawn(&self, physics: &mut PhysicsWorld, gravity: &mut GravitySystem) -> GravityResult<SpawnedScene> {
        physics.set_global_gravity(self.global_gravity);
        physics.set_substeps(self.substeps);

        let mut scene = SpawnedScene::default();

        for spawn in &self.sources {
            scene.sources.push(gravity.add_source(spawn.config.clone(), spawn.position, physics));
        }

        for spawn in &self.bodies {
            let collider = Collider { position: spawn.position, shape: spawn.shape, is_trigger: false };
            let body = RigidBody::new_dynamic(BodyId(0), spawn.position, collider, spawn.mass)
                .with_velocity(spawn.velocity);

            let id = physics.add_body(body);
            gravity.add_body(id, physics)?;
            gravity.set_gravity_enabled(id, spawn.gravity_enabled)?;
            scene.bodies.push(id);
        }

        Ok(scene)
    }
}
