use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::engine::{
    collision::{Collider, CollisionShape},
    error::GravityResult,
    physics::{
        physics_world::{PhysicsWorld, TriggerId},
        rigid_body::{Orientation, RigidBody},
        SpaceDimension,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

/// Shape of a gravity field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GravityTopology {
    /// Radial pull from a point, like a planet
    #[default]
    Spherical,
    /// Uniform pull along one world axis
    Directional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    pub fn unit(&self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// Serializable settings of a gravity source.
///
/// `force` is conventionally negative: the pull direction points away from the
/// source, so a negative magnitude attracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravitySourceConfig {
    pub topology: GravityTopology,
    pub dimension: SpaceDimension,
    /// Only read by directional fields
    pub axis: Axis,
    pub bidirectional: bool,
    pub fall_off: bool,
    pub force: f32,
    pub rotational_correction_speed: f32,
    pub unlimited_range: bool,
    /// Seconds between registry scans when `unlimited_range` is set.
    /// Zero or less scans every tick.
    pub check_interval: f32,
    /// Detection radius of spherical fields
    pub radius: f32,
    /// Detection box size of directional fields. 2D fields only read x and y.
    pub area: Vec3,
}

impl Default for GravitySourceConfig {
    fn default() -> Self {
        Self {
            topology: GravityTopology::Spherical,
            dimension: SpaceDimension::ThreeD,
            axis: Axis::Y,
            bidirectional: false,
            fall_off: false,
            force: -9.81,
            rotational_correction_speed: 5.0,
            unlimited_range: false,
            check_interval: 1.0,
            radius: 10.0,
            area: Vec3::splat(10.0),
        }
    }
}

impl GravitySourceConfig {
    pub fn spherical(radius: f32) -> Self {
        Self { topology: GravityTopology::Spherical, radius, ..Default::default() }
    }

    pub fn directional(axis: Axis, area: Vec3) -> Self {
        Self { topology: GravityTopology::Directional, axis, area, ..Default::default() }
    }

    pub fn from_json_str(json: &str) -> GravityResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_dimension(mut self, dimension: SpaceDimension) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_force(mut self, force: f32) -> Self {
        self.force = force;
        self
    }

    pub fn with_fall_off(mut self, fall_off: bool) -> Self {
        self.fall_off = fall_off;
        self
    }

    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    pub fn with_rotational_correction_speed(mut self, speed: f32) -> Self {
        self.rotational_correction_speed = speed.max(0.0);
        self
    }

    pub fn with_unlimited_range(mut self, check_interval: f32) -> Self {
        self.unlimited_range = true;
        self.check_interval = check_interval;
        self
    }
}

/// A gravity-emitting object.
///
/// The source keeps no list of the bodies it affects. Bodies hold its
/// [`SourceId`] in their subscription set and call [`GravitySource::apply_gravity`]
/// every tick.
#[derive(Debug, Clone)]
pub struct GravitySource {
    pub(crate) id: SourceId,
    config: GravitySourceConfig,
    position: Vec3,
    trigger: Option<TriggerId>,
    remaining_interval: f32,
}

impl GravitySource {
    pub fn new(config: GravitySourceConfig, position: Vec3) -> Self {
        let remaining_interval = config.check_interval;
        let mut source = Self {
            id: SourceId(0),
            config,
            position: Vec3::ZERO,
            trigger: None,
            remaining_interval,
        };
        source.position = source.flatten(position);
        source
    }

    /// Provision the detection volume in the physics world. Only the owning
    /// [`GravitySystem`](crate::engine::physics::GravitySystem) calls this,
    /// since it maps trigger events back to the source by this volume.
    pub(crate) fn initialize(&mut self, physics: &mut PhysicsWorld) {
        if let Some(old) = self.trigger.take() {
            physics.remove_trigger(old);
        }
        self.trigger = Some(physics.add_trigger(self.detection_volume()));
        self.remaining_interval = self.config.check_interval;
    }

    /// Drop the detection volume. The source applies no more gravity through
    /// trigger membership afterwards.
    pub(crate) fn release(&mut self, physics: &mut PhysicsWorld) {
        if let Some(trigger) = self.trigger.take() {
            physics.remove_trigger(trigger);
        }
    }

    /// Collider matching the current topology, dimension and size
    pub fn detection_volume(&self) -> Collider {
        let c = &self.config;
        let shape = match (c.topology, c.dimension) {
            (GravityTopology::Spherical, SpaceDimension::TwoD) => CollisionShape::Circle { radius: c.radius },
            (GravityTopology::Spherical, SpaceDimension::ThreeD) => CollisionShape::Sphere { radius: c.radius },
            (GravityTopology::Directional, SpaceDimension::TwoD) => {
                CollisionShape::Rectangle { width: c.area.x, height: c.area.y }
            }
            (GravityTopology::Directional, SpaceDimension::ThreeD) => CollisionShape::Cuboid { size: c.area },
        };

        Collider { position: self.position, shape, is_trigger: true }
    }

    /// Advance the scan countdown. Returns true when an unlimited-range source
    /// is due for a registry scan.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.config.unlimited_range {
            return false;
        }
        if self.config.check_interval <= 0.0 {
            return true;
        }

        self.remaining_interval -= dt;
        if self.remaining_interval <= 0.0 {
            self.remaining_interval = self.config.check_interval;
            true
        } else {
            false
        }
    }

    /// Inverse-square attenuation, saturating at 1 inside unit distance
    pub fn fall_off(distance: f32) -> f32 {
        1.0 / (distance * distance).max(1.0)
    }

    /// Force magnitude felt at `body_position`
    pub fn force_at(&self, body_position: Vec3) -> f32 {
        if self.config.fall_off {
            let distance = self.flatten(body_position).distance(self.position);
            self.config.force * Self::fall_off(distance)
        } else {
            self.config.force
        }
    }

    /// Unit direction the force acts along, before the force sign is applied.
    /// Zero when the direction is undefined, e.g. a body sitting exactly on the
    /// source.
    pub fn pull_direction(&self, body_position: Vec3) -> Vec3 {
        let offset = self.flatten(body_position) - self.position;

        match self.config.topology {
            GravityTopology::Spherical => offset.normalize_or_zero(),
            GravityTopology::Directional => {
                let axis = self.config.axis.unit();
                if self.config.bidirectional {
                    (axis * offset.dot(axis)).normalize_or_zero()
                } else {
                    axis
                }
            }
        }
    }

    /// Pull one body: turn its up toward the pull direction and add the force to
    /// its accumulator. Returns the submitted force, or `None` when the body
    /// lives in the other dimension.
    pub fn apply_gravity(&self, body: &mut RigidBody, dt: f32) -> Option<Vec3> {
        if body.dimension() != self.config.dimension {
            trace!(source = ?self.id, body = ?body.id, "dimension mismatch, skipping");
            return None;
        }

        // Computed per body, fall-off depends on this body's distance
        let force = self.force_at(body.position);
        let direction = self.pull_direction(body.position);

        self.align(body, direction, dt);

        let applied = direction * force;
        body.apply_force(applied);
        trace!(source = ?self.id, body = ?body.id, ?applied, "gravity applied");

        Some(applied)
    }

    fn align(&self, body: &mut RigidBody, up: Vec3, dt: f32) {
        let t = (self.config.rotational_correction_speed * dt).clamp(0.0, 1.0);

        match body.orientation {
            Orientation::Spatial(rotation) => {
                if up == Vec3::ZERO {
                    return;
                }
                let target = Quat::from_rotation_arc(rotation * Vec3::Y, up) * rotation;
                body.orientation = Orientation::Spatial(rotation.slerp(target, t).normalize());
            }
            Orientation::Planar(angle) => {
                let up = up.truncate();
                if up == Vec2::ZERO {
                    return;
                }
                let target = (-up.x).atan2(up.y);
                let delta = (target - angle + PI).rem_euclid(TAU) - PI;
                body.orientation = Orientation::Planar(angle + delta * t);
            }
        }
    }

    // 2D sources live in the xy plane
    fn flatten(&self, v: Vec3) -> Vec3 {
        match self.config.dimension {
            SpaceDimension::TwoD => v.truncate().extend(0.0),
            SpaceDimension::ThreeD => v,
        }
    }
}

/// Accessors
impl GravitySource {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn config(&self) -> &GravitySourceConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn trigger(&self) -> Option<TriggerId> {
        self.trigger
    }

    pub fn topology(&self) -> GravityTopology {
        self.config.topology
    }

    pub fn dimension(&self) -> SpaceDimension {
        self.config.dimension
    }

    pub fn axis(&self) -> Axis {
        self.config.axis
    }

    pub fn bidirectional(&self) -> bool {
        self.config.bidirectional
    }

    pub fn fall_off_enabled(&self) -> bool {
        self.config.fall_off
    }

    pub fn force(&self) -> f32 {
        self.config.force
    }

    pub fn rotational_correction_speed(&self) -> f32 {
        self.config.rotational_correction_speed
    }

    pub fn unlimited_range(&self) -> bool {
        self.config.unlimited_range
    }

    pub fn check_interval(&self) -> f32 {
        self.config.check_interval
    }

    pub fn remaining_interval(&self) -> f32 {
        self.remaining_interval
    }

    pub fn radius(&self) -> f32 {
        self.config.radius
    }

    pub fn area(&self) -> Vec3 {
        self.config.area
    }
}

/// Setters. Topology and dimension are fixed once the source exists.
impl GravitySource {
    pub fn set_axis(&mut self, axis: Axis) {
        self.config.axis = axis;
    }

    pub fn set_bidirectional(&mut self, bidirectional: bool) {
        self.config.bidirectional = bidirectional;
    }

    pub fn set_fall_off(&mut self, fall_off: bool) {
        self.config.fall_off = fall_off;
    }

    pub fn set_force(&mut self, force: f32) {
        self.config.force = force;
    }

    pub fn set_rotational_correction_speed(&mut self, speed: f32) {
        self.config.rotational_correction_speed = speed.max(0.0);
    }

    pub fn set_check_interval(&mut self, check_interval: f32) {
        self.config.check_interval = check_interval;
        self.remaining_interval = self.remaining_interval.min(check_interval);
    }

    // Membership has to be resynced when this flips, see GravitySystem::set_unlimited_range
    pub(crate) fn set_unlimited_range(&mut self, unlimited_range: bool) {
        self.config.unlimited_range = unlimited_range;
        self.remaining_interval = self.config.check_interval;
    }

    /// Resize the spherical detection volume
    pub fn set_radius(&mut self, radius: f32, physics: &mut PhysicsWorld) {
        self.config.radius = radius;
        self.sync_trigger(physics);
    }

    /// Resize the directional detection volume
    pub fn set_area(&mut self, area: Vec3, physics: &mut PhysicsWorld) {
        self.config.area = area;
        self.sync_trigger(physics);
    }

    pub fn set_position(&mut self, position: Vec3, physics: &mut PhysicsWorld) {
        self.position = self.flatten(position);
        self.sync_trigger(physics);
    }

    fn sync_trigger(&self, physics: &mut PhysicsWorld) {
        if let Some(trigger) = self.trigger {
            let volume = self.detection_volume();
            physics.reshape_trigger(trigger, volume.shape);
            physics.move_trigger(trigger, volume.position);
        }
    }
}
