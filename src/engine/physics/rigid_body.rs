use crate::engine::{collision::Collider, physics::SpaceDimension};
use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Static,
    Dynamic,
    Kinematic,
}

/// Rotation state of a body. Which variant a body carries is decided when it is
/// created and never changes, so callers match on it instead of probing for
/// 2D or 3D capabilities every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    /// Counter-clockwise rotation around the z axis, in radians.
    Planar(f32),
    Spatial(Quat),
}

impl Orientation {
    pub fn dimension(&self) -> SpaceDimension {
        match self {
            Orientation::Planar(_) => SpaceDimension::TwoD,
            Orientation::Spatial(_) => SpaceDimension::ThreeD,
        }
    }

    pub fn identity(dimension: SpaceDimension) -> Self {
        match dimension {
            SpaceDimension::TwoD => Orientation::Planar(0.0),
            SpaceDimension::ThreeD => Orientation::Spatial(Quat::IDENTITY),
        }
    }

    /// Local +Y expressed in world space.
    pub fn up(&self) -> Vec3 {
        match *self {
            Orientation::Planar(angle) => Vec3::new(-angle.sin(), angle.cos(), 0.0),
            Orientation::Spatial(rotation) => rotation * Vec3::Y,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RigidBody {
    pub id: BodyId,

    pub body_type: BodyType,

    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,

    pub mass: f32,

    pub collider: Collider,
    pub orientation: Orientation,

    /// Multiplier on the world's global gravity. Zero means the body only
    /// reacts to explicit forces.
    pub gravity_scale: f32,

    pub(crate) force_accumulator: Vec3,
}

impl RigidBody {
    /// Create a new dynamic rigid body. The collider's shape decides whether it
    /// is a planar or a spatial body.
    pub fn new_dynamic(id: BodyId, position: Vec3, collider: Collider, mass: f32) -> Self {
        Self::with_type(id, BodyType::Dynamic, position, collider, mass.max(0.001)) // Prevent division by zero
    }

    /// Create a new static rigid body (planets, walls)
    pub fn new_static(id: BodyId, position: Vec3, collider: Collider) -> Self {
        Self::with_type(id, BodyType::Static, position, collider, f32::INFINITY)
    }

    /// Create a new kinematic rigid body (moving platforms)
    pub fn new_kinematic(id: BodyId, position: Vec3, collider: Collider) -> Self {
        Self::with_type(id, BodyType::Kinematic, position, collider, f32::INFINITY)
    }

    fn with_type(id: BodyId, body_type: BodyType, position: Vec3, mut collider: Collider, mass: f32) -> Self {
        let dimension = collider.dimension();
        let position = match dimension {
            SpaceDimension::TwoD => position.truncate().extend(0.0),
            SpaceDimension::ThreeD => position,
        };
        collider.position = position;

        Self {
            id,
            body_type,
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            mass,
            collider,
            orientation: Orientation::identity(dimension),
            gravity_scale: 1.0,
            force_accumulator: Vec3::ZERO,
        }
    }

    pub fn dimension(&self) -> SpaceDimension {
        self.orientation.dimension()
    }

    pub fn up(&self) -> Vec3 {
        self.orientation.up()
    }

    /// Apply a force to this body (will be integrated next physics step).
    /// Planar bodies drop the z component.
    pub fn apply_force(&mut self, force: Vec3) {
        if self.body_type == BodyType::Dynamic {
            self.force_accumulator += match self.dimension() {
                SpaceDimension::TwoD => force.truncate().extend(0.0),
                SpaceDimension::ThreeD => force,
            };
        }
    }

    /// Force gathered since the last integration step
    pub fn accumulated_force(&self) -> Vec3 {
        self.force_accumulator
    }

    pub fn clear_forces(&mut self) {
        self.force_accumulator = Vec3::ZERO;
    }

    /// Set position directly
    pub fn set_position(&mut self, position: Vec3) {
        self.position = match self.dimension() {
            SpaceDimension::TwoD => position.truncate().extend(0.0),
            SpaceDimension::ThreeD => position,
        };
        self.collider.position = self.position;
    }

    /// Turn off the world's built-in gravity for this body
    pub fn disable_builtin_gravity(&mut self) {
        self.gravity_scale = 0.0;
    }

    /// Get the current kinetic energy of the body
    pub fn kinetic_energy(&self) -> f32 {
        if self.mass.is_infinite() {
            0.0
        } else {
            0.5 * self.mass * self.velocity.length_squared()
        }
    }
}

/// Builder pattern for useful properties
impl RigidBody {
    /// Set the initial velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the mass (clamped to a minimum to avoid division by zero)
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass.max(0.001);
        self
    }

    /// Set the initial orientation. Ignored when the variant does not match
    /// the body's dimension.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        if orientation.dimension() == self.dimension() {
            self.orientation = orientation;
        }
        self
    }

    pub fn with_gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }
}
