use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use tracing::trace;

use crate::engine::{
    collision::{check_collision, Collider, CollisionShape},
    physics::rigid_body::{BodyId, BodyType, RigidBody},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEventKind {
    Enter,
    Exit,
}

/// A body started or stopped overlapping a trigger volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub trigger: TriggerId,
    pub body: BodyId,
    pub kind: TriggerEventKind,
}

/// The main physics world that manages all physics bodies and trigger volumes
pub struct PhysicsWorld {
    bodies: Vec<RigidBody>,
    next_body_id: u32,
    global_gravity: Vec3,

    triggers: BTreeMap<TriggerId, Collider>,
    next_trigger_id: u32,
    overlaps: BTreeSet<(TriggerId, BodyId)>,
    trigger_events: Vec<TriggerEvent>,

    substeps: u32,
}

impl PhysicsWorld {
    /// Create a new physics world
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            next_body_id: 0,
            global_gravity: Vec3::ZERO,

            triggers: BTreeMap::new(),
            next_trigger_id: 0,
            overlaps: BTreeSet::new(),
            trigger_events: Vec::new(),

            substeps: 1,
        }
    }

    /// Configure gravity for the world
    pub fn set_global_gravity(&mut self, gravity: Vec3) {
        self.global_gravity = gravity;
    }

    pub fn global_gravity(&self) -> Vec3 {
        self.global_gravity
    }

    /// Add a body to the physics world. Ids are never reused.
    pub fn add_body(&mut self, mut body: RigidBody) -> BodyId {
        let id = BodyId(self.next_body_id);
        self.next_body_id += 1;

        body.id = id;
        self.bodies.push(body);

        id
    }

    /// Remove a body from the physics world. Triggers it was inside of get an
    /// exit event.
    pub fn remove_body(&mut self, id: BodyId) -> Option<RigidBody> {
        let index = self.bodies.iter().position(|b| b.id == id)?;

        let stale: Vec<_> = self.overlaps.iter().copied().filter(|(_, body)| *body == id).collect();
        for pair in stale {
            self.overlaps.remove(&pair);
            self.push_event(pair, TriggerEventKind::Exit);
        }

        Some(self.bodies.remove(index))
    }

    /// Get a reference to a body
    pub fn get_body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Get a mutable reference to a body
    pub fn get_body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    /// Get all bodies
    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    /// Register a trigger-only volume. Overlaps are detected on the next step.
    pub fn add_trigger(&mut self, collider: Collider) -> TriggerId {
        let id = TriggerId(self.next_trigger_id);
        self.next_trigger_id += 1;

        self.triggers.insert(id, collider.as_trigger());
        id
    }

    pub fn get_trigger(&self, id: TriggerId) -> Option<&Collider> {
        self.triggers.get(&id)
    }

    pub fn move_trigger(&mut self, id: TriggerId, position: Vec3) {
        if let Some(trigger) = self.triggers.get_mut(&id) {
            trigger.position = position;
        }
    }

    pub fn reshape_trigger(&mut self, id: TriggerId, shape: CollisionShape) {
        if let Some(trigger) = self.triggers.get_mut(&id) {
            trigger.shape = shape;
        }
    }

    /// Remove a trigger volume. Every body still inside it gets an exit event.
    pub fn remove_trigger(&mut self, id: TriggerId) -> Option<Collider> {
        let collider = self.triggers.remove(&id)?;

        let stale: Vec<_> = self.overlaps.iter().copied().filter(|(trigger, _)| *trigger == id).collect();
        for pair in stale {
            self.overlaps.remove(&pair);
            self.push_event(pair, TriggerEventKind::Exit);
        }

        Some(collider)
    }

    /// Bodies currently overlapping a trigger, as of the last step
    pub fn bodies_in_trigger(&self, id: TriggerId) -> Vec<BodyId> {
        self.overlaps
            .range((id, BodyId(0))..=(id, BodyId(u32::MAX)))
            .map(|(_, body)| *body)
            .collect()
    }

    /// Hand over the trigger events queued since the last drain
    pub fn drain_trigger_events(&mut self) -> Vec<TriggerEvent> {
        std::mem::take(&mut self.trigger_events)
    }

    /// Step the physics simulation forward by dt seconds. A zero or negative
    /// dt integrates nothing but still spends pending forces and refreshes
    /// trigger overlaps.
    pub fn step(&mut self, dt: f32) {
        if dt > 0.0 {
            let sub_dt = dt / self.substeps as f32;

            for _ in 0..self.substeps {
                self.step_internal(sub_dt);
            }
        }

        // Forces are submitted once per frame, so they are spent after the last substep
        for body in &mut self.bodies {
            body.clear_forces();
        }

        self.update_triggers();
    }

    /// Internal physics step
    fn step_internal(&mut self, dt: f32) {
        let global_gravity = self.global_gravity;

        for body in &mut self.bodies {
            match body.body_type {
                BodyType::Dynamic => {
                    let force = body.force_accumulator + global_gravity * body.mass * body.gravity_scale;

                    // Calculate acceleration from forces (F = ma, so a = F/m)
                    body.acceleration = force / body.mass;

                    // Integrate velocity (v = v0 + a*dt)
                    body.velocity += body.acceleration * dt;

                    // Integrate position (x = x0 + v*dt)
                    let next = body.position + body.velocity * dt;
                    body.set_position(next);
                }
                BodyType::Kinematic => {
                    // Kinematic bodies only update position based on velocity
                    let next = body.position + body.velocity * dt;
                    body.set_position(next);
                }
                BodyType::Static => {}
            }
        }
    }

    /// Recompute trigger overlaps and queue enter/exit events for the differences
    fn update_triggers(&mut self) {
        let mut current = BTreeSet::new();

        for (&trigger_id, trigger) in &self.triggers {
            for body in &self.bodies {
                if check_collision(trigger, &body.collider) {
                    current.insert((trigger_id, body.id));
                }
            }
        }

        let entered: Vec<_> = current.difference(&self.overlaps).copied().collect();
        let exited: Vec<_> = self.overlaps.difference(&current).copied().collect();

        for pair in exited {
            self.push_event(pair, TriggerEventKind::Exit);
        }
        for pair in entered {
            self.push_event(pair, TriggerEventKind::Enter);
        }

        self.overlaps = current;
    }

    fn push_event(&mut self, (trigger, body): (TriggerId, BodyId), kind: TriggerEventKind) {
        trace!(?trigger, ?body, ?kind, "trigger event");
        self.trigger_events.push(TriggerEvent { trigger, body, kind });
    }

    /// Set the number of physics substeps (higher = more accurate but slower)
    pub fn set_substeps(&mut self, substeps: u32) {
        self.substeps = substeps.max(1);
    }

    /// Get physics world statistics
    pub fn stats(&self) -> PhysicsStats {
        PhysicsStats {
            total_bodies: self.bodies.len(),
            dynamic_bodies: self.bodies.iter().filter(|b| b.body_type == BodyType::Dynamic).count(),
            triggers: self.triggers.len(),
            total_kinetic_energy: self.bodies.iter().map(|b| b.kinetic_energy()).sum(),
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Physics world statistics for debugging
#[derive(Debug, Clone)]
pub struct PhysicsStats {
    pub total_bodies: usize,
    pub dynamic_bodies: usize,
    pub triggers: usize,
    pub total_kinetic_energy: f32,
}
