use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::Vec3;
use tracing::{debug, info};

use crate::engine::{
    error::{GravityError, GravityResult},
    physics::{
        gravity::{GravitySource, GravitySourceConfig, SourceId},
        gravity_body::GravityBody,
        physics_world::{PhysicsWorld, TriggerEvent, TriggerEventKind, TriggerId},
        rigid_body::BodyId,
    },
};

/// Owns every gravity source and every gravity-affected body and keeps their
/// subscriptions in step with the physics world.
///
/// One frame is `update` (apply forces, run due scans), then the physics step,
/// then `handle_trigger_events` with whatever the step reported. Membership
/// changes from triggers and scans therefore show up in the next frame's forces.
#[derive(Default)]
pub struct GravitySystem {
    sources: BTreeMap<SourceId, GravitySource>,
    next_source_id: u32,
    bodies: BTreeMap<BodyId, GravityBody>,
    triggers: HashMap<TriggerId, SourceId>,
}

impl GravitySystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source and provision its detection volume
    pub fn add_source(&mut self, config: GravitySourceConfig, position: Vec3, physics: &mut PhysicsWorld) -> SourceId {
        let id = SourceId(self.next_source_id);
        self.next_source_id += 1;

        let mut source = GravitySource::new(config, position);
        source.id = id;
        source.initialize(physics);

        if let Some(trigger) = source.trigger() {
            self.triggers.insert(trigger, id);
        }

        info!(
            source = ?id,
            topology = ?source.topology(),
            dimension = ?source.dimension(),
            unlimited_range = source.unlimited_range(),
            "gravity source created"
        );
        self.sources.insert(id, source);
        id
    }

    /// Destroy a source. Every body subscribed to it is unsubscribed before the
    /// source is dropped, so no body is left holding a dead id.
    pub fn remove_source(&mut self, id: SourceId, physics: &mut PhysicsWorld) -> GravityResult<GravitySource> {
        let mut source = self.sources.remove(&id).ok_or(GravityError::UnknownSource(id))?;

        let mut released = 0;
        for body in self.bodies.values_mut() {
            if body.remove_source(id) {
                released += 1;
            }
        }

        if let Some(trigger) = source.trigger() {
            self.triggers.remove(&trigger);
        }
        source.release(physics);

        info!(source = ?id, released, "gravity source destroyed");
        Ok(source)
    }

    pub fn source(&self, id: SourceId) -> Option<&GravitySource> {
        self.sources.get(&id)
    }

    pub fn source_mut(&mut self, id: SourceId) -> Option<&mut GravitySource> {
        self.sources.get_mut(&id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &GravitySource> {
        self.sources.values()
    }

    /// Register a rigid body as gravity-affected and disable its built-in
    /// gravity. Bounded sources the body already sits inside pick it up right away.
    pub fn add_body(&mut self, body_id: BodyId, physics: &mut PhysicsWorld) -> GravityResult<()> {
        if self.bodies.contains_key(&body_id) {
            return Ok(());
        }

        let mut body = GravityBody::new(body_id);
        body.initialize(physics)?;

        for source in self.sources.values().filter(|s| !s.unlimited_range()) {
            if let Some(trigger) = source.trigger() {
                if physics.bodies_in_trigger(trigger).contains(&body_id) {
                    body.add_source(source.id());
                }
            }
        }

        info!(body = ?body_id, sources = body.source_count(), "gravity body registered");
        self.bodies.insert(body_id, body);
        Ok(())
    }

    pub fn remove_body(&mut self, body_id: BodyId) -> Option<GravityBody> {
        let removed = self.bodies.remove(&body_id);
        if removed.is_some() {
            info!(body = ?body_id, "gravity body removed");
        }
        removed
    }

    pub fn body(&self, id: BodyId) -> Option<&GravityBody> {
        self.bodies.get(&id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut GravityBody> {
        self.bodies.get_mut(&id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &GravityBody> {
        self.bodies.values()
    }

    pub fn set_gravity_enabled(&mut self, body: BodyId, enabled: bool) -> GravityResult<()> {
        let body = self.bodies.get_mut(&body).ok_or(GravityError::UnknownBody(body))?;
        body.set_gravity_enabled(enabled);
        Ok(())
    }

    /// Subscribe a body to a live source. Returns whether the set changed.
    pub fn subscribe(&mut self, body: BodyId, source: SourceId) -> GravityResult<bool> {
        if !self.sources.contains_key(&source) {
            return Err(GravityError::UnknownSource(source));
        }
        let body = self.bodies.get_mut(&body).ok_or(GravityError::UnknownBody(body))?;
        Ok(body.add_source(source))
    }

    /// Unsubscribe a body from a source. Unknown bodies and absent
    /// subscriptions are a no-op.
    pub fn unsubscribe(&mut self, body: BodyId, source: SourceId) -> bool {
        self.bodies
            .get_mut(&body)
            .map(|b| b.remove_source(source))
            .unwrap_or(false)
    }

    /// Bodies currently subscribed to a source
    pub fn subscribers(&self, source: SourceId) -> Vec<BodyId> {
        self.bodies
            .values()
            .filter(|b| b.has_source(source))
            .map(|b| b.body())
            .collect()
    }

    /// Switch a source between trigger-bounded and scan-driven membership.
    /// Going back to bounded drops bodies outside the volume and picks up the
    /// ones inside it.
    pub fn set_unlimited_range(&mut self, id: SourceId, unlimited_range: bool, physics: &PhysicsWorld) -> GravityResult<()> {
        let source = self.sources.get_mut(&id).ok_or(GravityError::UnknownSource(id))?;
        if source.unlimited_range() == unlimited_range {
            return Ok(());
        }
        source.set_unlimited_range(unlimited_range);

        if unlimited_range {
            return Ok(());
        }

        let inside: BTreeSet<BodyId> = source
            .trigger()
            .map(|trigger| physics.bodies_in_trigger(trigger).into_iter().collect())
            .unwrap_or_default();

        for body in self.bodies.values_mut() {
            if inside.contains(&body.body()) {
                body.add_source(id);
            } else {
                body.remove_source(id);
            }
        }

        debug!(source = ?id, inside = inside.len(), "membership resynced with detection volume");
        Ok(())
    }

    /// Apply membership changes reported by the physics step. Events for
    /// unknown triggers or bodies, and for unlimited-range sources, are ignored.
    pub fn handle_trigger_events(&mut self, events: &[TriggerEvent]) {
        for event in events {
            let Some(&source_id) = self.triggers.get(&event.trigger) else {
                continue;
            };
            let Some(source) = self.sources.get(&source_id) else {
                continue;
            };
            if source.unlimited_range() {
                continue;
            }
            let Some(body) = self.bodies.get_mut(&event.body) else {
                continue;
            };

            match event.kind {
                TriggerEventKind::Enter => body.add_source(source_id),
                TriggerEventKind::Exit => body.remove_source(source_id),
            };
        }
    }

    /// Apply every subscribed source to every gravity-enabled body, then run
    /// the registry scans that are due.
    pub fn update(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        for gravity_body in self.bodies.values_mut() {
            if !gravity_body.gravity_enabled() {
                continue;
            }
            let Some(rigid_body) = physics.get_body_mut(gravity_body.body()) else {
                continue;
            };

            let mut stale = Vec::new();
            for source_id in gravity_body.sources() {
                match self.sources.get(&source_id) {
                    Some(source) => {
                        source.apply_gravity(rigid_body, dt);
                    }
                    None => stale.push(source_id),
                }
            }
            for source_id in stale {
                gravity_body.remove_source(source_id);
            }
        }

        let due: Vec<SourceId> = self
            .sources
            .values_mut()
            .filter_map(|source| source.tick(dt).then_some(source.id()))
            .collect();

        for source_id in due {
            self.scan(source_id, physics);
        }
    }

    /// Subscribe every registered body of a matching dimension to the source
    fn scan(&mut self, source_id: SourceId, physics: &PhysicsWorld) {
        let Some(source) = self.sources.get(&source_id) else {
            return;
        };
        let dimension = source.dimension();

        let mut attached = 0;
        for body in self.bodies.values_mut() {
            let eligible = physics
                .get_body(body.body())
                .is_some_and(|rigid_body| rigid_body.dimension() == dimension);

            if eligible && body.add_source(source_id) {
                attached += 1;
            }
        }

        debug!(source = ?source_id, attached, "registry scan");
    }

    /// Run one whole frame: gravity, physics step, trigger membership.
    /// A paused frame (dt <= 0) applies no gravity and runs no scans, but
    /// trigger membership still follows bodies that were moved.
    pub fn frame(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        if dt > 0.0 {
            self.update(physics, dt);
        }
        physics.step(dt);

        let events = physics.drain_trigger_events();
        self.handle_trigger_events(&events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        collision::Collider,
        physics::{gravity::Axis, rigid_body::RigidBody, SpaceDimension},
    };

    fn add_ball(physics: &mut PhysicsWorld, position: Vec3) -> BodyId {
        physics.add_body(RigidBody::new_dynamic(BodyId(0), position, Collider::new_sphere(position, 0.5), 1.0))
    }

    fn add_disc(physics: &mut PhysicsWorld, x: f32, y: f32) -> BodyId {
        physics.add_body(RigidBody::new_dynamic(
            BodyId(0),
            Vec3::new(x, y, 0.0),
            Collider::new_circle(x, y, 0.5),
            1.0,
        ))
    }

    #[test]
    fn trigger_enter_subscribes_and_exit_unsubscribes() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let source = gravity.add_source(GravitySourceConfig::spherical(5.0), Vec3::ZERO, &mut physics);

        let body = add_ball(&mut physics, Vec3::new(0.0, 20.0, 0.0));
        gravity.add_body(body, &mut physics).unwrap();

        gravity.frame(&mut physics, 0.02);
        assert_eq!(gravity.body(body).unwrap().source_count(), 0);

        physics.get_body_mut(body).unwrap().set_position(Vec3::new(0.0, 3.0, 0.0));
        gravity.frame(&mut physics, 0.0001);
        assert!(gravity.body(body).unwrap().has_source(source));

        physics.get_body_mut(body).unwrap().set_position(Vec3::new(0.0, 30.0, 0.0));
        gravity.frame(&mut physics, 0.0001);
        assert!(!gravity.body(body).unwrap().has_source(source));
    }

    #[test]
    fn membership_changes_apply_next_frame() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        gravity.add_source(GravitySourceConfig::spherical(5.0), Vec3::ZERO, &mut physics);

        let body = add_ball(&mut physics, Vec3::new(0.0, 2.0, 0.0));
        gravity.add_body(body, &mut physics).unwrap();

        // The overlap is only detected during this frame's step
        gravity.frame(&mut physics, 0.01);
        assert_eq!(physics.get_body(body).unwrap().velocity, Vec3::ZERO);

        gravity.frame(&mut physics, 0.01);
        assert!(physics.get_body(body).unwrap().velocity.y < 0.0);
    }

    #[test]
    fn paused_frames_do_not_stack_forces() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let source = gravity.add_source(GravitySourceConfig::spherical(50.0).with_force(-9.81), Vec3::ZERO, &mut physics);
        let body = add_ball(&mut physics, Vec3::new(0.0, 10.0, 0.0));
        gravity.add_body(body, &mut physics).unwrap();

        gravity.frame(&mut physics, 0.01);
        assert!(gravity.body(body).unwrap().has_source(source));

        for _ in 0..11 {
            gravity.frame(&mut physics, 0.0);
        }
        let state = physics.get_body(body).unwrap();
        assert_eq!(state.accumulated_force(), Vec3::ZERO);
        assert_eq!(state.velocity, Vec3::ZERO);

        gravity.update(&mut physics, 0.01);
        assert_eq!(physics.get_body(body).unwrap().accumulated_force(), Vec3::new(0.0, -9.81, 0.0));

        physics.step(0.01);
        let velocity = physics.get_body(body).unwrap().velocity;
        assert!((velocity.y + 0.0981).abs() < 1e-5, "{velocity:?}");
    }

    #[test]
    fn paused_frames_still_track_membership() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let source = gravity.add_source(GravitySourceConfig::spherical(5.0), Vec3::ZERO, &mut physics);
        let body = add_ball(&mut physics, Vec3::new(0.0, 100.0, 0.0));
        gravity.add_body(body, &mut physics).unwrap();
        gravity.frame(&mut physics, 0.01);

        physics.get_body_mut(body).unwrap().set_position(Vec3::new(0.0, 2.0, 0.0));
        gravity.frame(&mut physics, 0.0);
        assert!(gravity.body(body).unwrap().has_source(source));
    }

    #[test]
    fn editing_a_source_keeps_its_volume_wired() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let source = gravity.add_source(GravitySourceConfig::spherical(1.0), Vec3::ZERO, &mut physics);

        let editable = gravity.source_mut(source).unwrap();
        editable.set_radius(5.0, &mut physics);
        editable.set_position(Vec3::new(0.0, 1.0, 0.0), &mut physics);

        let body = add_ball(&mut physics, Vec3::new(0.0, 3.0, 0.0));
        gravity.add_body(body, &mut physics).unwrap();
        for _ in 0..3 {
            gravity.frame(&mut physics, 0.001);
        }
        assert!(gravity.body(body).unwrap().has_source(source));
    }

    #[test]
    fn bodies_registered_inside_a_volume_are_picked_up() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let source = gravity.add_source(GravitySourceConfig::spherical(5.0), Vec3::ZERO, &mut physics);

        let body = add_ball(&mut physics, Vec3::new(1.0, 1.0, 0.0));
        physics.step(0.01);
        physics.drain_trigger_events();

        gravity.add_body(body, &mut physics).unwrap();
        assert!(gravity.body(body).unwrap().has_source(source));
    }

    #[test]
    fn unlimited_range_scan_attaches_every_eligible_body() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let config = GravitySourceConfig::spherical(1.0).with_unlimited_range(0.5);
        let source = gravity.add_source(config, Vec3::ZERO, &mut physics);

        let far: Vec<BodyId> = (1..=4)
            .map(|i| add_ball(&mut physics, Vec3::new(100.0 * i as f32, 0.0, 0.0)))
            .collect();
        let planar = add_disc(&mut physics, 50.0, 0.0);
        for &id in far.iter().chain([&planar]) {
            gravity.add_body(id, &mut physics).unwrap();
        }

        gravity.update(&mut physics, 0.25);
        assert!(gravity.subscribers(source).is_empty());

        gravity.update(&mut physics, 0.25);
        assert_eq!(gravity.subscribers(source), far);
        assert!(!gravity.body(planar).unwrap().has_source(source));
    }

    #[test]
    fn unlimited_sources_ignore_trigger_exits() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let config = GravitySourceConfig::spherical(5.0).with_unlimited_range(0.0);
        let source = gravity.add_source(config, Vec3::ZERO, &mut physics);

        let body = add_ball(&mut physics, Vec3::new(0.0, 2.0, 0.0));
        gravity.add_body(body, &mut physics).unwrap();
        gravity.frame(&mut physics, 0.0001);
        assert!(gravity.body(body).unwrap().has_source(source));

        physics.get_body_mut(body).unwrap().set_position(Vec3::new(0.0, 500.0, 0.0));
        gravity.frame(&mut physics, 0.0001);
        assert!(gravity.body(body).unwrap().has_source(source));
    }

    #[test]
    fn leaving_unlimited_range_resyncs_with_the_volume() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let config = GravitySourceConfig::spherical(5.0).with_unlimited_range(0.0);
        let source = gravity.add_source(config, Vec3::ZERO, &mut physics);

        let inside = add_ball(&mut physics, Vec3::new(0.0, 2.0, 0.0));
        let outside = add_ball(&mut physics, Vec3::new(0.0, 200.0, 0.0));
        gravity.add_body(inside, &mut physics).unwrap();
        gravity.add_body(outside, &mut physics).unwrap();
        gravity.frame(&mut physics, 0.0001);
        assert_eq!(gravity.subscribers(source), vec![inside, outside]);

        gravity.set_unlimited_range(source, false, &physics).unwrap();
        assert_eq!(gravity.subscribers(source), vec![inside]);
    }

    #[test]
    fn destroying_a_source_unsubscribes_every_body() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let source = gravity.add_source(GravitySourceConfig::spherical(50.0), Vec3::ZERO, &mut physics);
        let other = gravity.add_source(
            GravitySourceConfig::directional(Axis::Y, Vec3::splat(100.0)),
            Vec3::ZERO,
            &mut physics,
        );

        let bodies: Vec<BodyId> = (0..3)
            .map(|i| add_ball(&mut physics, Vec3::new(i as f32, 5.0, 0.0)))
            .collect();
        for &id in &bodies {
            gravity.add_body(id, &mut physics).unwrap();
        }
        gravity.frame(&mut physics, 0.0001);
        assert_eq!(gravity.subscribers(source).len(), 3);

        let removed = gravity.remove_source(source, &mut physics).unwrap();
        assert_eq!(removed.id(), source);
        assert!(gravity.subscribers(source).is_empty());
        assert_eq!(gravity.subscribers(other), bodies);
        assert!(removed.trigger().is_none());

        // The exit events from the dropped volume are harmless
        gravity.frame(&mut physics, 0.0001);
        assert!(gravity.subscribers(source).is_empty());
        assert!(matches!(
            gravity.remove_source(source, &mut physics),
            Err(GravityError::UnknownSource(_))
        ));
    }

    #[test]
    fn disabled_bodies_feel_nothing_until_reenabled() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let source = gravity.add_source(GravitySourceConfig::spherical(5.0), Vec3::ZERO, &mut physics);
        let body = add_ball(&mut physics, Vec3::new(0.0, 3.0, 0.0));
        gravity.add_body(body, &mut physics).unwrap();
        gravity.frame(&mut physics, 0.0001);

        gravity.set_gravity_enabled(body, false).unwrap();
        gravity.update(&mut physics, 0.02);
        assert_eq!(physics.get_body(body).unwrap().accumulated_force(), Vec3::ZERO);
        assert!(gravity.body(body).unwrap().has_source(source));

        gravity.set_gravity_enabled(body, true).unwrap();
        gravity.update(&mut physics, 0.02);
        assert!(physics.get_body(body).unwrap().accumulated_force().y < 0.0);
    }

    #[test]
    fn subscribe_rejects_dead_sources() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let source = gravity.add_source(GravitySourceConfig::spherical(5.0), Vec3::ZERO, &mut physics);
        let body = add_ball(&mut physics, Vec3::new(0.0, 300.0, 0.0));
        gravity.add_body(body, &mut physics).unwrap();

        assert!(gravity.subscribe(body, source).unwrap());
        assert!(!gravity.subscribe(body, source).unwrap());
        assert!(matches!(gravity.subscribe(body, SourceId(99)), Err(GravityError::UnknownSource(_))));
        assert!(matches!(gravity.subscribe(BodyId(99), source), Err(GravityError::UnknownBody(_))));

        assert!(gravity.unsubscribe(body, source));
        assert!(!gravity.unsubscribe(body, source));
        assert!(!gravity.unsubscribe(BodyId(99), source));
    }

    #[test]
    fn sources_only_pull_bodies_of_their_dimension() {
        let mut physics = PhysicsWorld::new();
        let mut gravity = GravitySystem::new();
        let flat = gravity.add_source(
            GravitySourceConfig::spherical(5.0).with_dimension(SpaceDimension::TwoD),
            Vec3::ZERO,
            &mut physics,
        );
        let ball = add_ball(&mut physics, Vec3::new(0.0, 3.0, 0.0));
        gravity.add_body(ball, &mut physics).unwrap();

        // Forced subscription across dimensions still applies nothing
        gravity.subscribe(ball, flat).unwrap();
        gravity.update(&mut physics, 0.02);
        assert_eq!(physics.get_body(ball).unwrap().accumulated_force(), Vec3::ZERO);
    }
}
