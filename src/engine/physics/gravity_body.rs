use std::collections::BTreeSet;

use tracing::debug;

use crate::engine::{
    error::{GravityError, GravityResult},
    physics::{gravity::SourceId, physics_world::PhysicsWorld, rigid_body::BodyId},
};

/// Gravity-side state of a rigid body: which sources currently pull on it and
/// whether they are allowed to.
#[derive(Debug, Clone)]
pub struct GravityBody {
    body: BodyId,
    gravity_enabled: bool,
    sources: BTreeSet<SourceId>,
}

impl GravityBody {
    pub fn new(body: BodyId) -> Self {
        Self {
            body,
            gravity_enabled: true,
            sources: BTreeSet::new(),
        }
    }

    /// Switch off the world's built-in gravity for the backing rigid body.
    /// It is never turned back on from here.
    pub fn initialize(&self, physics: &mut PhysicsWorld) -> GravityResult<()> {
        let rigid_body = physics
            .get_body_mut(self.body)
            .ok_or(GravityError::MissingRigidBody(self.body))?;

        rigid_body.disable_builtin_gravity();
        Ok(())
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Disabling keeps the subscriptions, it only stops force application
    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    /// Subscribe to a source. Returns false if it was already subscribed.
    pub fn add_source(&mut self, source: SourceId) -> bool {
        let added = self.sources.insert(source);
        if added {
            debug!(body = ?self.body, ?source, "subscribed to gravity source");
        }
        added
    }

    /// Unsubscribe from a source. Returns false if it was not subscribed.
    pub fn remove_source(&mut self, source: SourceId) -> bool {
        let removed = self.sources.remove(&source);
        if removed {
            debug!(body = ?self.body, ?source, "unsubscribed from gravity source");
        }
        removed
    }

    pub fn has_source(&self, source: SourceId) -> bool {
        self.sources.contains(&source)
    }

    pub fn sources(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.iter().copied()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}
