use gravclog::engine::{
    collision::Collider,
    physics::{Axis, BodyId, GravitySourceConfig, GravitySystem, PhysicsWorld, RigidBody, SpaceDimension},
};
use glam::Vec3;

fn ball(physics: &mut PhysicsWorld, position: Vec3) -> BodyId {
    physics.add_body(RigidBody::new_dynamic(BodyId(0), position, Collider::new_sphere(position, 0.5), 1.0))
}

#[test]
fn body_falls_toward_a_planet() {
    let mut physics = PhysicsWorld::new();
    physics.set_global_gravity(Vec3::new(0.0, 0.0, -9.81));
    let mut gravity = GravitySystem::new();
    gravity.add_source(GravitySourceConfig::spherical(50.0), Vec3::ZERO, &mut physics);

    let body = ball(&mut physics, Vec3::new(0.0, 10.0, 0.0));
    gravity.add_body(body, &mut physics).unwrap();

    for _ in 0..60 {
        gravity.frame(&mut physics, 1.0 / 60.0);
    }

    let state = physics.get_body(body).unwrap();
    assert!(state.position.y < 10.0);
    assert!(state.velocity.y < 0.0);
    // World gravity is switched off for gravity bodies
    assert_eq!(state.position.z, 0.0);
}

#[test]
fn body_leaving_a_directional_field_stops_accelerating() {
    let mut physics = PhysicsWorld::new();
    let mut gravity = GravitySystem::new();
    let field = gravity.add_source(
        GravitySourceConfig::directional(Axis::X, Vec3::new(4.0, 4.0, 4.0)).with_force(-20.0),
        Vec3::ZERO,
        &mut physics,
    );

    let body = ball(&mut physics, Vec3::ZERO);
    gravity.add_body(body, &mut physics).unwrap();

    let mut left_field = false;
    for _ in 0..600 {
        gravity.frame(&mut physics, 1.0 / 60.0);
        if !gravity.body(body).unwrap().has_source(field) && physics.get_body(body).unwrap().position.x < -3.0 {
            left_field = true;
            break;
        }
    }
    assert!(left_field);

    let exit_velocity = physics.get_body(body).unwrap().velocity;
    for _ in 0..30 {
        gravity.frame(&mut physics, 1.0 / 60.0);
    }
    assert_eq!(physics.get_body(body).unwrap().velocity, exit_velocity);
}

#[test]
fn bidirectional_field_pulls_both_sides_inward() {
    let mut physics = PhysicsWorld::new();
    let mut gravity = GravitySystem::new();
    gravity.add_source(
        GravitySourceConfig::directional(Axis::Y, Vec3::splat(40.0)).with_bidirectional(true),
        Vec3::ZERO,
        &mut physics,
    );

    let above = ball(&mut physics, Vec3::new(0.0, 8.0, 0.0));
    let below = ball(&mut physics, Vec3::new(0.0, -8.0, 0.0));
    gravity.add_body(above, &mut physics).unwrap();
    gravity.add_body(below, &mut physics).unwrap();

    for _ in 0..10 {
        gravity.frame(&mut physics, 1.0 / 60.0);
    }

    assert!(physics.get_body(above).unwrap().velocity.y < 0.0);
    assert!(physics.get_body(below).unwrap().velocity.y > 0.0);
}

#[test]
fn overlapping_sources_add_up() {
    let mut physics = PhysicsWorld::new();
    let mut gravity = GravitySystem::new();
    let config = GravitySourceConfig::directional(Axis::Y, Vec3::splat(20.0)).with_force(-1.0);
    let a = gravity.add_source(config.clone(), Vec3::ZERO, &mut physics);
    let b = gravity.add_source(config.with_force(-2.0), Vec3::ZERO, &mut physics);

    let body = ball(&mut physics, Vec3::ZERO);
    gravity.add_body(body, &mut physics).unwrap();
    gravity.frame(&mut physics, 0.0001);
    assert_eq!(gravity.subscribers(a), vec![body]);
    assert_eq!(gravity.subscribers(b), vec![body]);

    gravity.update(&mut physics, 0.0);
    assert_eq!(physics.get_body(body).unwrap().accumulated_force(), Vec3::new(0.0, -3.0, 0.0));
}

#[test]
fn unlimited_planar_source_reaches_far_discs() {
    let mut physics = PhysicsWorld::new();
    let mut gravity = GravitySystem::new();
    let source = gravity.add_source(
        GravitySourceConfig::spherical(1.0)
            .with_dimension(SpaceDimension::TwoD)
            .with_unlimited_range(0.1),
        Vec3::ZERO,
        &mut physics,
    );

    let discs: Vec<BodyId> = [(1000.0, 0.0), (0.0, -750.0), (-20.0, 20.0)]
        .into_iter()
        .map(|(x, y)| {
            physics.add_body(RigidBody::new_dynamic(
                BodyId(0),
                Vec3::new(x, y, 0.0),
                Collider::new_circle(x, y, 1.0),
                2.0,
            ))
        })
        .collect();
    for &disc in &discs {
        gravity.add_body(disc, &mut physics).unwrap();
    }

    for _ in 0..10 {
        gravity.frame(&mut physics, 1.0 / 60.0);
    }

    assert_eq!(gravity.subscribers(source), discs);
    for &disc in &discs {
        let state = physics.get_body(disc).unwrap();
        // Moving toward the origin
        assert!(state.velocity.dot(state.position) < 0.0);
    }
}

#[test]
fn removing_a_rigid_body_leaves_the_rest_running() {
    let mut physics = PhysicsWorld::new();
    let mut gravity = GravitySystem::new();
    let source = gravity.add_source(GravitySourceConfig::spherical(30.0), Vec3::ZERO, &mut physics);

    let keep = ball(&mut physics, Vec3::new(0.0, 5.0, 0.0));
    let gone = ball(&mut physics, Vec3::new(0.0, -5.0, 0.0));
    gravity.add_body(keep, &mut physics).unwrap();
    gravity.add_body(gone, &mut physics).unwrap();
    gravity.frame(&mut physics, 0.01);

    physics.remove_body(gone);
    for _ in 0..5 {
        gravity.frame(&mut physics, 0.01);
    }

    // The exit event from the removal drops the subscription
    assert_eq!(gravity.subscribers(source), vec![keep]);
    assert!(gravity.remove_body(gone).is_some());
    assert!(physics.get_body(keep).unwrap().velocity.y < 0.0);
}
