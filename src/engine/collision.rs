use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::engine::physics::SpaceDimension;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CollisionShape {
    Rectangle { width: f32, height: f32 },
    Circle { radius: f32 },
    Cuboid { size: Vec3 },
    Sphere { radius: f32 },
}

impl CollisionShape {
    pub fn dimension(&self) -> SpaceDimension {
        match self {
            CollisionShape::Rectangle { .. } | CollisionShape::Circle { .. } => SpaceDimension::TwoD,
            CollisionShape::Cuboid { .. } | CollisionShape::Sphere { .. } => SpaceDimension::ThreeD,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collider {
    /// Center of the shape. 2D shapes only read x and y.
    pub position: Vec3,
    pub shape: CollisionShape,
    pub is_trigger: bool,  // If true, detects overlaps but doesn't block movement
}

impl Collider {
    pub fn new_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec3::new(x, y, 0.0),
            shape: CollisionShape::Rectangle { width, height },
            is_trigger: false,
        }
    }

    pub fn new_circle(x: f32, y: f32, radius: f32) -> Self {
        Self {
            position: Vec3::new(x, y, 0.0),
            shape: CollisionShape::Circle { radius },
            is_trigger: false,
        }
    }

    pub fn new_cuboid(position: Vec3, size: Vec3) -> Self {
        Self {
            position,
            shape: CollisionShape::Cuboid { size },
            is_trigger: false,
        }
    }

    pub fn new_sphere(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            shape: CollisionShape::Sphere { radius },
            is_trigger: false,
        }
    }

    pub fn as_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    pub fn dimension(&self) -> SpaceDimension {
        self.shape.dimension()
    }
}

/// Overlap test between two colliders. Shapes living in different
/// dimensions never overlap.
pub fn check_collision(a: &Collider, b: &Collider) -> bool {
    let (pa, pb) = (a.position.truncate(), b.position.truncate());

    match (&a.shape, &b.shape) {
        (CollisionShape::Rectangle { width: w1, height: h1 },
         CollisionShape::Rectangle { width: w2, height: h2 }) => {
            aabb_vs_aabb(pa, Vec2::new(*w1, *h1), pb, Vec2::new(*w2, *h2))
        },
        (CollisionShape::Circle { radius: r1 },
         CollisionShape::Circle { radius: r2 }) => {
            circle_vs_circle(pa, *r1, pb, *r2)
        },
        (CollisionShape::Rectangle { width, height },
         CollisionShape::Circle { radius }) => {
            aabb_vs_circle(pa, Vec2::new(*width, *height), pb, *radius)
        },
        (CollisionShape::Circle { radius },
         CollisionShape::Rectangle { width, height }) => {
            aabb_vs_circle(pb, Vec2::new(*width, *height), pa, *radius)
        },
        (CollisionShape::Cuboid { size: s1 }, CollisionShape::Cuboid { size: s2 }) => {
            box_vs_box(a.position, *s1, b.position, *s2)
        },
        (CollisionShape::Sphere { radius: r1 }, CollisionShape::Sphere { radius: r2 }) => {
            let radius_sum = r1 + r2;
            (a.position - b.position).length_squared() <= radius_sum * radius_sum
        },
        (CollisionShape::Cuboid { size }, CollisionShape::Sphere { radius }) => {
            box_vs_sphere(a.position, *size, b.position, *radius)
        },
        (CollisionShape::Sphere { radius }, CollisionShape::Cuboid { size }) => {
            box_vs_sphere(b.position, *size, a.position, *radius)
        },
        _ => false,
    }
}

fn aabb_vs_aabb(pos1: Vec2, size1: Vec2, pos2: Vec2, size2: Vec2) -> bool {
    // Convert from center position to min/max bounds
    let (min1, max1) = (pos1 - size1 / 2.0, pos1 + size1 / 2.0);
    let (min2, max2) = (pos2 - size2 / 2.0, pos2 + size2 / 2.0);

    (min1.x < max2.x) &&
    (max1.x > min2.x) &&
    (min1.y < max2.y) &&
    (max1.y > min2.y)
}

fn circle_vs_circle(pos1: Vec2, r1: f32, pos2: Vec2, r2: f32) -> bool {
    let distance_sq = (pos1 - pos2).length_squared();
    let radius_sum = r1 + r2;
    distance_sq <= radius_sum * radius_sum
}

fn aabb_vs_circle(rect_pos: Vec2, size: Vec2, circle_pos: Vec2, radius: f32) -> bool {
    let closest = circle_pos.clamp(rect_pos - size / 2.0, rect_pos + size / 2.0);
    (circle_pos - closest).length_squared() <= radius * radius
}

fn box_vs_box(pos1: Vec3, size1: Vec3, pos2: Vec3, size2: Vec3) -> bool {
    let (min1, max1) = (pos1 - size1 / 2.0, pos1 + size1 / 2.0);
    let (min2, max2) = (pos2 - size2 / 2.0, pos2 + size2 / 2.0);

    min1.cmplt(max2).all() && max1.cmpgt(min2).all()
}

fn box_vs_sphere(box_pos: Vec3, size: Vec3, sphere_pos: Vec3, radius: f32) -> bool {
    let closest = sphere_pos.clamp(box_pos - size / 2.0, box_pos + size / 2.0);
    (sphere_pos - closest).length_squared() <= radius * radius
}
