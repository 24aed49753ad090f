//! 2D vectors, angles and the collision predicates used by the simulation

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point or displacement in world space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or `None` for a zero-length vector
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Some(Vec2::new(self.x / len, self.y / len))
        } else {
            None
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Unit vector pointing from `from` towards `to`
pub fn direction(from: Vec2, to: Vec2) -> Option<Vec2> {
    (to - from).normalized()
}

/// Bearing-style facing angle in degrees of `target` as seen from `origin`.
///
/// 0 points along +x and angles grow towards +y (screen "down"), which is the
/// rotation the client applies to the player sprite.
pub fn bearing_degrees(origin: Vec2, target: Vec2) -> f32 {
    let radians = (target.x - origin.x).atan2(target.y - origin.y);
    -radians.to_degrees() + 90.0
}

/// Circle (center, radius) against an axis-aligned square given by its
/// top-left corner and side length.
///
/// Tangency is not an overlap.
pub fn circle_overlaps_square(center: Vec2, radius: f32, corner: Vec2, size: f32) -> bool {
    let half = size / 2.0;
    let dist_x = (center.x - corner.x - half).abs();
    let dist_y = (center.y - corner.y - half).abs();

    if dist_x >= half + radius || dist_y >= half + radius {
        return false;
    }
    if dist_x <= half || dist_y <= half {
        return true;
    }

    let dx = dist_x - half;
    let dy = dist_y - half;
    dx * dx + dy * dy < radius * radius
}

/// Point strictly inside a circle
pub fn circle_contains(center: Vec2, radius: f32, point: Vec2) -> bool {
    center.distance(point) < radius
}

/// Point strictly inside a square inflated by `margin` on every side
pub fn point_in_inflated_square(point: Vec2, corner: Vec2, size: f32, margin: f32) -> bool {
    let min_x = corner.x - margin;
    let max_x = corner.x + size + margin;
    let min_y = corner.y - margin;
    let max_y = corner.y + size + margin;

    point.x > min_x && point.x < max_x && point.y > min_y && point.y < max_y
}

/// Either coordinate beyond `limit` in magnitude
pub fn outside_bounds(point: Vec2, limit: f32) -> bool {
    point.x < -limit || point.x > limit || point.y < -limit || point.y > limit
}
