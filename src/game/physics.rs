//! Player movement and barrier collision response

use super::entity::Barrier;
use super::geometry::{bearing_degrees, circle_overlaps_square, Vec2};
use super::input::{keys, InputState};

/// Physics system for turning held input into per-tick player displacement
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Per-tick displacement from the held movement keys.
    /// Each axis is independent; opposite keys cancel.
    pub fn movement_delta(input: &InputState, speed: f32) -> Vec2 {
        let mut delta = Vec2::ZERO;
        if input.keyboard.held(keys::W) {
            delta.y -= speed;
        }
        if input.keyboard.held(keys::S) {
            delta.y += speed;
        }
        if input.keyboard.held(keys::A) {
            delta.x -= speed;
        }
        if input.keyboard.held(keys::D) {
            delta.x += speed;
        }
        delta
    }

    /// Facing angle of a player at `position` aiming at `cursor`
    pub fn facing_angle(position: Vec2, cursor: Vec2) -> f32 {
        bearing_degrees(position, cursor)
    }

    /// Clamp `delta` against every barrier the player currently overlaps.
    ///
    /// For each overlapped barrier, a movement component is zeroed when it
    /// would carry the player further into that barrier from the side the
    /// player is on. The other component is kept, so players slide along
    /// barrier faces.
    pub fn resolve_barriers(position: Vec2, delta: Vec2, radius: f32, barriers: &[Barrier]) -> Vec2 {
        let mut delta = delta;

        for barrier in barriers
            .iter()
            .filter(|b| circle_overlaps_square(position, radius, b.position, b.size))
        {
            if position.x < barrier.position.x && delta.x > 0.0 {
                delta.x = 0.0;
            }
            if position.x > barrier.position.x + barrier.size && delta.x < 0.0 {
                delta.x = 0.0;
            }
            if position.y < barrier.position.y && delta.y > 0.0 {
                delta.y = 0.0;
            }
            if position.y > barrier.position.y + barrier.size && delta.y < 0.0 {
                delta.y = 0.0;
            }
        }

        delta
    }
}
