//! Player and barrier records owned by the simulation

use rand::Rng;
use uuid::Uuid;

use super::geometry::Vec2;

/// Health every player spawns with
pub const STARTING_HEALTH: i32 = 100;

/// Grid cells (exclusive upper bound) used for barrier placement
const BARRIER_GRID_X: i32 = 20;
const BARRIER_GRID_Y: i32 = 6;

/// Authoritative player state
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub position: Vec2,
    /// Displacement applied on the last tick
    pub velocity: Vec2,
    /// Facing in degrees (bearing convention, see `geometry::bearing_degrees`)
    pub angle: f32,
    /// May go negative before the death event is broadcast
    pub health: i32,
    /// Monotonic seconds of the last shot
    pub last_shot_time: f64,
}

impl Player {
    pub fn new(id: Uuid, now: f64) -> Self {
        Self {
            id,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            health: STARTING_HEALTH,
            last_shot_time: now,
        }
    }

    /// Death is strictly below zero; exactly zero health is alive
    pub fn is_dead(&self) -> bool {
        self.health < 0
    }
}

/// Static square obstacle, positioned by its top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barrier {
    pub position: Vec2,
    pub size: f32,
}

impl Barrier {
    pub fn new(position: Vec2, size: f32) -> Self {
        Self { position, size }
    }

    /// Generate `count` barriers snapped to a grid of `size`-sided cells
    pub fn generate<R: Rng>(rng: &mut R, count: usize, size: f32) -> Vec<Barrier> {
        (0..count)
            .map(|_| {
                let cell_x = rng.gen_range(1..BARRIER_GRID_X);
                let cell_y = rng.gen_range(1..BARRIER_GRID_Y);
                Barrier::new(Vec2::new(cell_x as f32 * size, cell_y as f32 * size), size)
            })
            .collect()
    }
}
