//! Combat system - firing, projectiles, hit detection, damage

use uuid::Uuid;

use super::entity::Barrier;
use super::geometry::{direction, outside_bounds, point_in_inflated_square, Vec2};
use super::input::{buttons, keys, InputState};

/// Active projectile in the world
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    /// Player that fired it; display only, it can outlive that player
    pub owner_id: Uuid,
    pub position: Vec2,
    /// Constant per-tick displacement
    pub velocity: Vec2,
}

impl Projectile {
    pub fn new(owner_id: Uuid, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            position,
            velocity,
        }
    }

    /// Spawn a projectile fired from `origin` towards `cursor`.
    ///
    /// It starts `muzzle_offset` units along the aim direction and travels at
    /// `speed` per tick. Returns `None` when the cursor sits exactly on the
    /// shooter, since there is no aim direction.
    pub fn fire(owner_id: Uuid, origin: Vec2, cursor: Vec2, muzzle_offset: f32, speed: f32) -> Option<Self> {
        let aim = direction(origin, cursor)?;
        Some(Self::new(owner_id, origin + aim * muzzle_offset, aim * speed))
    }

    /// Dead-reckon one tick
    pub fn advance(&mut self) {
        self.position += self.velocity;
    }
}

/// Why a projectile left the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    HitPlayer { target_id: Uuid },
    Barrier,
    OutOfBounds,
}

/// Combat rules shared by the tick loop
pub struct CombatSystem;

impl CombatSystem {
    /// Primary mouse button or space bar held
    pub fn wants_fire(input: &InputState) -> bool {
        input.mouse.held(buttons::LEFT) || input.keyboard.held(keys::SPACE)
    }

    /// Cooldown must be strictly exceeded
    pub fn can_fire(now: f64, last_shot_time: f64, cooldown: f64) -> bool {
        now - last_shot_time > cooldown
    }

    /// Health after a hit; negative values are kept so death can be detected later
    pub fn apply_damage(health: i32, damage: i32) -> i32 {
        health.saturating_sub(damage)
    }

    /// Inside any barrier inflated by `margin`
    pub fn hits_barrier(position: Vec2, barriers: &[Barrier], margin: f32) -> bool {
        barriers
            .iter()
            .any(|b| point_in_inflated_square(position, b.position, b.size, margin))
    }

    pub fn out_of_bounds(position: Vec2, limit: f32) -> bool {
        outside_bounds(position, limit)
    }
}
