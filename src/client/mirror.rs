//! Client-side copy of the world, extrapolated every frame and pulled
//! toward the positions the server reports

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::game::entity::STARTING_HEALTH;
use crate::game::geometry::Vec2;
use crate::ws::protocol::ServerEvent;

use super::reconcile::Reconciler;

/// A player as seen by this client
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorPlayer {
    pub id: Uuid,
    /// Extrapolated, displayed position
    pub position: Vec2,
    /// Last authoritative position
    pub server_position: Vec2,
    pub velocity: Vec2,
    /// Degrees
    pub angle: f32,
    pub health: i32,
}

impl MirrorPlayer {
    fn new(id: Uuid, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id,
            position,
            server_position: position,
            velocity,
            angle: 0.0,
            health: STARTING_HEALTH,
        }
    }
}

/// A projectile as seen by this client. Never corrected after spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorProjectile {
    pub id: Uuid,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Everything the client knows about the world
#[derive(Debug, Default)]
pub struct ClientMirror {
    self_id: Option<Uuid>,
    barriers: Vec<Vec2>,
    players: HashMap<Uuid, MirrorPlayer>,
    projectiles: HashMap<Uuid, MirrorProjectile>,
    dead: bool,
    reconciler: Reconciler,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reconciler(reconciler: Reconciler) -> Self {
        Self {
            reconciler,
            ..Self::default()
        }
    }

    /// Id assigned by the server, known once `configure` arrived
    pub fn self_id(&self) -> Option<Uuid> {
        self.self_id
    }

    /// Top-left corners of every barrier
    pub fn barriers(&self) -> &[Vec2] {
        &self.barriers
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn player(&self, id: Uuid) -> Option<&MirrorPlayer> {
        self.players.get(&id)
    }

    pub fn own_player(&self) -> Option<&MirrorPlayer> {
        self.self_id.and_then(|id| self.players.get(&id))
    }

    pub fn players(&self) -> impl Iterator<Item = &MirrorPlayer> {
        self.players.values()
    }

    pub fn projectile(&self, id: Uuid) -> Option<&MirrorProjectile> {
        self.projectiles.get(&id)
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &MirrorProjectile> {
        self.projectiles.values()
    }

    /// Apply one server event. Events naming unknown ids are ignored.
    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::Configure(configure) => {
                self.self_id = Some(configure.id);
                self.barriers = configure.barriers.clone();
                info!(player_id = %configure.id, barriers = self.barriers.len(), "Configured by server");
            }
            ServerEvent::PlayerConnect(connect) => {
                let mut player = MirrorPlayer::new(connect.id, connect.posn, connect.velocity);
                player.health = connect.health;
                self.players.insert(connect.id, player);
            }
            ServerEvent::PlayerDisconnect(entity) => {
                self.players.remove(&entity.id);
            }
            ServerEvent::PlayerHit(hit) => {
                if let Some(player) = self.players.get_mut(&hit.id) {
                    player.health -= hit.damage;
                }
            }
            ServerEvent::PlayerPosn(posn) => {
                if let Some(player) = self.players.get_mut(&posn.id) {
                    player.server_position = posn.posn;
                    player.velocity = posn.velocity;
                    player.angle = posn.angle;
                }
            }
            ServerEvent::PlayerDied(entity) => {
                if Some(entity.id) == self.self_id {
                    info!(player_id = %entity.id, "Own player died");
                    self.dead = true;
                } else {
                    self.players.remove(&entity.id);
                }
            }
            ServerEvent::SpawnBullet(spawn) => {
                self.projectiles.insert(
                    spawn.id,
                    MirrorProjectile {
                        id: spawn.id,
                        position: spawn.posn,
                        velocity: spawn.velocity,
                    },
                );
            }
            ServerEvent::KillBullet(entity) => {
                self.projectiles.remove(&entity.id);
            }
            ServerEvent::Pong(_) => {
                debug!("Pong carries no world state");
            }
        }
    }

    /// Advance one frame: projectiles dead-reckon, players extrapolate and
    /// then converge on their server position. Frozen once dead.
    pub fn frame(&mut self) {
        if self.dead {
            return;
        }

        for projectile in self.projectiles.values_mut() {
            projectile.position += projectile.velocity;
        }

        // The own player is corrected the same way as everyone else
        for player in self.players.values_mut() {
            let extrapolated = player.position + player.velocity;
            player.position = self.reconciler.reconcile(extrapolated, player.server_position);
        }
    }
}
