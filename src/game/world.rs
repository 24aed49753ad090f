//! World state and the authoritative tick loop

use std::sync::Arc;

use parking_lot::RwLock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::util::time::Timer;
use crate::ws::dispatch::TriggerRegistry;
use crate::ws::protocol::{
    ClientMsg, Configure, EntityRef, PlayerConnect, PlayerHit, PlayerPosn, ServerEvent, SpawnBullet,
};

use super::combat::{CombatSystem, Projectile, Termination};
use super::entity::Barrier;
use super::geometry::circle_contains;
use super::outbox::Outbox;
use super::physics::PhysicsSystem;
use super::session::{Session, SessionPhase};

/// Commands sent from connection tasks to the simulation task
#[derive(Debug)]
pub enum WorldCommand {
    /// A socket was accepted; frames for it go to `outbound`
    Connect {
        id: Uuid,
        outbound: mpsc::Sender<String>,
    },
    /// A decoded client message
    Input { id: Uuid, msg: ClientMsg },
    /// The socket closed
    Disconnect { id: Uuid },
}

/// Counters published after every tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub tick: u64,
    pub players: usize,
    pub projectiles: usize,
    pub barriers: usize,
}

/// The whole simulation: sessions, projectiles and static geometry
pub struct World {
    config: GameConfig,
    tick: u64,
    sessions: Vec<Session>,
    projectiles: Vec<Projectile>,
    barriers: Vec<Barrier>,
    triggers: TriggerRegistry,
}

impl World {
    /// Create a world with a freshly generated barrier layout
    pub fn new(config: GameConfig) -> Self {
        let mut rng = match config.barrier_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let barriers = Barrier::generate(&mut rng, config.barrier_count, config.barrier_size);
        Self::with_barriers(config, barriers)
    }

    /// Create a world with an explicit barrier layout
    pub fn with_barriers(config: GameConfig, barriers: Vec<Barrier>) -> Self {
        Self {
            config,
            tick: 0,
            sessions: Vec::new(),
            projectiles: Vec::new(),
            barriers,
            triggers: TriggerRegistry::with_builtins(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    pub fn session_mut(&mut self, id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id() == id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }

    pub fn triggers_mut(&mut self) -> &mut TriggerRegistry {
        &mut self.triggers
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            tick: self.tick,
            players: self.sessions.len(),
            projectiles: self.projectiles.len(),
            barriers: self.barriers.len(),
        }
    }

    /// Register a new connection and tell everyone about it
    pub fn connect(&mut self, id: Uuid, outbound: mpsc::Sender<String>, now: f64, outbox: &mut Outbox) {
        if self.session(id).is_some() {
            warn!(player_id = %id, "Duplicate connection id, ignoring");
            return;
        }

        let session = Session::new(id, now, outbound);
        let announce = player_connect(&session);
        self.sessions.push(session);

        outbox.broadcast(announce);

        for existing in self.sessions.iter().filter(|s| s.id() != id) {
            outbox.send_to(id, player_connect(existing));
        }

        outbox.send_to(
            id,
            ServerEvent::Configure(Configure {
                id,
                barriers: self.barriers.iter().map(|b| b.position).collect(),
            }),
        );

        info!(player_id = %id, players = self.sessions.len(), "Player connected");
    }

    /// Drop a connection's session. Its projectiles stay in flight.
    pub fn disconnect(&mut self, id: Uuid, outbox: &mut Outbox) {
        let Some(index) = self.sessions.iter().position(|s| s.id() == id) else {
            return;
        };
        self.sessions.remove(index);
        outbox.broadcast(ServerEvent::PlayerDisconnect(EntityRef { id }));

        info!(player_id = %id, players = self.sessions.len(), "Player disconnected");
    }

    /// Buffer input or route a trigger for one connection
    pub fn handle_message(&mut self, id: Uuid, msg: ClientMsg, outbox: &mut Outbox) {
        if let ClientMsg::Trigger { trigger, data } = &msg {
            if self.session(id).is_some() {
                if let Some(reply) = self.triggers.dispatch(id, trigger, data) {
                    outbox.send_to(id, reply);
                }
            }
            return;
        }

        match self.session_mut(id) {
            Some(session) if session.is_alive() => session.buffer_input(&msg),
            Some(_) => {}
            None => debug!(player_id = %id, "Input for unknown session"),
        }
    }

    /// Apply a command from a connection task
    pub fn apply(&mut self, command: WorldCommand, now: f64, outbox: &mut Outbox) {
        match command {
            WorldCommand::Connect { id, outbound } => self.connect(id, outbound, now, outbox),
            WorldCommand::Input { id, msg } => self.handle_message(id, msg, outbox),
            WorldCommand::Disconnect { id } => self.disconnect(id, outbox),
        }
    }

    /// Put a projectile in flight and announce it
    pub fn spawn_projectile(&mut self, projectile: Projectile, outbox: &mut Outbox) {
        outbox.broadcast(spawn_bullet(&projectile));
        self.projectiles.push(projectile);
    }

    /// Advance the simulation by one tick at monotonic time `now` (seconds)
    pub fn tick(&mut self, now: f64, outbox: &mut Outbox) {
        self.tick += 1;
        self.advance_projectiles(outbox);
        self.simulate_players(now, outbox);
    }

    /// Move every projectile and remove those that hit something or left the world
    fn advance_projectiles(&mut self, outbox: &mut Outbox) {
        let mut projectiles = std::mem::take(&mut self.projectiles);

        projectiles.retain_mut(|projectile| {
            projectile.advance();

            let Some(termination) = self.termination(projectile) else {
                return true;
            };

            outbox.broadcast(ServerEvent::KillBullet(EntityRef { id: projectile.id }));

            if let Termination::HitPlayer { target_id } = termination {
                let damage = self.config.projectile_damage;
                outbox.broadcast(ServerEvent::PlayerHit(PlayerHit {
                    id: target_id,
                    damage,
                }));
                if let Some(target) = self.session_mut(target_id) {
                    target.player.health = CombatSystem::apply_damage(target.player.health, damage);
                }
            }

            false
        });

        self.projectiles = projectiles;
    }

    /// First matching termination condition: player, then barrier, then bounds
    fn termination(&self, projectile: &Projectile) -> Option<Termination> {
        let radius = self.config.player_radius;

        if let Some(target) = self
            .sessions
            .iter()
            .filter(|s| s.is_alive())
            .find(|s| circle_contains(s.player.position, radius, projectile.position))
        {
            return Some(Termination::HitPlayer {
                target_id: target.id(),
            });
        }

        if CombatSystem::hits_barrier(projectile.position, &self.barriers, self.config.barrier_inflate) {
            return Some(Termination::Barrier);
        }

        if CombatSystem::out_of_bounds(projectile.position, self.config.projectile_bounds) {
            return Some(Termination::OutOfBounds);
        }

        None
    }

    fn simulate_players(&mut self, now: f64, outbox: &mut Outbox) {
        let config = &self.config;
        let barriers = &self.barriers;
        let projectiles = &mut self.projectiles;

        for session in self.sessions.iter_mut().filter(|s| s.is_alive()) {
            let position = session.player.position;
            let cursor = session.input.cursor;
            let mut delta = PhysicsSystem::movement_delta(&session.input, config.move_speed);

            if CombatSystem::wants_fire(&session.input)
                && CombatSystem::can_fire(now, session.player.last_shot_time, config.fire_cooldown_secs)
            {
                if let Some(projectile) = Projectile::fire(
                    session.id(),
                    position,
                    cursor,
                    config.player_radius,
                    config.projectile_speed,
                ) {
                    outbox.broadcast(spawn_bullet(&projectile));
                    projectiles.push(projectile);
                    session.player.last_shot_time = now;
                }
            }

            session.player.angle = PhysicsSystem::facing_angle(position, cursor);

            delta = PhysicsSystem::resolve_barriers(position, delta, config.player_radius, barriers);
            session.player.position = position + delta;
            session.player.velocity = delta;

            outbox.broadcast(ServerEvent::PlayerPosn(PlayerPosn {
                id: session.id(),
                posn: session.player.position,
                velocity: session.player.velocity,
                angle: session.player.angle,
            }));

            if session.player.is_dead() {
                session.phase = SessionPhase::Dead;
                outbox.broadcast(ServerEvent::PlayerDied(EntityRef { id: session.id() }));
                info!(player_id = %session.id(), health = session.player.health, "Player died");
            }

            session.input.end_tick();
        }
    }
}

fn player_connect(session: &Session) -> ServerEvent {
    ServerEvent::PlayerConnect(PlayerConnect {
        id: session.id(),
        posn: session.player.position,
        velocity: session.player.velocity,
        health: session.player.health,
    })
}

fn spawn_bullet(projectile: &Projectile) -> ServerEvent {
    ServerEvent::SpawnBullet(SpawnBullet {
        id: projectile.id,
        posn: projectile.position,
        velocity: projectile.velocity,
    })
}

/// Cloneable handle used by connection tasks to reach the simulation
#[derive(Clone)]
pub struct WorldHandle {
    pub command_tx: mpsc::Sender<WorldCommand>,
    pub stats: Arc<RwLock<WorldStats>>,
}

impl WorldHandle {
    pub fn stats(&self) -> WorldStats {
        *self.stats.read()
    }
}

/// Owns the world and drives it at the configured tick rate
pub struct WorldRunner {
    world: World,
    command_rx: mpsc::Receiver<WorldCommand>,
    stats: Arc<RwLock<WorldStats>>,
}

impl WorldRunner {
    pub fn new(world: World) -> (Self, WorldHandle) {
        let (command_tx, command_rx) = mpsc::channel(1024);
        let stats = Arc::new(RwLock::new(world.stats()));

        let handle = WorldHandle {
            command_tx,
            stats: stats.clone(),
        };

        let runner = Self {
            world,
            command_rx,
            stats,
        };

        (runner, handle)
    }

    /// Run the authoritative tick loop until every handle is dropped
    pub async fn run(mut self) {
        let tick_duration = self.world.config().tick_duration();
        let mut tick_interval = interval(tick_duration);
        // Late ticks run late; they never overlap or burst
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let epoch = Instant::now();
        info!(
            tick_rate = self.world.config().tick_rate,
            barriers = self.world.barriers().len(),
            "Simulation started"
        );

        loop {
            tick_interval.tick().await;
            let timer = Timer::new();
            let now = epoch.elapsed().as_secs_f64();

            let mut outbox = Outbox::new();
            if !self.drain_commands(now, &mut outbox) {
                info!("All handles dropped, stopping simulation");
                break;
            }

            self.world.tick(now, &mut outbox);
            let delivery = outbox.deliver(self.world.sessions());

            let stats = self.world.stats();
            *self.stats.write() = stats;

            let elapsed = timer.elapsed();
            if elapsed > tick_duration {
                warn!(tick = stats.tick, elapsed_ms = elapsed.as_millis() as u64, "Tick overran its budget");
            }
            if stats.tick % (self.world.config().tick_rate as u64 * 10) == 0 {
                debug!(
                    tick = stats.tick,
                    players = stats.players,
                    projectiles = stats.projectiles,
                    frames_sent = delivery.sent,
                    frames_dropped = delivery.dropped,
                    "Tick stats"
                );
            }
        }
    }

    /// Apply every queued command; false once no sender is left
    fn drain_commands(&mut self, now: f64, outbox: &mut Outbox) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => self.world.apply(command, now, outbox),
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::geometry::Vec2;
    use crate::game::input::{buttons, keys};
    use crate::ws::protocol::Ping;
    use serde_json::json;

    fn empty_world() -> World {
        World::with_barriers(GameConfig::default(), Vec::new())
    }

    fn join(world: &mut World, now: f64) -> (Uuid, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(1024);
        let id = Uuid::new_v4();
        world.connect(id, tx, now, &mut Outbox::new());
        (id, rx)
    }

    #[test]
    fn connect_announces_then_configures() {
        let mut world = World::with_barriers(
            GameConfig::default(),
            vec![Barrier::new(Vec2::new(150.0, 300.0), 150.0)],
        );
        let (first, _) = join(&mut world, 0.0);

        let (tx, _rx) = mpsc::channel(8);
        let second = Uuid::new_v4();
        let mut outbox = Outbox::new();
        world.connect(second, tx, 0.0, &mut outbox);

        let messages = outbox.messages();
        assert_eq!(messages.len(), 3);
        assert!(matches!(
            &messages[0].event,
            ServerEvent::PlayerConnect(p) if p.id == second && p.health == 100
        ));
        assert!(matches!(&messages[1].event, ServerEvent::PlayerConnect(p) if p.id == first));
        assert!(matches!(
            &messages[2].event,
            ServerEvent::Configure(c) if c.id == second && c.barriers == vec![Vec2::new(150.0, 300.0)]
        ));
    }

    #[test]
    fn disconnect_removes_session_and_is_idempotent() {
        let mut world = empty_world();
        let (id, _rx) = join(&mut world, 0.0);

        let mut outbox = Outbox::new();
        world.disconnect(id, &mut outbox);
        world.disconnect(id, &mut outbox);

        assert!(world.session(id).is_none());
        assert_eq!(outbox.named("player_disconnect").count(), 1);
    }

    #[test]
    fn every_live_player_is_broadcast_each_tick() {
        let mut world = empty_world();
        join(&mut world, 0.0);
        join(&mut world, 0.0);

        let mut outbox = Outbox::new();
        world.tick(1.0, &mut outbox);
        assert_eq!(outbox.named("player_posn").count(), 2);
        assert_eq!(world.tick_count(), 1);
    }

    #[test]
    fn edges_are_cleared_after_the_player_phase() {
        let mut world = empty_world();
        let (id, _rx) = join(&mut world, 0.0);
        world.handle_message(id, ClientMsg::KeyPressed { key: keys::D }, &mut Outbox::new());
        assert!(world.session(id).unwrap().input.keyboard.pressed(keys::D));

        world.tick(1.0, &mut Outbox::new());
        let input = &world.session(id).unwrap().input;
        assert!(!input.keyboard.pressed(keys::D));
        assert!(input.keyboard.held(keys::D));
    }

    #[test]
    fn firing_respects_cooldown() {
        let mut world = empty_world();
        let (id, _rx) = join(&mut world, 0.0);
        world.handle_message(
            id,
            ClientMsg::MouseMoved {
                position: Vec2::new(500.0, 0.0),
            },
            &mut Outbox::new(),
        );
        world.handle_message(id, ClientMsg::MousePressed { button: buttons::LEFT }, &mut Outbox::new());

        // Cooldown not yet exceeded since connect
        let mut outbox = Outbox::new();
        world.tick(0.2, &mut outbox);
        assert_eq!(outbox.named("spawn_bullet").count(), 0);

        let mut outbox = Outbox::new();
        world.tick(0.5, &mut outbox);
        assert_eq!(outbox.named("spawn_bullet").count(), 1);
        assert_eq!(world.projectiles().len(), 1);

        let projectile = &world.projectiles()[0];
        assert_eq!(projectile.position, Vec2::new(50.0, 0.0));
        assert_eq!(projectile.velocity, Vec2::new(13.0, 0.0));

        let mut outbox = Outbox::new();
        world.tick(0.6, &mut outbox);
        assert_eq!(outbox.named("spawn_bullet").count(), 0);

        let mut outbox = Outbox::new();
        world.tick(0.81, &mut outbox);
        assert_eq!(outbox.named("spawn_bullet").count(), 1);
    }

    #[test]
    fn angle_tracks_cursor() {
        let mut world = empty_world();
        let (id, _rx) = join(&mut world, 0.0);
        world.handle_message(
            id,
            ClientMsg::MouseMoved {
                position: Vec2::new(0.0, 100.0),
            },
            &mut Outbox::new(),
        );
        world.tick(1.0, &mut Outbox::new());
        assert!((world.session(id).unwrap().player.angle - 90.0).abs() < 1e-4);
    }

    #[test]
    fn ping_trigger_replies_to_caller_only() {
        let mut world = empty_world();
        let (id, _rx) = join(&mut world, 0.0);

        let mut outbox = Outbox::new();
        world.handle_message(
            id,
            ClientMsg::Trigger {
                trigger: "ping".to_string(),
                data: json!({"t": 42}),
            },
            &mut outbox,
        );

        assert_eq!(outbox.messages().len(), 1);
        assert_eq!(outbox.messages()[0].recipient, crate::game::outbox::Recipient::One(id));
        assert_eq!(outbox.messages()[0].event, ServerEvent::Pong(Ping { t: 42 }));
    }

    #[test]
    fn input_for_unknown_session_is_ignored() {
        let mut world = empty_world();
        let mut outbox = Outbox::new();
        world.handle_message(Uuid::new_v4(), ClientMsg::KeyPressed { key: keys::W }, &mut outbox);
        assert!(outbox.is_empty());
    }

    #[test]
    fn seeded_worlds_share_a_layout() {
        let config = GameConfig {
            barrier_seed: Some(3),
            ..GameConfig::default()
        };
        let a = World::new(config.clone());
        let b = World::new(config);
        assert_eq!(a.barriers(), b.barriers());
        assert_eq!(a.barriers().len(), 20);
    }

    #[tokio::test]
    async fn runner_processes_commands_and_publishes_stats() {
        let config = GameConfig {
            tick_rate: 200,
            barrier_seed: Some(1),
            ..GameConfig::default()
        };
        let (runner, handle) = WorldRunner::new(World::new(config));
        let task = tokio::spawn(runner.run());

        let (tx, mut rx) = mpsc::channel(64);
        let id = Uuid::new_v4();
        handle
            .command_tx
            .send(WorldCommand::Connect { id, outbound: tx })
            .await
            .unwrap();

        let first = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(first.contains("player_connect"));

        let configure = rx.recv().await.unwrap();
        assert!(configure.contains("configure"));

        assert_eq!(handle.stats().barriers, 20);
        drop(handle);
        tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
    }
}
