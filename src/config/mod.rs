//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (comma-separated); any origin when unset
    pub client_origin: Option<String>,
    /// Frames buffered per connection before new ones are dropped
    pub outbound_buffer: usize,
    /// Simulation tunables
    pub game: GameConfig,
}

/// Simulation tunables. Distances and speeds are world units per tick.
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Ticks per second
    pub tick_rate: u32,
    /// Displacement per held direction key per tick
    pub move_speed: f32,
    /// Minimum seconds between two shots of one player
    pub fire_cooldown_secs: f64,
    /// Projectile displacement per tick
    pub projectile_speed: f32,
    /// Health removed per projectile hit
    pub projectile_damage: i32,
    /// Projectiles beyond this |x| or |y| are removed
    pub projectile_bounds: f32,
    /// Player collision radius
    pub player_radius: f32,
    /// Barrier side length
    pub barrier_size: f32,
    /// Number of barriers generated at startup
    pub barrier_count: usize,
    /// Margin added around barriers when testing projectiles
    pub barrier_inflate: f32,
    /// Seed for the barrier layout; random when unset
    pub barrier_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            move_speed: 5.0,
            fire_cooldown_secs: 0.3,
            projectile_speed: 13.0,
            projectile_damage: 10,
            projectile_bounds: 3000.0,
            player_radius: 50.0,
            barrier_size: 150.0,
            barrier_count: 20,
            barrier_inflate: 5.0,
            barrier_seed: None,
        }
    }
}

impl GameConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate as f64)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(ConfigError::Invalid("TICK_RATE"));
        }
        let positive = [
            ("MOVE_SPEED", self.move_speed),
            ("PROJECTILE_SPEED", self.projectile_speed),
            ("PROJECTILE_BOUNDS", self.projectile_bounds),
            ("PLAYER_RADIUS", self.player_radius),
            ("BARRIER_SIZE", self.barrier_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(name));
            }
        }
        if !(self.fire_cooldown_secs.is_finite() && self.fire_cooldown_secs >= 0.0) {
            return Err(ConfigError::Invalid("FIRE_COOLDOWN_SECS"));
        }
        if !(self.barrier_inflate.is_finite() && self.barrier_inflate >= 0.0) {
            return Err(ConfigError::Invalid("BARRIER_INFLATE"));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // PORT wins over SERVER_ADDR for hosted deployments
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:5500".to_string()),
        };

        let defaults = GameConfig::default();
        let game = GameConfig {
            tick_rate: parse_or(&lookup, "TICK_RATE", defaults.tick_rate)?,
            move_speed: parse_or(&lookup, "MOVE_SPEED", defaults.move_speed)?,
            fire_cooldown_secs: parse_or(&lookup, "FIRE_COOLDOWN_SECS", defaults.fire_cooldown_secs)?,
            projectile_speed: parse_or(&lookup, "PROJECTILE_SPEED", defaults.projectile_speed)?,
            projectile_damage: parse_or(&lookup, "PROJECTILE_DAMAGE", defaults.projectile_damage)?,
            projectile_bounds: parse_or(&lookup, "PROJECTILE_BOUNDS", defaults.projectile_bounds)?,
            player_radius: parse_or(&lookup, "PLAYER_RADIUS", defaults.player_radius)?,
            barrier_size: parse_or(&lookup, "BARRIER_SIZE", defaults.barrier_size)?,
            barrier_count: parse_or(&lookup, "BARRIER_COUNT", defaults.barrier_count)?,
            barrier_inflate: parse_or(&lookup, "BARRIER_INFLATE", defaults.barrier_inflate)?,
            barrier_seed: lookup("BARRIER_SEED")
                .map(|raw| raw.parse().map_err(|_| ConfigError::Invalid("BARRIER_SEED")))
                .transpose()?,
        };
        game.validate()?;

        let outbound_buffer: usize = parse_or(&lookup, "OUTBOUND_BUFFER", 256)?;
        if outbound_buffer == 0 {
            return Err(ConfigError::Invalid("OUTBOUND_BUFFER"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            client_origin: lookup("CLIENT_ORIGIN").filter(|origin| !origin.trim().is_empty()),
            outbound_buffer,
            game,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
