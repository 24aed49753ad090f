//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{World, WorldHandle, WorldRunner};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: WorldHandle,
}

impl AppState {
    /// Build the world and return the state alongside the runner that must be spawned
    pub fn new(config: Config) -> (Self, WorldRunner) {
        let config = Arc::new(config);

        let world = World::new(config.game.clone());
        let (runner, handle) = WorldRunner::new(world);

        let state = Self {
            config,
            world: handle,
        };

        (state, runner)
    }
}
