//! Per-connection state owned by the simulation

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::entity::Player;
use super::input::InputState;
use crate::ws::protocol::ClientMsg;

/// Lifecycle of the player attached to a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Being simulated and broadcast
    Alive,
    /// Death was broadcast; waiting for the transport to close
    Dead,
}

/// One connected client: its player, buffered input and outbound queue
#[derive(Debug)]
pub struct Session {
    pub player: Player,
    pub input: InputState,
    pub phase: SessionPhase,
    outbound: mpsc::Sender<String>,
}

impl Session {
    pub fn new(id: Uuid, now: f64, outbound: mpsc::Sender<String>) -> Self {
        Self {
            player: Player::new(id, now),
            input: InputState::default(),
            phase: SessionPhase::Alive,
            outbound,
        }
    }

    pub fn id(&self) -> Uuid {
        self.player.id
    }

    pub fn is_alive(&self) -> bool {
        self.phase == SessionPhase::Alive
    }

    /// Buffer a raw input edge or cursor move. Triggers are routed by the world.
    pub fn buffer_input(&mut self, msg: &ClientMsg) {
        match msg {
            ClientMsg::KeyPressed { key } => self.input.keyboard.press(*key),
            ClientMsg::KeyReleased { key } => self.input.keyboard.release(*key),
            ClientMsg::MousePressed { button } => self.input.mouse.press(*button),
            ClientMsg::MouseReleased { button } => self.input.mouse.release(*button),
            ClientMsg::MouseMoved { position } => self.input.cursor = *position,
            ClientMsg::Trigger { .. } => {}
        }
    }

    /// Queue a frame without waiting. Full or closed queues drop the frame.
    pub fn send(&self, frame: String) -> bool {
        match self.outbound.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(player_id = %self.id(), "Outbound queue full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}
