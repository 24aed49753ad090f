//! Local input tracking for the client, forwarding each raw edge to the server

use crate::game::geometry::Vec2;
use crate::game::input::InputState;
use crate::ws::protocol::ClientMsg;

/// The client's own view of its input devices
#[derive(Debug, Clone, Default)]
pub struct LocalInput {
    state: InputState,
}

impl LocalInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn press_key(&mut self, key: u32) -> ClientMsg {
        self.state.keyboard.press(key);
        ClientMsg::KeyPressed { key }
    }

    pub fn release_key(&mut self, key: u32) -> ClientMsg {
        self.state.keyboard.release(key);
        ClientMsg::KeyReleased { key }
    }

    pub fn press_button(&mut self, button: u32) -> ClientMsg {
        self.state.mouse.press(button);
        ClientMsg::MousePressed { button }
    }

    pub fn release_button(&mut self, button: u32) -> ClientMsg {
        self.state.mouse.release(button);
        ClientMsg::MouseReleased { button }
    }

    pub fn move_cursor(&mut self, position: Vec2) -> ClientMsg {
        self.state.cursor = position;
        ClientMsg::MouseMoved { position }
    }

    /// Decay edges once the frame has consumed them
    pub fn end_frame(&mut self) {
        self.state.end_tick();
    }
}
