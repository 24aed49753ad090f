//! Edge/level input tracking for keyboard keys and mouse buttons

use std::collections::HashMap;

use super::geometry::Vec2;

/// Browser key codes understood by the simulation
pub mod keys {
    pub const SPACE: u32 = 32;
    pub const A: u32 = 65;
    pub const D: u32 = 68;
    pub const S: u32 = 83;
    pub const W: u32 = 87;
}

/// Mouse button codes
pub mod buttons {
    pub const LEFT: u32 = 0;
    pub const MIDDLE: u32 = 1;
    pub const RIGHT: u32 = 2;
}

/// Per-code state machine.
///
/// `Pressed` and `Released` last for one tick/frame and decay to `Held` and
/// `Up` in [`InputTable::end_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Up,
    Pressed,
    Held,
    Released,
}

impl ButtonState {
    fn on_press(self) -> Self {
        match self {
            ButtonState::Up | ButtonState::Released => ButtonState::Pressed,
            held => held,
        }
    }

    fn on_release(self) -> Self {
        ButtonState::Released
    }

    fn decay(self) -> Self {
        match self {
            ButtonState::Pressed => ButtonState::Held,
            ButtonState::Released => ButtonState::Up,
            other => other,
        }
    }
}

/// States for one device, keyed by code. Codes never seen are `Up`.
#[derive(Debug, Clone, Default)]
pub struct InputTable {
    states: HashMap<u32, ButtonState>,
}

impl InputTable {
    pub fn press(&mut self, code: u32) {
        let state = self.states.entry(code).or_default();
        *state = state.on_press();
    }

    pub fn release(&mut self, code: u32) {
        let state = self.states.entry(code).or_default();
        *state = state.on_release();
    }

    pub fn state(&self, code: u32) -> ButtonState {
        self.states.get(&code).copied().unwrap_or_default()
    }

    /// Transitioned down since the last `end_tick`
    pub fn pressed(&self, code: u32) -> bool {
        self.state(code) == ButtonState::Pressed
    }

    /// Currently down
    pub fn held(&self, code: u32) -> bool {
        matches!(self.state(code), ButtonState::Pressed | ButtonState::Held)
    }

    /// Transitioned up since the last `end_tick`
    pub fn released(&self, code: u32) -> bool {
        self.state(code) == ButtonState::Released
    }

    /// Decay edge states and forget codes that are fully up
    pub fn end_tick(&mut self) {
        self.states.retain(|_, state| {
            *state = state.decay();
            *state != ButtonState::Up
        });
    }
}

/// Everything one participant has told us about its input devices
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keyboard: InputTable,
    pub mouse: InputTable,
    /// Last reported cursor position, in world coordinates
    pub cursor: Vec2,
}

impl InputState {
    pub fn end_tick(&mut self) {
        self.keyboard.end_tick();
        self.mouse.end_tick();
    }
}
