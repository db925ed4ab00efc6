//! # Input State
//!
//! Per-frame snapshots of keyboard, mouse button and cursor input.

use std::collections::HashMap;
use winit::{event::MouseButton, keyboard::KeyCode};

/// Represents the state of a key or button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RawInputState {
    /// Key/button is not pressed
    #[default]
    NotPressed,
    /// Key/button was just pressed this frame
    Pressed,
    /// Key/button has been held down for multiple frames
    Held,
    /// Key/button was just released this frame
    Released,
}

impl RawInputState {
    /// Determines if the input is actively down (either pressed or held)
    pub fn is_active(&self) -> bool {
        matches!(self, RawInputState::Pressed | RawInputState::Held)
    }

    /// Determines if the input was just pressed this frame
    pub fn is_just_pressed(&self) -> bool {
        matches!(self, RawInputState::Pressed)
    }

    /// Determines if the input was just released this frame
    pub fn is_just_released(&self) -> bool {
        matches!(self, RawInputState::Released)
    }

    /// Derives the transition from the previous and current raw states
    pub fn from_raw_states(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => RawInputState::Pressed,
            (true, true) => RawInputState::Held,
            (true, false) => RawInputState::Released,
            (false, false) => RawInputState::NotPressed,
        }
    }
}

/// A snapshot of one frame's input with key and button transitions resolved.
#[derive(Debug, Default)]
pub struct ProcessedInputState {
    pub keyboard_states: HashMap<KeyCode, RawInputState>,
    pub mouse_button_states: HashMap<MouseButton, RawInputState>,
    /// Raw mouse motion since the last frame (x, y)
    pub mouse_delta: Option<(f64, f64)>,
    /// Cursor position in physical pixels, if the cursor is inside the window
    pub cursor_position: Option<(f64, f64)>,
    /// Whether the cursor moved this frame
    pub cursor_moved: bool,
    /// Scroll since the last frame, in lines
    pub scroll_lines: f32,
}

impl ProcessedInputState {
    /// Gets the state of a keyboard key
    pub fn get_key_state(&self, key: KeyCode) -> RawInputState {
        self.keyboard_states.get(&key).copied().unwrap_or_default()
    }

    /// Gets the state of a mouse button
    pub fn get_mouse_button_state(&self, button: MouseButton) -> RawInputState {
        self.mouse_button_states
            .get(&button)
            .copied()
            .unwrap_or_default()
    }

    /// Gets the mouse movement delta since the last frame
    pub fn get_mouse_delta(&self) -> Option<(f64, f64)> {
        self.mouse_delta
    }
}

/// Tracks the state of mouse inputs including buttons, scroll, movement and cursor.
#[derive(Debug, Default)]
pub struct MouseInput {
    pub mouse_button_inputs_old: HashMap<MouseButton, bool>,
    pub mouse_button_inputs_new: HashMap<MouseButton, bool>,
    /// Accumulated scroll since the last frame, in lines
    pub mouse_scroll_lines: f32,
    /// Accumulated raw motion since the last frame (x, y)
    pub mouse_delta: Option<(f64, f64)>,
    pub cursor_position: Option<(f64, f64)>,
    pub cursor_moved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_follow_raw_states() {
        assert_eq!(RawInputState::from_raw_states(false, true), RawInputState::Pressed);
        assert_eq!(RawInputState::from_raw_states(true, true), RawInputState::Held);
        assert_eq!(RawInputState::from_raw_states(true, false), RawInputState::Released);
        assert!(!RawInputState::from_raw_states(false, false).is_active());
    }
}
