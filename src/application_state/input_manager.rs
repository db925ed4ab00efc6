//! # Input Manager
//!
//! Collects winit events between frames and turns them into a [`ProcessedInputState`]
//! once per frame.

use std::collections::HashMap;

use winit::{
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::input_state::{MouseInput, ProcessedInputState, RawInputState};

const KEY_CODES: [KeyCode; 2] = [KeyCode::KeyN, KeyCode::Backspace];

const MOUSE_BUTTONS: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

/// Pixel scroll deltas (touchpads, browsers) are converted to lines with this factor.
const PIXELS_PER_SCROLL_LINE: f64 = 40.0;

pub struct InputManager {
    pub keyboard_inputs_old: HashMap<KeyCode, bool>,
    pub keyboard_inputs_new: HashMap<KeyCode, bool>,
    pub mouse_inputs: MouseInput,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    /// Creates an input manager with every tracked key and button released.
    pub fn new() -> Self {
        let keyboard_inputs_old = KEY_CODES.iter().map(|key| (*key, false)).collect();
        let keyboard_inputs_new = KEY_CODES.iter().map(|key| (*key, false)).collect();

        let mouse_inputs = MouseInput {
            mouse_button_inputs_old: MOUSE_BUTTONS.iter().map(|button| (*button, false)).collect(),
            mouse_button_inputs_new: MOUSE_BUTTONS.iter().map(|button| (*button, false)).collect(),
            ..Default::default()
        };

        Self {
            keyboard_inputs_old,
            keyboard_inputs_new,
            mouse_inputs,
        }
    }

    /// Copies the current key and button states into the previous-frame maps.
    pub fn move_old_states(&mut self) {
        for (key, new_state) in self.keyboard_inputs_new.iter() {
            if let Some(old_state) = self.keyboard_inputs_old.get_mut(key) {
                *old_state = *new_state;
            }
        }

        for (button, new_state) in self.mouse_inputs.mouse_button_inputs_new.iter() {
            if let Some(old_state) = self.mouse_inputs.mouse_button_inputs_old.get_mut(button) {
                *old_state = *new_state;
            }
        }
    }

    /// Records a window event.
    pub fn intake_input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => {
                if let Some(key_state) = self.keyboard_inputs_new.get_mut(key) {
                    *key_state = *state == ElementState::Pressed;
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.mouse_inputs.mouse_scroll_lines += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => {
                        (position.y / PIXELS_PER_SCROLL_LINE) as f32
                    }
                };
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(button_state) = self.mouse_inputs.mouse_button_inputs_new.get_mut(button) {
                    *button_state = *state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_inputs.cursor_position = Some((position.x, position.y));
                self.mouse_inputs.cursor_moved = true;
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_inputs.cursor_position = None;
            }
            _ => {}
        }
    }

    /// Accumulates raw mouse motion.
    pub fn intake_mouse_motion(&mut self, delta: (f64, f64)) {
        let (x, y) = self.mouse_inputs.mouse_delta.unwrap_or((0.0, 0.0));
        self.mouse_inputs.mouse_delta = Some((x + delta.0, y + delta.1));
    }

    /// Resolves the raw states collected since the last frame.
    pub fn create_processed_input_state(&self) -> ProcessedInputState {
        let keyboard_states = self
            .keyboard_inputs_new
            .iter()
            .map(|(key, &new_state)| {
                let old_state = self.keyboard_inputs_old.get(key).copied().unwrap_or(false);
                (*key, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        let mouse_button_states = self
            .mouse_inputs
            .mouse_button_inputs_new
            .iter()
            .map(|(button, &new_state)| {
                let old_state = self
                    .mouse_inputs
                    .mouse_button_inputs_old
                    .get(button)
                    .copied()
                    .unwrap_or(false);
                (*button, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        ProcessedInputState {
            keyboard_states,
            mouse_button_states,
            mouse_delta: self.mouse_inputs.mouse_delta,
            cursor_position: self.mouse_inputs.cursor_position,
            cursor_moved: self.mouse_inputs.cursor_moved,
            scroll_lines: self.mouse_inputs.mouse_scroll_lines,
        }
    }

    /// Returns this frame's processed input and prepares for the next frame.
    pub fn get_and_reset_processed_input(&mut self) -> ProcessedInputState {
        let processed_input = self.create_processed_input_state();
        self.reset_inputs();
        processed_input
    }

    /// Ends the frame: transitions become history and per-frame accumulators clear.
    pub fn reset_inputs(&mut self) {
        self.move_old_states();

        self.mouse_inputs.mouse_scroll_lines = 0.0;
        self.mouse_inputs.mouse_delta = None;
        self.mouse_inputs.cursor_moved = false;
    }

    /// Releases every key and button, for when the window loses focus.
    pub fn release_all(&mut self) {
        self.keyboard_inputs_new.values_mut().for_each(|state| *state = false);
        self.mouse_inputs
            .mouse_button_inputs_new
            .values_mut()
            .for_each(|state| *state = false);
    }
}
