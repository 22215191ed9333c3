use std::collections::{HashMap, HashSet};

use crate::coords::Vec2;

use super::types::{ButtonAction, InputEvent, Key, KeyState, Modifiers, MouseButton};

/// Input state for the window, queried by the application once per frame.
///
/// Events are applied as they arrive; [`end_frame`](Self::end_frame) advances
/// edge state after the frame has been processed:
/// - keys: `Pressed` becomes `Held`, `Released` is forgotten
/// - mouse: the current button set becomes the previous one, so
///   `mouse_pressed`/`mouse_released` report changes between frames
/// - scroll delta resets to zero
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,

    keys: HashMap<Key, KeyState>,

    buttons: HashSet<MouseButton>,
    prev_buttons: HashSet<MouseButton>,

    /// Last known pointer position in physical pixels.
    pointer: Vec2,
    pointer_inside: bool,
    scroll_delta: f32,

    reading_text: bool,
    text: String,
}

impl InputState {
    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = m,

            InputEvent::Focused(focused) => {
                self.focused = focused;
                if !focused {
                    // Avoids keys stuck down when focus changes mid-press.
                    for state in self.keys.values_mut() {
                        *state = KeyState::Released;
                    }
                    self.buttons.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                self.pointer = Vec2::new(x, y);
                self.pointer_inside = true;
            }

            InputEvent::PointerLeft => self.pointer_inside = false,

            InputEvent::Key { repeat: true, .. } => {}

            InputEvent::Key { key, action, .. } => match action {
                ButtonAction::Press => {
                    self.keys.insert(key, KeyState::Pressed);
                }
                ButtonAction::Release => {
                    if let Some(state) = self.keys.get_mut(&key) {
                        *state = KeyState::Released;
                    }
                }
            },

            InputEvent::PointerButton { button, action } => match action {
                ButtonAction::Press => {
                    self.buttons.insert(button);
                }
                ButtonAction::Release => {
                    self.buttons.remove(&button);
                }
            },

            InputEvent::Scroll { delta } => self.scroll_delta += delta,

            InputEvent::Text(t) => {
                if self.reading_text {
                    self.text.push_str(&t);
                }
            }
        }
    }

    /// Advances edge state; call once after the frame's update.
    pub fn end_frame(&mut self) {
        self.prev_buttons.clone_from(&self.buttons);
        self.keys.retain(|_, s| *s != KeyState::Released);
        for state in self.keys.values_mut() {
            *state = KeyState::Held;
        }
        self.scroll_delta = 0.0;
    }

    // ── keyboard ──────────────────────────────────────────────────────────

    pub fn key_state(&self, key: Key) -> Option<KeyState> {
        self.keys.get(&key).copied()
    }

    /// Went down this frame.
    pub fn key_pressed(&self, key: Key) -> bool {
        self.key_state(key) == Some(KeyState::Pressed)
    }

    /// Down this frame, whether newly pressed or held.
    pub fn key_down(&self, key: Key) -> bool {
        matches!(self.key_state(key), Some(KeyState::Pressed | KeyState::Held))
    }

    pub fn key_released(&self, key: Key) -> bool {
        self.key_state(key) == Some(KeyState::Released)
    }

    // ── mouse ─────────────────────────────────────────────────────────────

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button) && !self.prev_buttons.contains(&button)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        !self.buttons.contains(&button) && self.prev_buttons.contains(&button)
    }

    /// Pointer position multiplied by `scale`.
    pub fn pointer_position(&self, scale: f32) -> Vec2 {
        self.pointer * scale
    }

    /// Whether the pointer is currently over the window.
    pub fn pointer_inside(&self) -> bool {
        self.pointer_inside
    }

    /// Wheel lines scrolled this frame.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    // ── text ──────────────────────────────────────────────────────────────

    /// Starts collecting committed text, discarding anything collected before.
    pub fn start_text_read(&mut self) {
        self.reading_text = true;
        self.text.clear();
    }

    /// Stops collecting and returns the text entered since `start_text_read`.
    pub fn stop_text_read(&mut self) -> String {
        self.reading_text = false;
        std::mem::take(&mut self.text)
    }

    pub fn is_reading_text(&self) -> bool {
        self.reading_text
    }
}
