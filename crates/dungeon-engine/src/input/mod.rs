//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The runtime translates window events (see `platform`) into `InputEvent`s
//! and feeds them to the window's `InputState`.

pub(crate) mod platform;
mod state;
mod types;

pub use state::InputState;
pub use types::{ButtonAction, InputEvent, Key, KeyState, Modifiers, MouseButton};
