//! Time subsystem.
//!
//! - `FrameClock`: per-frame delta time, clamped
//! - `FramePacer`: fixed frame-rate limiting for the runtime loop

mod frame_clock;

pub use frame_clock::{FrameClock, FramePacer, FrameTime};
