//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the application window, and wires them to
//! the GPU layer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
