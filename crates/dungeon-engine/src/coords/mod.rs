//! Coordinate and geometry types shared by the renderer, grid and editor.
//!
//! Canonical CPU space:
//! - Pixels, origin top-left
//! - +X right, +Y down
//!
//! Layers may draw in a low logical resolution and be upscaled at flush time;
//! the shader converts the final pixel position to NDC using the viewport.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::Color;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
