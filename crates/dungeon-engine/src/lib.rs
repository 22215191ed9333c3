//! Dungeon engine crate.
//!
//! A small 2D engine built around a layered vertex-streaming renderer: every
//! draw layer owns a fixed region of one shared GPU vertex buffer, producers
//! append vertices during the frame, and each layer is drawn with one call.
//! Also hosts the tile grid/tile map, texture atlases and the texture palette
//! used by the editor, plus the winit/wgpu runtime that drives an [`core::App`].

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;

pub mod atlas;
pub mod grid;
pub mod palette;
pub mod tilemap;
