//! Layered vertex-streaming renderer.
//!
//! Every layer owns a fixed region of one shared vertex buffer. Producers
//! append vertices during the frame; [`RenderManager::frame_update`] draws each
//! layer's written range once, in configuration order, and rewinds non-static
//! layers.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Texture coordinates are in texels of the layer's texture.
//! - The vertex shader applies the layer transform, then converts to NDC using
//!   the viewport uniform.

mod arena;
mod batch;
mod common;
mod ctx;
mod layer;
mod manager;
mod region;
mod texture;
mod vertex;

pub use arena::{RegionId, VertexArena};
pub use batch::{LayerBatcher, LayerDraw, VertexSink};
pub use ctx::{RenderCtx, RenderTarget};
pub use layer::{DrawLayer, LayerDesc, LayerId, RenderState, Topology, Transform, SCREEN_LAYER};
pub use manager::RenderManager;
pub use region::{partition, BufferRegion};
pub use texture::{TextureId, TextureStore};
pub use vertex::{quad, Vertex, QUAD_VERTEX_COUNT};
