use bytemuck::{Pod, Zeroable};

use crate::coords::{Color, Rect, Vec2};

/// Vertex stored in the shared vertex buffer.
///
/// Layout (20 bytes):
///
///  offset  0  position    [f32; 2]   loc 0
///  offset  8  color       [u8; 4]    loc 1 (Unorm8x4)
///  offset 12  tex_coords  [f32; 2]   loc 2 (texels, not normalized)
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [u8; 4],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Unorm8x4,  // color
        2 => Float32x2  // tex_coords
    ];

    #[inline]
    pub fn new(position: Vec2, color: Color, tex_coords: Vec2) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            tex_coords: tex_coords.to_array(),
        }
    }

    /// Untextured vertex; samples texel (0, 0) of whatever texture is bound.
    #[inline]
    pub fn colored(position: Vec2, color: Color) -> Self {
        Self::new(position, color, Vec2::zero())
    }

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Vertices per quad in a triangle list.
pub const QUAD_VERTEX_COUNT: usize = 6;

/// Expands `rect` into two triangles with texture coordinates from `tex`.
///
/// Corner order is `{TL, TR, BL, TR, BR, BL}`. Every quad in the crate (tile
/// bake, single-cell repaint, `draw_rect`) goes through this function, so equal
/// inputs always produce bit-identical vertices.
pub fn quad(rect: Rect, tex: Rect, color: Color) -> [Vertex; QUAD_VERTEX_COUNT] {
    let tl = Vertex::new(rect.top_left(), color, tex.top_left());
    let tr = Vertex::new(rect.top_right(), color, tex.top_right());
    let bl = Vertex::new(rect.bottom_left(), color, tex.bottom_left());
    let br = Vertex::new(rect.bottom_right(), color, tex.bottom_right());

    [tl, tr, bl, tr, br, bl]
}
