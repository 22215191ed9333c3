use crate::coords::Vec2;

use super::arena::RegionId;
use super::texture::TextureId;

/// Primitive topology a layer's vertices are assembled with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

impl Topology {
    pub const ALL: [Topology; 5] = [
        Topology::Points,
        Topology::Lines,
        Topology::LineStrip,
        Topology::Triangles,
        Topology::TriangleStrip,
    ];

    #[inline]
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::Points => wgpu::PrimitiveTopology::PointList,
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
            Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// Scale-then-translate transform applied in the vertex shader.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub scale: Vec2,
    pub translate: Vec2,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: Vec2::splat(1.0),
        translate: Vec2::zero(),
    };

    /// Appends a uniform scale applied after this transform.
    #[inline]
    pub fn then_scale(self, factor: f32) -> Self {
        Self {
            scale: self.scale * factor,
            translate: self.translate * factor,
        }
    }

    #[inline]
    pub fn apply(self, p: Vec2) -> Vec2 {
        p.scale(self.scale) + self.translate
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-layer texture + transform bundle.
///
/// `texture = None` binds the built-in white texel, so vertex colors pass
/// through unchanged.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RenderState {
    pub texture: Option<TextureId>,
    pub transform: Transform,
}

/// Description of one draw layer, consumed when the renderer is built.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDesc {
    pub label: &'static str,
    /// Keep the written vertices across frames instead of rewinding after flush.
    pub is_static: bool,
    /// Scale by `window_width / resolution[0]` at flush time.
    pub upscale: bool,
    /// Logical resolution the layer is authored in.
    pub resolution: [u32; 2],
    pub topology: Topology,
    pub state: RenderState,
    /// Vertex capacity of the layer's buffer region.
    pub capacity: u32,
}

impl LayerDesc {
    pub fn new(label: &'static str, topology: Topology, capacity: u32) -> Self {
        Self {
            label,
            is_static: false,
            upscale: false,
            resolution: [0, 0],
            topology,
            state: RenderState::default(),
            capacity,
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Enables upscaling from `resolution` to the window width.
    pub fn with_upscale(mut self, resolution: [u32; 2]) -> Self {
        self.upscale = true;
        self.resolution = resolution;
        self
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.state.texture = Some(texture);
        self
    }
}

/// A configured layer: its description plus the arena region it owns for life.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawLayer {
    pub label: &'static str,
    pub is_static: bool,
    pub upscale: bool,
    pub resolution: [u32; 2],
    pub topology: Topology,
    pub state: RenderState,
    pub(crate) region: RegionId,
}

impl DrawLayer {
    pub(crate) fn from_desc(desc: &LayerDesc, region: RegionId) -> Self {
        Self {
            label: desc.label,
            is_static: desc.is_static,
            upscale: desc.upscale,
            resolution: desc.resolution,
            topology: desc.topology,
            state: desc.state,
            region,
        }
    }

    #[inline]
    pub fn region_id(&self) -> RegionId {
        self.region
    }
}

/// Target of a draw call.
///
/// Any negative index converts to [`LayerId::Screen`], the reserved region
/// drawn after every configured layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LayerId {
    Screen,
    Index(usize),
}

/// Raw index of the screen layer, for callers that address layers by number.
pub const SCREEN_LAYER: i32 = -1;

impl From<i32> for LayerId {
    #[inline]
    fn from(v: i32) -> Self {
        if v < 0 { LayerId::Screen } else { LayerId::Index(v as usize) }
    }
}

impl From<usize> for LayerId {
    #[inline]
    fn from(v: usize) -> Self {
        LayerId::Index(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_index_is_screen() {
        assert_eq!(LayerId::from(SCREEN_LAYER), LayerId::Screen);
        assert_eq!(LayerId::from(-7), LayerId::Screen);
        assert_eq!(LayerId::from(2), LayerId::Index(2));
    }

    #[test]
    fn then_scale_is_uniform() {
        let t = Transform { scale: Vec2::new(1.0, 2.0), translate: Vec2::new(3.0, 0.0) }
            .then_scale(4.0);
        assert_eq!(t.apply(Vec2::new(1.0, 1.0)), Vec2::new(16.0, 8.0));
    }

    #[test]
    fn identity_leaves_points() {
        assert_eq!(Transform::IDENTITY.apply(Vec2::new(5.0, -2.0)), Vec2::new(5.0, -2.0));
    }
}
