//! GPU types shared by the layer pipelines.

use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;

use super::layer::Transform;

// ── blend ─────────────────────────────────────────────────────────────────

/// Straight-alpha "source over" blending; vertex colors and atlas texels are
/// not premultiplied.
pub(super) fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── layer uniform ─────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct LayerUniform {
    pub viewport: [f32; 2],
    pub scale: [f32; 2],
    pub translate: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

impl LayerUniform {
    pub(super) fn new(viewport: Viewport, transform: Transform) -> Self {
        Self {
            viewport: [viewport.width.max(1.0), viewport.height.max(1.0)],
            scale: transform.scale.to_array(),
            translate: transform.translate.to_array(),
            _pad: [0.0; 2],
        }
    }
}

/// Minimum binding size for the layer uniform buffer.
pub(super) fn layer_ubo_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<LayerUniform>() as u64)
        .expect("LayerUniform has non-zero size by construction")
}
