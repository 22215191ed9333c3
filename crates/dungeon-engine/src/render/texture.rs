use image::{Rgba, RgbaImage};

use super::RenderCtx;

/// Opaque handle to a texture registered in a [`TextureStore`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub(crate) usize);

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct TextureSlot {
    image: RgbaImage,
    gpu: Option<GpuTexture>,
    dirty: bool,
}

/// Owns the images layers can bind and their GPU copies.
///
/// Images are kept on the CPU and uploaded lazily on the next frame, so
/// textures can be registered or replaced before a device exists. Slot 0 is a
/// 1×1 white texel bound by untextured layers.
pub struct TextureStore {
    slots: Vec<TextureSlot>,
    sampler: Option<wgpu::Sampler>,
}

impl Default for TextureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureStore {
    pub fn new() -> Self {
        let mut store = Self { slots: Vec::new(), sampler: None };
        store.add(RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])));
        store
    }

    /// Built-in white texel.
    #[inline]
    pub fn white(&self) -> TextureId {
        TextureId(0)
    }

    /// Registers an image; it is uploaded before the next flush.
    pub fn add(&mut self, image: RgbaImage) -> TextureId {
        let id = TextureId(self.slots.len());
        self.slots.push(TextureSlot { image, gpu: None, dirty: true });
        id
    }

    /// Replaces the image behind `id`. Unknown ids are ignored.
    ///
    /// A size change recreates the GPU texture; otherwise the pixels are
    /// re-uploaded in place.
    pub fn replace(&mut self, id: TextureId, image: RgbaImage) {
        let Some(slot) = self.slots.get_mut(id.0) else {
            log::warn!("TextureStore: replace on unknown texture {id:?}");
            return;
        };
        if slot.image.dimensions() != image.dimensions() {
            slot.gpu = None;
        }
        slot.image = image;
        slot.dirty = true;
    }

    #[inline]
    pub fn image(&self, id: TextureId) -> Option<&RgbaImage> {
        self.slots.get(id.0).map(|s| &s.image)
    }

    /// Size in texels, if `id` is known.
    pub fn size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.image(id).map(|img| img.dimensions())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[cfg(test)]
    fn is_dirty(&self, id: TextureId) -> bool {
        self.slots.get(id.0).is_some_and(|s| s.dirty)
    }

    /// Drops every GPU copy so the next upload rebuilds them against a new
    /// bind group layout.
    pub(crate) fn invalidate_gpu(&mut self) {
        for slot in &mut self.slots {
            slot.gpu = None;
            slot.dirty = true;
        }
    }

    /// Bind group for `id`; falls back to the white texel for unknown ids.
    pub(crate) fn bind_group(&self, id: TextureId) -> Option<&wgpu::BindGroup> {
        self.slots
            .get(id.0)
            .or_else(|| self.slots.first())
            .and_then(|s| s.gpu.as_ref())
            .map(|g| &g.bind_group)
    }

    /// Creates or refreshes GPU textures for every dirty slot.
    pub(crate) fn upload(&mut self, ctx: &RenderCtx<'_>, layout: &wgpu::BindGroupLayout) {
        if self.sampler.is_none() {
            self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("dungeon texture sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                // Pixel art: no filtering between texels.
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            }));
        }
        let Some(sampler) = self.sampler.as_ref() else { return };

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.dirty {
                continue;
            }

            let (width, height) = slot.image.dimensions();
            if width == 0 || height == 0 {
                log::warn!("TextureStore: texture {index} has zero size; skipped");
                slot.dirty = false;
                continue;
            }

            let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };

            let gpu = slot.gpu.get_or_insert_with(|| {
                let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("dungeon layer texture"),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("dungeon texture bind group"),
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                });
                GpuTexture { texture, bind_group }
            });

            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &gpu.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                slot.image.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                size,
            );

            slot.dirty = false;
            log::debug!("TextureStore: uploaded texture {index} ({width}×{height})");
        }
    }
}
