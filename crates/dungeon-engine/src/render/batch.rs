use core::ops::Range;

use crate::atlas::TextureAtlas;
use crate::coords::{Color, Rect, Vec2, Viewport};

use super::arena::VertexArena;
use super::layer::{DrawLayer, LayerDesc, LayerId, Topology, Transform};
use super::texture::TextureId;
use super::vertex::{quad, Vertex};

/// Anything that accepts vertex batches addressed by layer.
///
/// Implemented by [`LayerBatcher`] and [`RenderManager`](super::RenderManager),
/// so producers such as the tile map can be driven without a GPU.
pub trait VertexSink {
    /// Number of configured layers (excluding the screen layer).
    fn layer_count(&self) -> usize;

    /// Appends up to `count` vertices to `layer`; returns how many were stored.
    fn draw_buffer(&mut self, vertices: &[Vertex], count: usize, layer: LayerId) -> usize;
}

/// One draw call produced by [`LayerBatcher::flush`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDraw {
    pub label: &'static str,
    pub topology: Topology,
    pub texture: Option<TextureId>,
    /// Layer transform with the upscale factor already composed in.
    pub transform: Transform,
    /// Vertex range inside the shared buffer.
    pub vertices: Range<u32>,
}

/// Frame collector for the layered renderer.
///
/// Owns the vertex arena and the layer table. Collect phase: any number of
/// `draw_*` calls append into the addressed layer's region, truncating on
/// overflow. Flush phase: [`flush`](Self::flush) yields one [`LayerDraw`] per
/// layer in configuration order (screen layer last) and rewinds every
/// non-static region.
pub struct LayerBatcher {
    arena: VertexArena,
    layers: Vec<DrawLayer>,
    screen: DrawLayer,

    warned_overflow: bool,
    warned_unknown_layer: bool,
}

impl LayerBatcher {
    /// Builds the layer table. Regions are allocated in `layers` order with the
    /// screen region last.
    pub fn new(layers: &[LayerDesc], screen: &LayerDesc) -> Self {
        let capacities: Vec<u32> = layers
            .iter()
            .chain(std::iter::once(screen))
            .map(|d| d.capacity)
            .collect();

        let arena = VertexArena::new(&capacities);
        let ids = arena.region_ids();

        let table = layers
            .iter()
            .zip(ids.iter())
            .map(|(desc, &id)| DrawLayer::from_desc(desc, id))
            .collect();
        let screen = DrawLayer::from_desc(screen, ids[layers.len()]);

        log::debug!(
            "LayerBatcher: {} layers + screen, {} vertices total",
            layers.len(),
            arena.capacity()
        );

        Self {
            arena,
            layers: table,
            screen,
            warned_overflow: false,
            warned_unknown_layer: false,
        }
    }

    #[inline]
    pub fn arena(&self) -> &VertexArena {
        &self.arena
    }

    #[inline]
    pub(crate) fn arena_mut(&mut self) -> &mut VertexArena {
        &mut self.arena
    }

    #[inline]
    pub fn layers(&self) -> &[DrawLayer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&DrawLayer> {
        match id {
            LayerId::Screen => Some(&self.screen),
            LayerId::Index(i) => self.layers.get(i),
        }
    }

    /// Region state of `id`, if the layer exists.
    pub fn region(&self, id: LayerId) -> Option<super::BufferRegion> {
        self.layer(id).map(|l| self.arena.region(l.region))
    }

    /// Rewinds a layer's region, static or not. Used to rewrite static content.
    pub fn reset_layer(&mut self, id: LayerId) {
        if let Some(region) = self.layer(id).map(|l| l.region) {
            self.arena.reset(region);
        }
    }

    // ── collect ───────────────────────────────────────────────────────────

    /// Appends `min(count, vertices.len())` vertices to `layer`, truncated to
    /// the region's remaining capacity. Unknown layers are skipped.
    pub fn draw_buffer(&mut self, vertices: &[Vertex], count: usize, layer: LayerId) -> usize {
        let Some(region) = self.layer(layer).map(|l| l.region) else {
            if !self.warned_unknown_layer {
                log::warn!("LayerBatcher: draw to unknown layer {layer:?}; ignored");
                self.warned_unknown_layer = true;
            }
            return 0;
        };

        let requested = count.min(vertices.len());
        let written = self.arena.write(region, &vertices[..requested]);

        if written < requested && !self.warned_overflow {
            log::warn!(
                "LayerBatcher: region of layer {layer:?} is full; dropped {} vertices",
                requested - written
            );
            self.warned_overflow = true;
        }
        written
    }

    /// Two-vertex line segment.
    pub fn draw_line(&mut self, a: Vec2, b: Vec2, color: Color, layer: LayerId) -> usize {
        let v = [Vertex::colored(a, color), Vertex::colored(b, color)];
        self.draw_buffer(&v, v.len(), layer)
    }

    /// Solid quad (six vertices, texture coordinates at texel 0).
    pub fn draw_rect(&mut self, rect: Rect, color: Color, layer: LayerId) -> usize {
        let v = quad(rect, Rect::zero(), color);
        self.draw_buffer(&v, v.len(), layer)
    }

    /// Textured quad sampling `tex` (texel coordinates) of the layer's texture.
    pub fn draw_textured_rect(&mut self, rect: Rect, tex: Rect, color: Color, layer: LayerId) -> usize {
        let v = quad(rect, tex, color);
        self.draw_buffer(&v, v.len(), layer)
    }

    /// Quad of the sprite's size at `position`, sampling the named atlas
    /// rectangle. Unknown names draw nothing.
    pub fn draw_sprite(
        &mut self,
        atlas: &TextureAtlas,
        name: &str,
        position: Vec2,
        color: Color,
        layer: LayerId,
    ) -> usize {
        let Some(tex) = atlas.sprite(name) else {
            log::debug!("LayerBatcher: unknown sprite `{name}`");
            return 0;
        };
        let dst = Rect::from_origin_size(position, tex.size);
        self.draw_textured_rect(dst, tex, color, layer)
    }

    /// Replaces vertices already written to `layer`; see
    /// [`VertexArena::write_at`]. Unknown layers are skipped.
    pub fn overwrite(&mut self, vertices: &[Vertex], offset: usize, layer: LayerId) -> usize {
        let Some(region) = self.layer(layer).map(|l| l.region) else {
            return 0;
        };
        self.arena.write_at(region, offset, vertices)
    }

    // ── flush ─────────────────────────────────────────────────────────────

    /// Produces this frame's draw list and rewinds non-static regions.
    ///
    /// `viewport` is the current window size; upscaled layers are scaled by
    /// `viewport.width / resolution[0]` on both axes.
    pub fn flush(&mut self, viewport: Viewport) -> Vec<LayerDraw> {
        let mut draws = Vec::with_capacity(self.layers.len() + 1);

        for layer in self.layers.iter().chain(std::iter::once(&self.screen)) {
            let region = self.arena.region(layer.region);

            let mut transform = layer.state.transform;
            if layer.upscale {
                transform = transform.then_scale(viewport.upscale_factor(layer.resolution[0]));
            }

            draws.push(LayerDraw {
                label: layer.label,
                topology: layer.topology,
                texture: layer.state.texture,
                transform,
                vertices: region.written(),
            });

        }

        self.discard_frame();
        draws
    }

    /// Rewinds every non-static region without producing draws. Call once
    /// for each frame whose [`flush`](Self::flush) is skipped.
    pub fn discard_frame(&mut self) {
        for layer in self.layers.iter().chain(std::iter::once(&self.screen)) {
            if !layer.is_static {
                self.arena.reset(layer.region);
            }
        }
    }
}

impl VertexSink for LayerBatcher {
    #[inline]
    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    fn draw_buffer(&mut self, vertices: &[Vertex], count: usize, layer: LayerId) -> usize {
        LayerBatcher::draw_buffer(self, vertices, count, layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batcher() -> LayerBatcher {
        let layers = [
            LayerDesc::new("background", Topology::Triangles, 12)
                .with_static(true)
                .with_upscale([320, 240]),
            LayerDesc::new("grid", Topology::Lines, 4).with_upscale([320, 240]),
        ];
        let screen = LayerDesc::new("screen", Topology::Triangles, 6);
        LayerBatcher::new(&layers, &screen)
    }

    fn verts(n: usize) -> Vec<Vertex> {
        vec![Vertex::colored(Vec2::new(1.0, 2.0), Color::WHITE); n]
    }

    // ── collect ───────────────────────────────────────────────────────────

    #[test]
    fn regions_follow_layer_order_with_screen_last() {
        let b = batcher();
        assert_eq!(b.region(LayerId::Index(0)).unwrap().offset, 0);
        assert_eq!(b.region(LayerId::Index(1)).unwrap().offset, 12);
        assert_eq!(b.region(LayerId::Screen).unwrap().offset, 16);
    }

    #[test]
    fn draw_buffer_respects_count_argument() {
        let mut b = batcher();
        assert_eq!(b.draw_buffer(&verts(4), 2, LayerId::Index(1)), 2);
        assert_eq!(b.region(LayerId::Index(1)).unwrap().count, 2);
    }

    #[test]
    fn overflow_writes_exactly_remaining_capacity() {
        let mut b = batcher();
        b.draw_buffer(&verts(3), 3, LayerId::Index(1));

        let written = b.draw_buffer(&verts(5), 5, LayerId::Index(1));

        assert_eq!(written, 1);
        assert_eq!(b.region(LayerId::Index(1)).unwrap().count, 4);
        // Screen region starts right after and stays empty.
        assert_eq!(b.region(LayerId::Screen).unwrap().count, 0);
        assert!(b.arena().as_slice()[16..].iter().all(|v| *v == Vertex::default()));
    }

    #[test]
    fn unknown_layer_is_skipped() {
        let mut b = batcher();
        assert_eq!(b.draw_buffer(&verts(2), 2, LayerId::Index(9)), 0);
        assert!(b.arena().as_slice().iter().all(|v| *v == Vertex::default()));
    }

    #[test]
    fn negative_index_targets_screen() {
        let mut b = batcher();
        b.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE, LayerId::from(-1));
        assert_eq!(b.region(LayerId::Screen).unwrap().count, 6);
    }

    #[test]
    fn draw_line_writes_two_vertices() {
        let mut b = batcher();
        let n = b.draw_line(Vec2::zero(), Vec2::new(5.0, 0.0), Color::GREEN, LayerId::Index(1));
        assert_eq!(n, 2);
        let got = b.arena().contents(b.layers()[1].region_id());
        assert_eq!(got[1].position, [5.0, 0.0]);
        assert_eq!(got[1].color, Color::GREEN.to_array());
    }

    #[test]
    fn draw_sprite_uses_atlas_rect() {
        let desc = crate::atlas::AtlasDesc::parse("sprite,stone,4,0,4,4\n").unwrap();
        let atlas = TextureAtlas::from_parts(image::RgbaImage::new(8, 4), desc, Vec::new());
        let mut b = batcher();

        assert_eq!(b.draw_sprite(&atlas, "stone", Vec2::new(10.0, 10.0), Color::WHITE, LayerId::Index(0)), 6);
        assert_eq!(b.draw_sprite(&atlas, "nope", Vec2::zero(), Color::WHITE, LayerId::Index(0)), 0);

        let got = b.arena().contents(b.layers()[0].region_id());
        assert_eq!(got[0].position, [10.0, 10.0]);
        assert_eq!(got[0].tex_coords, [4.0, 0.0]);
        assert_eq!(got[4].position, [14.0, 14.0]);
        assert_eq!(got[4].tex_coords, [8.0, 4.0]);
    }

    // ── flush ─────────────────────────────────────────────────────────────

    #[test]
    fn flush_resets_dynamic_and_keeps_static() {
        let mut b = batcher();
        b.draw_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::WHITE, LayerId::Index(0));
        b.draw_line(Vec2::zero(), Vec2::new(1.0, 1.0), Color::WHITE, LayerId::Index(1));

        let draws = b.flush(Viewport::new(1280.0, 960.0));

        assert_eq!(draws[0].vertices, 0..6);
        assert_eq!(draws[1].vertices, 12..14);
        assert_eq!(b.region(LayerId::Index(0)).unwrap().count, 6);
        assert_eq!(b.region(LayerId::Index(1)).unwrap().count, 0);

        // Static content is drawn again next frame without being rewritten.
        let again = b.flush(Viewport::new(1280.0, 960.0));
        assert_eq!(again[0].vertices, 0..6);
        assert_eq!(again[1].vertices, 12..12);
    }

    #[test]
    fn flush_order_is_configuration_order() {
        let mut b = batcher();
        let labels: Vec<_> = b.flush(Viewport::new(640.0, 480.0)).iter().map(|d| d.label).collect();
        assert_eq!(labels, ["background", "grid", "screen"]);
    }

    #[test]
    fn upscale_uses_window_width_ratio_on_both_axes() {
        let mut b = batcher();
        let draws = b.flush(Viewport::new(1280.0, 600.0));
        assert_eq!(draws[0].transform.scale, Vec2::new(4.0, 4.0));
        // Screen layer is not upscaled.
        assert_eq!(draws[2].transform, Transform::IDENTITY);
    }

    #[test]
    fn resize_changes_transform_not_regions() {
        let mut b = batcher();
        let before = b.arena().regions().to_vec();
        let small = b.flush(Viewport::new(320.0, 240.0));
        let large = b.flush(Viewport::new(960.0, 720.0));
        assert_eq!(small[1].transform.scale, Vec2::splat(1.0));
        assert_eq!(large[1].transform.scale, Vec2::splat(3.0));
        assert_eq!(b.arena().regions(), &before[..]);
    }

    #[test]
    fn discarded_frames_do_not_accumulate() {
        let mut b = batcher();
        b.draw_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::WHITE, LayerId::Index(0));

        // Window minimized: the frame is produced but never flushed.
        for _ in 0..10 {
            b.draw_line(Vec2::zero(), Vec2::new(1.0, 1.0), Color::WHITE, LayerId::Index(1));
            b.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE, LayerId::Screen);
            b.discard_frame();
        }

        b.draw_line(Vec2::zero(), Vec2::new(1.0, 1.0), Color::WHITE, LayerId::Index(1));
        let draws = b.flush(Viewport::new(320.0, 240.0));
        assert_eq!(draws[0].vertices, 0..6);
        assert_eq!(draws[1].vertices, 12..14);
        assert_eq!(draws[2].vertices, 16..16);
    }

    #[test]
    fn overwrite_patches_static_layer_in_place() {
        let mut b = batcher();
        b.draw_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::WHITE, LayerId::Index(0));
        b.flush(Viewport::new(320.0, 240.0));

        let patch = [Vertex::colored(Vec2::new(7.0, 7.0), Color::GREEN); 2];
        assert_eq!(b.overwrite(&patch, 4, LayerId::Index(0)), 2);
        assert_eq!(b.overwrite(&patch, 0, LayerId::Index(7)), 0);

        let got = b.arena().contents(b.layers()[0].region_id());
        assert_eq!(got.len(), 6);
        assert_eq!(got[4].position, [7.0, 7.0]);
        assert_eq!(got[3].color, Color::WHITE.to_array());
    }

    #[test]
    fn reset_layer_rewinds_static_region() {
        let mut b = batcher();
        b.draw_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::WHITE, LayerId::Index(0));
        b.reset_layer(LayerId::Index(0));
        assert_eq!(b.region(LayerId::Index(0)).unwrap().count, 0);
    }
}
