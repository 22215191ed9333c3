use image::{Rgba, RgbaImage};

use crate::coords::{Color, Rect, Vec2};
use crate::render::{quad, LayerId, TextureId, TextureStore, VertexSink};

/// Default palette backdrop.
pub const PALETTE_BACKGROUND: Color = Color::rgb(100, 100, 100);

/// On-screen view of the atlas used to pick tiles.
///
/// Owns an off-screen RGBA canvas initialised to the background color with
/// the atlas image composited on top. Off-screen draws (`fill_rect`, `blit`,
/// `clear`) only touch the canvas; call [`refresh_texture`](Self::refresh_texture)
/// afterwards to push the result to the GPU.
pub struct TexturePalette {
    pub enabled: bool,
    pub background: Color,
    /// Top-left corner on screen.
    pub position: Vec2,
    canvas: RgbaImage,
    texture: Option<TextureId>,
}

impl TexturePalette {
    pub fn new(atlas: &RgbaImage) -> Self {
        let mut palette = Self {
            enabled: false,
            background: PALETTE_BACKGROUND,
            position: Vec2::zero(),
            canvas: RgbaImage::new(atlas.width(), atlas.height()),
            texture: None,
        };
        palette.clear();
        palette.blit(atlas, Vec2::zero());
        palette
    }

    #[inline]
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    /// Screen rectangle covered by the palette.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size())
    }

    // ── off-screen drawing ────────────────────────────────────────────────

    /// Fills the canvas with the background color.
    pub fn clear(&mut self) {
        let bg = Rgba(self.background.to_array());
        for px in self.canvas.pixels_mut() {
            *px = bg;
        }
    }

    /// Blends a solid rectangle (canvas texels) over the canvas.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else { return };
        for y in y0..y1 {
            for x in x0..x1 {
                let px = self.canvas.get_pixel_mut(x, y);
                *px = Rgba(color.over(Color::from(*px)).to_array());
            }
        }
    }

    /// Blends `src` over the canvas with its top-left corner at `dst`.
    pub fn blit(&mut self, src: &RgbaImage, dst: Vec2) {
        let area = Rect::from_origin_size(dst, Vec2::new(src.width() as f32, src.height() as f32));
        let Some((x0, y0, x1, y1)) = self.clip(area) else { return };
        let (dx, dy) = (dst.x as i64, dst.y as i64);

        for y in y0..y1 {
            for x in x0..x1 {
                let s = src.get_pixel((x as i64 - dx) as u32, (y as i64 - dy) as u32);
                let px = self.canvas.get_pixel_mut(x, y);
                *px = Rgba(Color::from(*s).over(Color::from(*px)).to_array());
            }
        }
    }

    /// Registers the canvas with `store` on first use and re-uploads it after.
    pub fn refresh_texture(&mut self, store: &mut TextureStore) -> TextureId {
        match self.texture {
            Some(id) => {
                store.replace(id, self.canvas.clone());
                id
            }
            None => {
                let id = store.add(self.canvas.clone());
                self.texture = Some(id);
                id
            }
        }
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Draws the palette quad into `layer` when enabled. The layer must bind
    /// the palette texture.
    pub fn frame_update(&self, sink: &mut impl VertexSink, layer: impl Into<LayerId>) {
        if !self.enabled {
            return;
        }
        let tex = Rect::from_origin_size(Vec2::zero(), self.size());
        let v = quad(self.bounds(), tex, Color::WHITE);
        sink.draw_buffer(&v, v.len(), layer.into());
    }

    /// Tile id whose tile-set rectangle lies under screen `point`, if the
    /// palette is visible and the point hits one.
    pub fn tile_at(&self, point: Vec2, tile_set: &[Rect]) -> Option<u32> {
        if !self.enabled || !self.bounds().contains(point) {
            return None;
        }
        let local = point - self.position;
        tile_set
            .iter()
            .position(|r| r.contains(local))
            .map(|i| i as u32)
    }

    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = (self.canvas.width() as f32, self.canvas.height() as f32);
        let x0 = rect.origin.x.max(0.0);
        let y0 = rect.origin.y.max(0.0);
        let x1 = (rect.origin.x + rect.size.x).min(w);
        let y1 = (rect.origin.y + rect.size.y).min(h);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{LayerBatcher, LayerDesc, Topology};

    fn atlas() -> RgbaImage {
        let mut img = RgbaImage::new(8, 4);
        img.put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        img
    }

    #[test]
    fn canvas_is_background_plus_atlas() {
        let p = TexturePalette::new(&atlas());
        // Transparent atlas texels show the background.
        assert_eq!(p.canvas().get_pixel(0, 0), &Rgba([100, 100, 100, 255]));
        assert_eq!(p.canvas().get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut p = TexturePalette::new(&atlas());
        p.fill_rect(Rect::new(6.0, -2.0, 10.0, 3.0), Color::GREEN);
        assert_eq!(p.canvas().get_pixel(7, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(p.canvas().get_pixel(7, 1), &Rgba([100, 100, 100, 255]));
        assert_eq!(p.canvas().get_pixel(5, 0), &Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn refresh_texture_adds_then_replaces() {
        let mut store = TextureStore::new();
        let mut p = TexturePalette::new(&atlas());

        let id = p.refresh_texture(&mut store);
        assert_eq!(store.len(), 2);

        p.clear();
        assert_eq!(p.refresh_texture(&mut store), id);
        assert_eq!(store.len(), 2);
        assert_eq!(store.image(id).unwrap().get_pixel(1, 1), &Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn frame_update_only_when_enabled() {
        let mut b = LayerBatcher::new(
            &[LayerDesc::new("palette", Topology::Triangles, 12)],
            &LayerDesc::new("screen", Topology::Triangles, 6),
        );
        let mut p = TexturePalette::new(&atlas());

        p.frame_update(&mut b, 0usize);
        assert_eq!(b.region(LayerId::Index(0)).unwrap().count, 0);

        p.enabled = true;
        p.position = Vec2::new(10.0, 10.0);
        p.frame_update(&mut b, 0usize);
        let v = b.arena().contents(b.layers()[0].region_id());
        assert_eq!(v.len(), 6);
        assert_eq!(v[4].position, [18.0, 14.0]);
        assert_eq!(v[4].tex_coords, [8.0, 4.0]);
    }

    #[test]
    fn tile_at_hits_tile_rect() {
        let mut p = TexturePalette::new(&atlas());
        let tiles = [Rect::new(0.0, 0.0, 4.0, 4.0), Rect::new(4.0, 0.0, 4.0, 4.0)];
        assert_eq!(p.tile_at(Vec2::new(5.0, 1.0), &tiles), None);

        p.enabled = true;
        p.position = Vec2::new(100.0, 0.0);
        assert_eq!(p.tile_at(Vec2::new(105.0, 1.0), &tiles), Some(1));
        assert_eq!(p.tile_at(Vec2::new(5.0, 1.0), &tiles), None);
    }
}
