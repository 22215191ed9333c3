use crate::coords::{Color, Rect};
use crate::grid::Grid;
use crate::render::{quad, LayerId, Vertex, VertexSink, QUAD_VERTEX_COUNT};

/// Color of cells whose tile id has no tile-set entry.
pub const MISSING_TILE_COLOR: Color = Color::MAGENTA;

/// A grid baked into a triangle list, six vertices per cell.
///
/// Cell `i` occupies `vertices[i*6..i*6+6]`, ordered top-left, top-right,
/// bottom-left, top-right, bottom-right, bottom-left. The vertex buffer always
/// holds exactly `cell_count * 6` vertices.
#[derive(Debug, Clone)]
pub struct TileMap {
    grid: Grid,
    tile_set: Vec<Rect>,
    vertices: Vec<Vertex>,
}

impl TileMap {
    /// Takes ownership of `grid` and bakes it.
    pub fn new(grid: Grid, tile_set: Vec<Rect>) -> Self {
        let vertices = vec![Vertex::default(); grid.cell_count() * QUAD_VERTEX_COUNT];
        let mut map = Self { grid, tile_set, vertices };
        map.bake();
        map
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn tile_set(&self) -> &[Rect] {
        &self.tile_set
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The six vertices of cell `index`.
    pub fn cell_vertices(&self, index: i32) -> Option<&[Vertex]> {
        let start = usize::try_from(index).ok()?.checked_mul(QUAD_VERTEX_COUNT)?;
        self.vertices.get(start..start + QUAD_VERTEX_COUNT)
    }

    /// Replaces the tile set and re-bakes every cell.
    pub fn set_tile_set(&mut self, tile_set: Vec<Rect>) {
        self.tile_set = tile_set;
        self.bake();
    }

    /// Recomputes every cell from its tile id.
    pub fn bake(&mut self) -> &[Vertex] {
        for i in 0..self.grid.cell_count() {
            let tile = self.grid.cells()[i];
            let (tex, color) = match self.tile_set.get(tile as usize) {
                Some(&rect) => (rect, Color::WHITE),
                None => (Rect::zero(), MISSING_TILE_COLOR),
            };
            self.write_cell(i, tex, color);
        }
        &self.vertices
    }

    /// Overwrites only cell `index`'s six vertices to sample `tex`.
    ///
    /// Produces the same vertices `bake` would if the cell's tile-set entry
    /// were `tex`. Out-of-range indices are ignored.
    pub fn repaint_cell(&mut self, index: i32, tex: Rect) {
        let Ok(i) = usize::try_from(index) else { return };
        if i >= self.grid.cell_count() {
            return;
        }
        self.write_cell(i, tex, Color::WHITE);
    }

    /// Sets cell `index` to `tile` and repaints it. Returns `false` if either
    /// the index or the tile id is out of range.
    pub fn paint(&mut self, index: i32, tile: u32) -> bool {
        let Some(&tex) = self.tile_set.get(tile as usize) else {
            return false;
        };
        if !self.grid.set_cell(index, tile) {
            return false;
        }
        self.repaint_cell(index, tex);
        true
    }

    /// Hands the whole vertex buffer to `sink` in one call. Does nothing when
    /// `layer` is not one of the sink's configured layers.
    pub fn submit(&self, sink: &mut impl VertexSink, layer: usize) -> usize {
        if layer >= sink.layer_count() {
            return 0;
        }
        sink.draw_buffer(&self.vertices, self.vertices.len(), LayerId::Index(layer))
    }

    fn write_cell(&mut self, i: usize, tex: Rect, color: Color) {
        let origin = self.grid.index_to_position(i as i32, 1.0);
        let cell = Rect::from_origin_size(origin, self.grid.cell_size());
        let start = i * QUAD_VERTEX_COUNT;
        self.vertices[start..start + QUAD_VERTEX_COUNT].copy_from_slice(&quad(cell, tex, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::render::{LayerBatcher, LayerDesc, Topology};

    fn two_by_two() -> TileMap {
        TileMap::new(Grid::new(2, 2, 4, 4, Vec2::zero()), vec![Rect::new(0.0, 0.0, 8.0, 8.0)])
    }

    // ── bake ──────────────────────────────────────────────────────────────

    #[test]
    fn bake_emits_six_vertices_per_cell() {
        let map = two_by_two();
        let v = map.vertices();
        assert_eq!(v.len(), 24);

        for cell in v.chunks(6) {
            let tex: Vec<_> = cell.iter().map(|x| x.tex_coords).collect();
            assert_eq!(tex, [[0.0, 0.0], [8.0, 0.0], [0.0, 8.0], [8.0, 0.0], [8.0, 8.0], [0.0, 8.0]]);
            assert!(cell.iter().all(|x| x.color == Color::WHITE.to_array()));
        }

        // Cell 3 sits at column 1, row 1.
        assert_eq!(v[18].position, [4.0, 4.0]);
        assert_eq!(v[22].position, [8.0, 8.0]);
    }

    #[test]
    fn missing_tile_is_flagged() {
        let map = TileMap::new(Grid::new(1, 1, 4, 4, Vec2::zero()), Vec::new());
        assert!(map.vertices().iter().all(|x| x.color == MISSING_TILE_COLOR.to_array()));
        assert!(map.vertices().iter().all(|x| x.tex_coords == [0.0, 0.0]));
    }

    // ── repaint ───────────────────────────────────────────────────────────

    #[test]
    fn repaint_matches_full_bake() {
        let r = Rect::new(8.0, 0.0, 8.0, 8.0);
        let mut painted = two_by_two();
        painted.repaint_cell(2, r);

        let mut baked = TileMap::new(
            Grid::new(2, 2, 4, 4, Vec2::zero()),
            vec![Rect::new(0.0, 0.0, 8.0, 8.0), r],
        );
        let mut grid = baked.grid().clone();
        grid.set_cell(2, 1);
        baked = TileMap::new(grid, baked.tile_set().to_vec());

        assert_eq!(painted.vertices()[12..18], baked.vertices()[12..18]);
        // Neighbours untouched.
        assert_eq!(painted.vertices()[..12], two_by_two().vertices()[..12]);
    }

    #[test]
    fn paint_updates_cell_and_vertices() {
        let mut map = TileMap::new(
            Grid::new(2, 1, 4, 4, Vec2::zero()),
            vec![Rect::new(0.0, 0.0, 4.0, 4.0), Rect::new(4.0, 0.0, 4.0, 4.0)],
        );
        assert!(map.paint(1, 1));
        assert_eq!(map.grid().cell(1), Some(1));
        assert_eq!(map.vertices()[6].tex_coords, [4.0, 0.0]);

        assert!(!map.paint(1, 5));
        assert!(!map.paint(9, 0));
    }

    #[test]
    fn cell_vertices_is_the_cell_slice() {
        let map = two_by_two();
        assert_eq!(map.cell_vertices(3), Some(&map.vertices()[18..24]));
        assert_eq!(map.cell_vertices(4), None);
        assert_eq!(map.cell_vertices(-1), None);
    }

    // ── submit ────────────────────────────────────────────────────────────

    #[test]
    fn submit_skips_unknown_layer() {
        let map = two_by_two();
        let mut b = LayerBatcher::new(
            &[LayerDesc::new("tiles", Topology::Triangles, 64)],
            &LayerDesc::new("screen", Topology::Triangles, 6),
        );

        assert_eq!(map.submit(&mut b, 3), 0);
        assert_eq!(map.submit(&mut b, 0), 24);
        assert_eq!(b.region(LayerId::Index(0)).unwrap().count, 24);
    }
}
