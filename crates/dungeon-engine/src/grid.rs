use crate::coords::{Color, Vec2};
use crate::render::Vertex;

/// Fixed-size row-major cell grid.
///
/// Index `i` maps to `column = i % columns`, `row = i / columns`. Each cell
/// stores a tile id. The grid never draws; it only produces numbers and line
/// vertices for a renderer to consume.
///
/// Index arithmetic is unchecked: out-of-range indices produce meaningless
/// positions rather than errors. Use [`contains_index`](Self::contains_index)
/// where input comes from the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub columns: i32,
    pub rows: i32,
    pub cell_width: i32,
    pub cell_height: i32,
    /// World-space origin of cell 0.
    pub position: Vec2,
    pub line_color: Color,
    cells: Vec<u32>,
}

impl Grid {
    /// All cells start at tile 0. Negative dimensions are treated as zero.
    pub fn new(columns: i32, rows: i32, cell_width: i32, cell_height: i32, position: Vec2) -> Self {
        let columns = columns.max(0);
        let rows = rows.max(0);
        Self {
            columns,
            rows,
            cell_width,
            cell_height,
            position,
            line_color: Color::WHITE,
            cells: vec![0; columns as usize * rows as usize],
        }
    }

    pub fn with_line_color(mut self, color: Color) -> Self {
        self.line_color = color;
        self
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cell_size(&self) -> Vec2 {
        Vec2::new(self.cell_width as f32, self.cell_height as f32)
    }

    // ── index math ────────────────────────────────────────────────────────

    #[inline]
    pub fn index_of(&self, column: i32, row: i32) -> i32 {
        column + row * self.columns
    }

    #[inline]
    pub fn column_row(&self, index: i32) -> (i32, i32) {
        (index % self.columns, index / self.columns)
    }

    #[inline]
    pub fn contains_index(&self, index: i32) -> bool {
        index >= 0 && (index as usize) < self.cells.len()
    }

    /// Top-left corner of cell `index`, with cell extents multiplied by `scale`.
    pub fn index_to_position(&self, index: i32, scale: f32) -> Vec2 {
        let (column, row) = self.column_row(index);
        Vec2::new(
            self.position.x + (column * self.cell_width) as f32 * scale,
            self.position.y + (row * self.cell_height) as f32 * scale,
        )
    }

    /// Column and row containing `point` when the grid is drawn at `scale`.
    ///
    /// Quotients are truncated toward zero, so points up to one cell left of
    /// or above the origin still land in column/row 0.
    pub fn position_to_cell(&self, point: Vec2, scale: f32) -> (i32, i32) {
        let p = point - self.position * scale;
        let column = (p.x / (self.cell_width as f32 * scale)) as i32;
        let row = (p.y / (self.cell_height as f32 * scale)) as i32;
        (column, row)
    }

    /// Index of the cell containing `point`. Lossy: any point in a cell maps
    /// to that cell's index.
    pub fn position_to_index(&self, point: Vec2, scale: f32) -> i32 {
        let (column, row) = self.position_to_cell(point, scale);
        self.index_of(column, row)
    }

    /// Like [`position_to_index`](Self::position_to_index) but `None` for
    /// points outside the grid, including the truncated band left of and
    /// above the origin.
    pub fn cell_index_at(&self, point: Vec2, scale: f32) -> Option<i32> {
        let p = point - self.position * scale;
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let (column, row) = self.position_to_cell(point, scale);
        (column < self.columns && row < self.rows).then(|| self.index_of(column, row))
    }

    // ── cells ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn cell(&self, index: i32) -> Option<u32> {
        usize::try_from(index).ok().and_then(|i| self.cells.get(i).copied())
    }

    /// Sets the tile id of `index`. Returns `false` if the index is out of range.
    pub fn set_cell(&mut self, index: i32, tile: u32) -> bool {
        let Some(cell) = usize::try_from(index).ok().and_then(|i| self.cells.get_mut(i)) else {
            return false;
        };
        *cell = tile;
        true
    }

    // ── geometry ──────────────────────────────────────────────────────────

    /// Line-list vertices for the grid overlay covering `target` logical pixels.
    ///
    /// Draws `target / cell_size` rows and columns starting at `position`:
    /// one horizontal pair per row followed by one vertical pair per column,
    /// `2 * (rows + columns)` vertices in total.
    pub fn build_line_geometry(&self, target: [u32; 2]) -> Vec<Vertex> {
        if self.cell_width <= 0 || self.cell_height <= 0 {
            return Vec::new();
        }

        let columns = target[0] as i32 / self.cell_width;
        let rows = target[1] as i32 / self.cell_height;
        let width = (columns * self.cell_width) as f32;
        let height = (rows * self.cell_height) as f32;
        let origin = self.position;
        let color = self.line_color;

        let mut out = Vec::with_capacity(2 * (rows + columns) as usize);
        for i in 0..rows {
            let y = origin.y + (i * self.cell_height) as f32;
            out.push(Vertex::colored(Vec2::new(origin.x, y), color));
            out.push(Vertex::colored(Vec2::new(origin.x + width, y), color));
        }
        for i in 0..columns {
            let x = origin.x + (i * self.cell_width) as f32;
            out.push(Vertex::colored(Vec2::new(x, origin.y), color));
            out.push(Vertex::colored(Vec2::new(x, origin.y + height), color));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_grid() -> Grid {
        Grid::new(80, 60, 4, 4, Vec2::zero())
    }

    #[test]
    fn cell_count_does_not_overflow_i32() {
        // 70_000² exceeds i32::MAX; the product is taken in usize.
        let g = Grid::new(70_000, 0, 1, 1, Vec2::zero());
        assert_eq!(g.cell_count(), 0);
        let g = Grid::new(-3, 5, 1, 1, Vec2::zero());
        assert_eq!(g.cell_count(), 0);
    }

    // ── index math ────────────────────────────────────────────────────────

    #[test]
    fn point_maps_to_containing_cell() {
        let g = editor_grid();
        assert_eq!(g.position_to_index(Vec2::new(5.0, 5.0), 1.0), 81);
        assert_eq!(g.column_row(81), (1, 1));
    }

    #[test]
    fn index_position_round_trip() {
        let g = Grid::new(7, 5, 3, 2, Vec2::new(10.0, 20.0));
        for i in 0..g.cell_count() as i32 {
            assert_eq!(g.position_to_index(g.index_to_position(i, 1.0), 1.0), i);
        }
    }

    #[test]
    fn quantizes_to_top_left_corner() {
        let g = editor_grid();
        let i = g.position_to_index(Vec2::new(5.0, 7.9), 1.0);
        assert_eq!(g.index_to_position(i, 1.0), Vec2::new(4.0, 4.0));
    }

    #[test]
    fn scale_applies_to_both_directions() {
        let g = editor_grid();
        // Window pixels at 4× upscale.
        let i = g.position_to_index(Vec2::new(20.0, 20.0), 4.0);
        assert_eq!(i, 81);
        assert_eq!(g.index_to_position(i, 4.0), Vec2::new(16.0, 16.0));
    }

    #[test]
    fn negative_coordinates_truncate_toward_zero() {
        let g = editor_grid();
        assert_eq!(g.position_to_cell(Vec2::new(-3.0, 2.0), 1.0), (0, 0));
        assert_eq!(g.position_to_cell(Vec2::new(-5.0, 2.0), 1.0), (-1, 0));
    }

    #[test]
    fn cell_index_at_rejects_outside_points() {
        let g = Grid::new(4, 3, 4, 4, Vec2::zero());
        assert_eq!(g.cell_index_at(Vec2::new(5.0, 5.0), 1.0), Some(5));
        assert_eq!(g.cell_index_at(Vec2::new(-1.0, 5.0), 1.0), None);
        // Column 4 would wrap into the next row.
        assert_eq!(g.cell_index_at(Vec2::new(17.0, 0.0), 1.0), None);
        assert_eq!(g.cell_index_at(Vec2::new(0.0, 12.0), 1.0), None);
    }

    // ── cells ─────────────────────────────────────────────────────────────

    #[test]
    fn cells_start_zeroed_and_are_bounds_checked() {
        let mut g = Grid::new(2, 2, 4, 4, Vec2::zero());
        assert_eq!(g.cells(), &[0, 0, 0, 0]);
        assert!(g.set_cell(3, 7));
        assert_eq!(g.cell(3), Some(7));
        assert!(!g.set_cell(4, 1));
        assert!(!g.set_cell(-1, 1));
        assert_eq!(g.cell(-1), None);
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn line_geometry_vertex_count() {
        let g = editor_grid();
        let v = g.build_line_geometry([320, 240]);
        assert_eq!(v.len(), 2 * (60 + 80));
    }

    #[test]
    fn line_geometry_uses_row_height_for_rows() {
        let g = Grid::new(4, 4, 8, 2, Vec2::new(1.0, 1.0)).with_line_color(Color::GREEN);
        let v = g.build_line_geometry([16, 4]);

        // Two rows, two columns.
        assert_eq!(v.len(), 8);
        assert_eq!(v[2].position, [1.0, 3.0]);
        assert_eq!(v[3].position, [17.0, 3.0]);
        assert_eq!(v[6].position, [9.0, 1.0]);
        assert_eq!(v[7].position, [9.0, 5.0]);
        assert!(v.iter().all(|x| x.color == Color::GREEN.to_array()));
    }
}
