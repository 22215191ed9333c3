use core::ops::Range;

use super::region::{partition, BufferRegion};
use super::vertex::Vertex;

/// Handle to one sub-allocation of a [`VertexArena`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RegionId(usize);

impl RegionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// CPU mirror of the shared GPU vertex buffer, split into fixed regions.
///
/// Regions are computed once at construction and never move. Writes are
/// bounds-checked against the region's remaining capacity and report how many
/// vertices were actually stored; excess input is dropped. The union of all
/// ranges written since the last [`take_dirty`](Self::take_dirty) is tracked so
/// the GPU copy can be updated with a single `write_buffer`.
#[derive(Debug)]
pub struct VertexArena {
    vertices: Vec<Vertex>,
    regions: Vec<BufferRegion>,
    dirty: Option<Range<usize>>,
}

impl VertexArena {
    /// Allocates one region per entry of `capacities`, in order.
    pub fn new(capacities: &[u32]) -> Self {
        let regions = partition(capacities);
        let total: usize = capacities.iter().map(|&c| c as usize).sum();

        Self {
            vertices: vec![Vertex::default(); total],
            regions,
            dirty: None,
        }
    }

    /// Ids of all regions in allocation order.
    pub fn region_ids(&self) -> Vec<RegionId> {
        (0..self.regions.len()).map(RegionId).collect()
    }

    #[inline]
    pub fn region(&self, id: RegionId) -> BufferRegion {
        self.regions[id.0]
    }

    #[inline]
    pub fn regions(&self) -> &[BufferRegion] {
        &self.regions
    }

    /// Total vertex capacity over all regions.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertices currently written into `id`.
    pub fn contents(&self, id: RegionId) -> &[Vertex] {
        let r = self.regions[id.0].written();
        &self.vertices[r.start as usize..r.end as usize]
    }

    /// Appends `src` at the region's cursor, truncated to its remaining capacity.
    ///
    /// Returns the number of vertices written. Never writes past
    /// `offset + capacity`.
    pub fn write(&mut self, id: RegionId, src: &[Vertex]) -> usize {
        let region = &mut self.regions[id.0];
        let n = src.len().min(region.remaining() as usize);
        if n == 0 {
            return 0;
        }

        let start = (region.offset + region.count) as usize;
        self.vertices[start..start + n].copy_from_slice(&src[..n]);
        region.count += n as u32;

        self.mark_dirty(start..start + n);
        n
    }

    /// Overwrites vertices already written to `id`, starting `offset` vertices
    /// into the region. The cursor does not move; input reaching past it is
    /// dropped. Returns the number of vertices replaced.
    pub fn write_at(&mut self, id: RegionId, offset: usize, src: &[Vertex]) -> usize {
        let region = self.regions[id.0];
        let n = src.len().min((region.count as usize).saturating_sub(offset));
        if n == 0 {
            return 0;
        }

        let start = region.offset as usize + offset;
        self.vertices[start..start + n].copy_from_slice(&src[..n]);
        self.mark_dirty(start..start + n);
        n
    }

    /// Rewinds the region's cursor. Stale vertices stay in place until overwritten.
    #[inline]
    pub fn reset(&mut self, id: RegionId) {
        self.regions[id.0].count = 0;
    }

    /// Returns and clears the range written since the previous call.
    pub fn take_dirty(&mut self) -> Option<Range<usize>> {
        self.dirty.take()
    }

    /// Marks everything currently written as pending upload, for a freshly
    /// created GPU buffer.
    pub fn mark_written_dirty(&mut self) {
        let end = self.regions.iter().map(|r| r.written().end).max().unwrap_or(0);
        if end > 0 {
            self.mark_dirty(0..end as usize);
        }
    }

    fn mark_dirty(&mut self, range: Range<usize>) {
        self.dirty = Some(match self.dirty.take() {
            None => range,
            Some(d) => d.start.min(range.start)..d.end.max(range.end),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Color, Vec2};

    fn verts(n: usize) -> Vec<Vertex> {
        (0..n)
            .map(|i| Vertex::colored(Vec2::new(i as f32, 0.0), Color::WHITE))
            .collect()
    }

    fn ids(arena: &VertexArena) -> Vec<RegionId> {
        arena.region_ids()
    }

    // ── write ─────────────────────────────────────────────────────────────

    #[test]
    fn write_appends_at_cursor() {
        let mut arena = VertexArena::new(&[4, 4]);
        let r = ids(&arena);

        assert_eq!(arena.write(r[1], &verts(2)), 2);
        assert_eq!(arena.write(r[1], &verts(1)), 1);

        let region = arena.region(r[1]);
        assert_eq!(region.count, 3);
        assert_eq!(arena.contents(r[1])[2].position, [0.0, 0.0]);
        assert_eq!(arena.as_slice()[4].position, [0.0, 0.0]);
        assert_eq!(arena.as_slice()[5].position, [1.0, 0.0]);
    }

    #[test]
    fn overflow_truncates_to_remaining_capacity() {
        let mut arena = VertexArena::new(&[5, 5]);
        let r = ids(&arena);

        arena.write(r[0], &verts(3));
        let written = arena.write(r[0], &verts(10));

        assert_eq!(written, 2);
        assert_eq!(arena.region(r[0]).count, 5);
        // Neighbouring region is untouched.
        assert!(arena.as_slice()[5..].iter().all(|v| *v == Vertex::default()));
    }

    #[test]
    fn full_region_accepts_nothing() {
        let mut arena = VertexArena::new(&[2]);
        let r = ids(&arena);
        arena.write(r[0], &verts(2));
        assert_eq!(arena.write(r[0], &verts(1)), 0);
        assert!(arena.region(r[0]).is_full());
    }

    #[test]
    fn reset_rewinds_cursor() {
        let mut arena = VertexArena::new(&[3]);
        let r = ids(&arena);
        arena.write(r[0], &verts(3));
        arena.reset(r[0]);
        assert_eq!(arena.region(r[0]).count, 0);
        assert!(arena.contents(r[0]).is_empty());
    }

    #[test]
    fn write_at_replaces_inside_cursor_only() {
        let mut arena = VertexArena::new(&[2, 6]);
        let r = ids(&arena);
        arena.write(r[1], &verts(4));
        arena.take_dirty();

        let patch = vec![Vertex::colored(Vec2::new(9.0, 9.0), Color::GREEN); 3];
        assert_eq!(arena.write_at(r[1], 2, &patch), 2);

        assert_eq!(arena.region(r[1]).count, 4);
        assert_eq!(arena.contents(r[1])[1].position, [1.0, 0.0]);
        assert_eq!(arena.contents(r[1])[2].position, [9.0, 9.0]);
        assert_eq!(arena.contents(r[1])[3].position, [9.0, 9.0]);
        // Only the replaced slice is pending upload.
        assert_eq!(arena.take_dirty(), Some(4..6));
        assert_eq!(arena.write_at(r[1], 4, &patch), 0);
        assert_eq!(arena.take_dirty(), None);
    }

    // ── dirty tracking ────────────────────────────────────────────────────

    #[test]
    fn dirty_range_covers_all_writes() {
        let mut arena = VertexArena::new(&[4, 4, 4]);
        let r = ids(&arena);

        arena.write(r[2], &verts(1));
        arena.write(r[0], &verts(2));

        assert_eq!(arena.take_dirty(), Some(0..9));
        assert_eq!(arena.take_dirty(), None);
    }

    #[test]
    fn truncated_write_is_not_dirty() {
        let mut arena = VertexArena::new(&[1]);
        let r = ids(&arena);
        arena.write(r[0], &verts(1));
        arena.take_dirty();
        arena.write(r[0], &verts(1));
        assert_eq!(arena.take_dirty(), None);
    }

    #[test]
    fn mark_written_dirty_covers_persisted_regions() {
        let mut arena = VertexArena::new(&[4, 4, 4]);
        let r = ids(&arena);
        arena.write(r[0], &verts(3));
        arena.write(r[1], &verts(2));
        arena.take_dirty();

        arena.mark_written_dirty();
        assert_eq!(arena.take_dirty(), Some(0..6));

        arena.reset(r[0]);
        arena.reset(r[1]);
        arena.mark_written_dirty();
        assert_eq!(arena.take_dirty(), None);
    }
}
