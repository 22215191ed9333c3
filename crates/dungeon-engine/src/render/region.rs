use core::ops::Range;

/// Fixed window into the shared vertex buffer plus a write cursor.
///
/// Invariants:
/// - `offset` and `capacity` never change after partitioning
/// - `0 <= count <= capacity`
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BufferRegion {
    pub offset: u32,
    pub capacity: u32,
    pub count: u32,
}

impl BufferRegion {
    #[inline]
    pub const fn new(offset: u32, capacity: u32) -> Self {
        Self { offset, capacity, count: 0 }
    }

    /// Vertices that can still be written this frame.
    #[inline]
    pub fn remaining(self) -> u32 {
        self.capacity - self.count
    }

    #[inline]
    pub fn is_full(self) -> bool {
        self.count >= self.capacity
    }

    /// Whole reserved range `[offset, offset + capacity)`.
    #[inline]
    pub fn reserved(self) -> Range<u32> {
        self.offset..self.offset + self.capacity
    }

    /// Written range `[offset, offset + count)`.
    #[inline]
    pub fn written(self) -> Range<u32> {
        self.offset..self.offset + self.count
    }
}

/// Splits one buffer into contiguous regions, one per capacity.
///
/// `region[k].offset` is the prefix sum of `capacities[..k]`.
pub fn partition(capacities: &[u32]) -> Vec<BufferRegion> {
    let mut offset = 0u32;
    capacities
        .iter()
        .map(|&capacity| {
            let region = BufferRegion::new(offset, capacity);
            offset += capacity;
            region
        })
        .collect()
}
