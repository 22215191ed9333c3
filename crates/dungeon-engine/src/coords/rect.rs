use super::Vec2;

/// Axis-aligned rectangle (top-left origin, +Y down).
///
/// Used both for screen geometry and for atlas sub-rectangles, where the
/// components are integer texel coordinates stored as `f32`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Rectangle from integer pixel coordinates (atlas records).
    #[inline]
    pub fn from_px(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self::new(x as f32, y as f32, w as f32, h as f32)
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn top_left(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn top_right(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y)
    }

    #[inline]
    pub fn bottom_left(self) -> Vec2 {
        Vec2::new(self.origin.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn bottom_right(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.origin.x
            && p.y >= self.origin.y
            && p.x < self.origin.x + self.size.x
            && p.y < self.origin.y + self.size.y
    }

    /// Returns the rectangle moved by `offset`.
    #[inline]
    pub fn translated(self, offset: Vec2) -> Self {
        Self::from_origin_size(self.origin + offset, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── corners ───────────────────────────────────────────────────────────

    #[test]
    fn corners_follow_top_left_origin() {
        let rect = r(2.0, 3.0, 10.0, 20.0);
        assert_eq!(rect.top_left(), Vec2::new(2.0, 3.0));
        assert_eq!(rect.top_right(), Vec2::new(12.0, 3.0));
        assert_eq!(rect.bottom_left(), Vec2::new(2.0, 23.0));
        assert_eq!(rect.bottom_right(), Vec2::new(12.0, 23.0));
    }

    #[test]
    fn from_px_converts_integer_fields() {
        assert_eq!(Rect::from_px(8, 16, 4, 4), r(8.0, 16.0, 4.0, 4.0));
    }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_top_left_inclusive() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn contains_bottom_right_exclusive() {
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn contains_outside() {
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(-1.0, 5.0)));
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(5.0, -1.0)));
    }

    // ── misc ──────────────────────────────────────────────────────────────

    #[test]
    fn translated_keeps_size() {
        let moved = r(1.0, 1.0, 4.0, 4.0).translated(Vec2::new(10.0, -1.0));
        assert_eq!(moved, r(11.0, 0.0, 4.0, 4.0));
    }

    #[test]
    fn is_empty_zero_size() {
        assert!(Rect::zero().is_empty());
        assert!(!r(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
