/// Drawable surface size in physical pixels.
///
/// Renderers treat this as the coordinate basis for converting pixel positions
/// to NDC in the shader. Recomputed from the surface on every frame, so a window
/// resize changes the view transform without touching any vertex data.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Uniform factor mapping a logical resolution onto this viewport.
    ///
    /// Only the X ratio is used; the aspect ratio of upscaled content is locked
    /// to it, so Y may overflow or underfill a window with a different aspect.
    #[inline]
    pub fn upscale_factor(self, logical_width: u32) -> f32 {
        if logical_width == 0 {
            return 1.0;
        }
        self.width / logical_width as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upscale_uses_x_ratio_only() {
        let vp = Viewport::new(1280.0, 1024.0);
        assert_eq!(vp.upscale_factor(320), 4.0);
    }

    #[test]
    fn upscale_zero_resolution_is_identity() {
        assert_eq!(Viewport::new(800.0, 600.0).upscale_factor(0), 1.0);
    }
}
