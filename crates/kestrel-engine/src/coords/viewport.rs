use super::Vec2;

/// Viewport size in surface pixels.
///
/// GPU buffers keep the last size announced on the bus and use it to map
/// pixel positions to clip space. A stale viewport draws in the wrong place
/// but never fails.
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

    /// Maps a pixel position to clip space (`-1..1`, +Y up).
    ///
    /// An invalid viewport is treated as 1×1 so the result stays finite.
    #[inline]
    pub fn to_clip(self, p: Vec2) -> [f32; 2] {
        let w = if self.is_valid() { self.width } else { 1.0 };
        let h = if self.is_valid() { self.height } else { 1.0 };
        [p.x / w * 2.0 - 1.0, 1.0 - p.y / h * 2.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn corners_map_to_clip_extremes() {
        let vp = Viewport::new(800.0, 600.0);
        assert_eq!(vp.to_clip(Vec2::new(0.0, 0.0)), [-1.0, 1.0]);
        assert_eq!(vp.to_clip(Vec2::new(800.0, 600.0)), [1.0, -1.0]);
    }

    #[test]
    fn center_maps_to_origin() {
        let [x, y] = Viewport::new(800.0, 600.0).to_clip(Vec2::new(400.0, 300.0));
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0);
    }

    #[test]
    fn invalid_viewport_stays_finite() {
        let [x, y] = Viewport::default().to_clip(Vec2::new(5.0, 5.0));
        assert!(x.is_finite() && y.is_finite());
    }
}
