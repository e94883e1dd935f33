/// Per-corner radii for a rounded rectangle (logical pixels).
///
/// Packed into rect vertices as `[top_left, bottom_left, top_right, bottom_right]`,
/// the same order as the quad's vertices. Negative values are clamped to zero by the shader.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CornerRadii {
    pub top_left: f32,
    pub bottom_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
}

impl CornerRadii {
    #[inline]
    pub const fn new(top_left: f32, bottom_left: f32, top_right: f32, bottom_right: f32) -> Self {
        Self { top_left, bottom_left, top_right, bottom_right }
    }

    /// Uniform radius on all four corners.
    #[inline]
    pub const fn all(r: f32) -> Self {
        Self::new(r, r, r, r)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.top_left, self.bottom_left, self.top_right, self.bottom_right]
    }
}
