use crate::coords::{Rect, Viewport};
use crate::paint::Color;

use super::texture::{textured_quad, validate_textured};
use super::{BatchItem, ItemKind, RenderEffects, TextureRef, TextureVertex, VERTICES_PER_ITEM};

/// One character cut from a font atlas texture.
///
/// Packs like a [`TextureItem`](super::TextureItem); kept as its own kind so
/// text batches and flushes independently of sprites.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct GlyphItem {
    pub glyph: char,
    /// Glyph cell in the atlas, in texture pixels.
    pub src_rect: Rect,
    pub dest_rect: Rect,
    pub scale: f32,
    pub angle: f32,
    pub tint: Color,
    pub effects: RenderEffects,
    pub atlas: TextureRef,
    pub layer: i32,
}

impl GlyphItem {
    pub fn new(glyph: char, atlas: TextureRef, src_rect: Rect, dest_rect: Rect, tint: Color) -> Self {
        Self {
            glyph,
            src_rect,
            dest_rect,
            scale: 1.0,
            angle: 0.0,
            tint,
            effects: RenderEffects::None,
            atlas,
            layer: 0,
        }
    }
}

impl BatchItem for GlyphItem {
    const KIND: ItemKind = ItemKind::Glyph;
    type Vertex = TextureVertex;

    #[inline]
    fn layer(&self) -> i32 {
        self.layer
    }

    #[inline]
    fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    #[inline]
    fn texture(&self) -> Option<TextureRef> {
        Some(self.atlas)
    }

    fn validate(&self) -> Result<(), &'static str> {
        validate_textured(self.atlas, self.src_rect, self.dest_rect, self.scale, self.angle, self.tint)
    }

    fn vertices(&self, viewport: Viewport) -> [TextureVertex; VERTICES_PER_ITEM as usize] {
        textured_quad(
            self.atlas,
            self.src_rect,
            self.dest_rect,
            self.scale,
            self.angle,
            self.tint,
            self.effects,
            viewport,
        )
    }
}
