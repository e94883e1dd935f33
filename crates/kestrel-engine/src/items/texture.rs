use bytemuck::{Pod, Zeroable};

use crate::backend::TextureId;
use crate::coords::{Rect, Vec2, Viewport};
use crate::layout::{FieldType, VertexField, VertexType};
use crate::paint::Color;

use super::{BatchItem, ItemKind, VERTICES_PER_ITEM};

/// A texture registered with the device, with its pixel size.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct TextureRef {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl TextureRef {
    pub const fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        !self.id.is_null() && self.width > 0 && self.height > 0
    }
}

/// Mirroring applied to the sampled region.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum RenderEffects {
    #[default]
    None,
    FlipHorizontally,
    FlipVertically,
    FlipBoth,
}

impl RenderEffects {
    #[inline]
    fn flips(self) -> (bool, bool) {
        match self {
            RenderEffects::None => (false, false),
            RenderEffects::FlipHorizontally => (true, false),
            RenderEffects::FlipVertically => (false, true),
            RenderEffects::FlipBoth => (true, true),
        }
    }
}

/// A region of a texture drawn into a destination rectangle.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TextureItem {
    /// Sampled region, in texture pixels.
    pub src_rect: Rect,
    /// Destination, in logical pixels. Scaling and rotation keep its center fixed.
    pub dest_rect: Rect,
    pub scale: f32,
    /// Clockwise, in degrees.
    pub angle: f32,
    /// Multiplied with the sampled color.
    pub tint: Color,
    pub effects: RenderEffects,
    pub texture: TextureRef,
    pub layer: i32,
}

impl TextureItem {
    /// Draws `src_rect` of `texture` into `dest_rect`, untinted.
    pub fn new(texture: TextureRef, src_rect: Rect, dest_rect: Rect) -> Self {
        Self {
            src_rect,
            dest_rect,
            scale: 1.0,
            angle: 0.0,
            tint: Color::WHITE,
            effects: RenderEffects::None,
            texture,
            layer: 0,
        }
    }

    /// Draws the whole texture at `dest_rect`.
    pub fn whole(texture: TextureRef, dest_rect: Rect) -> Self {
        let src = Rect::new(0.0, 0.0, texture.width as f32, texture.height as f32);
        Self::new(texture, src, dest_rect)
    }
}

/// Vertex record shared by textured quads and glyphs.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TextureVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
    pub tint: [f32; 4],
}

impl VertexType for TextureVertex {
    const NAME: &'static str = "TextureVertex";

    const FIELDS: &'static [VertexField] = &[
        VertexField::new("position", FieldType::Vec2),
        VertexField::new("tex_coord", FieldType::Vec2),
        VertexField::new("tint", FieldType::Vec4),
    ];
}

pub(super) fn validate_textured(
    texture: TextureRef,
    src: Rect,
    dest: Rect,
    scale: f32,
    angle: f32,
    tint: Color,
) -> Result<(), &'static str> {
    if !texture.is_valid() {
        return Err("texture must be registered and non-empty");
    }
    if !src.is_finite() || !dest.is_finite() || !tint.is_finite() || !angle.is_finite() {
        return Err("geometry and tint must be finite");
    }
    if src.is_empty() || dest.is_empty() {
        return Err("source and destination must have a positive size");
    }
    if !(scale > 0.0 && scale.is_finite()) {
        return Err("scale must be greater than zero");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(super) fn textured_quad(
    texture: TextureRef,
    src: Rect,
    dest: Rect,
    scale: f32,
    angle: f32,
    tint: Color,
    effects: RenderEffects,
    viewport: Viewport,
) -> [TextureVertex; VERTICES_PER_ITEM as usize] {
    let center = dest.center();
    let quad = Rect::from_center(center, Vec2::new(dest.size.x * scale, dest.size.y * scale));

    let tw = texture.width as f32;
    let th = texture.height as f32;
    let (mut u0, mut u1) = (src.left() / tw, src.right() / tw);
    let (mut v0, mut v1) = (src.top() / th, src.bottom() / th);

    let (flip_h, flip_v) = effects.flips();
    if flip_h {
        core::mem::swap(&mut u0, &mut u1);
    }
    if flip_v {
        core::mem::swap(&mut v0, &mut v1);
    }

    let uvs = [[u0, v0], [u0, v1], [u1, v0], [u1, v1]];
    let tint = tint.to_array();
    let corners = quad.quad_corners();

    let mut out = [TextureVertex::default(); VERTICES_PER_ITEM as usize];
    for (i, v) in out.iter_mut().enumerate() {
        *v = TextureVertex {
            position: viewport.to_clip(corners[i].rotate_about(center, angle)),
            tex_coord: uvs[i],
            tint,
        };
    }
    out
}

impl BatchItem for TextureItem {
    const KIND: ItemKind = ItemKind::Texture;
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
        Some(self.texture)
    }

    fn validate(&self) -> Result<(), &'static str> {
        validate_textured(self.texture, self.src_rect, self.dest_rect, self.scale, self.angle, self.tint)
    }

    fn vertices(&self, viewport: Viewport) -> [TextureVertex; VERTICES_PER_ITEM as usize] {
        textured_quad(
            self.texture,
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
