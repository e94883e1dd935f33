use bytemuck::{Pod, Zeroable};

use crate::coords::{CornerRadii, Rect, Viewport};
use crate::layout::{FieldType, VertexField, VertexType};
use crate::paint::Color;

use super::{BatchItem, ItemKind, VERTICES_PER_ITEM};

/// Filled or outlined rectangle with optional rounded corners.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RectItem {
    pub rect: Rect,
    pub color: Color,
    /// `false` draws only a border of `border_thickness` pixels.
    pub is_solid: bool,
    pub border_thickness: f32,
    pub corner_radius: CornerRadii,
    pub layer: i32,
}

impl RectItem {
    /// Solid rectangle with square corners.
    pub fn solid(rect: Rect, color: Color) -> Self {
        Self {
            rect,
            color,
            is_solid: true,
            ..Self::default()
        }
    }

    /// Rectangle outline `thickness` pixels wide.
    pub fn outline(rect: Rect, color: Color, thickness: f32) -> Self {
        Self {
            rect,
            color,
            is_solid: false,
            border_thickness: thickness,
            ..Self::default()
        }
    }

    pub fn with_corner_radius(mut self, radius: CornerRadii) -> Self {
        self.corner_radius = radius;
        self
    }
}

/// Vertex record for [`RectItem`].
///
/// `rectangle` repeats the item rect (logical px) on every vertex so the
/// fragment stage can evaluate the rounded-box distance locally.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct RectVertex {
    pub position: [f32; 2],
    pub rectangle: [f32; 4],
    pub color: [f32; 4],
    pub is_solid: f32,
    pub border_thickness: f32,
    pub corner_radius: [f32; 4],
}

impl VertexType for RectVertex {
    const NAME: &'static str = "RectVertex";

    const FIELDS: &'static [VertexField] = &[
        VertexField::new("position", FieldType::Vec2),
        VertexField::new("rectangle", FieldType::Vec4),
        VertexField::new("color", FieldType::Vec4),
        VertexField::new("is_solid", FieldType::F32),
        VertexField::new("border_thickness", FieldType::F32),
        VertexField::new("corner_radius", FieldType::Vec4),
    ];
}

impl BatchItem for RectItem {
    const KIND: ItemKind = ItemKind::Rect;
    type Vertex = RectVertex;

    #[inline]
    fn layer(&self) -> i32 {
        self.layer
    }

    #[inline]
    fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    fn validate(&self) -> Result<(), &'static str> {
        if !self.rect.is_finite() || !self.color.is_finite() {
            return Err("geometry and color must be finite");
        }
        if self.rect.is_empty() {
            return Err("width and height must be greater than zero");
        }
        if !self.is_solid && self.border_thickness <= 0.0 {
            return Err("an outline needs a positive border thickness");
        }
        Ok(())
    }

    fn vertices(&self, viewport: Viewport) -> [RectVertex; VERTICES_PER_ITEM as usize] {
        let rectangle = self.rect.to_array();
        let color = self.color.to_array();
        let is_solid = if self.is_solid { 1.0 } else { 0.0 };
        let corner_radius = self.corner_radius.to_array();

        self.rect.quad_corners().map(|corner| RectVertex {
            position: viewport.to_clip(corner),
            rectangle,
            color,
            is_solid,
            border_thickness: self.border_thickness,
            corner_radius,
        })
    }
}
