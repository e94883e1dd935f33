use bytemuck::{Pod, Zeroable};

use crate::coords::{Vec2, Viewport};
use crate::layout::{FieldType, VertexField, VertexType};
use crate::paint::Color;

use super::{BatchItem, ItemKind, VERTICES_PER_ITEM};

/// Straight line segment drawn as a quad `thickness` pixels wide.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LineItem {
    pub p1: Vec2,
    pub p2: Vec2,
    pub color: Color,
    pub thickness: f32,
    pub layer: i32,
}

impl LineItem {
    pub fn new(p1: Vec2, p2: Vec2, color: Color, thickness: f32) -> Self {
        Self {
            p1,
            p2,
            color,
            thickness,
            layer: 0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl VertexType for LineVertex {
    const NAME: &'static str = "LineVertex";

    const FIELDS: &'static [VertexField] = &[
        VertexField::new("position", FieldType::Vec2),
        VertexField::new("color", FieldType::Vec4),
    ];
}

impl BatchItem for LineItem {
    const KIND: ItemKind = ItemKind::Line;
    type Vertex = LineVertex;

    #[inline]
    fn layer(&self) -> i32 {
        self.layer
    }

    #[inline]
    fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    fn validate(&self) -> Result<(), &'static str> {
        if !self.p1.is_finite() || !self.p2.is_finite() || !self.color.is_finite() {
            return Err("endpoints and color must be finite");
        }
        if self.thickness <= 0.0 {
            return Err("thickness must be greater than zero");
        }
        if self.p1 == self.p2 {
            return Err("endpoints must differ");
        }
        Ok(())
    }

    fn vertices(&self, viewport: Viewport) -> [LineVertex; VERTICES_PER_ITEM as usize] {
        let half = (self.p2 - self.p1).perpendicular() * (self.thickness * 0.5);
        let color = self.color.to_array();

        [self.p1 - half, self.p1 + half, self.p2 - half, self.p2 + half].map(|p| LineVertex {
            position: viewport.to_clip(p),
            color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::VertexLayout;

    #[test]
    fn descriptor_matches_struct() {
        assert_eq!(VertexLayout::validate::<LineVertex>().unwrap().stride(), 24);
    }

    #[test]
    fn horizontal_line_extends_vertically_by_half_thickness() {
        let vp = Viewport::new(100.0, 100.0);
        let line = LineItem::new(Vec2::new(10.0, 50.0), Vec2::new(90.0, 50.0), Color::WHITE, 10.0);
        let v = line.vertices(vp);

        // y = 45 and y = 55 in pixels.
        assert_eq!(v[0].position, vp.to_clip(Vec2::new(10.0, 45.0)));
        assert_eq!(v[1].position, vp.to_clip(Vec2::new(10.0, 55.0)));
        assert_eq!(v[2].position, vp.to_clip(Vec2::new(90.0, 45.0)));
        assert_eq!(v[3].position, vp.to_clip(Vec2::new(90.0, 55.0)));
    }

    #[test]
    fn validate_rejects_zero_length_and_thickness() {
        let p = Vec2::new(1.0, 1.0);
        assert!(LineItem::new(p, p, Color::WHITE, 1.0).validate().is_err());
        assert!(LineItem::new(p, Vec2::zero(), Color::WHITE, 0.0).validate().is_err());
        assert!(LineItem::new(p, Vec2::zero(), Color::WHITE, 1.0).validate().is_ok());
    }
}
