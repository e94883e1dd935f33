use std::rc::Rc;

use crate::backend::GraphicsDevice;
use crate::bus::ids::{BatchSize, BATCH_SIZE_SET};
use crate::bus::NotificationBus;
use crate::config::BatchConfig;
use crate::error::Result;
use crate::items::{BatchItem, GlyphItem, ItemKind, LineItem, RectItem, TextureItem};

use super::{DrawStats, Renderer, ShaderLibrary};

const PUBLISHER: &str = "FrameRenderer";

/// Totals for one frame, across every kind.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub draw_calls: u32,
    pub items: u32,
}

/// A stretch of the merged end-of-frame order belonging to one kind.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Segment {
    kind: ItemKind,
    first_slot: u32,
    len: u32,
}

/// Owns one renderer per item kind and orders them at end of frame.
///
/// Items of every kind are drawn by `(layer, kind, submission order)`, kinds
/// ranked rect < line < texture < glyph. Only a batch that fills mid-frame is
/// drawn early.
pub struct FrameRenderer {
    bus: NotificationBus,
    shaders: ShaderLibrary,
    rects: Renderer<RectItem>,
    lines: Renderer<LineItem>,
    textures: Renderer<TextureItem>,
    glyphs: Renderer<GlyphItem>,
    frame: u64,
    last: FrameStats,
}

impl FrameRenderer {
    pub fn new(device: Rc<dyn GraphicsDevice>, bus: &NotificationBus, config: BatchConfig) -> Result<Self> {
        let shaders = ShaderLibrary::new(Rc::clone(&device));
        Ok(Self {
            rects: Renderer::new(Rc::clone(&device), bus, &shaders, config)?,
            lines: Renderer::new(Rc::clone(&device), bus, &shaders, config)?,
            textures: Renderer::new(Rc::clone(&device), bus, &shaders, config)?,
            glyphs: Renderer::new(device, bus, &shaders, config)?,
            shaders,
            bus: bus.clone(),
            frame: 0,
            last: FrameStats::default(),
        })
    }

    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    pub fn rects(&mut self) -> &mut Renderer<RectItem> {
        &mut self.rects
    }

    pub fn lines(&mut self) -> &mut Renderer<LineItem> {
        &mut self.lines
    }

    pub fn textures(&mut self) -> &mut Renderer<TextureItem> {
        &mut self.textures
    }

    pub fn glyphs(&mut self) -> &mut Renderer<GlyphItem> {
        &mut self.glyphs
    }

    pub fn render_rect(&mut self, item: RectItem, layer: i32) -> Result<()> {
        self.rects.render(item, layer)
    }

    pub fn render_line(&mut self, item: LineItem, layer: i32) -> Result<()> {
        self.lines.render(item, layer)
    }

    pub fn render_texture(&mut self, item: TextureItem, layer: i32) -> Result<()> {
        self.textures.render(item, layer)
    }

    pub fn render_glyph(&mut self, item: GlyphItem, layer: i32) -> Result<()> {
        self.glyphs.render(item, layer)
    }

    /// Announces a new batch size to every buffer and batching service.
    ///
    /// Pending items of every kind are discarded.
    pub fn set_batch_size(&self, batch_size: u32) -> Result<()> {
        log::debug!("batch size set to {batch_size}");
        self.bus.push_data(BATCH_SIZE_SET, PUBLISHER, &BatchSize(batch_size))
    }

    /// Stats of the last completed frame.
    pub fn stats(&self) -> FrameStats {
        self.last
    }

    pub fn begin_frame(&mut self) {
        self.rects.reset_stats();
        self.lines.reset_stats();
        self.textures.reset_stats();
        self.glyphs.reset_stats();
    }

    /// Discards everything still queued without drawing it.
    pub fn abandon_frame(&mut self) {
        self.rects.clear();
        self.lines.clear();
        self.textures.clear();
        self.glyphs.clear();
    }

    /// Draws everything still queued, preserving layer order across kinds.
    pub fn end_frame(&mut self) -> Result<FrameStats> {
        let rects = self.rects.sorted_pending();
        let lines = self.lines.sorted_pending();
        let textures = self.textures.sorted_pending();
        let glyphs = self.glyphs.sorted_pending();

        let segments = merge_segments([
            layers_of(&rects),
            layers_of(&lines),
            layers_of(&textures),
            layers_of(&glyphs),
        ]);

        self.rects.upload(&rects)?;
        self.lines.upload(&lines)?;
        self.textures.upload(&textures)?;
        self.glyphs.upload(&glyphs)?;

        for seg in &segments {
            let range = seg.first_slot as usize..(seg.first_slot + seg.len) as usize;
            match seg.kind {
                ItemKind::Rect => self.rects.draw(&rects[range], seg.first_slot)?,
                ItemKind::Line => self.lines.draw(&lines[range], seg.first_slot)?,
                ItemKind::Texture => self.textures.draw(&textures[range], seg.first_slot)?,
                ItemKind::Glyph => self.glyphs.draw(&glyphs[range], seg.first_slot)?,
            }
        }

        self.abandon_frame();

        let mut totals = DrawStats::default();
        for s in [self.rects.stats(), self.lines.stats(), self.textures.stats(), self.glyphs.stats()] {
            totals.add(s);
        }

        self.frame += 1;
        self.last = FrameStats {
            frame: self.frame,
            draw_calls: totals.draw_calls,
            items: totals.items,
        };
        log::trace!(
            "frame {}: {} segments, {} draw calls, {} items",
            self.frame,
            segments.len(),
            totals.draw_calls,
            totals.items
        );
        Ok(self.last)
    }
}

fn layers_of<I: BatchItem>(items: &[I]) -> Vec<i32> {
    items.iter().map(|i| i.layer()).collect()
}

/// Merges per-kind layer lists (each already in draw order, indexed by
/// `ItemKind as usize`) into same-kind draw segments.
fn merge_segments(layers: [Vec<i32>; 4]) -> Vec<Segment> {
    let mut order: Vec<(i32, ItemKind, u32)> = Vec::new();
    for kind in ItemKind::ALL {
        for (slot, layer) in layers[kind as usize].iter().enumerate() {
            order.push((*layer, kind, slot as u32));
        }
    }
    order.sort_unstable();

    let mut segments: Vec<Segment> = Vec::new();
    for (_, kind, slot) in order {
        match segments.last_mut() {
            Some(seg) if seg.kind == kind && seg.first_slot + seg.len == slot => seg.len += 1,
            _ => segments.push(Segment {
                kind,
                first_slot: slot,
                len: 1,
            }),
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessDevice, TextureId};
    use crate::bus::ids::{GL_INITIALIZED, VIEWPORT_SIZE_CHANGED};
    use crate::coords::{Rect, Vec2, Viewport};
    use crate::items::TextureRef;
    use crate::paint::Color;

    fn setup(batch_size: u32) -> (Rc<HeadlessDevice>, NotificationBus, FrameRenderer) {
        let device = Rc::new(HeadlessDevice::new());
        let bus = NotificationBus::new();
        let frame = FrameRenderer::new(device.clone(), &bus, BatchConfig { batch_size }).unwrap();
        bus.push(GL_INITIALIZED, "test").unwrap();
        bus.push_data(VIEWPORT_SIZE_CHANGED, "test", &Viewport::new(320.0, 240.0))
            .unwrap();
        (device, bus, frame)
    }

    fn rect() -> RectItem {
        RectItem::solid(Rect::new(0.0, 0.0, 4.0, 4.0), Color::WHITE)
    }

    fn line() -> LineItem {
        LineItem::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0), Color::WHITE, 1.0)
    }

    // ── segment merging ──────────────────────────────────────────────────

    #[test]
    fn non_interleaved_kinds_make_one_segment_each() {
        let segs = merge_segments([vec![0, 0, 1], vec![2], vec![], vec![5, 5]]);
        assert_eq!(
            segs,
            vec![
                Segment { kind: ItemKind::Rect, first_slot: 0, len: 3 },
                Segment { kind: ItemKind::Line, first_slot: 0, len: 1 },
                Segment { kind: ItemKind::Glyph, first_slot: 0, len: 2 },
            ]
        );
    }

    #[test]
    fn interleaved_layers_split_segments() {
        let segs = merge_segments([vec![0, 2], vec![1], vec![], vec![]]);
        let kinds: Vec<(ItemKind, u32, u32)> = segs.iter().map(|s| (s.kind, s.first_slot, s.len)).collect();
        assert_eq!(
            kinds,
            vec![(ItemKind::Rect, 0, 1), (ItemKind::Line, 0, 1), (ItemKind::Rect, 1, 1)]
        );
    }

    #[test]
    fn same_layer_orders_by_kind_rank() {
        let segs = merge_segments([vec![3], vec![3], vec![3], vec![3]]);
        let kinds: Vec<ItemKind> = segs.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, ItemKind::ALL.to_vec());
    }

    // ── end of frame ─────────────────────────────────────────────────────

    #[test]
    fn end_frame_draws_kinds_in_layer_order() {
        let (device, _bus, mut frame) = setup(16);
        frame.begin_frame();

        frame.render_line(line(), 0).unwrap();
        frame.render_rect(rect(), 1).unwrap();
        frame.render_rect(rect(), -2).unwrap();

        let stats = frame.end_frame().unwrap();
        let programs: Vec<_> = device.draws().iter().map(|d| d.program).collect();
        let shaders = frame.shaders();
        assert_eq!(
            programs,
            vec![
                shaders.program(ItemKind::Rect),
                shaders.program(ItemKind::Line),
                shaders.program(ItemKind::Rect),
            ]
        );

        let rect_draws: Vec<(u32, u32)> = device
            .draws()
            .iter()
            .filter(|d| d.program == shaders.program(ItemKind::Rect))
            .map(|d| (d.first_index, d.index_count))
            .collect();
        assert_eq!(rect_draws, vec![(0, 6), (6, 6)]);
        assert_eq!(stats, FrameStats { frame: 1, draw_calls: 3, items: 3 });
        assert_eq!(frame.rects().batch().occupied_count(), 0);
    }

    #[test]
    fn mid_frame_fill_flushes_early_and_counts() {
        let (device, _bus, mut frame) = setup(2);
        frame.begin_frame();

        for _ in 0..3 {
            frame.render_rect(rect(), 0).unwrap();
        }
        assert_eq!(device.draws().len(), 1);

        let stats = frame.end_frame().unwrap();
        assert_eq!(device.draws().len(), 2);
        assert_eq!(stats.items, 3);
        assert_eq!(stats.draw_calls, 2);
    }

    #[test]
    fn empty_frame_draws_nothing() {
        let (device, _bus, mut frame) = setup(4);
        frame.begin_frame();
        let stats = frame.end_frame().unwrap();
        assert!(device.draws().is_empty());
        assert_eq!(stats, FrameStats { frame: 1, draw_calls: 0, items: 0 });
    }

    #[test]
    fn textured_segments_split_by_texture() {
        let (device, _bus, mut frame) = setup(8);
        let a = TextureRef::new(TextureId::from_raw(50), 4, 4);
        let b = TextureRef::new(TextureId::from_raw(60), 4, 4);
        let dest = Rect::new(0.0, 0.0, 4.0, 4.0);

        frame.render_texture(TextureItem::whole(a, dest), 0).unwrap();
        frame.render_texture(TextureItem::whole(b, dest), 0).unwrap();
        frame.end_frame().unwrap();

        let textures: Vec<TextureId> = device.draws().iter().map(|d| d.texture).collect();
        assert_eq!(textures, vec![a.id, b.id]);
    }

    #[test]
    fn abandoned_frame_draws_nothing_next_time() {
        let (device, _bus, mut frame) = setup(8);
        frame.render_rect(rect(), 0).unwrap();
        frame.render_line(line(), 0).unwrap();
        frame.abandon_frame();

        let stats = frame.end_frame().unwrap();
        assert!(device.draws().is_empty());
        assert_eq!(stats.items, 0);
    }

    #[test]
    fn set_batch_size_resizes_every_kind() {
        let (_device, _bus, mut frame) = setup(4);
        frame.set_batch_size(9).unwrap();
        assert_eq!(frame.rects().batch().capacity(), 9);
        assert_eq!(frame.glyphs().buffer().capacity(), 9);
    }
}
