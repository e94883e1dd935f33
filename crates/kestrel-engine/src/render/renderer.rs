use std::rc::Rc;

use crate::backend::{GraphicsDevice, ProgramId, TextureId};
use crate::batch::{AddOutcome, BatchingService};
use crate::buffer::GpuBuffer;
use crate::bus::NotificationBus;
use crate::config::BatchConfig;
use crate::error::{Error, Result};
use crate::items::{BatchItem, INDICES_PER_ITEM};

use super::ShaderLibrary;

/// Draw calls and items submitted by one renderer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DrawStats {
    pub draw_calls: u32,
    pub items: u32,
}

impl DrawStats {
    pub(super) fn add(&mut self, other: DrawStats) {
        self.draw_calls += other.draw_calls;
        self.items += other.items;
    }
}

/// Batches and draws one item kind.
///
/// Items are validated, tagged with their layer and queued. A batch that
/// fills is flushed right away; whatever remains is flushed explicitly (or by
/// [`super::FrameRenderer::end_frame`]).
pub struct Renderer<I: BatchItem> {
    device: Rc<dyn GraphicsDevice>,
    program: ProgramId,
    buffer: GpuBuffer<I>,
    batch: BatchingService<I>,
    stats: DrawStats,
}

impl<I: BatchItem> Renderer<I> {
    pub fn new(
        device: Rc<dyn GraphicsDevice>,
        bus: &NotificationBus,
        shaders: &ShaderLibrary,
        config: BatchConfig,
    ) -> Result<Self> {
        Ok(Self {
            program: shaders.program(I::KIND),
            buffer: GpuBuffer::new(Rc::clone(&device), bus, config)?,
            batch: BatchingService::new(bus, config),
            device,
            stats: DrawStats::default(),
        })
    }

    #[inline]
    pub fn buffer(&self) -> &GpuBuffer<I> {
        &self.buffer
    }

    #[inline]
    pub fn batch(&self) -> &BatchingService<I> {
        &self.batch
    }

    /// Totals since the last [`Renderer::reset_stats`].
    #[inline]
    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DrawStats::default();
    }

    /// Queues `item` on `layer`. Lower layers draw first.
    pub fn render(&mut self, mut item: I, layer: i32) -> Result<()> {
        item.validate()
            .map_err(|reason| Error::InvalidItem { kind: I::KIND, reason })?;
        item.set_layer(layer);

        match self.batch.add(item)? {
            AddOutcome::Queued => Ok(()),
            AddOutcome::Filled => self.flush(),
            AddOutcome::Dropped => Err(Error::BatchFull { kind: I::KIND }),
        }
    }

    pub fn render_range(&mut self, items: impl IntoIterator<Item = I>, layer: i32) -> Result<()> {
        for item in items {
            self.render(item, layer)?;
        }
        Ok(())
    }

    /// Uploads and draws everything queued, ordered by `(layer, slot)`, then
    /// empties the batch. Does nothing when the batch is empty.
    pub fn flush(&mut self) -> Result<()> {
        let items = self.sorted_pending();
        if items.is_empty() {
            return Ok(());
        }

        self.upload(&items)?;
        self.draw(&items, 0)?;
        self.batch.empty_batch();

        log::trace!("{} flush: {} items", I::KIND, items.len());
        Ok(())
    }

    /// Queued items in draw order.
    pub(super) fn sorted_pending(&self) -> Vec<I> {
        let mut pending = self.batch.occupied_items();
        pending.sort_by_key(|(slot, item)| (item.layer(), *slot));
        pending.into_iter().map(|(_, item)| item).collect()
    }

    /// Writes `items` to consecutive slots starting at 0.
    pub(super) fn upload(&self, items: &[I]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.buffer.prepare_for_upload()?;
        for (slot, item) in items.iter().enumerate() {
            self.buffer.upload_vertex_data(item, slot as u32)?;
        }
        Ok(())
    }

    /// Draws `items`, previously uploaded starting at `first_slot`.
    ///
    /// Kinds without a texture draw in one call. Textured kinds draw one call
    /// per run of items sharing a texture, binding it first.
    pub(super) fn draw(&mut self, items: &[I], first_slot: u32) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        self.buffer.prepare_for_upload()?;
        self.device.use_program(self.program);

        let mut start = 0;
        while start < items.len() {
            let texture = items[start].texture().map(|t| t.id);
            let len = items[start..]
                .iter()
                .take_while(|i| i.texture().map(|t| t.id) == texture)
                .count();

            self.device.bind_texture(texture.unwrap_or(TextureId::NULL));
            self.device.draw_indexed(
                (first_slot + start as u32) * INDICES_PER_ITEM,
                len as u32 * INDICES_PER_ITEM,
            );
            self.stats.draw_calls += 1;
            start += len;
        }

        self.stats.items += items.len() as u32;
        Ok(())
    }

    pub(super) fn clear(&self) {
        self.batch.empty_batch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessDevice;
    use crate::bus::ids::{BatchSize, BATCH_SIZE_SET, GL_INITIALIZED, VIEWPORT_SIZE_CHANGED};
    use crate::coords::{Rect, Vec2, Viewport};
    use crate::items::{ItemKind, LineItem, RectItem, RectVertex, TextureItem, TextureRef};
    use crate::paint::Color;

    struct Fixture {
        device: Rc<HeadlessDevice>,
        bus: NotificationBus,
        shaders: ShaderLibrary,
    }

    fn fixture() -> Fixture {
        let device = Rc::new(HeadlessDevice::new());
        let bus = NotificationBus::new();
        let shaders = ShaderLibrary::new(device.clone());
        Fixture { device, bus, shaders }
    }

    impl Fixture {
        fn renderer<I: BatchItem>(&self, batch_size: u32) -> Renderer<I> {
            Renderer::new(self.device.clone(), &self.bus, &self.shaders, BatchConfig { batch_size }).unwrap()
        }

        fn start(&self) {
            self.bus.push(GL_INITIALIZED, "test").unwrap();
            self.bus
                .push_data(VIEWPORT_SIZE_CHANGED, "test", &Viewport::new(200.0, 200.0))
                .unwrap();
        }
    }

    fn rect(x: f32) -> RectItem {
        RectItem::solid(Rect::new(x, 0.0, 10.0, 10.0), Color::WHITE)
    }

    // ── ordering ─────────────────────────────────────────────────────────

    #[test]
    fn lower_layer_is_uploaded_and_drawn_first() {
        let fx = fixture();
        let mut rects = fx.renderer::<RectItem>(2);
        fx.start();
        fx.bus.push_data(BATCH_SIZE_SET, "test", &BatchSize(2)).unwrap();

        let high = rect(100.0);
        let low = rect(0.0);
        rects.render(high, 5).unwrap();
        // Fills the batch of two and flushes.
        rects.render(low, -1).unwrap();

        let draws = fx.device.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!((draws[0].first_index, draws[0].index_count), (0, 12));

        let bytes = fx.device.buffer_contents(rects.buffer().vertex_buffer()).unwrap();
        let vp = Viewport::new(200.0, 200.0);
        let item_bytes = rects.buffer().item_bytes() as usize;
        assert_eq!(&bytes[..item_bytes], bytemuck::cast_slice::<RectVertex, u8>(&low.vertices(vp)));
        assert_eq!(
            &bytes[item_bytes..2 * item_bytes],
            bytemuck::cast_slice::<RectVertex, u8>(&high.vertices(vp))
        );
        assert_eq!(rects.batch().occupied_count(), 0);
    }

    #[test]
    fn equal_layers_keep_submission_order() {
        let fx = fixture();
        let mut rects = fx.renderer::<RectItem>(8);
        fx.start();

        rects.render(rect(1.0), 0).unwrap();
        rects.render(rect(2.0), 0).unwrap();
        let order: Vec<f32> = rects.sorted_pending().iter().map(|r| r.rect.origin.x).collect();
        assert_eq!(order, vec![1.0, 2.0]);
    }

    // ── flushing ─────────────────────────────────────────────────────────

    #[test]
    fn flush_of_empty_batch_draws_nothing() {
        let fx = fixture();
        let mut lines = fx.renderer::<LineItem>(4);
        fx.start();
        lines.flush().unwrap();
        assert!(fx.device.draws().is_empty());
    }

    #[test]
    fn explicit_flush_binds_program_and_draws_once() {
        let fx = fixture();
        let mut lines = fx.renderer::<LineItem>(10);
        fx.start();

        for i in 0..3 {
            let y = i as f32 * 10.0;
            lines
                .render(LineItem::new(Vec2::new(0.0, y), Vec2::new(50.0, y), Color::WHITE, 2.0), 0)
                .unwrap();
        }
        assert!(fx.device.draws().is_empty());
        lines.flush().unwrap();

        let draws = fx.device.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].index_count, 18);
        assert_eq!(draws[0].program, fx.shaders.program(ItemKind::Line));
        assert_eq!(draws[0].vao, lines.buffer().vertex_array());
        assert_eq!(lines.stats(), DrawStats { draw_calls: 1, items: 3 });
    }

    #[test]
    fn textured_items_draw_one_call_per_texture_run() {
        let fx = fixture();
        let mut sprites = fx.renderer::<TextureItem>(16);
        fx.start();

        let a = TextureRef::new(TextureId::from_raw(100), 8, 8);
        let b = TextureRef::new(TextureId::from_raw(200), 8, 8);
        let dest = Rect::new(0.0, 0.0, 8.0, 8.0);
        for tex in [a, a, b, a] {
            sprites.render(TextureItem::whole(tex, dest), 0).unwrap();
        }
        sprites.flush().unwrap();

        let runs: Vec<(TextureId, u32, u32)> = fx
            .device
            .draws()
            .iter()
            .map(|d| (d.texture, d.first_index, d.index_count))
            .collect();
        assert_eq!(runs, vec![(a.id, 0, 12), (b.id, 12, 6), (a.id, 18, 6)]);
    }

    #[test]
    fn flush_before_device_init_fails() {
        let fx = fixture();
        let mut rects = fx.renderer::<RectItem>(4);
        rects.render(rect(0.0), 0).unwrap();
        assert!(matches!(rects.flush(), Err(Error::Lifecycle(_))));
    }

    #[test]
    fn render_after_failed_fill_flush_reports_full_batch() {
        let fx = fixture();
        let mut rects = fx.renderer::<RectItem>(1);

        // Fills the batch; the flush fails because the device is not up yet.
        assert!(matches!(rects.render(rect(0.0), 0), Err(Error::Lifecycle(_))));
        assert_eq!(
            rects.render(rect(1.0), 0),
            Err(Error::BatchFull { kind: ItemKind::Rect })
        );
        assert_eq!(rects.batch().occupied_items(), vec![(0, rect(0.0))]);
    }

    // ── validation ───────────────────────────────────────────────────────

    #[test]
    fn invalid_items_are_rejected_before_batching() {
        let fx = fixture();
        let mut sprites = fx.renderer::<TextureItem>(4);

        let unregistered = TextureItem::whole(TextureRef::default(), Rect::new(0.0, 0.0, 4.0, 4.0));
        let err = sprites.render(unregistered, 0).unwrap_err();

        assert!(matches!(err, Error::InvalidItem { kind: ItemKind::Texture, .. }));
        assert_eq!(sprites.batch().occupied_count(), 0);
    }

    #[test]
    fn render_assigns_layer() {
        let fx = fixture();
        let mut rects = fx.renderer::<RectItem>(4);
        rects.render(rect(0.0), 7).unwrap();
        assert_eq!(rects.batch().occupied_items()[0].1.layer, 7);
    }
}
