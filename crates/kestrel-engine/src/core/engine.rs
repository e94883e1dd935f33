use std::rc::Rc;

use crate::backend::{GraphicsDevice, WgpuDevice};
use crate::bus::ids::{GL_INITIALIZED, SYSTEM_SHUTTING_DOWN, VIEWPORT_SIZE_CHANGED};
use crate::bus::NotificationBus;
use crate::config::BatchConfig;
use crate::coords::Viewport;
use crate::error::Result;
use crate::render::FrameRenderer;

const PUBLISHER: &str = "Engine";

/// The rendering core wired to one graphics device.
///
/// Built before the device exists: every buffer subscribes at construction
/// and waits for [`Engine::device_ready`]. The runtime then announces the
/// viewport on every resize and [`Engine::shutdown`] on exit.
pub struct Engine<D: GraphicsDevice + 'static = WgpuDevice> {
    bus: NotificationBus,
    device: Rc<D>,
    renderer: FrameRenderer,
    viewport: Viewport,
    ready: bool,
    shut_down: bool,
}

impl Engine<WgpuDevice> {
    /// Engine on a detached [`WgpuDevice`].
    pub fn new(config: BatchConfig) -> Result<Self> {
        Self::with_device(Rc::new(WgpuDevice::new()), config)
    }
}

impl<D: GraphicsDevice + 'static> Engine<D> {
    pub fn with_device(device: Rc<D>, config: BatchConfig) -> Result<Self> {
        let bus = NotificationBus::new();
        let renderer = FrameRenderer::new(device.clone(), &bus, config)?;
        log::debug!("engine created (batch size {})", config.batch_size);

        Ok(Self {
            bus,
            device,
            renderer,
            viewport: Viewport::default(),
            ready: false,
            shut_down: false,
        })
    }

    #[inline]
    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn renderer(&mut self) -> &mut FrameRenderer {
        &mut self.renderer
    }

    /// Last viewport announced.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Announces that the device can take calls. Later calls do nothing.
    pub fn device_ready(&mut self) -> Result<()> {
        if self.ready || self.shut_down {
            return Ok(());
        }
        self.ready = true;
        log::debug!("publishing {GL_INITIALIZED}");
        self.bus.push(GL_INITIALIZED, PUBLISHER)
    }

    /// Announces a new drawable size, in surface pixels.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if !viewport.is_valid() {
            log::debug!("ignoring viewport {}x{}", viewport.width, viewport.height);
            return Ok(());
        }
        if viewport == self.viewport {
            return Ok(());
        }
        self.viewport = viewport;
        self.bus.push_data(VIEWPORT_SIZE_CHANGED, PUBLISHER, &viewport)
    }

    /// Releases every buffer and subscription. Idempotent.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        log::debug!("publishing {SYSTEM_SHUTTING_DOWN}");
        self.bus.push(SYSTEM_SHUTTING_DOWN, PUBLISHER)
    }
}

impl<D: GraphicsDevice + 'static> Drop for Engine<D> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("engine shutdown failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessDevice;
    use crate::buffer::BufferState;
    use crate::coords::Rect;
    use crate::items::RectItem;
    use crate::paint::Color;

    fn engine(batch_size: u32) -> (Rc<HeadlessDevice>, Engine<HeadlessDevice>) {
        let device = Rc::new(HeadlessDevice::new());
        let engine = Engine::with_device(device.clone(), BatchConfig { batch_size }).unwrap();
        (device, engine)
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    #[test]
    fn construction_touches_no_gpu_state() {
        let (device, mut engine) = engine(4);
        assert_eq!(device.live_buffer_count(), 0);
        assert_eq!(engine.renderer().rects().buffer().state(), BufferState::Uninitialized);
    }

    #[test]
    fn device_ready_initializes_every_buffer_once() {
        let (device, mut engine) = engine(4);
        engine.device_ready().unwrap();
        engine.device_ready().unwrap();

        // Vertex and index buffer per kind.
        assert_eq!(device.live_buffer_count(), 8);
        assert_eq!(engine.renderer().glyphs().buffer().state(), BufferState::Initialized);
    }

    #[test]
    fn viewport_reaches_buffers_and_invalid_sizes_are_ignored() {
        let (_device, mut engine) = engine(4);
        engine.set_viewport(Viewport::new(800.0, 600.0)).unwrap();
        engine.set_viewport(Viewport::new(0.0, 600.0)).unwrap();

        assert_eq!(engine.viewport(), Viewport::new(800.0, 600.0));
        assert_eq!(engine.renderer().lines().buffer().viewport(), Viewport::new(800.0, 600.0));
    }

    #[test]
    fn shutdown_disposes_buffers_and_is_idempotent() {
        let (device, mut engine) = engine(4);
        engine.device_ready().unwrap();
        engine.shutdown().unwrap();
        engine.shutdown().unwrap();

        assert_eq!(device.live_buffer_count(), 0);
        assert_eq!(device.live_vertex_array_count(), 0);
        assert_eq!(engine.renderer().rects().buffer().state(), BufferState::Disposed);
        assert_eq!(engine.bus().subscriber_count(GL_INITIALIZED), 0);

        engine.device_ready().unwrap();
        assert_eq!(device.live_vertex_array_count(), 0);
    }

    #[test]
    fn frame_draws_after_ready() {
        let (device, mut engine) = engine(4);
        engine.device_ready().unwrap();
        engine.set_viewport(Viewport::new(100.0, 100.0)).unwrap();

        let renderer = engine.renderer();
        renderer.begin_frame();
        renderer
            .render_rect(RectItem::solid(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE), 0)
            .unwrap();
        let stats = renderer.end_frame().unwrap();

        assert_eq!(stats.draw_calls, 1);
        assert_eq!(device.draws().len(), 1);
    }
}
