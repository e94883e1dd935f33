use winit::window::{Window, WindowId};

use crate::backend::WgpuDevice;
use crate::coords::Viewport;
use crate::render::FrameRenderer;
use crate::window::RuntimeCtx;

use super::Engine;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Inner size in physical pixels, the space item positions are given in.
    pub fn size(&self) -> (f32, f32) {
        let size = self.window.inner_size();
        (size.width as f32, size.height as f32)
    }

    #[inline]
    pub fn scale_factor(&self) -> f32 {
        self.window.scale_factor() as f32
    }
}

/// Per-frame context passed to [`super::App::on_frame`].
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    /// Frames presented before this one.
    pub frame: u64,
    pub engine: &'a mut Engine,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a> FrameCtx<'a> {
    #[inline]
    pub fn renderer(&mut self) -> &mut FrameRenderer {
        self.engine.renderer()
    }

    #[inline]
    pub fn device(&self) -> &WgpuDevice {
        self.engine.device()
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.engine.viewport()
    }
}
