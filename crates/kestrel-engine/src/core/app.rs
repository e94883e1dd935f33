use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;
use super::Engine;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`crate::window::Runtime`].
pub trait App {
    /// Called once the device is attached and the first viewport announced.
    /// Textures are created here.
    fn on_start(&mut self, engine: &mut Engine) -> anyhow::Result<()> {
        let _ = engine;
        Ok(())
    }

    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per frame, between clearing and presenting.
    ///
    /// An error abandons the frame; the runtime logs it and keeps going.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<AppControl>;
}
