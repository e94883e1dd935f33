use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::BatchConfig;
use crate::coords::Viewport;
use crate::core::{App as CoreApp, AppControl, Engine, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::paint::Color;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Cleared to at the start of every frame.
    pub clear_color: Color,
    pub batch: BatchConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "kestrel".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            clear_color: Color::BLACK,
            batch: BatchConfig::from_env(),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current frame is presented.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.commands.push(Command::SetTitle(title.into()));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    SetTitle(String),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until it exits or the window closes.
    ///
    /// The rendering core is built before the window, so its buffers are
    /// waiting on the bus when the device comes up.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let engine = Engine::new(config.batch).context("failed to build the rendering core")?;
        let mut state = AppState::new(config, gpu_init, engine, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    engine: Engine,
    app: A,

    window: Option<WindowEntry>,
    frames: u64,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, engine: Engine, app: A) -> Self {
        Self {
            config,
            gpu_init,
            engine,
            app,
            window: None,
            frames: 0,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    /// Opens the window, attaches the device and announces it.
    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        entry.with_gpu(|gpu| gpu.attach(self.engine.device()));
        self.engine.device_ready().context("device initialization failed")?;

        let size = entry.with_gpu(|gpu| gpu.size());
        self.engine.set_viewport(viewport_of(size))?;

        self.app.on_start(&mut self.engine).context("application start failed")?;

        entry.with_window(|w| w.request_redraw());
        self.window = Some(entry);
        Ok(())
    }

    fn close_window(&mut self) {
        if let Err(e) = self.engine.shutdown() {
            log::error!("shutdown failed: {e:#}");
        }
        self.window = None;
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };
        entry.with_gpu_mut(|gpu| gpu.resize(new_size));
        entry.with_window(|w| w.request_redraw());

        if let Err(e) = self.engine.set_viewport(viewport_of(new_size)) {
            log::error!("viewport update failed: {e:#}");
        }
    }

    /// Acquires, clears, lets the app draw, flushes and presents one frame.
    fn redraw(&mut self, window_id: WindowId) -> (AppControl, RuntimeCtx) {
        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;

        let Some(entry) = self.window.as_mut() else {
            return (control, runtime_ctx);
        };

        let clear_color = self.config.clear_color;
        let (engine, app, frames) = (&mut self.engine, &mut self.app, &mut self.frames);

        entry.with_mut(|fields| {
            let frame = match fields.gpu.begin_frame() {
                Ok(f) => f,
                Err(err) => {
                    if fields.gpu.handle_surface_error(err) == SurfaceErrorAction::Fatal {
                        control = AppControl::Exit;
                    }
                    return;
                }
            };

            fields.gpu.clear(&frame, clear_color);
            engine.device().begin_frame(frame.view.clone());
            engine.renderer().begin_frame();

            // Scope to ensure `ctx` is dropped before ending the frame.
            let drawn = {
                let mut ctx = FrameCtx {
                    window: WindowCtx {
                        id: window_id,
                        window: fields.window,
                    },
                    frame: *frames,
                    engine: &mut *engine,
                    runtime: &mut runtime_ctx,
                };
                app.on_frame(&mut ctx)
            };

            match drawn.and_then(|c| Ok((c, engine.renderer().end_frame()?))) {
                Ok((c, stats)) => {
                    control = c;
                    log::trace!("frame {}: {} draw calls", *frames, stats.draw_calls);
                }
                Err(e) => {
                    log::error!("frame {} abandoned: {e:#}", *frames);
                    engine.renderer().abandon_frame();
                }
            }

            engine.device().end_frame();
            fields.window.pre_present_notify();
            fields.gpu.present(frame);
            *frames += 1;
        });

        (control, runtime_ctx)
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::SetTitle(title) => {
                    if let Some(entry) = &self.window {
                        entry.with_window(|w| w.set_title(&title));
                    }
                }
                Command::Exit => self.request_exit(event_loop),
            }
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.open_window(event_loop) {
            log::error!("failed to open window: {e:#}");
            self.request_exit(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.close_window();
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => self.resize(new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size);
                }
            }

            WindowEvent::RedrawRequested => {
                let (control, runtime_ctx) = self.redraw(window_id);
                if control == AppControl::Exit {
                    self.request_exit(event_loop);
                }
                self.apply_commands(event_loop, runtime_ctx);
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("exiting after {} frames", self.frames);
        self.close_window();
    }
}

fn viewport_of(size: PhysicalSize<u32>) -> Viewport {
    Viewport::new(size.width as f32, size.height as f32)
}
