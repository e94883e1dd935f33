mod assets;

use anyhow::Result;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use kestrel_engine::config::BatchConfig;
use kestrel_engine::coords::{CornerRadii, Rect, Vec2};
use kestrel_engine::core::{App, AppControl, Engine, FrameCtx};
use kestrel_engine::device::GpuInit;
use kestrel_engine::items::{GlyphItem, LineItem, RectItem, RenderEffects, TextureItem, TextureRef};
use kestrel_engine::logging::{init_logging, LoggingConfig};
use kestrel_engine::paint::Color;
use kestrel_engine::window::{Runtime, RuntimeConfig};

use assets::GlyphAtlas;

/// Small enough that every kind fills and flushes mid-frame.
const DEMO_BATCH_SIZE: u32 = 24;

const TITLE: &str = "KESTREL";

#[derive(Default)]
struct Studio {
    checker: TextureRef,
    atlas: Option<GlyphAtlas>,
}

impl Studio {
    fn draw_grid(ctx: &mut FrameCtx<'_>, t: f32) -> Result<()> {
        let renderer = ctx.renderer();
        for row in 0..6 {
            for col in 0..10 {
                let x = 40.0 + col as f32 * 56.0;
                let y = 40.0 + row as f32 * 56.0;
                let phase = t * 2.0 + (row + col) as f32 * 0.4;
                let color = Color::from_straight(0.3 + 0.3 * phase.sin(), 0.5, 0.8, 0.9);
                let rect = Rect::new(x, y, 48.0, 48.0);

                let item = if (row + col) % 3 == 0 {
                    RectItem::outline(rect, color, 3.0)
                } else {
                    RectItem::solid(rect, color)
                };
                renderer.render_rect(item.with_corner_radius(CornerRadii::all(10.0)), 0)?;
            }
        }
        Ok(())
    }

    fn draw_fan(ctx: &mut FrameCtx<'_>, t: f32) -> Result<()> {
        let center = Vec2::new(900.0, 200.0);
        let renderer = ctx.renderer();
        for i in 0..48 {
            let a = t * 0.5 + i as f32 / 48.0 * std::f32::consts::TAU;
            let tip = Vec2::new(center.x + 150.0 * a.cos(), center.y + 150.0 * a.sin());
            let color = Color::from_straight(1.0, i as f32 / 48.0, 0.3, 1.0);
            renderer.render_line(LineItem::new(center, tip, color, 2.0), 1)?;
        }
        Ok(())
    }

    fn draw_sprites(&self, ctx: &mut FrameCtx<'_>, t: f32) -> Result<()> {
        let effects = [
            RenderEffects::None,
            RenderEffects::FlipHorizontally,
            RenderEffects::FlipVertically,
            RenderEffects::FlipBoth,
        ];
        let renderer = ctx.renderer();
        for (i, effects) in effects.into_iter().enumerate() {
            let mut item = TextureItem::whole(self.checker, Rect::new(60.0 + i as f32 * 150.0, 420.0, 96.0, 96.0));
            item.angle = t * 30.0 * (i as f32 + 1.0);
            item.scale = 1.0 + 0.2 * (t + i as f32).sin();
            item.effects = effects;
            // Layer 2 puts sprites over the grid, under the title.
            renderer.render_texture(item, 2)?;
        }
        Ok(())
    }

    fn draw_title(&self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let Some(atlas) = &self.atlas else {
            return Ok(());
        };
        let renderer = ctx.renderer();
        for (i, glyph) in TITLE.chars().enumerate() {
            let Some(src) = atlas.cell(glyph) else {
                continue;
            };
            let dest = Rect::new(720.0 + i as f32 * 40.0, 440.0, 36.0, 36.0);
            let tint = Color::from_srgb_u8(255, 214, 102, 255);
            renderer.render_glyph(GlyphItem::new(glyph, atlas.texture, src, dest, tint), 3)?;
        }
        Ok(())
    }
}

impl App for Studio {
    fn on_start(&mut self, engine: &mut Engine) -> Result<()> {
        self.checker = assets::checkerboard(engine.device(), 8, 8);
        self.atlas = Some(GlyphAtlas::generate(engine.device()));
        anyhow::ensure!(self.checker.is_valid(), "checkerboard texture was not created");
        Ok(())
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<AppControl> {
        let t = ctx.frame as f32 / 60.0;

        // Backdrop panel under everything.
        let (w, h) = ctx.window.size();
        ctx.renderer().render_rect(
            RectItem::solid(Rect::new(16.0, 16.0, w - 32.0, h - 32.0), Color::from_srgb_u8(24, 28, 36, 255))
                .with_corner_radius(CornerRadii::all(18.0)),
            -1,
        )?;

        Self::draw_grid(ctx, t)?;
        Self::draw_fan(ctx, t)?;
        self.draw_sprites(ctx, t)?;
        self.draw_title(ctx)?;

        if ctx.frame % 300 == 0 {
            let stats = ctx.renderer().stats();
            log::info!(
                "frame {}: {} draw calls, {} items",
                stats.frame,
                stats.draw_calls,
                stats.items
            );
        }

        Ok(AppControl::Continue)
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut batch = BatchConfig::from_env();
    if std::env::var_os(BatchConfig::ENV_BATCH_SIZE).is_none() {
        batch.batch_size = DEMO_BATCH_SIZE;
    }

    let config = RuntimeConfig {
        title: "Kestrel Studio".to_string(),
        initial_size: LogicalSize::new(1120.0, 600.0),
        clear_color: Color::from_srgb_u8(12, 14, 18, 255),
        batch,
    };

    Runtime::run(config, GpuInit::default(), Studio::default())
}
