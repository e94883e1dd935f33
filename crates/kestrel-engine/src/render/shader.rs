use std::rc::Rc;

use state::InitCell;

use crate::backend::{GraphicsDevice, ProgramId};
use crate::items::ItemKind;

const RECT_WGSL: &str = include_str!("shaders/rect.wgsl");
const LINE_WGSL: &str = include_str!("shaders/line.wgsl");
const TEXTURE_WGSL: &str = include_str!("shaders/texture.wgsl");
const GLYPH_WGSL: &str = include_str!("shaders/glyph.wgsl");

/// WGSL source for `kind`.
pub fn shader_source(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Rect => RECT_WGSL,
        ItemKind::Line => LINE_WGSL,
        ItemKind::Texture => TEXTURE_WGSL,
        ItemKind::Glyph => GLYPH_WGSL,
    }
}

/// Per-kind shader programs, each created on first request.
pub struct ShaderLibrary {
    device: Rc<dyn GraphicsDevice>,
    programs: [InitCell<ProgramId>; 4],
}

impl ShaderLibrary {
    pub fn new(device: Rc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            programs: Default::default(),
        }
    }

    pub fn program(&self, kind: ItemKind) -> ProgramId {
        *self.programs[kind as usize].get_or_init(|| {
            log::debug!("creating {kind} shader program");
            self.device.create_program(&format!("kestrel {kind} shader"), shader_source(kind))
        })
    }
}
