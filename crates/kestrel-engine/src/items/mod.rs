//! Batch items: the per-kind draw requests and their vertex records.
//!
//! The kind set is closed (rect, line, texture, glyph). Everything generic in
//! the core (`GpuBuffer`, `BatchingService`, `Renderer`) is parameterized
//! over [`BatchItem`] rather than over a renderer hierarchy.

use core::fmt;

use crate::coords::Viewport;
use crate::layout::VertexType;

mod glyph;
mod line;
mod rect;
mod texture;

pub use glyph::GlyphItem;
pub use line::{LineItem, LineVertex};
pub use rect::{RectItem, RectVertex};
pub use texture::{RenderEffects, TextureItem, TextureRef, TextureVertex};

/// Every item is drawn as one quad.
pub const VERTICES_PER_ITEM: u32 = 4;

/// Two triangles per quad.
pub const INDICES_PER_ITEM: u32 = 6;

/// The closed set of batchable item kinds.
///
/// Declaration order is the draw order between kinds that share a layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ItemKind {
    Rect,
    Line,
    Texture,
    Glyph,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [ItemKind::Rect, ItemKind::Line, ItemKind::Texture, ItemKind::Glyph];

    pub const fn name(self) -> &'static str {
        match self {
            ItemKind::Rect => "rect",
            ItemKind::Line => "line",
            ItemKind::Texture => "texture",
            ItemKind::Glyph => "glyph",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value-type draw request that can be batched and packed into GPU memory.
///
/// `Default` is the empty sentinel: slots are reset to it after a flush.
pub trait BatchItem: Copy + Default + PartialEq + fmt::Debug + 'static {
    const KIND: ItemKind;

    /// Vertex record this item is packed into.
    type Vertex: VertexType;

    fn layer(&self) -> i32;

    fn set_layer(&mut self, layer: i32);

    /// Texture the item samples from, for kinds that sample one.
    fn texture(&self) -> Option<TextureRef> {
        None
    }

    #[inline]
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Rejects requests that cannot produce a sensible quad.
    fn validate(&self) -> Result<(), &'static str>;

    /// The item's quad, in vertex order top-left, bottom-left, top-right, bottom-right.
    ///
    /// Positions are in clip space, converted with `viewport`.
    fn vertices(&self, viewport: Viewport) -> [Self::Vertex; VERTICES_PER_ITEM as usize];
}
