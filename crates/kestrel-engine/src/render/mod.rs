//! Batch renderers.
//!
//! A [`Renderer`] per item kind validates requests, batches them and flushes
//! full batches. [`FrameRenderer`] owns all four and draws what remains at end
//! of frame in layer order.
//!
//! Convention:
//! - CPU geometry is in viewport pixels (top-left origin, +Y down).
//! - Buffers convert to clip space at upload; shaders receive clip positions.

mod frame;
mod renderer;
mod shader;

pub use frame::{FrameRenderer, FrameStats};
pub use renderer::{DrawStats, Renderer};
pub use shader::{shader_source, ShaderLibrary};
