//! Graphics device abstraction.
//!
//! The batching core talks to the GPU through [`GraphicsDevice`], a small
//! handle-based surface shaped after classic vertex-array/buffer/program
//! APIs. Two implementations ship with the crate:
//! - [`WgpuDevice`]: the real backend, attached to a wgpu device once one exists
//! - [`HeadlessDevice`]: records every call in memory, used by tests and tools
//!
//! Methods take `&self`; implementations use interior mutability so a single
//! device can be shared as `Rc<dyn GraphicsDevice>` by every buffer.

mod handles;
mod headless;
mod wgpu_device;

pub use handles::{AttribPointer, BufferId, BufferTarget, ProgramId, TextureId, VertexArrayId};
pub use headless::{DrawCall, HeadlessDevice};
pub use wgpu_device::WgpuDevice;

use crate::items::TextureRef;

/// Byte length of a tightly packed RGBA8 image, or `None` if it overflows.
pub(crate) fn rgba8_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)?.checked_mul(4)
}

/// Handle-based GPU command surface.
///
/// State is "bind then act": `draw_indexed` uses the currently bound vertex
/// array, program and texture.
pub trait GraphicsDevice {
    fn create_vertex_array(&self, label: &str) -> VertexArrayId;

    fn create_buffer(&self, target: BufferTarget, label: &str) -> BufferId;

    /// Attaches `buffer` to `vao` in the slot matching its target.
    fn attach_buffer(&self, vao: VertexArrayId, buffer: BufferId);

    /// Replaces the whole store of `buffer` with `data`.
    fn buffer_data(&self, buffer: BufferId, data: &[u8]);

    /// Overwrites `data.len()` bytes at `offset`. Out-of-range writes are dropped.
    fn buffer_sub_data(&self, buffer: BufferId, offset: u64, data: &[u8]);

    /// Declares one vertex attribute of `vao`.
    fn vertex_attrib(&self, vao: VertexArrayId, attrib: AttribPointer);

    fn bind_vertex_array(&self, vao: VertexArrayId);

    /// Registers a WGSL program with `vs_main`/`fs_main` entry points.
    fn create_program(&self, label: &str, source: &'static str) -> ProgramId;

    fn use_program(&self, program: ProgramId);

    /// Uploads straight RGBA8 pixels as a sampleable texture.
    ///
    /// Returns a reference with a null id when the device cannot create it.
    fn create_texture_rgba8(&self, label: &str, width: u32, height: u32, pixels: &[u8]) -> TextureRef;

    /// Binds `texture` for subsequent draws; [`TextureId::NULL`] binds none.
    fn bind_texture(&self, texture: TextureId);

    /// Draws `index_count` u32 indices starting at `first_index` as triangles.
    fn draw_indexed(&self, first_index: u32, index_count: u32);

    fn delete_buffer(&self, buffer: BufferId);

    fn delete_vertex_array(&self, vao: VertexArrayId);
}
