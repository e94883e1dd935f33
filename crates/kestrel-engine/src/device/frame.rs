/// An acquired swapchain image.
///
/// Batched draws target `view` between [`crate::backend::WgpuDevice::begin_frame`]
/// and `end_frame`. Dropping `surface_texture` after the last submit presents it.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}
