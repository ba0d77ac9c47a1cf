/// One acquired swapchain image with its encoder.
///
/// Hand it back to [`Gpu::present`](super::Gpu::present) promptly; the next
/// image cannot be acquired while this one is held.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
