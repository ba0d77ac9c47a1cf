use crate::color::Color;
use crate::resources::VertexBufferLayout;

use super::uniforms::UniformLocation;
use super::GpuResult;

/// Blend equation applied to subsequent draws.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// `src * src_alpha + dst * (1 - src_alpha)`.
    Alpha,
}

impl BlendMode {
    pub fn to_wgpu(self) -> wgpu::BlendState {
        match self {
            Self::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        }
    }
}

/// Decoded RGBA8 pixels, rows bottom-up (texcoord `(0, 0)` is the first texel).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    /// Single-color image, mostly useful for placeholders and tests.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let texels = width as usize * height as usize;
        Self {
            width,
            height,
            rgba: rgba.repeat(texels),
        }
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Bind-state graphics API used by the resource wrappers.
///
/// Bindings are global: `bind_*` latches state that later calls (most
/// importantly [`draw_indexed`](Self::draw_indexed)) observe until it is
/// rebound or unbound. Handles release their GPU object when dropped.
pub trait GraphicsApi {
    type Buffer;
    type VertexArray;
    type Texture;
    type Program;

    fn create_vertex_buffer(&mut self, contents: &[u8]) -> GpuResult<Self::Buffer>;
    fn create_index_buffer(&mut self, indices: &[u32]) -> GpuResult<Self::Buffer>;

    fn create_vertex_array(&mut self) -> GpuResult<Self::VertexArray>;

    /// Attaches `buffer` to `vertex_array`, described by `layout`.
    fn attach_vertex_buffer(
        &mut self,
        vertex_array: &mut Self::VertexArray,
        buffer: &Self::Buffer,
        layout: &VertexBufferLayout,
    ) -> GpuResult<()>;

    fn create_texture(&mut self, image: &TextureImage) -> GpuResult<Self::Texture>;

    /// Compiles a combined vertex + fragment program.
    fn create_program(&mut self, label: &str, source: &str) -> GpuResult<Self::Program>;

    /// Resolves a uniform by name; `None` if the program does not expose it.
    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<UniformLocation>;

    fn set_uniform_vec4(
        &mut self,
        program: &Self::Program,
        location: UniformLocation,
        value: [f32; 4],
    ) -> GpuResult<()>;

    fn set_uniform_int(
        &mut self,
        program: &Self::Program,
        location: UniformLocation,
        value: i32,
    ) -> GpuResult<()>;

    fn bind_program(&mut self, program: Option<&Self::Program>);
    fn bind_vertex_array(&mut self, vertex_array: Option<&Self::VertexArray>);
    fn bind_index_buffer(&mut self, buffer: Option<&Self::Buffer>);
    fn bind_texture(&mut self, unit: u32, texture: Option<&Self::Texture>) -> GpuResult<()>;

    fn set_blend(&mut self, blend: Option<BlendMode>);

    /// Clears the color buffer.
    fn clear(&mut self, color: Color);

    /// Draws `count` indices from the bound index buffer.
    fn draw_indexed(&mut self, count: u32) -> GpuResult<()>;
}
