//! Named drawable shapes and the registry that owns them.

mod registry;

pub use registry::{ShapeRegistry, UnknownShape};

use std::path::Path;

use anyhow::{Context, Result};

use crate::gfx::{BlendMode, GpuResult, GraphicsApi};
use crate::render::Renderer;
use crate::resources::{IndexBuffer, Shader, Texture, VertexArray, VertexBuffer, VertexBufferLayout};

/// Floats per interleaved vertex: `x, y, u, v`.
pub const FLOATS_PER_VERTEX: usize = 4;

pub const COLOR_UNIFORM: &str = "u_Color";
pub const TEXTURE_UNIFORM: &str = "u_Texture";

const TEXTURE_UNIT: u32 = 0;

/// Green, blue and alpha of the tint; red is animated per draw.
const TINT_GBA: [f32; 3] = [0.3, 0.8, 1.0];

/// Interleaved `[x, y, u, v]` vertices plus triangle-list indices.
#[derive(Debug, Copy, Clone)]
pub struct Geometry<'a> {
    pub vertices: &'a [f32],
    pub indices: &'a [u32],
}

impl<'a> Geometry<'a> {
    pub fn new(vertices: &'a [f32], indices: &'a [u32]) -> Self {
        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.vertices.is_empty(), "geometry has no vertices");
        anyhow::ensure!(
            self.vertices.len() % FLOATS_PER_VERTEX == 0,
            "vertex data length {} is not a multiple of {FLOATS_PER_VERTEX}",
            self.vertices.len()
        );
        anyhow::ensure!(!self.indices.is_empty(), "geometry has no indices");

        let vertex_count = self.vertex_count();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            anyhow::bail!("index {bad} out of range for {vertex_count} vertices");
        }
        Ok(())
    }
}

/// A textured, shaded mesh with an identifier.
///
/// Owns its buffers, vertex array, texture and shader; all are released
/// together when the shape is dropped.
pub struct Shape<A: GraphicsApi> {
    id: String,
    vertex_array: VertexArray<A>,
    vertex_buffer: VertexBuffer<A>,
    index_buffer: IndexBuffer<A>,
    texture: Texture<A>,
    shader: Shader<A>,
}

impl<A: GraphicsApi> Shape<A> {
    /// Loads the texture and shader from disk and uploads `geometry`.
    pub fn new(
        api: &mut A,
        id: impl Into<String>,
        geometry: Geometry<'_>,
        texture_path: impl AsRef<Path>,
        shader_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let id = id.into();
        let texture = Texture::from_file(api, texture_path)
            .with_context(|| format!("shape `{id}`: texture"))?;
        let shader = Shader::from_file(api, shader_path)
            .with_context(|| format!("shape `{id}`: shader"))?;
        Self::from_assets(api, id, geometry, texture, shader)
    }

    /// Builds a shape from an already loaded texture and shader.
    ///
    /// Enables alpha blending for every subsequent draw as a side effect.
    pub fn from_assets(
        api: &mut A,
        id: impl Into<String>,
        geometry: Geometry<'_>,
        texture: Texture<A>,
        shader: Shader<A>,
    ) -> Result<Self> {
        let id = id.into();
        geometry
            .validate()
            .with_context(|| format!("shape `{id}`: invalid geometry"))?;

        let vertex_buffer = VertexBuffer::new(api, geometry.vertices)?;
        let index_buffer = IndexBuffer::new(api, geometry.indices)?;

        api.set_blend(Some(BlendMode::Alpha));

        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2); // position
        layout.push::<f32>(2); // texcoord

        let mut vertex_array = VertexArray::new(api)?;
        vertex_array.add_buffer(api, &vertex_buffer, layout)?;

        log::debug!(
            "shape `{id}`: {} vertices, {} indices",
            geometry.vertex_count(),
            geometry.index_count()
        );

        Ok(Self {
            id,
            vertex_array,
            vertex_buffer,
            index_buffer,
            texture,
            shader,
        })
    }

    /// Draws the shape tinted with `r` in the red channel.
    ///
    /// Leaves this shape's shader, texture and geometry bound.
    pub fn draw(&self, renderer: &Renderer, api: &mut A, r: f32) -> GpuResult<()> {
        let [g, b, a] = TINT_GBA;
        self.shader.bind(api);
        self.shader.set_uniform_4f(api, COLOR_UNIFORM, r, g, b, a)?;
        self.texture.bind(api, TEXTURE_UNIT)?;
        self.shader.set_uniform_1i(api, TEXTURE_UNIFORM, TEXTURE_UNIT as i32)?;
        renderer.draw(api, &self.vertex_array, &self.index_buffer, &self.shader)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn layout(&self) -> Option<&VertexBufferLayout> {
        self.vertex_array.layout()
    }

    /// Vertex data size in bytes.
    pub fn vertex_bytes(&self) -> usize {
        self.vertex_buffer.size()
    }

    pub fn index_count(&self) -> u32 {
        self.index_buffer.count()
    }

    pub fn texture(&self) -> &Texture<A> {
        &self.texture
    }

    pub fn shader(&self) -> &Shader<A> {
        &self.shader
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::gfx::{RecordingApi, TextureImage};

    pub const QUAD_VERTICES: [f32; 16] = [
        -0.5, -0.5, 0.0, 0.0, //
        0.5, -0.5, 1.0, 0.0, //
        0.5, 0.5, 1.0, 1.0, //
        -0.5, 0.5, 0.0, 1.0,
    ];
    pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

    const SOURCE: &str = "@vertex fn vs_main() {} @fragment fn fs_main() {}";

    pub fn shape_with(
        api: &mut RecordingApi,
        id: &str,
        vertices: &[f32],
        indices: &[u32],
    ) -> Result<Shape<RecordingApi>> {
        let texture = Texture::from_image(api, &TextureImage::solid(2, 2, [255; 4]))?;
        let shader = Shader::from_source(api, "basic", SOURCE)?;
        Shape::from_assets(api, id, Geometry::new(vertices, indices), texture, shader)
    }

    pub fn quad(api: &mut RecordingApi, id: &str) -> Shape<RecordingApi> {
        shape_with(api, id, &QUAD_VERTICES, &QUAD_INDICES).unwrap()
    }
}
