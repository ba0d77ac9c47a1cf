use crate::color::Color;
use crate::gfx::{GpuResult, GraphicsApi};
use crate::resources::{IndexBuffer, Shader, VertexArray};

/// Clears the framebuffer and issues indexed draws.
///
/// Holds no reference to any resource between calls; every draw is fully
/// described by its arguments.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Renderer {
    clear_color: Color,
}

impl Renderer {
    pub fn new(clear_color: Color) -> Self {
        Self { clear_color }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Clears the color buffer. Call once per frame before drawing.
    pub fn clear<A: GraphicsApi>(&self, api: &mut A) {
        api.clear(self.clear_color);
    }

    /// Binds the triple and draws every index in `index_buffer`.
    pub fn draw<A: GraphicsApi>(
        &self,
        api: &mut A,
        vertex_array: &VertexArray<A>,
        index_buffer: &IndexBuffer<A>,
        shader: &Shader<A>,
    ) -> GpuResult<()> {
        shader.bind(api);
        vertex_array.bind(api);
        index_buffer.bind(api);
        api.draw_indexed(index_buffer.count())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GpuCall, RecordingApi};
    use crate::resources::{VertexBuffer, VertexBufferLayout};

    const SOURCE: &str = "fn vs_main() {} fn fs_main() {}";

    struct Quad {
        va: VertexArray<RecordingApi>,
        ib: IndexBuffer<RecordingApi>,
        shader: Shader<RecordingApi>,
        _vb: VertexBuffer<RecordingApi>,
    }

    fn quad(api: &mut RecordingApi, indices: &[u32]) -> Quad {
        let vb = VertexBuffer::new(api, &[0.0f32; 16]).unwrap();
        let mut va = VertexArray::new(api).unwrap();
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2).push::<f32>(2);
        va.add_buffer(api, &vb, layout).unwrap();
        let ib = IndexBuffer::new(api, indices).unwrap();
        let shader = Shader::from_source(api, "quad", SOURCE).unwrap();
        Quad { va, ib, shader, _vb: vb }
    }

    #[test]
    fn one_draw_per_call_with_stored_count() {
        let mut api = RecordingApi::new();
        let q = quad(&mut api, &[0, 1, 2, 2, 3, 0]);
        let renderer = Renderer::default();

        renderer.draw(&mut api, &q.va, &q.ib, &q.shader).unwrap();
        assert_eq!(api.draw_calls(), vec![6]);

        renderer.draw(&mut api, &q.va, &q.ib, &q.shader).unwrap();
        assert_eq!(api.draw_calls(), vec![6, 6]);
    }

    #[test]
    fn draw_binds_shader_then_geometry() {
        let mut api = RecordingApi::new();
        let q = quad(&mut api, &[0, 1, 2]);
        api.take_calls();

        Renderer::default().draw(&mut api, &q.va, &q.ib, &q.shader).unwrap();
        assert_eq!(
            api.calls(),
            vec![
                GpuCall::BindProgram(Some(4)),
                GpuCall::BindVertexArray(Some(2)),
                GpuCall::BindIndexBuffer(Some(3)),
                GpuCall::DrawIndexed { count: 3 },
            ]
        );
    }

    #[test]
    fn default_clear_color_is_opaque_black() {
        assert_eq!(Renderer::default().clear_color(), Color::BLACK);
    }

    #[test]
    fn clear_uses_configured_color() {
        let mut api = RecordingApi::new();
        let color = Color::new(0.1, 0.2, 0.3, 1.0);
        Renderer::new(color).clear(&mut api);
        assert_eq!(api.calls(), vec![GpuCall::Clear(color)]);
    }
}
