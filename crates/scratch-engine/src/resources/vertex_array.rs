use crate::gfx::{GpuResult, GraphicsApi};

use super::{VertexBuffer, VertexBufferLayout};

/// Binds a vertex buffer's bytes to shader inputs through a layout.
pub struct VertexArray<A: GraphicsApi> {
    handle: A::VertexArray,
    layout: Option<VertexBufferLayout>,
}

impl<A: GraphicsApi> VertexArray<A> {
    pub fn new(api: &mut A) -> GpuResult<Self> {
        Ok(Self {
            handle: api.create_vertex_array()?,
            layout: None,
        })
    }

    /// Attaches `buffer`, replacing any previous attachment.
    pub fn add_buffer(
        &mut self,
        api: &mut A,
        buffer: &VertexBuffer<A>,
        layout: VertexBufferLayout,
    ) -> GpuResult<()> {
        layout.validate()?;
        api.attach_vertex_buffer(&mut self.handle, buffer.handle(), &layout)?;
        self.layout = Some(layout);
        Ok(())
    }

    pub fn bind(&self, api: &mut A) {
        api.bind_vertex_array(Some(&self.handle));
    }

    pub fn unbind(api: &mut A) {
        api.bind_vertex_array(None);
    }

    /// Layout of the attached buffer, if any.
    pub fn layout(&self) -> Option<&VertexBufferLayout> {
        self.layout.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GpuCall, GpuError, RecordingApi};

    #[test]
    fn add_buffer_records_stride() {
        let mut api = RecordingApi::new();
        let vb = VertexBuffer::new(&mut api, &[0.0f32; 8]).unwrap();
        let mut va = VertexArray::new(&mut api).unwrap();

        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2).push::<f32>(2);
        va.add_buffer(&mut api, &vb, layout).unwrap();

        assert_eq!(va.layout().map(|l| l.stride()), Some(16));
        assert!(api.calls().contains(&GpuCall::AttachVertexBuffer {
            vertex_array: 2,
            buffer: 1,
            stride: 16,
        }));
    }

    #[test]
    fn unbind_clears_binding() {
        let mut api = RecordingApi::new();
        let va = VertexArray::new(&mut api).unwrap();
        va.bind(&mut api);
        VertexArray::<RecordingApi>::unbind(&mut api);

        assert_eq!(
            api.calls()[1..],
            [GpuCall::BindVertexArray(Some(1)), GpuCall::BindVertexArray(None)]
        );
    }

    #[test]
    fn invalid_layout_is_not_attached() {
        let mut api = RecordingApi::new();
        let vb = VertexBuffer::new(&mut api, &[0u8; 6]).unwrap();
        let mut va = VertexArray::new(&mut api).unwrap();

        let mut layout = VertexBufferLayout::new();
        layout.push::<u8>(3);
        let err = va.add_buffer(&mut api, &vb, layout).unwrap_err();

        assert!(matches!(err, GpuError::UnsupportedVertexFormat { .. }));
        assert!(va.layout().is_none());
    }
}
