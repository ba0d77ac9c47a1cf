use bytemuck::Pod;

use crate::gfx::{GpuResult, GraphicsApi};

/// GPU-resident vertex data.
pub struct VertexBuffer<A: GraphicsApi> {
    handle: A::Buffer,
    size: usize,
}

impl<A: GraphicsApi> VertexBuffer<A> {
    /// Uploads `data` as raw bytes.
    pub fn new<T: Pod>(api: &mut A, data: &[T]) -> GpuResult<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let handle = api.create_vertex_buffer(bytes)?;
        Ok(Self { handle, size: bytes.len() })
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn handle(&self) -> &A::Buffer {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GpuCall, RecordingApi};

    #[test]
    fn uploads_float_data_as_bytes() {
        let mut api = RecordingApi::new();
        let vb = VertexBuffer::new(&mut api, &[0.0f32; 16]).unwrap();
        assert_eq!(vb.size(), 64);
        assert_eq!(api.calls(), vec![GpuCall::CreateVertexBuffer { id: 1, bytes: 64 }]);
    }
}
