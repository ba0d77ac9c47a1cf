use crate::gfx::{GpuResult, GraphicsApi};

/// GPU-resident `u32` index list. The element count is fixed at upload.
pub struct IndexBuffer<A: GraphicsApi> {
    handle: A::Buffer,
    count: u32,
}

impl<A: GraphicsApi> IndexBuffer<A> {
    pub fn new(api: &mut A, indices: &[u32]) -> GpuResult<Self> {
        let handle = api.create_index_buffer(indices)?;
        Ok(Self { handle, count: indices.len() as u32 })
    }

    pub fn bind(&self, api: &mut A) {
        api.bind_index_buffer(Some(&self.handle));
    }

    pub fn unbind(api: &mut A) {
        api.bind_index_buffer(None);
    }

    /// Number of indices.
    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GpuCall, RecordingApi};

    #[test]
    fn count_matches_upload() {
        let mut api = RecordingApi::new();
        let ib = IndexBuffer::new(&mut api, &[0, 1, 2, 2, 3, 0]).unwrap();
        assert_eq!(ib.count(), 6);
    }

    #[test]
    fn bind_and_unbind() {
        let mut api = RecordingApi::new();
        let ib = IndexBuffer::new(&mut api, &[0, 1, 2]).unwrap();
        api.take_calls();

        ib.bind(&mut api);
        IndexBuffer::unbind(&mut api);
        assert_eq!(
            api.calls(),
            vec![GpuCall::BindIndexBuffer(Some(1)), GpuCall::BindIndexBuffer(None)]
        );
    }
}
