//! Headless [`GraphicsApi`] that journals every call.
//!
//! Used as the backend in tests: it enforces the same binding rules as the
//! real backend but never touches a device.

use std::cell::RefCell;
use std::rc::Rc;

use crate::color::Color;
use crate::resources::VertexBufferLayout;

use super::uniforms::{lookup_uniform, UniformKind, UniformLocation, MAX_TEXTURE_UNITS};
use super::{BlendMode, GpuError, GpuResult, GraphicsApi, TextureImage};

/// One journaled call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateVertexBuffer { id: u32, bytes: usize },
    CreateIndexBuffer { id: u32, count: u32 },
    CreateVertexArray { id: u32 },
    AttachVertexBuffer { vertex_array: u32, buffer: u32, stride: u32 },
    CreateTexture { id: u32, width: u32, height: u32 },
    CreateProgram { id: u32, label: String },
    SetUniformVec4 { program: u32, name: &'static str, value: [f32; 4] },
    SetUniformInt { program: u32, name: &'static str, value: i32 },
    BindProgram(Option<u32>),
    BindVertexArray(Option<u32>),
    BindIndexBuffer(Option<u32>),
    BindTexture { unit: u32, texture: Option<u32> },
    SetBlend(Option<BlendMode>),
    Clear(Color),
    DrawIndexed { count: u32 },
    Release(u32),
}

type Journal = Rc<RefCell<Vec<GpuCall>>>;

/// Handle that records `Release` when dropped.
#[derive(Debug)]
pub struct RecordedHandle {
    id: u32,
    journal: Journal,
}

impl RecordedHandle {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for RecordedHandle {
    fn drop(&mut self) {
        self.journal.borrow_mut().push(GpuCall::Release(self.id));
    }
}

#[derive(Debug)]
pub struct RecordedBuffer {
    handle: RecordedHandle,
    /// Index count for index buffers, byte size for vertex buffers.
    len: u32,
}

impl RecordedBuffer {
    pub fn id(&self) -> u32 {
        self.handle.id
    }
}

#[derive(Debug)]
pub struct RecordedVertexArray {
    handle: RecordedHandle,
    attached: bool,
}

impl RecordedVertexArray {
    pub fn id(&self) -> u32 {
        self.handle.id
    }
}

#[derive(Debug, Default)]
struct BoundState {
    program: Option<u32>,
    vertex_array: Option<(u32, bool)>,
    index_buffer: Option<(u32, u32)>,
}

/// Recording backend.
#[derive(Debug, Default)]
pub struct RecordingApi {
    journal: Journal,
    next_id: u32,
    bound: BoundState,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<GpuCall> {
        self.journal.borrow().clone()
    }

    /// Drains the journal.
    pub fn take_calls(&self) -> Vec<GpuCall> {
        std::mem::take(&mut *self.journal.borrow_mut())
    }

    pub fn draw_calls(&self) -> Vec<u32> {
        self.journal
            .borrow()
            .iter()
            .filter_map(|c| match c {
                GpuCall::DrawIndexed { count } => Some(*count),
                _ => None,
            })
            .collect()
    }

    /// Ids released so far.
    pub fn released(&self) -> Vec<u32> {
        self.journal
            .borrow()
            .iter()
            .filter_map(|c| match c {
                GpuCall::Release(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GpuCall) {
        self.journal.borrow_mut().push(call);
    }

    fn handle(&mut self) -> RecordedHandle {
        self.next_id += 1;
        RecordedHandle {
            id: self.next_id,
            journal: Rc::clone(&self.journal),
        }
    }
}

impl GraphicsApi for RecordingApi {
    type Buffer = RecordedBuffer;
    type VertexArray = RecordedVertexArray;
    type Texture = RecordedHandle;
    type Program = RecordedHandle;

    fn create_vertex_buffer(&mut self, contents: &[u8]) -> GpuResult<RecordedBuffer> {
        let handle = self.handle();
        self.record(GpuCall::CreateVertexBuffer { id: handle.id, bytes: contents.len() });
        Ok(RecordedBuffer { handle, len: contents.len() as u32 })
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> GpuResult<RecordedBuffer> {
        let handle = self.handle();
        let count = indices.len() as u32;
        self.record(GpuCall::CreateIndexBuffer { id: handle.id, count });
        Ok(RecordedBuffer { handle, len: count })
    }

    fn create_vertex_array(&mut self) -> GpuResult<RecordedVertexArray> {
        let handle = self.handle();
        self.record(GpuCall::CreateVertexArray { id: handle.id });
        Ok(RecordedVertexArray { handle, attached: false })
    }

    fn attach_vertex_buffer(
        &mut self,
        vertex_array: &mut RecordedVertexArray,
        buffer: &RecordedBuffer,
        layout: &VertexBufferLayout,
    ) -> GpuResult<()> {
        layout.validate()?;
        vertex_array.attached = true;
        self.record(GpuCall::AttachVertexBuffer {
            vertex_array: vertex_array.id(),
            buffer: buffer.id(),
            stride: layout.stride(),
        });
        Ok(())
    }

    fn create_texture(&mut self, image: &TextureImage) -> GpuResult<RecordedHandle> {
        if image.rgba.len() != image.expected_len() {
            return Err(GpuError::InvalidTextureData {
                expected: image.expected_len(),
                actual: image.rgba.len(),
            });
        }
        let handle = self.handle();
        self.record(GpuCall::CreateTexture {
            id: handle.id,
            width: image.width,
            height: image.height,
        });
        Ok(handle)
    }

    fn create_program(&mut self, label: &str, source: &str) -> GpuResult<RecordedHandle> {
        // Stand-in for a compiler: both entry points must exist.
        for entry in ["vs_main", "fs_main"] {
            if !source.contains(entry) {
                return Err(GpuError::ShaderCompile {
                    label: label.to_string(),
                    message: format!("missing entry point `{entry}`"),
                });
            }
        }
        let handle = self.handle();
        self.record(GpuCall::CreateProgram { id: handle.id, label: label.to_string() });
        Ok(handle)
    }

    fn uniform_location(&self, _program: &RecordedHandle, name: &str) -> Option<UniformLocation> {
        lookup_uniform(name)
    }

    fn set_uniform_vec4(
        &mut self,
        program: &RecordedHandle,
        location: UniformLocation,
        value: [f32; 4],
    ) -> GpuResult<()> {
        if location.kind != UniformKind::Vec4 {
            return Err(GpuError::UniformTypeMismatch { name: location.name });
        }
        self.record(GpuCall::SetUniformVec4 { program: program.id, name: location.name, value });
        Ok(())
    }

    fn set_uniform_int(
        &mut self,
        program: &RecordedHandle,
        location: UniformLocation,
        value: i32,
    ) -> GpuResult<()> {
        if location.kind != UniformKind::Sampler {
            return Err(GpuError::UniformTypeMismatch { name: location.name });
        }
        self.record(GpuCall::SetUniformInt { program: program.id, name: location.name, value });
        Ok(())
    }

    fn bind_program(&mut self, program: Option<&RecordedHandle>) {
        self.bound.program = program.map(|p| p.id);
        self.record(GpuCall::BindProgram(self.bound.program));
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<&RecordedVertexArray>) {
        self.bound.vertex_array = vertex_array.map(|va| (va.id(), va.attached));
        self.record(GpuCall::BindVertexArray(vertex_array.map(|va| va.id())));
    }

    fn bind_index_buffer(&mut self, buffer: Option<&RecordedBuffer>) {
        self.bound.index_buffer = buffer.map(|b| (b.id(), b.len));
        self.record(GpuCall::BindIndexBuffer(buffer.map(|b| b.id())));
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<&RecordedHandle>) -> GpuResult<()> {
        if unit >= MAX_TEXTURE_UNITS {
            return Err(GpuError::TextureUnitOutOfRange { unit, max: MAX_TEXTURE_UNITS });
        }
        self.record(GpuCall::BindTexture { unit, texture: texture.map(|t| t.id) });
        Ok(())
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) {
        self.record(GpuCall::SetBlend(blend));
    }

    fn clear(&mut self, color: Color) {
        self.record(GpuCall::Clear(color));
    }

    fn draw_indexed(&mut self, count: u32) -> GpuResult<()> {
        if self.bound.program.is_none() {
            return Err(GpuError::MissingBinding("program"));
        }
        match self.bound.vertex_array {
            Some((_, true)) => {}
            Some((_, false)) => return Err(GpuError::MissingBinding("vertex buffer")),
            None => return Err(GpuError::MissingBinding("vertex array")),
        }
        let Some((_, available)) = self.bound.index_buffer else {
            return Err(GpuError::MissingBinding("index buffer"));
        };
        if count > available {
            return Err(GpuError::IndexCountOutOfRange { requested: count, available });
        }
        self.record(GpuCall::DrawIndexed { count });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_without_bindings_is_rejected() {
        let mut api = RecordingApi::new();
        assert_eq!(api.draw_indexed(3), Err(GpuError::MissingBinding("program")));
        assert!(api.draw_calls().is_empty());
    }

    #[test]
    fn handles_record_release_on_drop() {
        let mut api = RecordingApi::new();
        let buffer = api.create_index_buffer(&[0, 1, 2]).unwrap();
        let id = buffer.id();
        drop(buffer);
        assert_eq!(api.released(), vec![id]);
    }

    #[test]
    fn program_without_fragment_entry_fails() {
        let mut api = RecordingApi::new();
        let err = api.create_program("broken", "fn vs_main() {}").unwrap_err();
        assert!(matches!(err, GpuError::ShaderCompile { .. }));
    }

    #[test]
    fn texture_data_length_is_checked() {
        let mut api = RecordingApi::new();
        let image = TextureImage { width: 2, height: 2, rgba: vec![0; 3] };
        assert_eq!(
            api.create_texture(&image).unwrap_err(),
            GpuError::InvalidTextureData { expected: 16, actual: 3 }
        );
    }
}
