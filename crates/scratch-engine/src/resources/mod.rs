//! RAII wrappers over [`GraphicsApi`](crate::gfx::GraphicsApi) handles.
//!
//! Each wrapper owns exactly one backend object and releases it on drop.

mod index_buffer;
mod layout;
mod shader;
mod texture;
mod vertex_array;
mod vertex_buffer;

pub use index_buffer::IndexBuffer;
pub use layout::{ElementType, VertexBufferElement, VertexBufferLayout, VertexElement};
pub use shader::Shader;
pub use texture::Texture;
pub use vertex_array::VertexArray;
pub use vertex_buffer::VertexBuffer;
