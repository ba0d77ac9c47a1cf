//! Graphics API seam.
//!
//! Resource wrappers talk to the GPU only through [`GraphicsApi`]. Two
//! backends exist:
//! - [`WgpuApi`]: renders through `wgpu`
//! - [`RecordingApi`]: journals calls without a device (tests, headless runs)

mod api;
mod error;
pub mod recording;
pub mod uniforms;
mod wgpu_api;

pub use api::{BlendMode, GraphicsApi, TextureImage};
pub use error::{ErrorPolicy, GpuError, GpuResult};
pub use recording::{GpuCall, RecordingApi};
pub use uniforms::{UniformKind, UniformLocation, MAX_TEXTURE_UNITS};
pub use wgpu_api::{WgpuApi, WgpuBuffer, WgpuProgram, WgpuTexture, WgpuVertexArray};
