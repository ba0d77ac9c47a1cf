//! `wgpu` device and window surface.
//!
//! Creates the Instance/Adapter/Device/Queue for one window, keeps the
//! surface configured across resizes and hands out per-frame encoders.

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
