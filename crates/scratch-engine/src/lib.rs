//! Scratch engine crate.
//!
//! Window/GPU runtime plus the small set of GPU resource wrappers (buffers,
//! vertex arrays, textures, shaders) that shapes are built from.

pub mod color;
pub mod core;
pub mod device;
pub mod gfx;
pub mod logging;
pub mod render;
pub mod resources;
pub mod shape;
pub mod time;
pub mod window;
