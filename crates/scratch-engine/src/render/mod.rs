//! Frame clearing and draw submission.

mod renderer;

pub use renderer::Renderer;
