use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::gfx::{GpuResult, WgpuApi};
use crate::time::FrameTime;

use super::app::AppControl;

pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback; `'w` is the window borrow held by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
}

impl FrameCtx<'_, '_> {
    /// Acquires the next image, runs `draw` against `api`, then records the
    /// frame and presents it.
    ///
    /// Surface errors are handled here and never reach `draw`. If `draw`
    /// fails, the frame is discarded and the error returned.
    pub fn render<F>(&mut self, api: &mut WgpuApi, draw: F) -> GpuResult<AppControl>
    where
        F: FnOnce(&mut WgpuApi) -> GpuResult<()>,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return Ok(match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        AppControl::Continue
                    }
                });
            }
        };

        api.set_surface_format(self.gpu.surface_format());

        if let Err(err) = draw(api) {
            api.discard_frame();
            return Err(err);
        }
        api.flush(&mut frame.encoder, &frame.view)?;

        self.window.window.pre_present_notify();
        self.gpu.present(frame);

        Ok(AppControl::Continue)
    }
}
