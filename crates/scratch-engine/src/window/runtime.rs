use std::fmt;

use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Scratch".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
        }
    }
}

/// Why the runtime stopped abnormally.
#[derive(Debug)]
pub enum RuntimeError {
    /// The event loop could not be created or failed while running.
    EventLoop(anyhow::Error),
    /// The window could not be created.
    Window(anyhow::Error),
    /// Adapter, device or surface setup failed.
    Graphics(anyhow::Error),
    /// The application returned an error from a frame.
    App(anyhow::Error),
}

impl RuntimeError {
    /// Process exit code for this failure.
    ///
    /// `1` for platform (event loop, window), `2` for GPU setup, `3` for
    /// errors raised by the application.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::EventLoop(_) | Self::Window(_) => 1,
            Self::Graphics(_) => 2,
            Self::App(_) => 3,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventLoop(e) => write!(f, "event loop error: {e:#}"),
            Self::Window(e) => write!(f, "window creation failed: {e:#}"),
            Self::Graphics(e) => write!(f, "graphics initialization failed: {e:#}"),
            Self::App(e) => write!(f, "application error: {e:#}"),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EventLoop(e) | Self::Window(e) | Self::Graphics(e) | Self::App(e) => {
                Some(e.as_ref())
            }
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until the window closes, the app
    /// asks to exit, or something fails.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<(), RuntimeError>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new()
            .map_err(|e| RuntimeError::EventLoop(anyhow::Error::new(e)))?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .map_err(|e| RuntimeError::EventLoop(anyhow::Error::new(e)))?;

        match state.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Window plus the GPU context whose surface borrows it.
#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// `winit` handler state: the app plus the window it renders into.
struct AppState<A>
where
    A: CoreApp + 'static,
{
    /// Window settings used when the window is (re)created.
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    /// `None` before `resumed` and after the window is closed.
    window: Option<WindowEntry>,

    /// First fatal error; returned from [`Runtime::run`] once the loop exits.
    failure: Option<RuntimeError>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            failure: None,
        }
    }

    /// Records the first failure and stops the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: RuntimeError) {
        log::error!("{err}");
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        self.window = None;
        event_loop.exit();
    }

    /// Opens the window and builds its GPU context.
    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry, RuntimeError> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| RuntimeError::Window(anyhow::Error::new(e)))?;

        let gpu_init = self.gpu_init.clone();

        WindowEntryTryBuilder {
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .map_err(RuntimeError::Graphics)
    }

    /// Ticks the clock and runs one `on_frame`; an app error ends the loop.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (app, window) = (&mut self.app, &mut self.window);
        let Some(entry) = window.as_mut() else {
            return;
        };

        let outcome = entry.with_mut(|fields| {
            let ft: FrameTime = fields.clock.tick();
            let mut ctx = FrameCtx {
                window: WindowCtx { window: fields.window },
                gpu: fields.gpu,
                time: ft,
            };
            app.on_frame(&mut ctx)
        });

        match outcome {
            Ok(AppControl::Continue) => {}
            Ok(AppControl::Exit) => {
                self.window = None;
                event_loop.exit();
            }
            Err(e) => self.fail(event_loop, RuntimeError::App(e)),
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.failure.is_some() {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.window = Some(entry);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: every frame animates.
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window.is_none() {
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.window = None;
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                self.window = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
