use anyhow::{Context, Result};

use scratch_engine::core::{App, AppControl, FrameCtx};
use scratch_engine::gfx::{ErrorPolicy, WgpuApi};
use scratch_engine::render::Renderer;
use scratch_engine::shape::{Geometry, Shape, ShapeRegistry};

use crate::pulse::ColorPulse;

pub const RECTANGLE: &str = "rectangle";

#[rustfmt::skip]
const QUAD_VERTICES: [f32; 16] = [
    -0.5, -0.5, 0.0, 0.0,
     0.5, -0.5, 1.0, 0.0,
     0.5,  0.5, 1.0, 1.0,
    -0.5,  0.5, 0.0, 1.0,
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

const TEXTURE_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/res/textures/checker.png");
const SHADER_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/res/shaders/basic.wgsl");

const STATS_EVERY: u64 = 120;

/// GPU-side state, created once the device exists.
struct Scene {
    api: WgpuApi,
    shapes: ShapeRegistry<WgpuApi>,
}

impl Scene {
    fn load(ctx: &FrameCtx<'_, '_>) -> Result<Self> {
        let mut api = WgpuApi::from_gpu(&*ctx.gpu).context("failed to set up graphics api")?;

        let rectangle = Shape::new(
            &mut api,
            RECTANGLE,
            Geometry::new(&QUAD_VERTICES, &QUAD_INDICES),
            TEXTURE_PATH,
            SHADER_PATH,
        )?;

        let mut shapes = ShapeRegistry::new();
        shapes.add_shape(RECTANGLE, rectangle);

        Ok(Self { api, shapes })
    }
}

/// Draws the textured rectangle with a pulsing red tint.
pub struct Sandbox {
    policy: ErrorPolicy,
    renderer: Renderer,
    pulse: ColorPulse,
    scene: Option<Scene>,
}

impl Sandbox {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            renderer: Renderer::default(),
            pulse: ColorPulse::new(),
            scene: None,
        }
    }
}

impl App for Sandbox {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl> {
        if self.scene.is_none() {
            let scene = Scene::load(ctx)?;
            log::info!("scene ready: {} shape(s)", scene.shapes.len());
            self.scene = Some(scene);
        }
        let Some(scene) = self.scene.as_mut() else {
            return Ok(AppControl::Continue);
        };

        let shape = scene.shapes.get_shape(RECTANGLE)?;
        let (renderer, policy, r) = (&self.renderer, self.policy, self.pulse.value());

        let control = ctx.render(&mut scene.api, |api| {
            renderer.clear(api);
            policy.resolve(shape.draw(renderer, api, r))?;
            Ok(())
        });
        let control = policy.resolve(control)?.unwrap_or(AppControl::Continue);

        self.pulse.advance();

        if ctx.time.frame_index % STATS_EVERY == 0 {
            log::debug!(
                "frame {} dt={:.4}s r={:.2}",
                ctx.time.frame_index,
                ctx.time.dt,
                self.pulse.value()
            );
        }

        Ok(control)
    }
}
