//! `wgpu` implementation of [`GraphicsApi`].
//!
//! `wgpu` has no global binding state, so this backend keeps it on the CPU:
//! `bind_*` calls latch handles, each `draw_indexed` snapshots the latched
//! state (pipeline, uniform block, buffers, texture unit) into a pending
//! draw, and [`WgpuApi::flush`] replays the frame's draws in one render pass.
//!
//! Device calls that can fail run inside a validation error scope, so
//! failures come back as [`GpuError`] instead of hitting the uncaptured
//! error handler.

use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::rc::Rc;

use wgpu::util::DeviceExt;

use crate::color::Color;
use crate::device::Gpu;
use crate::resources::VertexBufferLayout;

use super::uniforms::{lookup_uniform, MaterialBlock, UniformKind, UniformLocation, MAX_TEXTURE_UNITS};
use super::{BlendMode, GpuError, GpuResult, GraphicsApi, TextureImage};

const MIN_UNIFORM_SLOTS: usize = 64;

/// Vertex or index buffer.
pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
    /// Index count for index buffers, byte size for vertex buffers.
    len: u32,
}

/// Vertex buffer binding + layout (`wgpu` has no vertex array object).
#[derive(Default)]
pub struct WgpuVertexArray {
    vertex: Option<(wgpu::Buffer, VertexBufferLayout)>,
}

pub struct WgpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Compiled shader module plus the uniform values and pipelines tied to it.
#[derive(Clone)]
pub struct WgpuProgram(Rc<ProgramInner>);

struct ProgramInner {
    label: String,
    module: wgpu::ShaderModule,
    uniforms: RefCell<ProgramUniforms>,
    pipelines: RefCell<HashMap<PipelineKey, wgpu::RenderPipeline>>,
}

#[derive(Debug, Copy, Clone, Default)]
struct ProgramUniforms {
    block: MaterialBlock,
    texture_unit: u32,
}

#[derive(Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    layout: VertexBufferLayout,
    blend: Option<BlendMode>,
    format: wgpu::TextureFormat,
}

struct Bindings {
    program: Option<WgpuProgram>,
    vertex_array_bound: bool,
    vertex: Option<(wgpu::Buffer, VertexBufferLayout)>,
    index: Option<(wgpu::Buffer, u32)>,
    textures: Vec<Option<wgpu::BindGroup>>,
    blend: Option<BlendMode>,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            program: None,
            vertex_array_bound: false,
            vertex: None,
            index: None,
            textures: vec![None; MAX_TEXTURE_UNITS as usize],
            blend: None,
        }
    }
}

struct PendingDraw {
    pipeline: wgpu::RenderPipeline,
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    count: u32,
    uniform_offset: u32,
    textures: wgpu::BindGroup,
}

/// Real backend over a `wgpu` device.
pub struct WgpuApi {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    /// Sampled when the selected unit is empty (opaque black, like GL).
    fallback_texture: WgpuTexture,

    uniform_stride: usize,
    uniform_capacity: usize,
    uniform_buffer: Option<(wgpu::Buffer, wgpu::BindGroup)>,
    uniform_staging: Vec<u8>,

    bindings: Bindings,
    clear: Option<Color>,
    draws: Vec<PendingDraw>,
}

impl WgpuApi {
    /// Backend drawing into `gpu`'s surface.
    pub fn from_gpu(gpu: &Gpu<'_>) -> GpuResult<Self> {
        Self::new(gpu.device().clone(), gpu.queue().clone(), gpu.surface_format())
    }

    /// Backend over an existing device; pipelines target `surface_format`.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> GpuResult<Self> {

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scratch material bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: material_block_size(),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scratch texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scratch pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scratch sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let fallback_texture = upload_texture(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            &TextureImage::solid(1, 1, [0, 0, 0, 255]),
        )?;

        let alignment = device.limits().min_uniform_buffer_offset_alignment as usize;
        let uniform_stride = std::mem::size_of::<MaterialBlock>().next_multiple_of(alignment);

        log::debug!(
            "wgpu api ready (surface format {surface_format:?}, uniform stride {uniform_stride})"
        );

        Ok(Self {
            device,
            queue,
            surface_format,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            fallback_texture,
            uniform_stride,
            uniform_capacity: 0,
            uniform_buffer: None,
            uniform_staging: Vec::new(),
            bindings: Bindings::default(),
            clear: None,
            draws: Vec::new(),
        })
    }

    /// Target format for pipelines created from now on.
    pub fn set_surface_format(&mut self, format: wgpu::TextureFormat) {
        self.surface_format = format;
    }

    /// Number of draws recorded since the last flush.
    pub fn pending_draws(&self) -> usize {
        self.draws.len()
    }

    /// Drops the frame's recorded clear and draws.
    pub fn discard_frame(&mut self) {
        self.clear = None;
        self.draws.clear();
        self.uniform_staging.clear();
    }

    /// Records the frame's clear and draws into `encoder`, targeting `view`.
    pub fn flush(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) -> GpuResult<()> {
        let draws = std::mem::take(&mut self.draws);
        let load = match self.clear.take() {
            Some(color) => wgpu::LoadOp::Clear(color.to_wgpu()),
            None => wgpu::LoadOp::Load,
        };

        let uniforms = if draws.is_empty() {
            None
        } else {
            Some(self.upload_uniforms()?)
        };
        self.uniform_staging.clear();

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scratch frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(uniforms) = uniforms else { return Ok(()) };

        for draw in &draws {
            rpass.set_pipeline(&draw.pipeline);
            rpass.set_bind_group(0, &uniforms, &[draw.uniform_offset]);
            rpass.set_bind_group(1, &draw.textures, &[]);
            rpass.set_vertex_buffer(0, draw.vertex.slice(..));
            rpass.set_index_buffer(draw.index.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..draw.count, 0, 0..1);
        }

        Ok(())
    }

    fn upload_uniforms(&mut self) -> GpuResult<wgpu::BindGroup> {
        let slots = self.uniform_staging.len() / self.uniform_stride;

        if slots > self.uniform_capacity || self.uniform_buffer.is_none() {
            let capacity = slots.next_power_of_two().max(MIN_UNIFORM_SLOTS);
            let buffer = checked(&self.device, "create_buffer", || {
                self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("scratch material ubo"),
                    size: (capacity * self.uniform_stride) as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })?;

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("scratch material bind group"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        size: material_block_size(),
                    }),
                }],
            });

            log::debug!("material ubo grown to {capacity} slots");
            self.uniform_capacity = capacity;
            self.uniform_buffer = Some((buffer, bind_group));
        }

        let Some((buffer, bind_group)) = self.uniform_buffer.as_ref() else {
            return Err(GpuError::MissingBinding("uniform buffer"));
        };
        self.queue.write_buffer(buffer, 0, &self.uniform_staging);
        Ok(bind_group.clone())
    }

    fn push_uniforms(&mut self, block: &MaterialBlock) -> u32 {
        let offset = self.uniform_staging.len();
        self.uniform_staging.extend_from_slice(bytemuck::bytes_of(block));
        self.uniform_staging.resize(offset + self.uniform_stride, 0);
        offset as u32
    }

    fn pipeline_for(
        &self,
        program: &WgpuProgram,
        layout: &VertexBufferLayout,
        blend: Option<BlendMode>,
    ) -> GpuResult<wgpu::RenderPipeline> {
        let key = PipelineKey {
            layout: layout.clone(),
            blend,
            format: self.surface_format,
        };
        if let Some(pipeline) = program.0.pipelines.borrow().get(&key) {
            return Ok(pipeline.clone());
        }

        let attributes = layout.to_wgpu_attributes()?;
        let buffers = [wgpu::VertexBufferLayout {
            array_stride: layout.stride() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        let pipeline = checked(&self.device, "create_render_pipeline", || {
            self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(program.0.label.as_str()),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &program.0.module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.0.module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: blend.map(BlendMode::to_wgpu),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        })?;

        log::debug!("built pipeline for `{}` (stride {})", program.0.label, layout.stride());
        program.0.pipelines.borrow_mut().insert(key, pipeline.clone());
        Ok(pipeline)
    }
}

impl GraphicsApi for WgpuApi {
    type Buffer = WgpuBuffer;
    type VertexArray = WgpuVertexArray;
    type Texture = WgpuTexture;
    type Program = WgpuProgram;

    fn create_vertex_buffer(&mut self, contents: &[u8]) -> GpuResult<WgpuBuffer> {
        let buffer = checked(&self.device, "create_vertex_buffer", || {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scratch vbo"),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        })?;
        Ok(WgpuBuffer { buffer, len: contents.len() as u32 })
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> GpuResult<WgpuBuffer> {
        let buffer = checked(&self.device, "create_index_buffer", || {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("scratch ibo"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        })?;
        Ok(WgpuBuffer { buffer, len: indices.len() as u32 })
    }

    fn create_vertex_array(&mut self) -> GpuResult<WgpuVertexArray> {
        Ok(WgpuVertexArray::default())
    }

    fn attach_vertex_buffer(
        &mut self,
        vertex_array: &mut WgpuVertexArray,
        buffer: &WgpuBuffer,
        layout: &VertexBufferLayout,
    ) -> GpuResult<()> {
        layout.validate()?;
        vertex_array.vertex = Some((buffer.buffer.clone(), layout.clone()));
        Ok(())
    }

    fn create_texture(&mut self, image: &TextureImage) -> GpuResult<WgpuTexture> {
        upload_texture(&self.device, &self.queue, &self.texture_layout, &self.sampler, image)
    }

    fn create_program(&mut self, label: &str, source: &str) -> GpuResult<WgpuProgram> {
        let module = checked(&self.device, "create_shader_module", || {
            self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })
        .map_err(|err| match err {
            GpuError::Driver { message, .. } => GpuError::ShaderCompile {
                label: label.to_string(),
                message,
            },
            other => other,
        })?;

        Ok(WgpuProgram(Rc::new(ProgramInner {
            label: label.to_string(),
            module,
            uniforms: RefCell::default(),
            pipelines: RefCell::default(),
        })))
    }

    fn uniform_location(&self, _program: &WgpuProgram, name: &str) -> Option<UniformLocation> {
        lookup_uniform(name)
    }

    fn set_uniform_vec4(
        &mut self,
        program: &WgpuProgram,
        location: UniformLocation,
        value: [f32; 4],
    ) -> GpuResult<()> {
        if location.kind != UniformKind::Vec4 {
            return Err(GpuError::UniformTypeMismatch { name: location.name });
        }
        program.0.uniforms.borrow_mut().block.write_vec4(location, value);
        Ok(())
    }

    fn set_uniform_int(
        &mut self,
        program: &WgpuProgram,
        location: UniformLocation,
        value: i32,
    ) -> GpuResult<()> {
        if location.kind != UniformKind::Sampler {
            return Err(GpuError::UniformTypeMismatch { name: location.name });
        }
        let unit = u32::try_from(value)
            .ok()
            .filter(|u| *u < MAX_TEXTURE_UNITS)
            .ok_or(GpuError::TextureUnitOutOfRange {
                unit: value as u32,
                max: MAX_TEXTURE_UNITS,
            })?;
        program.0.uniforms.borrow_mut().texture_unit = unit;
        Ok(())
    }

    fn bind_program(&mut self, program: Option<&WgpuProgram>) {
        self.bindings.program = program.cloned();
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<&WgpuVertexArray>) {
        self.bindings.vertex_array_bound = vertex_array.is_some();
        self.bindings.vertex = vertex_array.and_then(|va| va.vertex.clone());
    }

    fn bind_index_buffer(&mut self, buffer: Option<&WgpuBuffer>) {
        self.bindings.index = buffer.map(|b| (b.buffer.clone(), b.len));
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<&WgpuTexture>) -> GpuResult<()> {
        let slot = self
            .bindings
            .textures
            .get_mut(unit as usize)
            .ok_or(GpuError::TextureUnitOutOfRange { unit, max: MAX_TEXTURE_UNITS })?;
        *slot = texture.map(|t| t.bind_group.clone());
        Ok(())
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) {
        self.bindings.blend = blend;
    }

    fn clear(&mut self, color: Color) {
        // A clear overwrites everything drawn before it in the frame.
        self.discard_frame();
        self.clear = Some(color);
    }

    fn draw_indexed(&mut self, count: u32) -> GpuResult<()> {
        let program = self
            .bindings
            .program
            .clone()
            .ok_or(GpuError::MissingBinding("program"))?;
        if !self.bindings.vertex_array_bound {
            return Err(GpuError::MissingBinding("vertex array"));
        }
        let (vertex, layout) = self
            .bindings
            .vertex
            .clone()
            .ok_or(GpuError::MissingBinding("vertex buffer"))?;
        let (index, available) = self
            .bindings
            .index
            .clone()
            .ok_or(GpuError::MissingBinding("index buffer"))?;
        if count > available {
            return Err(GpuError::IndexCountOutOfRange { requested: count, available });
        }

        let uniforms = *program.0.uniforms.borrow();
        let textures = self
            .bindings
            .textures
            .get(uniforms.texture_unit as usize)
            .cloned()
            .flatten()
            .unwrap_or_else(|| self.fallback_texture.bind_group.clone());

        let pipeline = self.pipeline_for(&program, &layout, self.bindings.blend)?;
        let uniform_offset = self.push_uniforms(&uniforms.block);

        self.draws.push(PendingDraw {
            pipeline,
            vertex,
            index,
            count,
            uniform_offset,
            textures,
        });
        Ok(())
    }
}

fn material_block_size() -> Option<NonZeroU64> {
    NonZeroU64::new(std::mem::size_of::<MaterialBlock>() as u64)
}

/// Runs `f` inside a validation error scope and reports what it captured.
fn checked<T>(device: &wgpu::Device, call: &'static str, f: impl FnOnce() -> T) -> GpuResult<T> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    match pollster::block_on(scope.pop()) {
        None => Ok(value),
        Some(err) => Err(GpuError::Driver {
            call,
            message: err.to_string(),
        }),
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    image: &TextureImage,
) -> GpuResult<WgpuTexture> {
    if image.rgba.len() != image.expected_len() {
        return Err(GpuError::InvalidTextureData {
            expected: image.expected_len(),
            actual: image.rgba.len(),
        });
    }

    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };

    let texture = checked(device, "create_texture", || {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scratch texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    })?;

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scratch texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    Ok(WgpuTexture {
        _texture: texture,
        bind_group,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    const SHADER: &str = r#"
struct Material { color: vec4<f32> };
@group(0) @binding(0) var<uniform> u_material: Material;
@group(1) @binding(0) var u_texture: texture_2d<f32>;
@group(1) @binding(1) var u_sampler: sampler;

struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) pos: vec2<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    return VsOut(vec4<f32>(pos, 0.0, 1.0), uv);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(u_texture, u_sampler, in.uv) * u_material.color;
}
"#;

    fn noop_api() -> WgpuApi {
        let (device, queue) = wgpu::Device::noop(&wgpu::DeviceDescriptor::default());
        WgpuApi::new(device, queue, TARGET).unwrap()
    }

    struct Quad {
        program: WgpuProgram,
        vertex_array: WgpuVertexArray,
        index: WgpuBuffer,
        _vertex: WgpuBuffer,
    }

    fn quad(api: &mut WgpuApi) -> Quad {
        let vertex = api.create_vertex_buffer(bytemuck::cast_slice(&[0.0f32; 16])).unwrap();
        let index = api.create_index_buffer(&[0, 1, 2, 2, 3, 0]).unwrap();

        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(2).push::<f32>(2);
        let mut vertex_array = api.create_vertex_array().unwrap();
        api.attach_vertex_buffer(&mut vertex_array, &vertex, &layout).unwrap();

        let program = api.create_program("basic", SHADER).unwrap();
        Quad { program, vertex_array, index, _vertex: vertex }
    }

    fn bind(api: &mut WgpuApi, q: &Quad) {
        api.bind_program(Some(&q.program));
        api.bind_vertex_array(Some(&q.vertex_array));
        api.bind_index_buffer(Some(&q.index));
    }

    fn location(name: &str) -> UniformLocation {
        lookup_uniform(name).unwrap()
    }

    #[test]
    fn clear_discards_earlier_draws() {
        let mut api = noop_api();
        let q = quad(&mut api);
        bind(&mut api, &q);

        api.draw_indexed(6).unwrap();
        assert_eq!(api.pending_draws(), 1);

        api.clear(Color::BLACK);
        assert_eq!(api.pending_draws(), 0);
        assert!(api.uniform_staging.is_empty());

        api.draw_indexed(6).unwrap();
        assert_eq!(api.pending_draws(), 1);
    }

    #[test]
    fn color_uniform_is_captured_per_draw() {
        let mut api = noop_api();
        let q = quad(&mut api);
        bind(&mut api, &q);

        api.set_uniform_vec4(&q.program, location("u_Color"), [0.25, 0.3, 0.8, 1.0]).unwrap();
        api.draw_indexed(6).unwrap();
        api.set_uniform_vec4(&q.program, location("u_Color"), [0.75, 0.3, 0.8, 1.0]).unwrap();
        api.draw_indexed(6).unwrap();

        let stride = api.uniform_stride;
        let first: &[f32] = bytemuck::cast_slice(&api.uniform_staging[..16]);
        let second: &[f32] = bytemuck::cast_slice(&api.uniform_staging[stride..stride + 16]);
        assert_eq!(first, [0.25, 0.3, 0.8, 1.0]);
        assert_eq!(second, [0.75, 0.3, 0.8, 1.0]);
        assert_eq!(api.draws[1].uniform_offset as usize, stride);
    }

    #[test]
    fn texture_unit_is_read_when_the_draw_is_issued() {
        let mut api = noop_api();
        let q = quad(&mut api);
        let texture = api.create_texture(&TextureImage::solid(2, 2, [255; 4])).unwrap();
        bind(&mut api, &q);
        api.bind_texture(2, Some(&texture)).unwrap();

        api.set_uniform_int(&q.program, location("u_Texture"), 2).unwrap();
        api.draw_indexed(6).unwrap();
        api.set_uniform_int(&q.program, location("u_Texture"), 0).unwrap();

        assert!(api.draws[0].textures == texture.bind_group);
    }

    #[test]
    fn empty_texture_unit_samples_fallback() {
        let mut api = noop_api();
        let q = quad(&mut api);
        bind(&mut api, &q);

        api.set_uniform_int(&q.program, location("u_Texture"), 5).unwrap();
        api.draw_indexed(6).unwrap();

        assert!(api.draws[0].textures == api.fallback_texture.bind_group);
    }

    #[test]
    fn texture_unit_past_last_is_rejected() {
        let mut api = noop_api();
        let q = quad(&mut api);

        let err = api
            .set_uniform_int(&q.program, location("u_Texture"), MAX_TEXTURE_UNITS as i32)
            .unwrap_err();
        assert_eq!(err, GpuError::TextureUnitOutOfRange { unit: 16, max: MAX_TEXTURE_UNITS });
        assert_eq!(q.program.0.uniforms.borrow().texture_unit, 0);
    }

    #[test]
    fn draw_requires_bindings_and_index_range() {
        let mut api = noop_api();
        let q = quad(&mut api);

        assert_eq!(api.draw_indexed(6), Err(GpuError::MissingBinding("program")));

        bind(&mut api, &q);
        assert_eq!(
            api.draw_indexed(7),
            Err(GpuError::IndexCountOutOfRange { requested: 7, available: 6 })
        );
        assert_eq!(api.pending_draws(), 0);
    }

    #[test]
    fn pipelines_are_cached_per_program() {
        let mut api = noop_api();
        let q = quad(&mut api);
        bind(&mut api, &q);

        api.draw_indexed(6).unwrap();
        api.draw_indexed(3).unwrap();
        assert_eq!(q.program.0.pipelines.borrow().len(), 1);

        api.set_blend(Some(BlendMode::Alpha));
        api.draw_indexed(6).unwrap();
        assert_eq!(q.program.0.pipelines.borrow().len(), 2);
    }

    #[test]
    fn invalid_wgsl_is_a_compile_error() {
        let mut api = noop_api();
        let err = api.create_program("broken", "fn vs_main( {").err().unwrap();
        assert!(matches!(err, GpuError::ShaderCompile { ref label, .. } if label == "broken"));
    }

    #[test]
    fn flush_drains_the_frame() {
        let mut api = noop_api();
        let q = quad(&mut api);

        api.clear(Color::BLACK);
        bind(&mut api, &q);
        api.draw_indexed(6).unwrap();

        let target = api.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test target"),
            size: wgpu::Extent3d { width: 4, height: 4, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = api
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        api.flush(&mut encoder, &view).unwrap();
        api.queue.submit(std::iter::once(encoder.finish()));

        assert_eq!(api.pending_draws(), 0);
        assert!(api.clear.is_none());
        assert!(api.uniform_capacity >= 1);
    }
}
