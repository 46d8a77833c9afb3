//! Shader program and full-screen quad
//!
//! Compiles the reprojection shader, builds the render pipeline, and owns
//! the uniform buffer, sampler, quad vertex buffer and the bind group that
//! ties them to the source texture.

use tracing::debug;

use crate::error::{ProjectionError, Result};
use crate::gpu::GpuContext;
use crate::rotation::Mat4;
use crate::texture::{RenderTarget, SourceTexture};

const SHADER_SRC: &str = include_str!("shaders/equirect.wgsl");

/// Quad corners as xyzw, drawn as a triangle strip
const QUAD_VERTICES: [f32; 16] = [
    0.0, 0.0, 1.0, 1.0, //
    1.0, 0.0, 1.0, 1.0, //
    0.0, 1.0, 1.0, 1.0, //
    1.0, 1.0, 1.0, 1.0,
];

/// Rotation matrix followed by the lens vector
const UNIFORM_FLOATS: usize = 20;

/// Lens parameters passed to the shader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensParams {
    /// Half the field of view, in radians
    pub half_fov_rad: f32,
    /// Image-circle radius in horizontal uv units
    pub radius_u: f32,
    /// Image-circle radius in vertical uv units
    pub radius_v: f32,
}

impl LensParams {
    /// Lens circle inscribed in the shorter source dimension
    pub fn new(fov_degrees: f32, source_width: u32, source_height: u32) -> Self {
        let short = source_width.min(source_height) as f32;
        Self {
            half_fov_rad: fov_degrees.to_radians() * 0.5,
            radius_u: 0.5 * short / source_width as f32,
            radius_v: 0.5 * short / source_height as f32,
        }
    }
}

/// Pack the uniform block in the layout of the shader's `Params` struct
pub fn uniform_block(matrix: &Mat4, lens: &LensParams) -> [f32; UNIFORM_FLOATS] {
    let mut block = [0.0f32; UNIFORM_FLOATS];
    block[..16].copy_from_slice(matrix.as_array());
    block[16] = lens.half_fov_rad;
    block[17] = lens.radius_u;
    block[18] = lens.radius_v;
    block
}

/// Compiled reprojection program bound to one source texture
pub struct ProjectionProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    quad_buffer: wgpu::Buffer,
}

impl ProjectionProgram {
    /// Compile the shader and build the pipeline
    pub fn new(gpu: &GpuContext, source: &SourceTexture, target: &RenderTarget) -> Result<Self> {
        let target_format = target.format();

        let program = gpu
            .checked("build shader program", |device, _| {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("equirect_shader"),
                    source: wgpu::ShaderSource::Wgsl(SHADER_SRC.into()),
                });

                let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("equirect_bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

                let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("equirect_layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("equirect_pipeline"),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: 16,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![0 => Float32x4],
                        }],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: target_format,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleStrip,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                });

                let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("equirect_uniforms"),
                    size: (UNIFORM_FLOATS * std::mem::size_of::<f32>()) as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });

                let quad_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("quad_vertices"),
                    size: std::mem::size_of_val(&QUAD_VERTICES) as u64,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });

                let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some("source_sampler"),
                    address_mode_u: wgpu::AddressMode::ClampToEdge,
                    address_mode_v: wgpu::AddressMode::ClampToEdge,
                    mag_filter: wgpu::FilterMode::Linear,
                    min_filter: wgpu::FilterMode::Linear,
                    ..Default::default()
                });

                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("equirect_bg"),
                    layout: &bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniform_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(source.view()),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                });

                Self {
                    pipeline,
                    bind_group,
                    uniform_buffer,
                    quad_buffer,
                }
            })
            .map_err(|e| ProjectionError::shader(e.to_string()))?;

        gpu.checked("upload quad", |_, queue| {
            queue.write_buffer(&program.quad_buffer, 0, bytemuck::cast_slice(&QUAD_VERTICES));
        })?;

        debug!("Projection program compiled");
        Ok(program)
    }

    /// Upload the rotation matrix and lens parameters
    pub fn write_uniforms(&self, gpu: &GpuContext, matrix: &Mat4, lens: &LensParams) -> Result<()> {
        let block = uniform_block(matrix, lens);
        gpu.checked("write uniforms", |_, queue| {
            queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&block));
        })
    }

    /// Record a clear + full-screen quad draw into `target`
    pub fn encode_draw(&self, encoder: &mut wgpu::CommandEncoder, target: &RenderTarget) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("equirect_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        pass.draw(0..4, 0..1);
    }
}
