use crate::config::CLEAR_COLOR;
use crate::model::PolygonMode;
use crate::utils::{Mesh, MeshBuffer, Vertex};
use crate::view::shader::{DrawRecord, FrameRecording, PassKind, PassRecord, Program, ShaderUniforms};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const UNIFORM_SIZE: u64 = std::mem::size_of::<ShaderUniforms>() as u64;
const INITIAL_UNIFORM_SLOTS: u32 = 64;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
    wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
    wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x4 },
];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

/// Depth target rendered from the light and sampled by the lit pass.
pub struct ShadowResources {
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
    pub view: wgpu::TextureView,
    pub texture: wgpu::Texture,
    pub resolution: u32,
}

pub fn create_shadow_resources(device: &wgpu::Device, resolution: u32) -> ShadowResources {
    let resolution = resolution.clamp(1, device.limits().max_texture_dimension_2d);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("shadow_map"),
        size: wgpu::Extent3d { width: resolution, height: resolution, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("shadow_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("shadow_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("shadow_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&sampler) },
        ],
    });

    ShadowResources { bind_group, bind_group_layout, sampler, view, texture, resolution }
}

/// One uniform buffer with a slot per recorded draw, addressed by dynamic offset.
pub struct UniformResources {
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub buffer: wgpu::Buffer,
    pub stride: u64,
    pub capacity: u32,
}

fn uniform_stride(device: &wgpu::Device) -> u64 {
    let align = device.limits().min_uniform_buffer_offset_alignment as u64;
    UNIFORM_SIZE.div_ceil(align) * align
}

fn create_uniform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("uniform_bind_group_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
            },
            count: None,
        }],
    })
}

fn create_uniform_slots(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    capacity: u32,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("uniform_buffer x{capacity}")),
        size: stride * capacity as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("uniform_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(UNIFORM_SIZE),
            }),
        }],
    });
    (buffer, bind_group)
}

pub fn create_uniform_resources(device: &wgpu::Device) -> UniformResources {
    let bind_group_layout = create_uniform_bind_group_layout(device);
    let stride = uniform_stride(device);
    let (buffer, bind_group) = create_uniform_slots(device, &bind_group_layout, stride, INITIAL_UNIFORM_SLOTS);
    UniformResources { bind_group, bind_group_layout, buffer, stride, capacity: INITIAL_UNIFORM_SLOTS }
}

impl UniformResources {
    fn ensure_capacity(&mut self, device: &wgpu::Device, slots: u32) {
        if slots <= self.capacity {
            return;
        }
        let capacity = slots.next_power_of_two();
        tracing::debug!(old = self.capacity, new = capacity, "growing uniform buffer");
        let (buffer, bind_group) = create_uniform_slots(device, &self.bind_group_layout, self.stride, capacity);
        self.buffer = buffer;
        self.bind_group = bind_group;
        self.capacity = capacity;
    }
}

/// Pack every draw's uniform block at `stride` spacing into `bytes`, replacing its contents.
pub fn pack_uniforms<'a>(bytes: &mut Vec<u8>, draws: impl Iterator<Item = &'a DrawRecord>, stride: u64) {
    bytes.clear();
    for draw in draws {
        let start = bytes.len();
        bytes.extend_from_slice(bytemuck::bytes_of(&draw.uniforms));
        bytes.resize(start + stride as usize, 0);
    }
}

pub struct PipelineResources {
    pub depth: wgpu::RenderPipeline,
    pub depth_line: Option<wgpu::RenderPipeline>,
    pub depth_point: Option<wgpu::RenderPipeline>,
    pub lit: wgpu::RenderPipeline,
    pub lit_line: Option<wgpu::RenderPipeline>,
    pub lit_point: Option<wgpu::RenderPipeline>,
    pub sky: wgpu::RenderPipeline,
}

impl PipelineResources {
    /// Lit pipeline for `mode`, or fill when the device lacks that mode.
    pub fn lit_for(&self, mode: PolygonMode) -> (&wgpu::RenderPipeline, bool) {
        pick_variant(mode, &self.lit, self.lit_line.as_ref(), self.lit_point.as_ref())
    }

    /// Shadow pipeline for `mode`. Polygon mode applies to the shadow pass as well.
    pub fn depth_for(&self, mode: PolygonMode) -> (&wgpu::RenderPipeline, bool) {
        pick_variant(mode, &self.depth, self.depth_line.as_ref(), self.depth_point.as_ref())
    }
}

/// Variant for `mode`, falling back to `fill` when it was not created.
/// The flag is false on fallback.
fn pick_variant<'a, T>(mode: PolygonMode, fill: &'a T, line: Option<&'a T>, point: Option<&'a T>) -> (&'a T, bool) {
    let wanted = match mode {
        PolygonMode::Fill => return (fill, true),
        PolygonMode::Line => line,
        PolygonMode::Point => point,
    };
    match wanted {
        Some(p) => (p, true),
        None => (fill, false),
    }
}

fn create_depth_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("depth_pipeline_{polygon_mode:?}")),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: if polygon_mode == wgpu::PolygonMode::Fill { Some(wgpu::Face::Back) } else { None },
            polygon_mode,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState { constant: 2, slope_scale: 2.0, clamp: 0.0 },
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

fn create_lit_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("lit_pipeline_{polygon_mode:?}")),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState { format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: if polygon_mode == wgpu::PolygonMode::Fill { Some(wgpu::Face::Back) } else { None },
            polygon_mode,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

pub fn create_pipelines(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    uniform_layout: &wgpu::BindGroupLayout,
    shadow_layout: &wgpu::BindGroupLayout,
) -> PipelineResources {
    let depth_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("depth_shader"),
        source: wgpu::ShaderSource::Wgsl(concat!(include_str!("shaders/uniforms.wgsl"), include_str!("shaders/depth.wgsl")).into()),
    });
    let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(concat!(include_str!("shaders/uniforms.wgsl"), include_str!("shaders/scene.wgsl")).into()),
    });
    let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("sky_shader"),
        source: wgpu::ShaderSource::Wgsl(concat!(include_str!("shaders/uniforms.wgsl"), include_str!("shaders/sky.wgsl")).into()),
    });

    let uniform_only_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("uniform_only_pipeline_layout"),
        bind_group_layouts: &[uniform_layout],
        push_constant_ranges: &[],
    });
    let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("lit_pipeline_layout"),
        bind_group_layouts: &[uniform_layout, shadow_layout],
        push_constant_ranges: &[],
    });

    let features = device.features();
    let line = features.contains(wgpu::Features::POLYGON_MODE_LINE);
    let point = features.contains(wgpu::Features::POLYGON_MODE_POINT);

    let depth = create_depth_pipeline(device, &uniform_only_layout, &depth_shader, wgpu::PolygonMode::Fill);
    let depth_line = line.then(|| create_depth_pipeline(device, &uniform_only_layout, &depth_shader, wgpu::PolygonMode::Line));
    let depth_point = point.then(|| create_depth_pipeline(device, &uniform_only_layout, &depth_shader, wgpu::PolygonMode::Point));

    let lit = create_lit_pipeline(device, &lit_layout, &scene_shader, format, wgpu::PolygonMode::Fill);
    let lit_line = line.then(|| create_lit_pipeline(device, &lit_layout, &scene_shader, format, wgpu::PolygonMode::Line));
    let lit_point = point.then(|| create_lit_pipeline(device, &lit_layout, &scene_shader, format, wgpu::PolygonMode::Point));

    let sky = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("sky_pipeline"),
        layout: Some(&uniform_only_layout),
        vertex: wgpu::VertexState {
            module: &sky_shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &sky_shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState { format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: Default::default(),
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
        // Drawn last at the far plane, behind everything already in the depth buffer
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    });

    PipelineResources { depth, depth_line, depth_point, lit, lit_line, lit_point, sky }
}

///////////////////////////////////////////////////////////////////////////////

/// Everything needed to turn a [`FrameRecording`] into GPU passes.
///
/// Fields drop top to bottom, so the mesh buffers and render targets go before
/// the layouts and pipelines they were created against.
pub struct RenderState {
    pub meshes: Vec<MeshBuffer>,
    pub depth_view: wgpu::TextureView,
    pub depth_texture: wgpu::Texture,
    pub shadow: ShadowResources,
    pub uniforms: UniformResources,
    pub pipelines: PipelineResources,
    pub width: u32,
    pub height: u32,
    uniform_bytes: Vec<u8>,
    fallback_warned: bool,
}

impl RenderState {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        shadow_resolution: u32,
        meshes: &[Mesh],
    ) -> Self {
        let uniforms = create_uniform_resources(device);
        let shadow = create_shadow_resources(device, shadow_resolution);
        let pipelines = create_pipelines(device, format, &uniforms.bind_group_layout, &shadow.bind_group_layout);
        let (depth_texture, depth_view) = create_depth_texture(device, width, height);
        let meshes = meshes.iter().map(|m| m.upload(device)).collect();

        tracing::info!(
            shadow_resolution = shadow.resolution,
            uniform_stride = uniforms.stride,
            line = pipelines.lit_line.is_some(),
            point = pipelines.lit_point.is_some(),
            "render state ready"
        );

        Self {
            meshes,
            depth_view,
            depth_texture,
            shadow,
            uniforms,
            pipelines,
            width: width.max(1),
            height: height.max(1),
            uniform_bytes: Vec::new(),
            fallback_warned: false,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let (depth_texture, depth_view) = create_depth_texture(device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
        self.width = width;
        self.height = height;
    }

    /// Encode the recorded depth and lit passes into `encoder`, lit output going to `target`.
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        recording: &FrameRecording,
    ) {
        let slots = recording.draw_count() as u32;
        if slots == 0 {
            return;
        }
        self.uniforms.ensure_capacity(device, slots);
        pack_uniforms(&mut self.uniform_bytes, recording.passes.iter().flat_map(|p| p.draws.iter()), self.uniforms.stride);
        queue.write_buffer(&self.uniforms.buffer, 0, &self.uniform_bytes);

        let mut slot = 0u32;
        for pass in &recording.passes {
            match pass.kind {
                PassKind::Depth => self.encode_depth_pass(encoder, pass, &mut slot),
                PassKind::Lit => self.encode_lit_pass(encoder, target, pass, &mut slot),
            }
        }
    }

    fn encode_depth_pass(&self, encoder: &mut wgpu::CommandEncoder, pass: &PassRecord, slot: &mut u32) {
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow_depth_pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow.view,
                depth_ops: Some(wgpu::Operations {
                    load: if pass.clear.depth { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        let (w, h) = clamp_viewport(pass.viewport, (self.shadow.resolution, self.shadow.resolution));
        rp.set_viewport(0.0, 0.0, w as f32, h as f32, 0.0, 1.0);
        // Fallback is reported once by the lit pass
        let (depth_pipeline, _) = self.pipelines.depth_for(pass.polygon_mode);
        rp.set_pipeline(depth_pipeline);

        for draw in &pass.draws {
            let offset = self.offset(*slot);
            *slot += 1;
            // Nothing to write without a colour target
            if draw.program != Program::Depth {
                continue;
            }
            let Some(mesh) = self.mesh(draw) else { continue };
            rp.set_bind_group(0, &self.uniforms.bind_group, &[offset]);
            rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            rp.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rp.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    fn encode_lit_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        pass: &PassRecord,
        slot: &mut u32,
    ) {
        let (lit_pipeline, supported) = self.pipelines.lit_for(pass.polygon_mode);
        if !supported && !self.fallback_warned {
            tracing::warn!(mode = ?pass.polygon_mode, "polygon mode not supported by this device, drawing filled");
            self.fallback_warned = true;
        }
        let [r, g, b, a] = CLEAR_COLOR;

        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lit_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: if pass.clear.color { wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }) } else { wgpu::LoadOp::Load },
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: if pass.clear.depth { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        let (w, h) = clamp_viewport(pass.viewport, (self.width, self.height));
        rp.set_viewport(0.0, 0.0, w as f32, h as f32, 0.0, 1.0);

        for draw in &pass.draws {
            let offset = self.offset(*slot);
            *slot += 1;
            let Some(mesh) = self.mesh(draw) else { continue };
            match draw.program {
                Program::Lit => {
                    rp.set_pipeline(lit_pipeline);
                    // Layout always has the shadow group; params.z tells the shader whether to sample it
                    rp.set_bind_group(1, &self.shadow.bind_group, &[]);
                }
                Program::Sky => rp.set_pipeline(&self.pipelines.sky),
                Program::Depth => {
                    tracing::warn!(mesh = ?draw.mesh, "depth program draw in lit pass skipped");
                    continue;
                }
            }
            rp.set_bind_group(0, &self.uniforms.bind_group, &[offset]);
            rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            rp.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rp.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    fn offset(&self, slot: u32) -> wgpu::DynamicOffset {
        (slot as u64 * self.uniforms.stride) as wgpu::DynamicOffset
    }

    fn mesh(&self, draw: &DrawRecord) -> Option<&MeshBuffer> {
        let mesh = self.meshes.get(draw.mesh.0);
        if mesh.is_none() {
            tracing::warn!(mesh = ?draw.mesh, "draw references unknown mesh");
        }
        mesh
    }
}

fn clamp_viewport((w, h): (u32, u32), (max_w, max_h): (u32, u32)) -> (u32, u32) {
    (w.clamp(1, max_w.max(1)), h.clamp(1, max_h.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::shader::MeshId;

    #[test]
    fn test_pack_uniforms_uses_stride() {
        let mut a = ShaderUniforms::default();
        a.params[0] = 0.25;
        let draws = [
            DrawRecord { program: Program::Depth, mesh: MeshId(0), uniforms: ShaderUniforms::default() },
            DrawRecord { program: Program::Lit, mesh: MeshId(1), uniforms: a },
        ];
        let mut bytes = Vec::new();
        pack_uniforms(&mut bytes, draws.iter(), 768);
        assert_eq!(bytes.len(), 768 * 2);
        let second: ShaderUniforms = bytemuck::pod_read_unaligned(&bytes[768..768 + UNIFORM_SIZE as usize]);
        assert_eq!(second.params[0], 0.25);
    }

    #[test]
    fn test_pack_uniforms_reuses_buffer() {
        let draw = DrawRecord { program: Program::Lit, mesh: MeshId(0), uniforms: ShaderUniforms::default() };
        let draws = vec![draw; 12];
        let mut bytes = Vec::new();
        pack_uniforms(&mut bytes, draws.iter(), 512);
        let capacity = bytes.capacity();
        let ptr = bytes.as_ptr();

        pack_uniforms(&mut bytes, draws.iter(), 512);
        assert_eq!(bytes.len(), 512 * 12);
        assert_eq!(bytes.capacity(), capacity);
        assert_eq!(bytes.as_ptr(), ptr);

        pack_uniforms(&mut bytes, draws[..2].iter(), 512);
        assert_eq!(bytes.len(), 512 * 2);
    }

    #[test]
    fn test_pick_variant_matches_mode_or_falls_back() {
        let (fill, line, point) = ("fill", "line", "point");
        assert_eq!(pick_variant(PolygonMode::Fill, &fill, Some(&line), Some(&point)), (&fill, true));
        assert_eq!(pick_variant(PolygonMode::Line, &fill, Some(&line), Some(&point)), (&line, true));
        assert_eq!(pick_variant(PolygonMode::Point, &fill, Some(&line), Some(&point)), (&point, true));
        assert_eq!(pick_variant(PolygonMode::Line, &fill, None, Some(&point)), (&fill, false));
        assert_eq!(pick_variant(PolygonMode::Point, &fill, Some(&line), None), (&fill, false));
    }

    #[test]
    fn test_clamp_viewport() {
        assert_eq!(clamp_viewport((4096, 4096), (2048, 2048)), (2048, 2048));
        assert_eq!(clamp_viewport((0, 10), (800, 600)), (1, 10));
    }
}
