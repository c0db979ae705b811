use crate::frame::{self, FrameData, MeshInstance, StarInstance, Uniforms, Vertex};
use crate::shaders;
use starscape_render::{
    Geometry, GeometryId, PerspectiveCamera, RenderError, Renderer, RendererOptions, Scene,
};
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MSAA_SAMPLES: u32 = 4;

/// GPU buffers for one text geometry.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Instance buffer that grows to fit.
struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    stride: u64,
    label: &'static str,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, label: &'static str, stride: u64, capacity: u64) -> Self {
        Self {
            buffer: Self::allocate(device, label, stride, capacity),
            capacity,
            stride,
            label,
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, stride: u64, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity.max(1) * stride,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let needed = bytes.len() as u64 / self.stride;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.stride, self.capacity);
            tracing::debug!(buffer = self.label, capacity = self.capacity, "instance buffer grown");
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
    }
}

/// Everything that dies with the GPU context.
struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    clear: wgpu::Color,
    star_pipeline: wgpu::RenderPipeline,
    mesh_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    stars: InstanceBuffer,
    mesh_instances: InstanceBuffer,
    meshes: BTreeMap<GeometryId, GpuMesh>,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
}

/// wgpu renderer drawing star points as pixel-sized quads and text meshes
/// with ambient plus directional lighting.
///
/// Owns its surface. [`Renderer::dispose`] drops the device, queue and
/// surface together; afterwards every render fails with
/// [`RenderError::Disposed`].
pub struct WgpuRenderer {
    options: RendererOptions,
    size: (u32, u32),
    backend: String,
    state: Option<GpuState>,
}

impl WgpuRenderer {
    /// Bind a renderer to `surface`, choosing an adapter that can present
    /// to it.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        options: RendererOptions,
    ) -> Result<Self, RenderError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RenderError::Device("no compatible adapter".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("starscape_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;

        let premultiplied = options.alpha
            && caps
                .alpha_modes
                .contains(&wgpu::CompositeAlphaMode::PreMultiplied);
        let alpha_mode = if premultiplied {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };
        let clear = if premultiplied {
            wgpu::Color::TRANSPARENT
        } else {
            wgpu::Color::BLACK
        };

        let sample_count = if options.antialias
            && adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            1
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::zeroed_identity()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let color_target = [Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let depth_stencil = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };
        let multisample = wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        };

        let star_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("star_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::STAR_SHADER.into()),
        });

        let star_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("star_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &star_shader,
                entry_point: Some("vs_star"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StarInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32,
                        2 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &star_shader,
                entry_point: Some("fs_star"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil.clone()),
            multisample,
            multiview: None,
            cache: None,
        });

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_mesh"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<MeshInstance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_mesh"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            // Text tumbles, so both faces must be visible.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil),
            multisample,
            multiview: None,
            cache: None,
        });

        let stars = InstanceBuffer::new(
            &device,
            "star_instances",
            std::mem::size_of::<StarInstance>() as u64,
            1024,
        );
        let mesh_instances = InstanceBuffer::new(
            &device,
            "mesh_instances",
            std::mem::size_of::<MeshInstance>() as u64,
            4,
        );

        let depth_view = create_target(
            &device,
            &config,
            DEPTH_FORMAT,
            sample_count,
            "depth_texture",
        );
        let msaa_view = (sample_count > 1)
            .then(|| create_target(&device, &config, format, sample_count, "msaa_texture"));

        let backend = adapter.get_info().backend.to_str().to_string();
        tracing::info!(
            backend = %backend,
            ?format,
            ?alpha_mode,
            sample_count,
            "GPU initialized"
        );

        Ok(Self {
            options,
            size: (config.width, config.height),
            backend,
            state: Some(GpuState {
                surface,
                device,
                queue,
                config,
                sample_count,
                clear,
                star_pipeline,
                mesh_pipeline,
                uniform_buffer,
                uniform_bind_group,
                stars,
                mesh_instances,
                meshes: BTreeMap::new(),
                depth_view,
                msaa_view,
            }),
        })
    }

    pub fn options(&self) -> RendererOptions {
        self.options
    }

    /// Name of the graphics backend in use, e.g. `vulkan` or `metal`.
    pub fn backend(&self) -> &str {
        &self.backend
    }
}

impl Renderer for WgpuRenderer {
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        let Some(gpu) = self.state.as_mut() else {
            return Err(RenderError::Disposed);
        };
        let frame = frame::collect_frame(scene, camera, self.size);
        gpu.sync_meshes(scene, &frame);
        gpu.draw(&frame)
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        if let Some(gpu) = self.state.as_mut() {
            gpu.resize(self.size.0, self.size.1);
        }
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn dispose(&mut self) {
        if let Some(gpu) = self.state.take() {
            tracing::debug!(meshes = gpu.meshes.len(), "releasing GPU context");
        }
    }

    fn is_disposed(&self) -> bool {
        self.state.is_none()
    }
}

impl GpuState {
    /// Upload buffers for new text geometries and drop those whose geometry
    /// has been disposed.
    fn sync_meshes(&mut self, scene: &Scene, frame: &FrameData) {
        let resources = scene.resources();
        self.meshes.retain(|id, _| resources.geometry(*id).is_some());

        for (id, _) in &frame.meshes {
            if self.meshes.contains_key(id) {
                continue;
            }
            let Some(Geometry::Mesh(mesh)) = resources.geometry(*id) else {
                continue;
            };
            let vertices = frame::mesh_vertices(mesh);
            let vertex_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("text_vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("text_index_buffer"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            tracing::debug!(geometry = id.0, vertices = vertices.len(), "uploaded text mesh");
            self.meshes.insert(
                *id,
                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                },
            );
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_target(
            &self.device,
            &self.config,
            DEPTH_FORMAT,
            self.sample_count,
            "depth_texture",
        );
        if self.sample_count > 1 {
            self.msaa_view = Some(create_target(
                &self.device,
                &self.config,
                self.config.format,
                self.sample_count,
                "msaa_texture",
            ));
        }
    }

    fn draw(&mut self, frame: &FrameData) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timed out; skipping frame");
                return Ok(());
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&frame.uniforms));
        self.stars
            .write(&self.device, &self.queue, bytemuck::cast_slice(&frame.stars));
        let mesh_instances: Vec<MeshInstance> = frame.meshes.iter().map(|(_, i)| *i).collect();
        self.mesh_instances.write(
            &self.device,
            &self.queue,
            bytemuck::cast_slice(&mesh_instances),
        );

        let (view, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&surface_view)),
            None => (&surface_view, None),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if !frame.stars.is_empty() {
                pass.set_pipeline(&self.star_pipeline);
                pass.set_vertex_buffer(0, self.stars.buffer.slice(..));
                pass.draw(0..6, 0..frame.stars.len() as u32);
            }

            if !frame.meshes.is_empty() {
                pass.set_pipeline(&self.mesh_pipeline);
                pass.set_vertex_buffer(1, self.mesh_instances.buffer.slice(..));
                for (instance, (id, _)) in frame.meshes.iter().enumerate() {
                    let Some(mesh) = self.meshes.get(id) else {
                        continue;
                    };
                    let instance = instance as u32;
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, instance..instance + 1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl Uniforms {
    fn zeroed_identity() -> Self {
        Self {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            viewport: [1.0, 1.0, 0.0, 0.0],
            ambient: [0.0; 4],
            light_color: [0.0; 4],
            light_dir: [0.0, 0.0, -1.0, 0.0],
        }
    }
}

fn create_target(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    format: wgpu::TextureFormat,
    sample_count: u32,
    label: &str,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
