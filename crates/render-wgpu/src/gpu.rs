use std::collections::BTreeMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use tableau_common::{Color, NodeId, Viewport};
use tableau_render::{RenderError, RenderSettings, Renderer};
use tableau_scene::{
    Geometry, Light, Material, NodeKind, PerspectiveCamera, SceneGraph, Shading, Side, TextureId,
    TextureImage,
};
use tracing::{debug, info, trace, warn};
use wgpu::util::DeviceExt;

use crate::shaders;

pub(crate) const MAX_LIGHTS: usize = 8;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const LIGHT_DIRECTIONAL: f32 = 0.0;
const LIGHT_POINT: f32 = 1.0;
const LIGHT_HEMISPHERE: f32 = 2.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
struct GpuLight {
    vector: [f32; 4],
    color: [f32; 4],
    extra: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    params: [u32; 4],
    lights: [GpuLight; MAX_LIGHTS],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    params: [u32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

/// Interleave geometry attributes. Point clouds and meshes without normals
/// or uvs get zeroes in the missing slots.
fn pack_vertices(geometry: &Geometry) -> Vec<Vertex> {
    geometry
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| Vertex {
            position: p.to_array(),
            normal: geometry.normals.get(i).map_or([0.0; 3], |n| n.to_array()),
            uv: geometry.uvs.get(i).map_or([0.0; 2], |uv| uv.to_array()),
        })
        .collect()
}

/// Color as written to the shader. The surface format is sRGB, so without
/// gamma output colors are linearized first and come back out unchanged.
fn shader_color(color: Color, gamma_output: bool) -> [f32; 3] {
    if gamma_output {
        color.to_array()
    } else {
        color.to_linear()
    }
}

fn gpu_light(light: &Light, world: Mat4, gamma_output: bool) -> GpuLight {
    let position = world.transform_point3(Vec3::ZERO);
    let rgba = |c: Color, intensity: f32| {
        let [r, g, b] = shader_color(c, gamma_output);
        [r, g, b, intensity]
    };
    match *light {
        Light::Directional { color, intensity } => GpuLight {
            vector: position.normalize_or(Vec3::Y).extend(LIGHT_DIRECTIONAL).to_array(),
            color: rgba(color, intensity),
            extra: [0.0; 4],
        },
        Light::Point {
            color,
            intensity,
            distance,
        } => GpuLight {
            vector: position.extend(LIGHT_POINT).to_array(),
            color: rgba(color, intensity),
            extra: [0.0, 0.0, 0.0, distance],
        },
        Light::Hemisphere {
            sky,
            ground,
            intensity,
        } => GpuLight {
            vector: Vec3::Y.extend(LIGHT_HEMISPHERE).to_array(),
            color: rgba(sky, intensity),
            extra: rgba(ground, 0.0),
        },
    }
}

/// Collect up to [`MAX_LIGHTS`] lights in traversal order.
fn collect_lights(scene: &SceneGraph, gamma_output: bool) -> (u32, [GpuLight; MAX_LIGHTS]) {
    let mut lights = [GpuLight::default(); MAX_LIGHTS];
    let ids = scene.lights();
    if ids.len() > MAX_LIGHTS {
        warn!(count = ids.len(), max = MAX_LIGHTS, "too many lights, extra lights ignored");
    }
    let mut count = 0;
    for id in ids.into_iter().take(MAX_LIGHTS) {
        let (Some(node), Some(world)) = (scene.get(id), scene.world_matrix(id)) else {
            continue;
        };
        if let NodeKind::Light(light) = &node.kind {
            lights[count] = gpu_light(light, world, gamma_output);
            count += 1;
        }
    }
    (count as u32, lights)
}

fn shading_code(shading: Shading) -> u32 {
    match shading {
        Shading::Basic | Shading::Points => 0,
        Shading::Standard => 1,
        Shading::Physical => 2,
        Shading::Toon => 3,
    }
}

fn object_uniforms(world: Mat4, material: &Material, has_map: bool, gamma_output: bool) -> ObjectUniforms {
    let [r, g, b] = shader_color(material.color, gamma_output);
    ObjectUniforms {
        model: world.to_cols_array_2d(),
        normal_matrix: world.inverse().transpose().to_cols_array_2d(),
        color: [r, g, b, 1.0],
        params: [shading_code(material.shading), has_map as u32, 0, 0],
    }
}

/// Device, queue and configured surface for one window.
pub struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    backend: wgpu::Backend,
}

impl GpuContext {
    /// Create a device for `target` and configure its surface at `size`
    /// physical pixels.
    pub fn new(target: impl Into<wgpu::SurfaceTarget<'static>>, size: Viewport) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::Init(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tableau_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Init(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Init("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let backend = adapter.get_info().backend;
        info!(backend = backend.to_str(), ?format, "GPU initialized");
        Ok(Self {
            surface,
            device,
            queue,
            config,
            backend,
        })
    }

    pub fn backend(&self) -> wgpu::Backend {
        self.backend
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn configure(&mut self, size: Viewport) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
    }
}

/// GPU resources for one mesh or point-cloud node.
struct NodeResources {
    geometry: Arc<Geometry>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    element_count: u32,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
}

struct GpuTexture {
    bind_group: wgpu::BindGroup,
}

/// wgpu renderer drawing a [`SceneGraph`] into a window surface.
pub struct WgpuRenderer {
    gpu: GpuContext,
    settings: RenderSettings,
    size: Viewport,
    pixel_ratio: f64,
    sample_count: u32,
    mesh_pipeline: wgpu::RenderPipeline,
    double_sided_pipeline: wgpu::RenderPipeline,
    points_pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    white_texture: GpuTexture,
    textures: BTreeMap<TextureId, GpuTexture>,
    nodes: BTreeMap<NodeId, NodeResources>,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
}

impl WgpuRenderer {
    /// Build pipelines on `gpu`. `size` is in logical pixels and the surface
    /// is reconfigured to `size * pixel_ratio`.
    pub fn new(gpu: GpuContext, settings: RenderSettings, size: Viewport, device_pixel_ratio: f64) -> Self {
        let device = &gpu.device;
        let sample_count = if settings.antialias { 4 } else { 1 };
        let format = gpu.config.format;

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_layout"),
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_layout"),
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_layout"),
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

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&scene_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let pipeline = |label, topology, cull_mode, vs, fs| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(vs),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Float32x2,
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fs),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        };
        let mesh_pipeline = pipeline(
            "mesh_pipeline",
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Back),
            "vs_main",
            "fs_main",
        );
        let double_sided_pipeline = pipeline(
            "double_sided_pipeline",
            wgpu::PrimitiveTopology::TriangleList,
            None,
            "vs_main",
            "fs_main",
        );
        let points_pipeline = pipeline(
            "points_pipeline",
            wgpu::PrimitiveTopology::PointList,
            None,
            "vs_points",
            "fs_points",
        );

        let white_texture = upload_texture(
            device,
            &gpu.queue,
            &texture_layout,
            &TextureImage::solid([255, 255, 255, 255]),
        );

        let pixel_ratio = settings.resolve_pixel_ratio(device_pixel_ratio);
        let buffer = size.scaled(pixel_ratio);
        let (depth_view, msaa_view) = create_targets(device, format, buffer, sample_count);

        let mut renderer = Self {
            gpu,
            settings,
            size,
            pixel_ratio,
            sample_count,
            mesh_pipeline,
            double_sided_pipeline,
            points_pipeline,
            scene_buffer,
            scene_bind_group,
            object_layout,
            texture_layout,
            white_texture,
            textures: BTreeMap::new(),
            nodes: BTreeMap::new(),
            depth_view,
            msaa_view,
        };
        renderer.reconfigure();
        renderer
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Nodes with GPU buffers currently cached.
    pub fn cached_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn reconfigure(&mut self) {
        let buffer = self.drawing_buffer_size();
        self.gpu.configure(buffer);
        let (depth_view, msaa_view) =
            create_targets(&self.gpu.device, self.gpu.config.format, buffer, self.sample_count);
        self.depth_view = depth_view;
        self.msaa_view = msaa_view;
        debug!(width = buffer.width, height = buffer.height, "surface reconfigured");
    }

    /// Upload textures referenced by the scene that are not on the GPU yet.
    fn sync_textures(&mut self, scene: &SceneGraph) {
        for id in scene.meshes() {
            let Some(map) = scene.get(id).and_then(|n| n.kind.material()).and_then(|m| m.map) else {
                continue;
            };
            if self.textures.contains_key(&map) {
                continue;
            }
            match scene.textures.get(map) {
                Some(image) if image.is_well_formed() => {
                    let texture = upload_texture(&self.gpu.device, &self.gpu.queue, &self.texture_layout, image);
                    debug!(texture = map.0, width = image.width, height = image.height, "texture uploaded");
                    self.textures.insert(map, texture);
                }
                _ => trace!(texture = map.0, "texture not available yet"),
            }
        }
    }

    /// Create or refresh per-node buffers and drop those of removed nodes.
    fn sync_nodes(&mut self, scene: &SceneGraph) {
        self.nodes.retain(|id, res| {
            scene
                .get(*id)
                .and_then(|n| n.kind.geometry())
                .is_some_and(|g| Arc::ptr_eq(g, &res.geometry))
        });

        for id in scene.traverse() {
            let Some(node) = scene.get(id) else {
                continue;
            };
            let (Some(geometry), Some(material), Some(world)) =
                (node.kind.geometry(), node.kind.material(), scene.world_matrix(id))
            else {
                continue;
            };
            let has_map = material.map.is_some_and(|m| self.textures.contains_key(&m));
            let uniforms = object_uniforms(world, material, has_map, self.settings.gamma_output);

            if let Some(res) = self.nodes.get(&id) {
                self.gpu
                    .queue
                    .write_buffer(&res.object_buffer, 0, bytemuck::bytes_of(&uniforms));
                continue;
            }
            if geometry.positions.is_empty() {
                continue;
            }
            let res = self.create_node_resources(geometry, &uniforms);
            trace!(node = %id.short(), name = %node.name, "node buffers created");
            self.nodes.insert(id, res);
        }
    }

    fn create_node_resources(&self, geometry: &Arc<Geometry>, uniforms: &ObjectUniforms) -> NodeResources {
        let device = &self.gpu.device;
        let vertices = pack_vertices(geometry);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("node_vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let (index_buffer, element_count) = if geometry.is_points() {
            (None, vertices.len() as u32)
        } else {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("node_indices"),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            (Some(buffer), geometry.indices.len() as u32)
        };
        let object_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("node_object"),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("node_object_bind_group"),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: object_buffer.as_entire_binding(),
            }],
        });
        NodeResources {
            geometry: Arc::clone(geometry),
            vertex_buffer,
            index_buffer,
            element_count,
            object_buffer,
            object_bind_group,
        }
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    image: &TextureImage,
) -> GpuTexture {
    let format = if image.srgb {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    };
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("color_map"),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &image.rgba,
    );
    let view = texture.create_view(&Default::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("color_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        anisotropy_clamp: image.anisotropy.clamp(1, 16),
        ..Default::default()
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("color_map_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });
    GpuTexture { bind_group }
}

fn create_targets(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    size: Viewport,
    sample_count: u32,
) -> (wgpu::TextureView, Option<wgpu::TextureView>) {
    let extent = wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    };
    let target = |label, format| {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: extent,
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&Default::default())
    };
    let depth = target("depth_texture", DEPTH_FORMAT);
    let msaa = (sample_count > 1).then(|| target("msaa_color", format));
    (depth, msaa)
}

impl Renderer for WgpuRenderer {
    type Output = ();

    fn set_pixel_ratio(&mut self, ratio: f64) {
        let ratio = RenderSettings {
            pixel_ratio: Some(ratio),
            ..self.settings
        }
        .resolve_pixel_ratio(1.0);
        if ratio != self.pixel_ratio {
            self.pixel_ratio = ratio;
            self.reconfigure();
        }
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, viewport: Viewport) {
        if viewport != self.size {
            self.size = viewport;
            self.reconfigure();
        }
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        if !self.size.is_valid() {
            return Err(RenderError::SurfaceUnavailable);
        }
        let gamma_output = self.settings.gamma_output;
        let (light_count, lights) = collect_lights(scene, gamma_output);
        let uniforms = SceneUniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            params: [light_count, 0, 0, 0],
            lights,
        };
        self.gpu
            .queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&uniforms));

        self.sync_textures(scene);
        self.sync_nodes(scene);

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Err(RenderError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Frame(e.to_string())),
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let (color_view, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&view)),
            None => (&view, None),
        };

        let [r, g, b] = shader_color(scene.background(), gamma_output);
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
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
            pass.set_bind_group(0, &self.scene_bind_group, &[]);

            for id in scene.traverse() {
                let (Some(node), Some(res)) = (scene.get(id), self.nodes.get(&id)) else {
                    continue;
                };
                let Some(material) = node.kind.material() else {
                    continue;
                };
                let pipeline = match (&node.kind, material.side) {
                    (NodeKind::Points { .. }, _) => &self.points_pipeline,
                    (_, Side::Double) => &self.double_sided_pipeline,
                    (_, Side::Front) => &self.mesh_pipeline,
                };
                let texture = material
                    .map
                    .and_then(|m| self.textures.get(&m))
                    .unwrap_or(&self.white_texture);

                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &res.object_bind_group, &[]);
                pass.set_bind_group(2, &texture.bind_group, &[]);
                pass.set_vertex_buffer(0, res.vertex_buffer.slice(..));
                match &res.index_buffer {
                    Some(indices) => {
                        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..res.element_count, 0, 0..1);
                    }
                    None => pass.draw(0..res.element_count, 0..1),
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use tableau_common::Transform;
    use tableau_scene::Node;

    #[test]
    fn packs_box_vertices_with_normals_and_uvs() {
        let geometry = Geometry::boxed(2.0, 2.0, 2.0);
        let vertices = pack_vertices(&geometry);
        assert_eq!(vertices.len(), 24);
        assert!(vertices.iter().all(|v| Vec3::from(v.normal).length() > 0.99));
        assert_eq!(Vec2::from(vertices[0].uv), geometry.uvs[0]);
    }

    #[test]
    fn packs_points_with_zeroed_attributes() {
        let vertices = pack_vertices(&Geometry::point_cloud(vec![Vec3::ONE, Vec3::X]));
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0; 3]);
    }

    #[test]
    fn uniform_blocks_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 48);
        assert_eq!(std::mem::size_of::<SceneUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 160);
    }

    #[test]
    fn lights_are_collected_in_order_and_capped() {
        let mut scene = SceneGraph::default();
        scene.add(Node::new(
            "hemi",
            Transform::default(),
            NodeKind::Light(Light::Hemisphere {
                sky: Color::from_hex(0xddeeff),
                ground: Color::from_hex(0x202020),
                intensity: 5.0,
            }),
        ));
        scene.add(Node::new(
            "point",
            Transform::from_position(Vec3::new(-1.0, 0.0, 25.0)),
            NodeKind::Light(Light::Point {
                color: Color::WHITE,
                intensity: 1.5,
                distance: 0.0,
            }),
        ));
        let (count, lights) = collect_lights(&scene, true);
        assert_eq!(count, 2);
        assert_eq!(lights[0].vector[3], LIGHT_HEMISPHERE);
        assert_eq!(lights[1].vector, [-1.0, 0.0, 25.0, LIGHT_POINT]);
        assert_eq!(lights[1].color[3], 1.5);

        for i in 0..MAX_LIGHTS {
            scene.add(Node::new(
                format!("extra{i}"),
                Transform::from_position(Vec3::splat(10.0)),
                NodeKind::Light(Light::Directional {
                    color: Color::WHITE,
                    intensity: 1.0,
                }),
            ));
        }
        let (count, lights) = collect_lights(&scene, true);
        assert_eq!(count as usize, MAX_LIGHTS);
        assert_eq!(lights[2].vector[3], LIGHT_DIRECTIONAL);
    }

    #[test]
    fn directional_light_points_from_its_position() {
        let light = Light::Directional {
            color: Color::WHITE,
            intensity: 5.0,
        };
        let gpu = gpu_light(&light, Mat4::from_translation(Vec3::splat(10.0)), false);
        let dir = Vec3::new(gpu.vector[0], gpu.vector[1], gpu.vector[2]);
        assert!((dir - Vec3::splat(10.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn colors_are_linearized_without_gamma_output() {
        let c = Color::from_hex(0x808080);
        assert_eq!(shader_color(c, true), c.to_array());
        assert!(shader_color(c, false)[0] < c.to_array()[0]);
    }

    #[test]
    fn object_uniforms_encode_shading_and_map() {
        let material = Material::toon(Color::from_hex(0xf8b500));
        let u = object_uniforms(Mat4::IDENTITY, &material, false, true);
        assert_eq!(u.params, [3, 0, 0, 0]);
        let u = object_uniforms(Mat4::IDENTITY, &Material::standard(Color::WHITE), true, true);
        assert_eq!(u.params, [1, 1, 0, 0]);
        assert_eq!(u.color, [1.0, 1.0, 1.0, 1.0]);
    }
}
