//! Lit mesh rendering for the room and characters.
//!
//! Models are uploaded once and drawn per node with a per-draw model matrix
//! taken from a dynamic-offset uniform buffer. Shading is Lambert diffuse
//! from one directional light plus a flat ambient term.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use dormer_common::ModelHandle;
use glam::{Mat4, Vec3};
use tracing::{debug, info, warn};
use wgpu::{util::DeviceExt, Device, Queue};

use crate::anim::AnimationMixer;
use crate::assets::{MeshVertex, ModelData};
use crate::camera::CameraUniform;

/// Depth buffer format.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Maximum mesh draws per frame.
pub const MAX_DRAWS: usize = 4096;

/// Ambient light colour (0x404040).
pub const AMBIENT_COLOR: Vec3 = Vec3::splat(64.0 / 255.0);

/// Directional light colour.
pub const SUN_COLOR: Vec3 = Vec3::ONE;

/// Directional light intensity.
pub const SUN_INTENSITY: f32 = 1.0;

/// Directional light position; it shines toward the origin.
pub const SUN_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);

/// Scene shader: Lambert diffuse with ambient.
pub const SCENE_SHADER: &str = r"
struct Globals {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
};

struct Model {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> globals: Globals;
@group(1) @binding(0) var<uniform> model: Model;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = model.model * vec4<f32>(in.position, 1.0);
    out.clip_position = globals.view_proj * world;
    out.normal = (model.normal * vec4<f32>(in.normal, 0.0)).xyz;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let diffuse = max(dot(n, globals.light_dir.xyz), 0.0);
    let light = globals.ambient.rgb + globals.light_color.rgb * diffuse;
    return vec4<f32>(in.color.rgb * light, in.color.a);
}
";

/// Per-frame scene constants.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct GlobalsUniform {
    /// Camera data
    pub camera: CameraUniform,
    /// Unit vector toward the light (w unused)
    pub light_dir: [f32; 4],
    /// Light colour times intensity (w unused)
    pub light_color: [f32; 4],
    /// Ambient colour (w unused)
    pub ambient: [f32; 4],
}

impl GlobalsUniform {
    /// Builds scene constants with the default lighting.
    #[must_use]
    pub fn new(camera: CameraUniform) -> Self {
        Self {
            camera,
            light_dir: SUN_POSITION.normalize().extend(0.0).to_array(),
            light_color: (SUN_COLOR * SUN_INTENSITY).extend(1.0).to_array(),
            ambient: AMBIENT_COLOR.extend(1.0).to_array(),
        }
    }
}

/// Per-draw transforms.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct ModelUniform {
    /// Object-to-world matrix
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model` for normals
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    /// Builds the uniform for a world matrix.
    #[must_use]
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
        }
    }
}

/// Rounds `size` up to a multiple of `alignment`.
#[must_use]
pub const fn align_to(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

/// Vertex and index buffers of one mesh.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// A model placed in the scene.
pub struct ModelInstance {
    /// CPU-side model used for posing
    pub data: Arc<ModelData>,
    /// Placement in the world
    pub transform: Mat4,
    /// Hidden instances are not drawn
    pub visible: bool,
    /// Clip playback
    pub mixer: AnimationMixer,
    /// Uploaded meshes, indexed like `data.meshes`
    meshes: Vec<Option<GpuMesh>>,
}

impl std::fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInstance")
            .field("transform", &self.transform)
            .field("visible", &self.visible)
            .field("mixer", &self.mixer)
            .field("meshes", &self.meshes.len())
            .finish()
    }
}

/// One queued draw: which mesh and where its uniform lives.
#[derive(Debug, Clone, Copy)]
struct DrawCall {
    handle: ModelHandle,
    mesh: usize,
    offset: u32,
}

/// Draws every visible model instance.
pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_stride: u64,
    depth_view: wgpu::TextureView,
    instances: HashMap<ModelHandle, ModelInstance>,
    draws: Vec<DrawCall>,
}

impl SceneRenderer {
    /// Creates the pipeline and a depth buffer for the given size.
    #[must_use]
    pub fn new(device: &Device, surface_format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        info!("Creating scene renderer");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Globals Layout"),
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

        let model_size = std::mem::size_of::<ModelUniform>() as u64;
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Model Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(model_size),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&globals_layout, &model_layout],
            push_constant_ranges: &[],
        });

        let vertex_attributes = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x4,
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &vertex_attributes,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
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
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let globals = GlobalsUniform::new(CameraUniform::default());
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Globals Buffer"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let model_stride = align_to(model_size, alignment);
        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Model Buffer"),
            size: model_stride * MAX_DRAWS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Model Bind Group"),
            layout: &model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &model_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(model_size),
                }),
            }],
        });

        let depth_view = create_depth_view(device, width, height);

        Self {
            pipeline,
            globals_buffer,
            globals_bind_group,
            model_buffer,
            model_bind_group,
            model_stride,
            depth_view,
            instances: HashMap::new(),
            draws: Vec::new(),
        }
    }

    /// Recreates the depth buffer after a window resize.
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.depth_view = create_depth_view(device, width, height);
    }

    /// Depth attachment for the scene pass.
    #[must_use]
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Uploads a model and adds it to the scene.
    pub fn add_model(
        &mut self,
        device: &Device,
        handle: ModelHandle,
        data: Arc<ModelData>,
        visible: bool,
    ) {
        let meshes = data
            .meshes
            .iter()
            .enumerate()
            .map(|(index, mesh)| {
                if mesh.indices.is_empty() {
                    return None;
                }
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Vertex Buffer"),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Index Buffer"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                debug!(index, triangles = mesh.indices.len() / 3, "Uploaded mesh");
                Some(GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                })
            })
            .collect();

        self.instances.insert(
            handle,
            ModelInstance {
                data,
                transform: Mat4::IDENTITY,
                visible,
                mixer: AnimationMixer::new(),
                meshes,
            },
        );
    }

    /// Looks up an instance for updating.
    pub fn instance_mut(&mut self, handle: ModelHandle) -> Option<&mut ModelInstance> {
        self.instances.get_mut(&handle)
    }

    /// Looks up an instance.
    #[must_use]
    pub fn instance(&self, handle: ModelHandle) -> Option<&ModelInstance> {
        self.instances.get(&handle)
    }

    /// Number of models in the scene.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Advances every instance's animation mixer.
    pub fn update_animations(&mut self, dt: f32) {
        for instance in self.instances.values_mut() {
            instance.mixer.update(dt);
        }
    }

    /// Writes per-frame uniforms and builds the draw list.
    pub fn prepare(&mut self, queue: &Queue, camera: CameraUniform) {
        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&GlobalsUniform::new(camera)),
        );

        self.draws.clear();
        let stride = self.model_stride as usize;
        let mut staging: Vec<u8> = Vec::new();

        'instances: for (&handle, instance) in &self.instances {
            if !instance.visible {
                continue;
            }
            let pose = instance.mixer.pose(&instance.data);
            for (node_index, node) in instance.data.nodes.iter().enumerate() {
                let Some(mesh) = node.mesh else {
                    continue;
                };
                if !matches!(instance.meshes.get(mesh), Some(Some(_))) {
                    continue;
                }
                if self.draws.len() >= MAX_DRAWS {
                    warn!(max = MAX_DRAWS, "Draw limit reached, skipping remaining meshes");
                    break 'instances;
                }

                let world = instance.transform * pose.get(node_index).copied().unwrap_or(Mat4::IDENTITY);
                let offset = staging.len();
                staging.extend_from_slice(bytemuck::bytes_of(&ModelUniform::new(world)));
                staging.resize(offset + stride, 0);

                self.draws.push(DrawCall {
                    handle,
                    mesh,
                    offset: offset as u32,
                });
            }
        }

        if !staging.is_empty() {
            queue.write_buffer(&self.model_buffer, 0, &staging);
        }
    }

    /// Records draws into a pass that uses [`Self::depth_view`] for depth.
    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.globals_bind_group, &[]);

        for draw in &self.draws {
            let Some(Some(mesh)) = self
                .instances
                .get(&draw.handle)
                .and_then(|i| i.meshes.get(draw.mesh))
            else {
                continue;
            };
            render_pass.set_bind_group(1, &self.model_bind_group, &[draw.offset]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    /// Number of draws queued by the last [`Self::prepare`].
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }
}

fn create_depth_view(device: &Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
