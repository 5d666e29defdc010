//! GPU renderer using wgpu.
//!
//! Draws the room and characters through [`SceneRenderer`], then the egui
//! HUD in a second pass on top.

#![allow(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use dormer_common::ModelHandle;
use dormer_kernel::{ModelData, PerspectiveCamera, SceneRenderer};
use glam::Mat4;
use tracing::{info, warn};
use winit::{dpi::PhysicalSize, window::Window};

use crate::ui::EguiIntegration;

/// Surface, device and the passes drawn each frame.
pub struct Renderer {
    /// wgpu surface for presenting to the window
    surface: wgpu::Surface<'static>,
    /// wgpu device for GPU operations
    device: wgpu::Device,
    /// wgpu queue for submitting commands
    queue: wgpu::Queue,
    /// Surface configuration
    config: wgpu::SurfaceConfiguration,
    /// Projection parameters
    camera: PerspectiveCamera,
    /// Room and characters
    scene: SceneRenderer,
    /// HUD overlay
    egui: EguiIntegration,
    /// Frames presented so far
    frame_count: u64,
}

impl Renderer {
    /// Creates a new renderer for the given window.
    ///
    /// The window must outlive the renderer.
    pub async fn new(window: &Window, vsync: bool, fov_degrees: f32, validation: bool) -> Result<Self> {
        let size = window.inner_size();

        let flags = if validation {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::default()
        };
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            dx12_shader_compiler: wgpu::Dx12Compiler::Fxc,
            flags,
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        // SAFETY: The app drops the renderer before the window it was created from
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::from_window(window)?)?
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find a suitable GPU adapter")?;

        info!("Using GPU adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Dormer Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .context("Failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("Surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut camera = PerspectiveCamera::new(config.width, config.height);
        camera.fov_y = fov_degrees;

        info!("Initializing scene pipeline...");
        let scene = SceneRenderer::new(&device, surface_format, config.width, config.height);
        let egui = EguiIntegration::new(&device, surface_format, window);

        info!(format = ?surface_format, "Renderer initialized successfully");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            camera,
            scene,
            egui,
            frame_count: 0,
        })
    }

    /// Resizes the surface, depth buffer and projection.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.scene
                .resize(&self.device, new_size.width, new_size.height);
            self.camera.set_viewport(new_size.width, new_size.height);
        }
    }

    /// Uploads a loaded model. The room is added visible, characters hidden.
    pub fn add_model(&mut self, handle: ModelHandle, data: Arc<ModelData>, visible: bool) {
        self.scene.add_model(&self.device, handle, data, visible);
    }

    /// Scene access for syncing instances.
    pub fn scene_mut(&mut self) -> &mut SceneRenderer {
        &mut self.scene
    }

    /// Forward a window event to egui. Returns true if egui consumed it.
    pub fn handle_ui_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.egui.handle_event(window, event)
    }

    /// Renders the scene from `view`, then the UI built by `build_ui`.
    pub fn render_with_ui(
        &mut self,
        window: &Window,
        view: Mat4,
        build_ui: impl FnOnce(&egui::Context),
    ) -> Result<()> {
        self.egui.begin_frame(window);
        build_ui(self.egui.context());
        let ui_output = self.egui.end_frame(window);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            },
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Surface timed out, skipping frame");
                return Ok(());
            },
            Err(e) => return Err(e).context("Failed to get surface texture"),
        };

        let view_target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.scene
            .prepare(&self.queue, self.camera.as_uniform(view));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let prepared_ui = self.egui.prepare(
            &self.device,
            &self.queue,
            &mut encoder,
            [self.config.width, self.config.height],
            ui_output,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view_target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.scene.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.scene.render(&mut render_pass);
        }

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("HUD Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view_target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.egui.render(&mut render_pass, &prepared_ui);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        window.pre_present_notify();
        output.present();

        self.frame_count += 1;

        Ok(())
    }

    /// Returns the current frame count.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
