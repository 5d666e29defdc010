//! Egui glue for the HUD.
//!
//! Owns the egui context, the winit input state and the wgpu renderer. The
//! frame is split into `begin_frame`/`end_frame` around HUD code, then
//! `prepare` before the overlay pass and `render` inside it.

use egui::{Context, FullOutput, ViewportId};
use winit::window::Window;

/// Egui integration for wgpu and winit.
pub struct EguiIntegration {
    context: Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl std::fmt::Debug for EguiIntegration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EguiIntegration")
            .field("pixels_per_point", &self.context.pixels_per_point())
            .finish_non_exhaustive()
    }
}

/// Tessellated HUD ready for the overlay pass.
pub struct PreparedUi {
    /// Paint jobs for this frame
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    /// Target size and scale
    pub screen: egui_wgpu::ScreenDescriptor,
}

impl std::fmt::Debug for PreparedUi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedUi")
            .field("paint_jobs", &self.paint_jobs.len())
            .field("size_in_pixels", &self.screen.size_in_pixels)
            .field("pixels_per_point", &self.screen.pixels_per_point)
            .finish()
    }
}

impl EguiIntegration {
    /// Create the integration for a window rendering into `output_format`.
    #[must_use]
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, window: &Window) -> Self {
        let context = Context::default();
        let scale = window.scale_factor() as f32;
        context.set_pixels_per_point(scale);

        let state = egui_winit::State::new(
            context.clone(),
            ViewportId::ROOT,
            window,
            Some(scale),
            None,
            None,
        );

        // The overlay pass has no depth attachment and no MSAA.
        let renderer = egui_wgpu::Renderer::new(device, output_format, None, 1, false);

        Self {
            context,
            state,
            renderer,
        }
    }

    /// Forward a window event. Returns true if egui wants it exclusively.
    pub fn handle_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Begin a new frame. Call before any HUD code.
    pub fn begin_frame(&mut self, window: &Window) {
        let raw_input = self.state.take_egui_input(window);
        self.context.begin_pass(raw_input);
    }

    /// End the frame and apply platform output (cursor icon, clipboard).
    pub fn end_frame(&mut self, window: &Window) -> FullOutput {
        let output = self.context.end_pass();
        self.state
            .handle_platform_output(window, output.platform_output.clone());
        output
    }

    /// Upload textures and vertex buffers for `output`.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        size_in_pixels: [u32; 2],
        output: FullOutput,
    ) -> PreparedUi {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: output.pixels_per_point,
        };

        for (id, image_delta) in &output.textures_delta.set {
            self.renderer
                .update_texture(device, queue, *id, image_delta);
        }

        let paint_jobs = self
            .context
            .tessellate(output.shapes, output.pixels_per_point);

        self.renderer
            .update_buffers(device, queue, encoder, &paint_jobs, &screen);

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }

        PreparedUi { paint_jobs, screen }
    }

    /// Draw prepared paint jobs. The pass must outlive its encoder borrow,
    /// so callers pass `render_pass.forget_lifetime()`.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'static>, prepared: &PreparedUi) {
        self.renderer
            .render(render_pass, &prepared.paint_jobs, &prepared.screen);
    }

    /// The egui context for HUD code.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }
}
