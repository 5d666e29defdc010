//! Application lifecycle management.
//!
//! Owns the window and renderer, feeds winit events to the input bridge and
//! runs one gameplay update plus one render per redraw.

use std::collections::HashMap;

use anyhow::Result;
use dormer_common::ModelHandle;
use dormer_gameplay::{CharacterRoster, CharacterState, GameState};
use dormer_kernel::{AssetLoader, AssetRequest, SceneRenderer};
use glam::{EulerRot, Mat4, Quat, Vec3};
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::config::EngineConfig;
use crate::hud::{Hud, HudData};
use crate::input::InputHandler;
use crate::renderer::Renderer;
use crate::timing::{FpsCounter, FrameTiming};

/// Application state.
struct DormerApp {
    /// Engine configuration
    config: EngineConfig,
    /// Renderer (initialized after window creation). Dropped before the window.
    renderer: Option<Renderer>,
    /// Window handle (created after resume)
    window: Option<Window>,

    // === Frame Systems ===
    /// Input handler
    input: InputHandler,
    /// Frame timing
    timing: FrameTiming,
    /// FPS counter for display
    fps_counter: FpsCounter,
    /// Meter bars and debug overlay
    hud: Hud,

    // === Scene ===
    /// Gameplay state (controller, meters, characters, story)
    gameplay: GameState,
    /// Background model loading
    loader: AssetLoader,
    /// Last animation generation applied to each character instance
    applied_animations: HashMap<ModelHandle, u32>,
    /// Whether the OS cursor is currently grabbed
    cursor_grabbed: bool,
}

impl DormerApp {
    fn new(config: EngineConfig) -> Self {
        let timing = FrameTiming::new(config.target_fps).with_vsync(config.vsync);
        let gameplay = GameState::new(&config.game_settings());

        Self {
            hud: Hud::new(config.show_debug_overlay),
            config,
            renderer: None,
            window: None,

            input: InputHandler::new(),
            timing,
            fps_counter: FpsCounter::new(),

            gameplay,
            loader: AssetLoader::new(),
            applied_animations: HashMap::new(),
            cursor_grabbed: false,
        }
    }

    /// Queues the room and every configured character.
    fn request_assets(&mut self) {
        self.loader
            .request(AssetRequest::Room(self.config.room_model.clone()));
        for character in &self.config.characters {
            self.loader.request(AssetRequest::Character {
                name: character.name.clone(),
                path: character.path.clone(),
            });
        }
        info!(count = self.loader.in_flight(), "Model loads queued");
    }

    /// Uploads finished models and tells gameplay about them.
    fn process_loaded_assets(&mut self) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        for loaded in self.loader.poll() {
            let data = match loaded.result {
                Ok(data) => data,
                Err(e) => {
                    self.gameplay
                        .on_asset_failed(loaded.request.path().to_path_buf(), e.to_string());
                    continue;
                },
            };

            let handle = ModelHandle::new();
            match loaded.request {
                AssetRequest::Room(path) => {
                    debug!(
                        path = %path.display(),
                        triangles = data.triangle_count(),
                        "Adding room to scene"
                    );
                    renderer.add_model(handle, data, true);
                    self.gameplay.on_room_loaded();
                },
                AssetRequest::Character { name, .. } => {
                    let clips = data.clip_names();
                    renderer.add_model(handle, data, false);
                    self.gameplay.on_character_loaded(name, handle, clips);
                },
            }
        }
    }

    /// Main update and render loop.
    fn update_and_render(&mut self) {
        let delta = self.timing.delta_time();
        let (fps, frame_time) = self.fps_counter.tick();

        if self.input.debug_toggle_pressed() {
            self.hud.toggle_debug();
            info!(
                "Debug overlay: {}",
                if self.hud.is_debug_visible() { "ON" } else { "OFF" }
            );
        }

        self.process_loaded_assets();

        if let Some(event) = self.input.story_event() {
            if !self.gameplay.trigger_story(event) {
                warn!(?event, "Story event ignored, character not loaded yet");
            }
        }

        let input = self.input.get_input();
        self.gameplay.update(delta.dt, delta.elapsed, &input);
        self.sync_cursor();

        if let Some(renderer) = &mut self.renderer {
            sync_characters(
                &self.gameplay.roster,
                renderer.scene_mut(),
                &mut self.applied_animations,
            );
            renderer.scene_mut().update_animations(delta.dt);
        }

        self.render(fps, frame_time);

        for event in self.gameplay.events.drain() {
            debug!(?event, "Game event");
        }

        self.input.end_frame();
        self.timing.sleep_remainder();
    }

    fn render(&mut self, fps: f32, frame_time: f32) {
        let data = HudData::from_state(&self.gameplay, fps, frame_time);
        let view = self.gameplay.view_matrix();
        let hud = &self.hud;

        if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
            if let Err(e) = renderer.render_with_ui(window, view, |ctx| hud.render(ctx, &data)) {
                warn!("Render error: {e:#}");
            }
        }
    }

    /// Matches the OS cursor to the controller's pointer-lock state.
    fn sync_cursor(&mut self) {
        let locked = self.gameplay.controller.is_locked();
        if locked == self.cursor_grabbed {
            return;
        }
        let Some(window) = &self.window else {
            return;
        };

        if locked {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                warn!("Failed to grab cursor: {e}");
            }
            window.set_cursor_visible(false);
        } else {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                warn!("Failed to release cursor: {e}");
            }
            window.set_cursor_visible(true);
        }
        self.cursor_grabbed = locked;
    }
}

/// World transform for a character from its position and XYZ Euler angles.
fn character_transform(position: Vec3, rotation: Vec3) -> Mat4 {
    let orientation = Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
    Mat4::from_rotation_translation(orientation, position)
}

/// What a character's mixer should do this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MixerSync<'a> {
    /// Generation unchanged, leave the mixer alone
    Keep,
    /// Restart the mixer on this clip
    Play(&'a str),
    /// Stop the mixer
    Stop,
}

/// Scene instance values derived from one roster entry.
#[derive(Debug, Clone, Copy, PartialEq)]
struct InstanceSync<'a> {
    visible: bool,
    transform: Mat4,
    mixer: MixerSync<'a>,
}

/// Works out the instance update for a character given the generation last
/// applied to its mixer (`None` before the first sync).
fn instance_sync(state: &CharacterState, applied: Option<u32>) -> InstanceSync<'_> {
    let mixer = if applied == Some(state.animation_generation) {
        MixerSync::Keep
    } else {
        match &state.current_animation {
            Some(clip) => MixerSync::Play(clip),
            None => MixerSync::Stop,
        }
    };
    InstanceSync {
        visible: state.visible,
        transform: character_transform(state.position, state.rotation),
        mixer,
    }
}

/// Copies roster state onto scene instances.
fn sync_characters(
    roster: &CharacterRoster,
    scene: &mut SceneRenderer,
    applied: &mut HashMap<ModelHandle, u32>,
) {
    for (name, character) in roster.iter() {
        let Some(instance) = scene.instance_mut(character.model) else {
            continue;
        };
        let sync = instance_sync(&character.state, applied.get(&character.model).copied());
        instance.visible = sync.visible;
        instance.transform = sync.transform;

        match sync.mixer {
            MixerSync::Keep => continue,
            MixerSync::Play(clip) => {
                debug!(%name, clip, "Starting animation");
                instance.mixer.play(clip);
            },
            MixerSync::Stop => instance.mixer.stop(),
        }
        applied.insert(character.model, character.state.animation_generation);
    }
}

impl ApplicationHandler for DormerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        info!("Application resumed, creating window...");

        let window_attrs = Window::default_attributes()
            .with_title("Dormer")
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => window,
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            },
        };
        info!("Window created successfully");

        let renderer = pollster::block_on(Renderer::new(
            &window,
            self.config.vsync,
            self.config.fov_degrees,
            self.config.gpu_validation,
        ));
        match renderer {
            Ok(renderer) => {
                self.renderer = Some(renderer);
            },
            Err(e) => {
                error!("Failed to initialize renderer: {e:#}");
                event_loop.exit();
                return;
            },
        }

        window.request_redraw();
        self.window = Some(window);
        self.request_assets();
        self.timing.reset();

        info!(
            "Dormer ready - {}x{}, click the scene to look around",
            self.config.window_width, self.config.window_height
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let ui_consumed = match (&mut self.renderer, &self.window) {
            (Some(renderer), Some(window)) => renderer.handle_ui_event(window, &event),
            _ => false,
        };
        if !ui_consumed {
            self.input.handle_event(&event);
        }

        match event {
            WindowEvent::CloseRequested => {
                let frames = self.renderer.as_ref().map_or(0, Renderer::frame_count);
                info!(
                    frames,
                    avg_fps = self.timing.current_fps(),
                    "Close requested, shutting down..."
                );
                event_loop.exit();
            },
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size);
                }
            },
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if !ui_consumed => {
                self.gameplay.on_click();
                self.sync_cursor();
            },
            WindowEvent::Focused(false) => {
                self.gameplay.release_pointer();
                self.sync_cursor();
            },
            WindowEvent::Focused(true) => {
                self.timing.reset();
            },
            WindowEvent::RedrawRequested => {
                self.update_and_render();

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            },
            _ => {},
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.cursor_grabbed {
                self.input.handle_mouse_motion(dx, dy);
            }
        }
    }
}

/// Runs the main application loop.
pub fn run(config: EngineConfig) -> Result<()> {
    info!("Configuration loaded:");
    info!("  Window: {}x{}", config.window_width, config.window_height);
    info!("  VSync: {}", config.vsync);
    info!("  Room: {}", config.room_model.display());
    info!("  Characters: {}", config.characters.len());

    info!("Creating event loop...");
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DormerApp::new(config);

    info!("Starting event loop...");
    event_loop.run_app(&mut app)?;

    Ok(())
}
