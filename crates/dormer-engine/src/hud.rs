//! Heads-up display: sleep and wellness bars plus the F3 debug overlay.

use dormer_gameplay::{GameState, MeterReadout, METER_MAX};
use egui::{Color32, Context, Pos2, Rect, RichText, Stroke, Ui, Vec2};
use glam::Vec3;

/// Per-frame values shown by the HUD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudData {
    /// Bar widths in logical pixels
    pub meters: MeterReadout,
    /// Smoothed frames per second
    pub fps: f32,
    /// Smoothed frame time in milliseconds
    pub frame_time_ms: f32,
    /// Eye position
    pub position: Vec3,
    /// Heading in radians
    pub yaw: f32,
    /// Pitch in radians
    pub pitch: f32,
    /// Pointer captured
    pub pointer_locked: bool,
    /// Room model has finished loading
    pub room_loaded: bool,
}

impl HudData {
    /// Collect HUD values from the game state.
    #[must_use]
    pub fn from_state(state: &GameState, fps: f32, frame_time_ms: f32) -> Self {
        Self {
            meters: state.meters.readout(),
            fps,
            frame_time_ms,
            position: state.controller.position(),
            yaw: state.controller.yaw(),
            pitch: state.controller.pitch(),
            pointer_locked: state.controller.is_locked(),
            room_loaded: state.is_room_loaded(),
        }
    }
}

/// Layout constants.
#[derive(Debug, Clone)]
pub struct HudConfig {
    /// Bar height in logical pixels.
    pub bar_height: f32,
    /// Gap between bars.
    pub bar_spacing: f32,
    /// Distance from the screen edge.
    pub padding: f32,
    /// Debug text size.
    pub debug_font_size: f32,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            bar_height: 14.0,
            bar_spacing: 6.0,
            padding: 16.0,
            debug_font_size: 14.0,
        }
    }
}

/// Gameplay HUD.
#[derive(Debug, Clone, Default)]
pub struct Hud {
    show_debug: bool,
    config: HudConfig,
}

impl Hud {
    /// Create a HUD with the debug overlay initially shown or hidden.
    #[must_use]
    pub fn new(show_debug: bool) -> Self {
        Self {
            show_debug,
            config: HudConfig::default(),
        }
    }

    /// Draw the HUD for this frame.
    pub fn render(&self, ctx: &Context, data: &HudData) {
        self.render_meters(ctx, &data.meters);
        if self.show_debug {
            self.render_debug(ctx, data);
        }
    }

    /// Bars in the top-left corner. One logical pixel per meter point.
    fn render_meters(&self, ctx: &Context, meters: &MeterReadout) {
        egui::Area::new(egui::Id::new("meters_area"))
            .fixed_pos(Pos2::new(self.config.padding, self.config.padding))
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    self.render_bar(ui, "Sleep", meters.sleep_px, sleep_color());
                    ui.add_space(self.config.bar_spacing);
                    self.render_bar(ui, "Wellness", meters.wellness_px, wellness_color(meters.wellness_px));
                });
            });
    }

    fn render_bar(&self, ui: &mut Ui, label: &str, width: f32, color: Color32) {
        ui.horizontal(|ui| {
            ui.label(RichText::new(label).color(Color32::WHITE).size(12.0));
            let (response, painter) = ui.allocate_painter(
                Vec2::new(METER_MAX, self.config.bar_height),
                egui::Sense::hover(),
            );
            let rect = response.rect;
            painter.rect_filled(rect, 2.0, Color32::from_rgb(30, 30, 30));

            let fill = Rect::from_min_size(
                rect.min,
                Vec2::new(bar_width(width), rect.height()),
            );
            painter.rect_filled(fill, 2.0, color);
            painter.rect_stroke(rect, 2.0, Stroke::new(1.0, Color32::from_rgb(60, 60, 60)));
        });
    }

    /// Debug panel in the top-right corner.
    fn render_debug(&self, ctx: &Context, data: &HudData) {
        let screen_rect = ctx.screen_rect();
        let size = self.config.debug_font_size;

        egui::Area::new(egui::Id::new("debug_overlay"))
            .fixed_pos(Pos2::new(
                screen_rect.width() - 230.0 - self.config.padding,
                self.config.padding,
            ))
            .show(ctx, |ui| {
                egui::Frame::dark_canvas(ui.style())
                    .fill(Color32::from_rgba_unmultiplied(0, 0, 0, 180))
                    .show(ui, |ui| {
                        ui.set_min_width(210.0);
                        ui.label(
                            RichText::new(format!("FPS: {:.1}", data.fps))
                                .color(fps_color(data.fps))
                                .size(size),
                        );
                        ui.label(
                            RichText::new(format!("Frame: {:.2}ms", data.frame_time_ms)).size(size),
                        );
                        ui.separator();

                        let p = data.position;
                        ui.label(
                            RichText::new(format!("Pos: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z))
                                .size(size),
                        );
                        ui.label(
                            RichText::new(format!(
                                "Yaw/Pitch: {:.0}° / {:.0}°",
                                data.yaw.to_degrees(),
                                data.pitch.to_degrees()
                            ))
                            .size(size),
                        );
                        ui.separator();

                        let lock = if data.pointer_locked { "locked" } else { "free (click to look)" };
                        ui.label(RichText::new(format!("Pointer: {lock}")).size(size));
                        if !data.room_loaded {
                            ui.label(RichText::new("Loading room...").color(Color32::YELLOW).size(size));
                        }
                    });
            });
    }

    /// Toggle debug overlay visibility.
    pub fn toggle_debug(&mut self) {
        self.show_debug = !self.show_debug;
    }

    /// Whether the debug overlay is shown.
    #[must_use]
    pub fn is_debug_visible(&self) -> bool {
        self.show_debug
    }
}

/// Fill width for a meter value, clamped to the bar.
fn bar_width(value: f32) -> f32 {
    value.clamp(0.0, METER_MAX)
}

fn sleep_color() -> Color32 {
    Color32::from_rgb(90, 110, 220)
}

/// Green while healthy, red once wellness drops below a third.
fn wellness_color(value: f32) -> Color32 {
    if value > METER_MAX / 3.0 {
        Color32::from_rgb(80, 200, 90)
    } else {
        Color32::from_rgb(220, 60, 50)
    }
}

fn fps_color(fps: f32) -> Color32 {
    if fps >= 60.0 {
        Color32::GREEN
    } else if fps >= 30.0 {
        Color32::YELLOW
    } else {
        Color32::RED
    }
}
