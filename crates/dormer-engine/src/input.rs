//! Input handling for the engine.
//!
//! Bridges winit window and device events to the gameplay input system.
//! Function keys are engine hooks and never reach gameplay bindings.

use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use dormer_gameplay::input::{Input, InputManager, KeyCode, MouseButton};
use dormer_gameplay::story::StoryEvent;

/// Maps the physical keys the scene binds. Everything else is ignored.
fn convert_key(key: WinitKeyCode) -> Option<KeyCode> {
    Some(match key {
        WinitKeyCode::KeyW => KeyCode::W,
        WinitKeyCode::KeyA => KeyCode::A,
        WinitKeyCode::KeyS => KeyCode::S,
        WinitKeyCode::KeyD => KeyCode::D,
        WinitKeyCode::KeyE => KeyCode::E,
        WinitKeyCode::Space => KeyCode::Space,
        WinitKeyCode::Escape => KeyCode::Escape,
        WinitKeyCode::ArrowUp => KeyCode::Up,
        WinitKeyCode::ArrowDown => KeyCode::Down,
        WinitKeyCode::ArrowLeft => KeyCode::Left,
        WinitKeyCode::ArrowRight => KeyCode::Right,
        _ => return None,
    })
}

fn convert_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::Left),
        WinitMouseButton::Right => Some(MouseButton::Right),
        _ => None,
    }
}

/// Maps story hotkeys to events.
fn story_hotkey(key: WinitKeyCode) -> Option<StoryEvent> {
    match key {
        WinitKeyCode::F1 => Some(StoryEvent::ShowCharacter1),
        WinitKeyCode::F2 => Some(StoryEvent::HideCharacter1),
        _ => None,
    }
}

/// Handles input from winit and provides processed input for gameplay.
#[derive(Debug, Default)]
pub struct InputHandler {
    /// The underlying input manager from gameplay crate
    manager: InputManager,
    /// Whether F3 (debug overlay) was just pressed
    debug_toggle_pressed: bool,
    /// Story event requested by hotkey this frame
    story_event: Option<StoryEvent>,
}

impl InputHandler {
    /// Create a new input handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a winit window event. Returns true if the event was handled.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(winit_key) = event.physical_key else {
                    return false;
                };
                self.handle_key(winit_key, event.state == ElementState::Pressed, event.repeat)
            },
            WindowEvent::MouseInput { state, button, .. } => {
                let is_pressed = *state == ElementState::Pressed;
                if let Some(btn) = convert_mouse_button(*button) {
                    self.manager.update_mouse_button(btn, is_pressed);
                }
                true
            },
            WindowEvent::Focused(false) => {
                self.manager.release_all();
                true
            },
            _ => false,
        }
    }

    fn handle_key(&mut self, winit_key: WinitKeyCode, is_pressed: bool, repeat: bool) -> bool {
        let fresh_press = is_pressed && !repeat;

        if winit_key == WinitKeyCode::F3 {
            self.debug_toggle_pressed |= fresh_press;
            return true;
        }
        if let Some(story) = story_hotkey(winit_key) {
            if fresh_press {
                self.story_event = Some(story);
            }
            return true;
        }

        let Some(key) = convert_key(winit_key) else {
            return false;
        };
        // Auto-repeats count as presses, like a browser keydown.
        if repeat && is_pressed {
            self.manager.repeat_key(key);
        } else {
            self.manager.update_key(key, is_pressed);
        }
        true
    }

    /// Feed raw mouse motion from `DeviceEvent::MouseMotion`.
    pub fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.manager.accumulate_mouse_delta(dx as f32, dy as f32);
    }

    /// Get the processed input state for gameplay.
    #[must_use]
    pub fn get_input(&self) -> Input {
        self.manager.process()
    }

    /// Check if debug overlay was toggled (F3).
    #[must_use]
    pub fn debug_toggle_pressed(&self) -> bool {
        self.debug_toggle_pressed
    }

    /// Story event requested by F1/F2 this frame.
    #[must_use]
    pub fn story_event(&self) -> Option<StoryEvent> {
        self.story_event
    }

    /// Reset per-frame state. Call at the end of each frame.
    pub fn end_frame(&mut self) {
        self.manager.end_frame();
        self.debug_toggle_pressed = false;
        self.story_event = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_input_handler_creation() {
        let handler = InputHandler::new();
        assert!(!handler.debug_toggle_pressed());
        assert!(handler.story_event().is_none());
        assert!(!handler.get_input().has_movement());
    }

    #[test]
    fn test_key_conversion() {
        assert_eq!(convert_key(WinitKeyCode::KeyW), Some(KeyCode::W));
        assert_eq!(convert_key(WinitKeyCode::Space), Some(KeyCode::Space));
        assert_eq!(convert_key(WinitKeyCode::ArrowUp), Some(KeyCode::Up));
        assert_eq!(convert_key(WinitKeyCode::Escape), Some(KeyCode::Escape));
        assert_eq!(convert_key(WinitKeyCode::F1), None);
        assert_eq!(convert_key(WinitKeyCode::KeyQ), None);
    }

    #[test]
    fn test_mouse_button_conversion() {
        assert_eq!(
            convert_mouse_button(WinitMouseButton::Left),
            Some(MouseButton::Left)
        );
        assert_eq!(
            convert_mouse_button(WinitMouseButton::Right),
            Some(MouseButton::Right)
        );
        assert_eq!(convert_mouse_button(WinitMouseButton::Middle), None);
    }

    #[test]
    fn test_story_hotkeys() {
        assert_eq!(story_hotkey(WinitKeyCode::F1), Some(StoryEvent::ShowCharacter1));
        assert_eq!(story_hotkey(WinitKeyCode::F2), Some(StoryEvent::HideCharacter1));
        assert_eq!(story_hotkey(WinitKeyCode::F3), None);
    }

    #[test]
    fn test_mouse_motion_accumulates_until_end_frame() {
        let mut handler = InputHandler::new();
        handler.handle_mouse_motion(3.0, -2.0);
        handler.handle_mouse_motion(1.0, 1.0);
        assert_eq!(handler.get_input().look_delta, Vec2::new(4.0, -1.0));

        handler.end_frame();
        assert_eq!(handler.get_input().look_delta, Vec2::ZERO);
    }

    #[test]
    fn test_end_frame_clears_state() {
        let mut handler = InputHandler::new();
        handler.debug_toggle_pressed = true;
        handler.story_event = Some(StoryEvent::HideCharacter1);

        handler.end_frame();

        assert!(!handler.debug_toggle_pressed());
        assert!(handler.story_event().is_none());
    }

    #[test]
    fn test_space_repeats_reach_gameplay() {
        let mut handler = InputHandler::new();
        assert!(handler.handle_key(WinitKeyCode::Space, true, false));
        handler.end_frame();

        handler.handle_key(WinitKeyCode::Space, true, true);
        handler.handle_key(WinitKeyCode::Space, true, true);
        assert_eq!(handler.get_input().exert_presses, 2);

        handler.handle_key(WinitKeyCode::Space, false, false);
        handler.end_frame();
        handler.handle_key(WinitKeyCode::Space, true, true);
        assert_eq!(handler.get_input().exert_presses, 0);
    }

    #[test]
    fn test_hotkeys_ignore_repeats() {
        let mut handler = InputHandler::new();
        assert!(handler.handle_key(WinitKeyCode::F1, true, true));
        assert!(handler.handle_key(WinitKeyCode::F3, true, true));
        assert!(handler.story_event().is_none());
        assert!(!handler.debug_toggle_pressed());

        handler.handle_key(WinitKeyCode::F2, true, false);
        assert_eq!(handler.story_event(), Some(StoryEvent::HideCharacter1));
        assert!(!handler.handle_key(WinitKeyCode::KeyQ, true, false));
    }

    #[test]
    fn test_focus_loss_releases_keys() {
        let mut handler = InputHandler::new();
        handler.manager.update_key(KeyCode::W, true);
        assert!(handler.get_input().forward);

        handler.handle_event(&WindowEvent::Focused(false));
        assert!(!handler.get_input().forward);
    }
}
