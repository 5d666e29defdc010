//! Keyboard and mouse state for the first-person controls.
//!
//! Raw key and button events are folded into per-frame [`KeyState`]s, looked
//! up through rebindable [`Action`] bindings and handed to gameplay as one
//! [`Input`] snapshot. Mouse motion is accumulated as a raw delta so
//! pointer-lock look works without a visible cursor.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur in the input system.
#[derive(Debug, Clone, Error)]
pub enum InputError {
    /// Key already bound to another action
    #[error("key {key:?} already bound to action: {action:?}")]
    KeyAlreadyBound {
        /// The key that's already bound
        key: KeyCode,
        /// The action it's bound to
        action: Action,
    },
}

/// Keys the scene can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// E key, free for rebinding
    E,
    /// Space bar
    Space,
    /// Escape
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
}

/// Per-frame state of one key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    /// Currently held down
    pub held: bool,
    /// Press events this frame, counting OS auto-repeats
    pub presses: u32,
    /// Let go this frame
    pub released: bool,
}

impl KeyState {
    /// Records a physical down or up transition.
    pub fn set_held(&mut self, held: bool) {
        if held && !self.held {
            self.presses += 1;
        }
        self.released |= !held && self.held;
        self.held = held;
    }

    /// Records an auto-repeat of a key that is still held.
    pub fn repeat(&mut self) {
        if self.held {
            self.presses += 1;
        }
    }

    /// Returns true if the key went down at least once this frame.
    #[must_use]
    pub const fn pressed_this_frame(&self) -> bool {
        self.presses > 0
    }

    /// Drops the per-frame counters.
    pub fn clear_frame(&mut self) {
        self.presses = 0;
        self.released = false;
    }
}

/// Game actions that can be bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Walk forward (W / Up arrow by default)
    MoveForward,
    /// Walk backward (S / Down arrow by default)
    MoveBackward,
    /// Strafe left (A / Left arrow by default)
    MoveLeft,
    /// Strafe right (D / Right arrow by default)
    MoveRight,
    /// Drain wellness (Space by default)
    Exert,
    /// Release the pointer lock (Escape by default)
    ReleasePointer,
}

impl Action {
    /// All bindable actions.
    pub const ALL: [Self; 6] = [
        Self::MoveForward,
        Self::MoveBackward,
        Self::MoveLeft,
        Self::MoveRight,
        Self::Exert,
        Self::ReleasePointer,
    ];

    /// Built-in binding for this action.
    #[must_use]
    pub const fn default_binding(self) -> KeyBinding {
        match self {
            Self::MoveForward => KeyBinding::with_secondary(KeyCode::W, KeyCode::Up),
            Self::MoveBackward => KeyBinding::with_secondary(KeyCode::S, KeyCode::Down),
            Self::MoveLeft => KeyBinding::with_secondary(KeyCode::A, KeyCode::Left),
            Self::MoveRight => KeyBinding::with_secondary(KeyCode::D, KeyCode::Right),
            Self::Exert => KeyBinding::new(KeyCode::Space),
            Self::ReleasePointer => KeyBinding::new(KeyCode::Escape),
        }
    }
}

/// One frame of input, ready for gameplay.
#[derive(Debug, Clone, Default)]
pub struct Input {
    /// Forward key held
    pub forward: bool,
    /// Backward key held
    pub backward: bool,
    /// Strafe-left key held
    pub left: bool,
    /// Strafe-right key held
    pub right: bool,
    /// Exert presses this frame, including key repeats
    pub exert_presses: u32,
    /// Release-pointer was pressed this frame
    pub release_pointer_just_pressed: bool,
    /// Left click this frame
    pub primary_just_pressed: bool,
    /// Raw mouse motion since the last frame, in pixels
    pub look_delta: Vec2,
}

impl Input {
    /// Returns true if any movement key is held.
    #[must_use]
    pub fn has_movement(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Returns true if the mouse moved this frame.
    #[must_use]
    pub fn has_look(&self) -> bool {
        self.look_delta != Vec2::ZERO
    }
}

/// Keys bound to one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// Primary key for this action
    pub primary: KeyCode,
    /// Optional secondary key
    pub secondary: Option<KeyCode>,
}

impl KeyBinding {
    /// A binding with a single key.
    #[must_use]
    pub const fn new(primary: KeyCode) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    /// A binding with two keys.
    #[must_use]
    pub const fn with_secondary(primary: KeyCode, secondary: KeyCode) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    /// Returns true if `key` triggers this binding.
    #[must_use]
    pub fn matches(&self, key: KeyCode) -> bool {
        self.primary == key || self.secondary == Some(key)
    }

    fn keys(&self) -> impl Iterator<Item = KeyCode> {
        std::iter::once(self.primary).chain(self.secondary)
    }
}

/// Tracks raw key, button and mouse state and resolves it through bindings.
#[derive(Debug)]
pub struct InputManager {
    keys: HashMap<KeyCode, KeyState>,
    buttons: HashMap<MouseButton, KeyState>,
    bindings: HashMap<Action, KeyBinding>,
    look_delta: Vec2,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    /// Creates a manager with the default bindings.
    #[must_use]
    pub fn new() -> Self {
        let mut manager = Self {
            keys: HashMap::new(),
            buttons: HashMap::new(),
            bindings: HashMap::new(),
            look_delta: Vec2::ZERO,
        };
        manager.set_default_bindings();
        manager
    }

    /// Restores WASD plus arrows, Space and Escape.
    pub fn set_default_bindings(&mut self) {
        self.bindings = Action::ALL
            .into_iter()
            .map(|action| (action, action.default_binding()))
            .collect();
    }

    /// Binds an action, replacing its previous keys.
    pub fn rebind(&mut self, action: Action, binding: KeyBinding) {
        self.bindings.insert(action, binding);
    }

    /// Binds an action, refusing keys already used by another action.
    pub fn try_rebind(&mut self, action: Action, binding: KeyBinding) -> Result<(), InputError> {
        let clash = self
            .bindings
            .iter()
            .filter(|(other, _)| **other != action)
            .find_map(|(other, existing)| {
                binding
                    .keys()
                    .find(|key| existing.matches(*key))
                    .map(|key| (key, *other))
            });
        if let Some((key, bound_to)) = clash {
            return Err(InputError::KeyAlreadyBound {
                key,
                action: bound_to,
            });
        }
        self.rebind(action, binding);
        Ok(())
    }

    /// Current binding of an action.
    #[must_use]
    pub fn get_binding(&self, action: Action) -> Option<&KeyBinding> {
        self.bindings.get(&action)
    }

    /// Records a key going down or up.
    pub fn update_key(&mut self, key: KeyCode, is_pressed: bool) {
        self.keys.entry(key).or_default().set_held(is_pressed);
    }

    /// Records an OS auto-repeat of a held key.
    pub fn repeat_key(&mut self, key: KeyCode) {
        if let Some(state) = self.keys.get_mut(&key) {
            state.repeat();
        }
    }

    /// Records a mouse button going down or up.
    pub fn update_mouse_button(&mut self, button: MouseButton, is_pressed: bool) {
        self.buttons.entry(button).or_default().set_held(is_pressed);
    }

    /// Adds raw mouse motion (pixels) to this frame's look delta.
    pub fn accumulate_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.look_delta += Vec2::new(dx, dy);
    }

    /// Lets go of every key and button (the window lost focus).
    pub fn release_all(&mut self) {
        for state in self.keys.values_mut().chain(self.buttons.values_mut()) {
            state.set_held(false);
        }
        self.look_delta = Vec2::ZERO;
    }

    /// Clears per-frame state. Call at the end of each frame.
    pub fn end_frame(&mut self) {
        for state in self.keys.values_mut().chain(self.buttons.values_mut()) {
            state.clear_frame();
        }
        self.look_delta = Vec2::ZERO;
    }

    /// Returns true while the key is held.
    #[must_use]
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.get(&key).is_some_and(|state| state.held)
    }

    /// Returns true while any key bound to the action is held.
    #[must_use]
    pub fn is_action_pressed(&self, action: Action) -> bool {
        self.bindings
            .get(&action)
            .is_some_and(|binding| binding.keys().any(|key| self.is_key_pressed(key)))
    }

    /// Press events for the action this frame, summed over its keys.
    #[must_use]
    pub fn action_presses(&self, action: Action) -> u32 {
        self.bindings.get(&action).map_or(0, |binding| {
            binding
                .keys()
                .filter_map(|key| self.keys.get(&key))
                .map(|state| state.presses)
                .sum()
        })
    }

    /// Returns true if the action was pressed this frame.
    #[must_use]
    pub fn is_action_just_pressed(&self, action: Action) -> bool {
        self.action_presses(action) > 0
    }

    /// Returns true if the button went down this frame.
    #[must_use]
    pub fn is_mouse_just_pressed(&self, button: MouseButton) -> bool {
        self.buttons
            .get(&button)
            .is_some_and(KeyState::pressed_this_frame)
    }

    /// Snapshot for this frame's gameplay update.
    #[must_use]
    pub fn process(&self) -> Input {
        Input {
            forward: self.is_action_pressed(Action::MoveForward),
            backward: self.is_action_pressed(Action::MoveBackward),
            left: self.is_action_pressed(Action::MoveLeft),
            right: self.is_action_pressed(Action::MoveRight),
            exert_presses: self.action_presses(Action::Exert),
            release_pointer_just_pressed: self.is_action_just_pressed(Action::ReleasePointer),
            primary_just_pressed: self.is_mouse_just_pressed(MouseButton::Left),
            look_delta: self.look_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state_transitions() {
        let mut state = KeyState::default();

        state.set_held(true);
        assert!(state.held);
        assert_eq!(state.presses, 1);

        state.clear_frame();
        state.set_held(true);
        assert_eq!(state.presses, 0);

        state.set_held(false);
        assert!(!state.held);
        assert!(state.released);
    }

    #[test]
    fn test_repeat_counts_only_while_held() {
        let mut state = KeyState::default();
        state.repeat();
        assert_eq!(state.presses, 0);

        state.set_held(true);
        state.repeat();
        state.repeat();
        assert_eq!(state.presses, 3);
    }

    #[test]
    fn test_default_bindings() {
        let manager = InputManager::new();
        for action in Action::ALL {
            assert_eq!(
                manager.get_binding(action),
                Some(&action.default_binding()),
                "{action:?} unbound"
            );
        }
        assert_eq!(
            manager.get_binding(Action::MoveForward).map(|b| b.primary),
            Some(KeyCode::W)
        );
    }

    #[test]
    fn test_arrow_keys_move() {
        let mut manager = InputManager::new();

        manager.update_key(KeyCode::Up, true);
        manager.update_key(KeyCode::Right, true);
        let input = manager.process();

        assert!(input.forward);
        assert!(input.right);
        assert!(!input.backward);
        assert!(!input.left);
    }

    #[test]
    fn test_keyup_clears_flag() {
        let mut manager = InputManager::new();

        manager.update_key(KeyCode::S, true);
        assert!(manager.process().backward);

        manager.end_frame();
        manager.update_key(KeyCode::S, false);
        assert!(!manager.process().backward);
    }

    #[test]
    fn test_held_space_counts_repeats() {
        let mut manager = InputManager::new();

        manager.update_key(KeyCode::Space, true);
        assert_eq!(manager.process().exert_presses, 1);

        manager.end_frame();
        assert_eq!(manager.process().exert_presses, 0);

        manager.repeat_key(KeyCode::Space);
        manager.repeat_key(KeyCode::Space);
        assert_eq!(manager.process().exert_presses, 2);
    }

    #[test]
    fn test_repeat_of_unheld_key_ignored() {
        let mut manager = InputManager::new();
        manager.repeat_key(KeyCode::Space);
        assert_eq!(manager.process().exert_presses, 0);
    }

    #[test]
    fn test_mouse_delta_accumulates_and_resets() {
        let mut manager = InputManager::new();

        manager.accumulate_mouse_delta(3.0, -1.0);
        manager.accumulate_mouse_delta(2.0, 4.0);
        assert_eq!(manager.process().look_delta, Vec2::new(5.0, 3.0));

        manager.end_frame();
        assert!(!manager.process().has_look());
    }

    #[test]
    fn test_release_all() {
        let mut manager = InputManager::new();
        manager.update_key(KeyCode::W, true);
        manager.update_mouse_button(MouseButton::Left, true);

        manager.release_all();

        assert!(!manager.is_key_pressed(KeyCode::W));
        assert!(!manager.process().has_movement());
    }

    #[test]
    fn test_rebind() {
        let mut manager = InputManager::new();

        manager.rebind(Action::Exert, KeyBinding::new(KeyCode::E));
        manager.update_key(KeyCode::Space, true);
        assert!(!manager.is_action_pressed(Action::Exert));

        manager.update_key(KeyCode::E, true);
        assert!(manager.is_action_pressed(Action::Exert));
    }

    #[test]
    fn test_try_rebind_conflict() {
        let mut manager = InputManager::new();

        let result = manager.try_rebind(Action::Exert, KeyBinding::new(KeyCode::W));
        assert!(matches!(
            result,
            Err(InputError::KeyAlreadyBound {
                key: KeyCode::W,
                action: Action::MoveForward
            })
        ));

        assert!(manager
            .try_rebind(Action::Exert, KeyBinding::new(KeyCode::E))
            .is_ok());
    }

    #[test]
    fn test_primary_click() {
        let mut manager = InputManager::new();
        manager.update_mouse_button(MouseButton::Left, true);
        assert!(manager.process().primary_just_pressed);

        manager.end_frame();
        assert!(!manager.process().primary_just_pressed);
    }
}
