//! First-person controller with pointer-lock mouse look.
//!
//! The camera yaws around world Y and pitches around its local X axis
//! (YXZ Euler order). Walking is restricted to the horizontal plane, so
//! looking up or down never changes walking speed.

use dormer_common::{RoomBounds, EYE_HEIGHT};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::input::Input;

/// Distance walked per fixed step while a movement key is held.
pub const DEFAULT_MOVE_SPEED: f32 = 0.02;

/// Radians of rotation per pixel of mouse motion.
pub const DEFAULT_LOOK_SENSITIVITY: f32 = 0.002;

/// Where the camera is placed once the room has loaded.
pub const SPAWN_POSITION: Vec3 = Vec3::new(0.0, EYE_HEIGHT, 0.0);

/// Yaw at spawn, facing into the room.
pub const SPAWN_YAW: f32 = PI;

/// Whether the cursor is captured by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointerLock {
    /// Cursor is free; movement and look are ignored
    #[default]
    Unlocked,
    /// Cursor is captured; movement and look are applied
    Locked,
}

/// First-person camera controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstPersonController {
    /// Camera position in world space
    position: Vec3,
    /// Rotation around world Y, radians
    yaw: f32,
    /// Rotation around local X, radians, clamped to [-π/2, π/2]
    pitch: f32,
    /// Distance per fixed step
    move_speed: f32,
    /// Radians per pixel
    look_sensitivity: f32,
    /// Pointer-lock state
    lock: PointerLock,
}

impl Default for FirstPersonController {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_SPEED, DEFAULT_LOOK_SENSITIVITY)
    }
}

impl FirstPersonController {
    /// Creates a controller at the origin looking down -Z.
    #[must_use]
    pub fn new(move_speed: f32, look_sensitivity: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            move_speed,
            look_sensitivity,
            lock: PointerLock::Unlocked,
        }
    }

    /// Places the camera at the spawn point facing into the room.
    pub fn place_at_spawn(&mut self) {
        self.position = SPAWN_POSITION;
        self.yaw = SPAWN_YAW;
        self.pitch = 0.0;
    }

    /// Captures the pointer. Returns true if the state changed.
    pub fn lock(&mut self) -> bool {
        let changed = self.lock == PointerLock::Unlocked;
        self.lock = PointerLock::Locked;
        changed
    }

    /// Releases the pointer. Returns true if the state changed.
    pub fn unlock(&mut self) -> bool {
        let changed = self.lock == PointerLock::Locked;
        self.lock = PointerLock::Unlocked;
        changed
    }

    /// Returns true while the pointer is captured.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock == PointerLock::Locked
    }

    /// Current pointer-lock state.
    #[must_use]
    pub fn pointer_lock(&self) -> PointerLock {
        self.lock
    }

    /// Applies mouse motion. Ignored unless the pointer is locked.
    pub fn look(&mut self, delta: Vec2) {
        if !self.is_locked() {
            return;
        }
        self.yaw -= delta.x * self.look_sensitivity;
        self.pitch = (self.pitch - delta.y * self.look_sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Moves along the view direction projected onto the floor plane.
    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.flat_forward() * distance;
    }

    /// Moves along the camera's right vector on the floor plane.
    pub fn move_right(&mut self, distance: f32) {
        self.position += self.flat_right() * distance;
    }

    /// Runs one fixed step of movement and clamps against the room.
    ///
    /// Nothing moves and no clamping happens while the pointer is free.
    pub fn step(&mut self, input: &Input, bounds: &RoomBounds) {
        if !self.is_locked() {
            return;
        }

        if input.forward {
            self.move_forward(self.move_speed);
        }
        if input.backward {
            self.move_forward(-self.move_speed);
        }
        if input.left {
            self.move_right(-self.move_speed);
        }
        if input.right {
            self.move_right(self.move_speed);
        }

        self.position = bounds.clamp_position(self.position);
    }

    /// Camera orientation.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Unit view direction including pitch.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    /// Unit forward direction on the floor plane.
    #[must_use]
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Unit right direction on the floor plane.
    #[must_use]
    pub fn flat_right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// World-to-view matrix for the renderer.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position).inverse()
    }

    /// Camera position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Teleports the camera without clamping.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Yaw in radians.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in radians.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Distance per fixed step.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn forward_input() -> Input {
        Input {
            forward: true,
            ..Input::default()
        }
    }

    #[test]
    fn test_spawn_faces_into_room() {
        let mut controller = FirstPersonController::default();
        controller.place_at_spawn();

        assert_eq!(controller.position(), SPAWN_POSITION);
        assert!(approx(controller.flat_forward(), Vec3::Z));
    }

    #[test]
    fn test_unlocked_ignores_movement() {
        let mut controller = FirstPersonController::default();
        controller.place_at_spawn();

        controller.step(&forward_input(), &RoomBounds::default());
        assert_eq!(controller.position(), SPAWN_POSITION);
    }

    #[test]
    fn test_locked_moves_forward_one_step() {
        let mut controller = FirstPersonController::default();
        controller.place_at_spawn();
        controller.lock();

        controller.step(&forward_input(), &RoomBounds::default());
        assert!(approx(
            controller.position(),
            Vec3::new(0.0, EYE_HEIGHT, DEFAULT_MOVE_SPEED)
        ));
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut controller = FirstPersonController::default();
        controller.place_at_spawn();
        controller.lock();

        let input = Input {
            forward: true,
            backward: true,
            left: true,
            right: true,
            ..Input::default()
        };
        controller.step(&input, &RoomBounds::default());
        assert!(approx(controller.position(), SPAWN_POSITION));
    }

    #[test]
    fn test_strafe_right_at_default_yaw() {
        let mut controller = FirstPersonController::new(1.0, DEFAULT_LOOK_SENSITIVITY);
        controller.move_right(1.0);
        assert!(approx(controller.position(), Vec3::X));
    }

    #[test]
    fn test_walls_stop_movement() {
        let mut controller = FirstPersonController::new(0.5, DEFAULT_LOOK_SENSITIVITY);
        controller.place_at_spawn();
        controller.lock();

        for _ in 0..100 {
            controller.step(&forward_input(), &RoomBounds::default());
        }
        assert_eq!(controller.position().z, 2.0);
        assert_eq!(controller.position().y, EYE_HEIGHT);
    }

    #[test]
    fn test_look_requires_lock() {
        let mut controller = FirstPersonController::default();
        controller.look(Vec2::new(100.0, 0.0));
        assert_eq!(controller.yaw(), 0.0);

        controller.lock();
        controller.look(Vec2::new(100.0, 0.0));
        assert!((controller.yaw() + 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut controller = FirstPersonController::default();
        controller.lock();

        controller.look(Vec2::new(0.0, -10_000.0));
        assert!((controller.pitch() - FRAC_PI_2).abs() < 1e-6);

        controller.look(Vec2::new(0.0, 20_000.0));
        assert!((controller.pitch() + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_does_not_change_walk_speed() {
        let mut controller = FirstPersonController::new(1.0, DEFAULT_LOOK_SENSITIVITY);
        controller.lock();
        controller.look(Vec2::new(0.0, -500.0));

        controller.move_forward(1.0);
        assert!((controller.position().length() - 1.0).abs() < 1e-5);
        assert_eq!(controller.position().y, 0.0);
    }

    #[test]
    fn test_lock_transitions() {
        let mut controller = FirstPersonController::default();
        assert!(controller.lock());
        assert!(!controller.lock());
        assert!(controller.unlock());
        assert!(!controller.unlock());
        assert_eq!(controller.pointer_lock(), PointerLock::Unlocked);
    }

    #[test]
    fn test_view_matrix_maps_eye_to_origin() {
        let mut controller = FirstPersonController::default();
        controller.place_at_spawn();
        let eye_in_view = controller.view_matrix().transform_point3(controller.position());
        assert!(approx(eye_in_view, Vec3::ZERO));
    }
}
