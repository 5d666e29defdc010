//! Perspective camera for the first-person view.
//!
//! The camera only owns projection parameters. The view matrix comes from
//! the gameplay controller each frame.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Vertical field of view in degrees.
pub const DEFAULT_FOV_Y: f32 = 75.0;

/// Near clip plane.
pub const DEFAULT_NEAR: f32 = 0.1;

/// Far clip plane.
pub const DEFAULT_FAR: f32 = 1000.0;

/// Perspective projection sized to the window.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view, degrees.
    pub fov_y: f32,
    /// Width divided by height.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Viewport size in pixels (width, height).
    viewport_size: (u32, u32),
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl PerspectiveCamera {
    /// Creates a camera for the given viewport size.
    #[must_use]
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        let mut camera = Self {
            fov_y: DEFAULT_FOV_Y,
            aspect: 1.0,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            viewport_size: (1, 1),
        };
        camera.set_viewport(viewport_width, viewport_height);
        camera
    }

    /// Updates the aspect ratio after a resize. Zero sizes are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport_size = (width, height);
        self.aspect = width as f32 / height as f32;
    }

    /// Get the viewport size.
    #[must_use]
    pub const fn viewport(&self) -> (u32, u32) {
        self.viewport_size
    }

    /// Projection matrix with a 0..1 depth range.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    /// Combines the projection with a view matrix.
    #[must_use]
    pub fn view_projection(&self, view: Mat4) -> Mat4 {
        self.projection() * view
    }

    /// Get uniform data for GPU shaders.
    #[must_use]
    pub fn as_uniform(&self, view: Mat4) -> CameraUniform {
        let eye = view.inverse().w_axis.truncate();
        CameraUniform {
            view_proj: self.view_projection(view).to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
        }
    }
}

/// GPU-compatible camera uniform data.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct CameraUniform {
    /// View-projection matrix (column-major).
    pub view_proj: [[f32; 4]; 4],
    /// Eye position in world space (w = 1).
    pub eye: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            eye: Vec3::ZERO.extend(1.0).to_array(),
        }
    }
}
