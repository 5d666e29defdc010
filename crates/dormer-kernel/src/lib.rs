//! # Dormer Kernel
//!
//! GPU and asset side of the room scene.
//!
//! This crate provides:
//! - A perspective camera sized to the window
//! - glTF model loading with node hierarchy and animation clips
//! - Background asset loading over a channel
//! - An animation mixer that poses node hierarchies
//! - A depth-tested, Lambert-lit mesh renderer
//!
//! ## Frame flow
//!
//! The engine polls the [`AssetLoader`] for finished models, uploads them
//! with [`SceneRenderer::add_model`], advances mixers with
//! [`SceneRenderer::update_animations`], then calls
//! [`SceneRenderer::prepare`] and [`SceneRenderer::render`] inside its
//! render pass.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod anim;
pub mod assets;
pub mod camera;
pub mod render;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::anim::*;
    pub use crate::assets::*;
    pub use crate::camera::*;
    pub use crate::render::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    #[test]
    fn test_mixer_pose_matches_node_count() {
        let model = ModelData {
            nodes: vec![NodeData::default(); 3],
            ..ModelData::default()
        };
        assert_eq!(AnimationMixer::new().pose(&model).len(), 3);
    }

    #[test]
    fn test_camera_and_lighting_agree_on_layout() {
        let camera = PerspectiveCamera::new(800, 600);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.7, 0.0), Vec3::new(0.0, 1.7, 1.0), Vec3::Y);
        let globals = GlobalsUniform::new(camera.as_uniform(view));
        assert!((globals.camera.eye[1] - 1.7).abs() < 1e-5);
    }
}
