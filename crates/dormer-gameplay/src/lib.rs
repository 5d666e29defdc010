//! # Dormer Gameplay
//!
//! CPU-side systems for the first-person room scene:
//! - Input handling with rebindable actions
//! - First-person controller with pointer lock
//! - Sleep and wellness meters
//! - Character roster and story events
//! - Event bus for reporting to the engine

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod characters;
pub mod controller;
pub mod events;
pub mod game_state;
pub mod input;
pub mod meters;
pub mod story;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::characters::*;
    pub use crate::controller::*;
    pub use crate::events::*;
    pub use crate::game_state::*;
    pub use crate::input::*;
    pub use crate::meters::*;
    pub use crate::story::*;
}

pub use prelude::*;
