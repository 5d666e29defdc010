//! # Dormer Common
//!
//! Common types, utilities, and shared abstractions for the Dormer room scene.
//!
//! This crate provides foundational types used across all Dormer subsystems:
//! - Room bounds and the fixed eye height used for collision clamping
//! - ID types for characters and loaded models
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod bounds;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bounds::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;
