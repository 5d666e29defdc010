//! Error types for Dormer.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Dormer operations.
#[derive(Debug, Error)]
pub enum DormerError {
    /// Asset loading errors
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading a model file.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// The glTF importer rejected the file
    #[error("failed to import {path}: {reason}")]
    Import {
        /// File that failed
        path: PathBuf,
        /// Importer message
        reason: String,
    },

    /// The file parsed but held no drawable triangles
    #[error("no geometry found in {0}")]
    NoGeometry(PathBuf),

    /// A feature the loader does not handle
    #[error("unsupported content in {path}: {what}")]
    Unsupported {
        /// File that failed
        path: PathBuf,
        /// Description of the unsupported feature
        what: String,
    },

    /// The loader thread went away before answering
    #[error("loader disconnected")]
    Disconnected,
}

impl AssetError {
    /// Returns the path involved, if any.
    #[must_use]
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Import { path, .. } | Self::Unsupported { path, .. } => Some(path),
            Self::NoGeometry(path) => Some(path),
            Self::Disconnected => None,
        }
    }
}

/// Result type alias for Dormer operations.
pub type DormerResult<T> = Result<T, DormerError>;
