//! ID types for characters and loaded models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for model handles.
static MODEL_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Handle to a model instance living in the scene.
///
/// Gameplay code only stores handles; the renderer owns the GPU data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelHandle(u64);

impl ModelHandle {
    /// Creates a new unique model handle.
    #[must_use]
    pub fn new() -> Self {
        Self(MODEL_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a handle from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of a scripted character (e.g. `character1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(String);

impl CharacterId {
    /// Creates a character id from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CharacterId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CharacterId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
