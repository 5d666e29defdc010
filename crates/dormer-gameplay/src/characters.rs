//! Character roster: which models are loaded, visible and animating.
//!
//! The roster holds plain state only. The scene reads it each frame to
//! position instances and drive their animation mixers.

use ahash::AHashMap;
use dormer_common::{CharacterId, ModelHandle};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-character scene state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharacterState {
    /// Whether the model is drawn
    pub visible: bool,
    /// Clip currently playing, if any
    pub current_animation: Option<String>,
    /// World position
    pub position: Vec3,
    /// Euler angles (XYZ order), radians
    pub rotation: Vec3,
    /// Bumped whenever a clip starts or stops so the scene can resync its mixer
    pub animation_generation: u32,
}

/// A loaded character model and its state.
#[derive(Debug, Clone)]
pub struct Character {
    /// Scene handle of the model instance
    pub model: ModelHandle,
    /// Clip names available on the model
    pub clips: Vec<String>,
    /// Current state
    pub state: CharacterState,
}

impl Character {
    /// Returns true if the model has a clip with this exact name.
    #[must_use]
    pub fn has_clip(&self, clip: &str) -> bool {
        self.clips.iter().any(|c| c == clip)
    }
}

/// Flat mapping from character name to loaded model.
#[derive(Debug, Default)]
pub struct CharacterRoster {
    characters: AHashMap<CharacterId, Character>,
}

impl CharacterRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly loaded model. It starts hidden with no animation.
    ///
    /// Registering a name twice replaces the previous entry.
    pub fn register(&mut self, name: CharacterId, model: ModelHandle, clips: Vec<String>) {
        debug!(%name, clips = clips.len(), "Registering character");
        self.characters.insert(
            name,
            Character {
                model,
                clips,
                state: CharacterState::default(),
            },
        );
    }

    /// Shows or hides a character, optionally moving it.
    ///
    /// Returns false without doing anything if the character is not loaded.
    pub fn toggle(
        &mut self,
        name: &CharacterId,
        visible: bool,
        position: Option<Vec3>,
        rotation: Option<Vec3>,
    ) -> bool {
        let Some(character) = self.characters.get_mut(name) else {
            return false;
        };

        character.state.visible = visible;
        if let Some(position) = position {
            character.state.position = position;
        }
        if let Some(rotation) = rotation {
            character.state.rotation = rotation;
        }
        true
    }

    /// Starts a clip from the beginning, replacing any current one.
    ///
    /// Returns false if the character is not loaded, has no clips, or has
    /// no clip with this name.
    pub fn play_animation(&mut self, name: &CharacterId, clip: &str) -> bool {
        let Some(character) = self.characters.get_mut(name) else {
            return false;
        };
        if !character.has_clip(clip) {
            debug!(%name, clip, "Clip not found");
            return false;
        }

        character.state.current_animation = Some(clip.to_string());
        character.state.animation_generation = character.state.animation_generation.wrapping_add(1);
        true
    }

    /// Stops the current clip. Returns false if nothing was playing.
    pub fn stop_animation(&mut self, name: &CharacterId) -> bool {
        let Some(character) = self.characters.get_mut(name) else {
            return false;
        };
        if character.state.current_animation.take().is_none() {
            return false;
        }
        character.state.animation_generation = character.state.animation_generation.wrapping_add(1);
        true
    }

    /// Looks up a character.
    #[must_use]
    pub fn get(&self, name: &CharacterId) -> Option<&Character> {
        self.characters.get(name)
    }

    /// Returns true if the character's model has finished loading.
    #[must_use]
    pub fn is_loaded(&self, name: &CharacterId) -> bool {
        self.characters.contains_key(name)
    }

    /// Iterates over all loaded characters.
    pub fn iter(&self) -> impl Iterator<Item = (&CharacterId, &Character)> {
        self.characters.iter()
    }

    /// Number of loaded characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Returns true if no character has loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
