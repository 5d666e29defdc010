//! Central game state management.
//!
//! This module provides the `GameState` struct which serves as the single source
//! of truth for the scene, coordinating the camera controller, meters,
//! characters and story beats.

use dormer_common::{CharacterId, ModelHandle, RoomBounds};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::characters::CharacterRoster;
use crate::controller::{FirstPersonController, DEFAULT_LOOK_SENSITIVITY, DEFAULT_MOVE_SPEED};
use crate::events::{EventBus, GameEvent};
use crate::input::Input;
use crate::meters::{MeterSettings, Meters};
use crate::story::{ProximityTrigger, StoryDirector, StoryEvent, StoryOutcome};

/// Fixed timestep for movement updates (60 updates per second).
const FIXED_TIMESTEP: f64 = 1.0 / 60.0;

/// Tunables used to build a [`GameState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Walkable area
    pub bounds: RoomBounds,
    /// Distance per fixed step
    pub move_speed: f32,
    /// Radians per pixel of mouse motion
    pub look_sensitivity: f32,
    /// Meter tunables
    pub meters: MeterSettings,
    /// Proximity zones watched once the room is loaded
    pub triggers: Vec<ProximityTrigger>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            bounds: RoomBounds::default(),
            move_speed: DEFAULT_MOVE_SPEED,
            look_sensitivity: DEFAULT_LOOK_SENSITIVITY,
            meters: MeterSettings::default(),
            triggers: Vec::new(),
        }
    }
}

/// Central game state containing all gameplay data.
///
/// This struct is the single source of truth for game state and is used by the
/// engine for the main game loop.
#[derive(Debug)]
pub struct GameState {
    /// First-person camera controller
    pub controller: FirstPersonController,
    /// Sleep and wellness meters
    pub meters: Meters,
    /// Loaded characters
    pub roster: CharacterRoster,
    /// Story beats and proximity zones
    pub story: StoryDirector,
    /// Walkable area
    pub bounds: RoomBounds,
    /// Outgoing events for the engine
    pub events: EventBus,
    /// Whether the room model has loaded
    room_loaded: bool,
    /// Current game time in seconds
    game_time: f64,
    /// Accumulated time for fixed timestep updates
    accumulator: f64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&GameSettings::default())
    }
}

impl GameState {
    /// Creates a new game state. The camera waits at the origin until the
    /// room loads.
    #[must_use]
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            controller: FirstPersonController::new(settings.move_speed, settings.look_sensitivity),
            meters: Meters::from_settings(&settings.meters),
            roster: CharacterRoster::new(),
            story: StoryDirector::with_triggers(settings.triggers.iter().cloned()),
            bounds: settings.bounds,
            events: EventBus::default(),
            room_loaded: false,
            game_time: 0.0,
            accumulator: 0.0,
        }
    }

    /// Updates all game systems for one frame.
    ///
    /// # Arguments
    ///
    /// * `dt` - Clamped delta time in seconds, drives movement
    /// * `elapsed` - Wall-clock seconds since the last frame, drives meter decay
    /// * `input` - Current input state
    pub fn update(&mut self, dt: f32, elapsed: f32, input: &Input) {
        if input.release_pointer_just_pressed {
            self.release_pointer();
        }

        if input.exert_presses > 0 {
            for _ in 0..input.exert_presses {
                self.meters.exert();
            }
            self.publish_meters();
        }

        self.controller.look(input.look_delta);

        self.accumulator += f64::from(dt);
        while self.accumulator >= FIXED_TIMESTEP {
            self.controller.step(input, &self.bounds);
            self.accumulator -= FIXED_TIMESTEP;
        }

        if self.meters.update(elapsed) > 0 {
            self.publish_meters();
        }

        if self.room_loaded {
            let outcomes = self
                .story
                .check_player_position(self.controller.position(), &mut self.roster);
            for outcome in outcomes {
                self.publish_outcome(outcome);
            }
        }

        self.game_time += f64::from(dt);
    }

    /// Handles a click on the scene: captures the pointer.
    pub fn on_click(&mut self) {
        debug!("Scene clicked");
        self.events.publish(GameEvent::SceneClicked);
        if self.controller.lock() {
            self.events.publish(GameEvent::PointerLocked);
        }
    }

    /// Releases the pointer (Escape or focus loss).
    pub fn release_pointer(&mut self) {
        if self.controller.unlock() {
            self.events.publish(GameEvent::PointerUnlocked);
        }
    }

    /// Places the camera at spawn once the room is in the scene.
    pub fn on_room_loaded(&mut self) {
        info!("Room model loaded");
        self.controller.place_at_spawn();
        self.room_loaded = true;
        self.events.publish(GameEvent::RoomLoaded);
    }

    /// Registers a character model that finished loading. It starts hidden.
    pub fn on_character_loaded(&mut self, name: CharacterId, model: ModelHandle, clips: Vec<String>) {
        info!(%name, "Character loaded");
        self.roster.register(name.clone(), model, clips);
        self.events.publish(GameEvent::CharacterLoaded { name });
    }

    /// Reports a model that failed to load. Nothing else changes.
    pub fn on_asset_failed(&mut self, path: PathBuf, reason: String) {
        error!(path = %path.display(), %reason, "Error loading model");
        self.events.publish(GameEvent::AssetFailed { path, reason });
    }

    /// Applies a story beat by hand. Returns false if it could not apply.
    pub fn trigger_story(&mut self, event: StoryEvent) -> bool {
        match self.story.trigger(event, &mut self.roster) {
            Some(outcome) => {
                self.publish_outcome(outcome);
                true
            }
            None => false,
        }
    }

    /// Shows or hides a character. No-op if it is not loaded.
    pub fn toggle_character(
        &mut self,
        name: &CharacterId,
        visible: bool,
        position: Option<Vec3>,
        rotation: Option<Vec3>,
    ) -> bool {
        let applied = self.roster.toggle(name, visible, position, rotation);
        if applied {
            let name = name.clone();
            self.events.publish(if visible {
                GameEvent::CharacterShown { name }
            } else {
                GameEvent::CharacterHidden { name }
            });
        }
        applied
    }

    /// Plays a clip on a character. No-op if the character or clip is missing.
    pub fn play_animation(&mut self, name: &CharacterId, clip: &str) -> bool {
        let applied = self.roster.play_animation(name, clip);
        if applied {
            self.events.publish(GameEvent::AnimationStarted {
                name: name.clone(),
                clip: clip.to_string(),
            });
        }
        applied
    }

    /// Returns whether the room model has loaded.
    #[must_use]
    pub const fn is_room_loaded(&self) -> bool {
        self.room_loaded
    }

    /// Returns the current game time in seconds.
    #[must_use]
    pub const fn game_time(&self) -> f64 {
        self.game_time
    }

    /// World-to-view matrix of the camera.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.controller.view_matrix()
    }

    /// Gets the interpolation alpha for rendering between fixed timesteps.
    #[must_use]
    pub fn interpolation_alpha(&self) -> f32 {
        (self.accumulator / FIXED_TIMESTEP) as f32
    }

    fn publish_meters(&self) {
        self.events.publish(GameEvent::MetersChanged {
            sleep: self.meters.sleep.current(),
            wellness: self.meters.wellness.current(),
        });
    }

    fn publish_outcome(&self, outcome: StoryOutcome) {
        match outcome {
            StoryOutcome::Shown { name, clip } => {
                self.events.publish(GameEvent::CharacterShown { name: name.clone() });
                if let Some(clip) = clip {
                    self.events.publish(GameEvent::AnimationStarted { name, clip });
                }
            }
            StoryOutcome::Hidden { name } => {
                self.events.publish(GameEvent::CharacterHidden { name });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dormer_common::EYE_HEIGHT;

    const FRAME: f32 = 1.0 / 60.0;

    fn loaded_state() -> GameState {
        let mut state = GameState::default();
        state.on_room_loaded();
        state.events.drain();
        state
    }

    #[test]
    fn test_room_load_places_camera() {
        let mut state = GameState::default();
        assert_eq!(state.controller.position(), Vec3::ZERO);

        state.on_room_loaded();
        assert!(state.is_room_loaded());
        assert_eq!(state.controller.position(), Vec3::new(0.0, EYE_HEIGHT, 0.0));
        assert_eq!(state.events.drain(), vec![GameEvent::RoomLoaded]);
    }

    #[test]
    fn test_click_locks_pointer() {
        let mut state = loaded_state();
        state.on_click();
        state.on_click();

        assert!(state.controller.is_locked());
        assert_eq!(
            state.events.drain(),
            vec![
                GameEvent::SceneClicked,
                GameEvent::PointerLocked,
                GameEvent::SceneClicked
            ]
        );
    }

    #[test]
    fn test_escape_releases_pointer() {
        let mut state = loaded_state();
        state.on_click();
        state.events.drain();

        let input = Input {
            release_pointer_just_pressed: true,
            ..Input::default()
        };
        state.update(0.0, 0.0, &input);
        assert!(!state.controller.is_locked());
        assert_eq!(state.events.drain(), vec![GameEvent::PointerUnlocked]);
    }

    #[test]
    fn test_movement_needs_lock() {
        let mut state = loaded_state();
        let input = Input {
            forward: true,
            ..Input::default()
        };

        state.update(FRAME * 10.0, FRAME * 10.0, &input);
        assert_eq!(state.controller.position(), Vec3::new(0.0, EYE_HEIGHT, 0.0));

        state.on_click();
        state.update(FRAME * 10.0, FRAME * 10.0, &input);
        assert!(state.controller.position().z > 0.15);
    }

    #[test]
    fn test_exert_works_unlocked() {
        let mut state = loaded_state();
        let input = Input {
            exert_presses: 1,
            ..Input::default()
        };
        state.update(0.0, 0.0, &input);

        assert_eq!(state.meters.wellness.current(), 90.0);
        assert_eq!(
            state.events.drain(),
            vec![GameEvent::MetersChanged {
                sleep: 100.0,
                wellness: 90.0
            }]
        );
    }

    #[test]
    fn test_sleep_decays_with_frames() {
        let mut state = loaded_state();
        for _ in 0..121 {
            state.update(FRAME, FRAME, &Input::default());
        }
        assert_eq!(state.meters.sleep.current(), 98.0);
    }

    #[test]
    fn test_repeated_exert_drains_each_press() {
        let mut state = loaded_state();
        let input = Input {
            exert_presses: 3,
            ..Input::default()
        };
        state.update(0.0, 0.0, &input);

        assert_eq!(state.meters.wellness.current(), 70.0);
        assert_eq!(
            state.events.drain(),
            vec![GameEvent::MetersChanged {
                sleep: 100.0,
                wellness: 70.0
            }]
        );
    }

    #[test]
    fn test_sleep_follows_wall_clock_after_stall() {
        let mut state = loaded_state();
        // A 5 s stall arrives as a clamped movement delta.
        state.update(0.25, 5.0, &Input::default());
        assert_eq!(state.meters.sleep.current(), 95.0);
    }

    #[test]
    fn test_default_state_never_fires_story() {
        let mut state = GameState::default();
        let id = CharacterId::from("character1");
        state.on_character_loaded(id.clone(), ModelHandle::from_raw(1), vec!["idle".to_string()]);
        state.on_room_loaded();
        state.update(FRAME, FRAME, &Input::default());

        let character = state.roster.get(&id).expect("loaded");
        assert!(!character.state.visible);
        assert!(character.state.current_animation.is_none());
    }

    #[test]
    fn test_configured_zone_shows_character() {
        let settings = GameSettings {
            triggers: vec![ProximityTrigger::default()],
            ..GameSettings::default()
        };
        let mut state = GameState::new(&settings);
        state.on_room_loaded();
        let id = CharacterId::from("character1");
        state.on_character_loaded(id.clone(), ModelHandle::from_raw(1), vec!["idle".to_string()]);
        state.events.drain();

        state.update(0.0, 0.0, &Input::default());

        let character = state.roster.get(&id).expect("loaded");
        assert!(character.state.visible);
        assert_eq!(character.state.current_animation.as_deref(), Some("idle"));
        assert_eq!(
            state.events.drain(),
            vec![
                GameEvent::CharacterShown { name: id.clone() },
                GameEvent::AnimationStarted {
                    name: id,
                    clip: "idle".to_string()
                }
            ]
        );
    }

    #[test]
    fn test_no_proximity_before_room() {
        let settings = GameSettings {
            triggers: vec![ProximityTrigger::default()],
            ..GameSettings::default()
        };
        let mut state = GameState::new(&settings);
        let id = CharacterId::from("character1");
        state.on_character_loaded(id.clone(), ModelHandle::from_raw(1), vec!["idle".to_string()]);

        state.update(0.0, 0.0, &Input::default());
        assert!(!state.roster.get(&id).expect("loaded").state.visible);
    }

    #[test]
    fn test_manual_story_events() {
        let mut state = loaded_state();
        assert!(!state.trigger_story(StoryEvent::HideCharacter1));

        let id = CharacterId::from("character1");
        state.on_character_loaded(id.clone(), ModelHandle::from_raw(1), Vec::new());
        assert!(state.trigger_story(StoryEvent::ShowCharacter1));
        assert!(state.trigger_story(StoryEvent::HideCharacter1));
        assert!(!state.roster.get(&id).expect("loaded").state.visible);
    }

    #[test]
    fn test_asset_failure_is_reported() {
        let mut state = GameState::default();
        state.on_asset_failed(PathBuf::from("missing.glb"), "not found".to_string());
        assert_eq!(
            state.events.drain(),
            vec![GameEvent::AssetFailed {
                path: PathBuf::from("missing.glb"),
                reason: "not found".to_string()
            }]
        );
        assert!(!state.is_room_loaded());
    }

    #[test]
    fn test_toggle_and_play_helpers() {
        let mut state = loaded_state();
        let id = CharacterId::from("character2");
        assert!(!state.toggle_character(&id, true, None, None));
        assert!(!state.play_animation(&id, "wave"));

        state.on_character_loaded(id.clone(), ModelHandle::from_raw(2), vec!["wave".to_string()]);
        assert!(state.toggle_character(&id, true, Some(Vec3::X), None));
        assert!(state.play_animation(&id, "wave"));
    }
}
