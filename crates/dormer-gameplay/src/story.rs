//! Scripted story beats and the proximity zones that fire them.

use dormer_common::{CharacterId, EYE_HEIGHT};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::characters::CharacterRoster;

/// Character driven by the built-in story beats.
pub const STORY_CHARACTER: &str = "character1";

/// Clip played when the story character appears.
pub const STORY_IDLE_CLIP: &str = "idle";

/// Default proximity zone radius.
pub const DEFAULT_TRIGGER_RADIUS: f32 = 2.0;

/// A scripted story beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoryEvent {
    /// Show character1 at the origin and play its idle clip
    ShowCharacter1,
    /// Hide character1
    HideCharacter1,
}

/// Visible side effect of applying a story event.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryOutcome {
    /// A character became visible
    Shown {
        /// Character shown
        name: CharacterId,
        /// Clip started, if the model had it
        clip: Option<String>,
    },
    /// A character was hidden
    Hidden {
        /// Character hidden
        name: CharacterId,
    },
}

/// Spherical zone that fires an event when the player walks into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityTrigger {
    /// Zone center
    pub center: Vec3,
    /// Zone radius
    pub radius: f32,
    /// Event fired on entry
    pub event: StoryEvent,
    /// Set once the event applied during the current visit
    #[serde(skip)]
    fired: bool,
}

impl ProximityTrigger {
    /// Creates a trigger zone.
    #[must_use]
    pub fn new(center: Vec3, radius: f32, event: StoryEvent) -> Self {
        Self {
            center,
            radius,
            event,
            fired: false,
        }
    }

    /// Returns true if the position is strictly inside the zone.
    #[must_use]
    pub fn contains(&self, position: Vec3) -> bool {
        position.distance(self.center) < self.radius
    }

    /// Returns true if the trigger already fired during this visit.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl Default for ProximityTrigger {
    fn default() -> Self {
        Self::new(
            Vec3::new(0.0, EYE_HEIGHT, 0.0),
            DEFAULT_TRIGGER_RADIUS,
            StoryEvent::ShowCharacter1,
        )
    }
}

/// Applies story events to the roster and watches proximity zones.
///
/// A new director has no zones. Beats fire only from hotkeys or from zones
/// added with [`StoryDirector::add_trigger`].
#[derive(Debug, Clone, Default)]
pub struct StoryDirector {
    triggers: Vec<ProximityTrigger>,
}

impl StoryDirector {
    /// Creates a director with no zones.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a director watching the given zones.
    #[must_use]
    pub fn with_triggers(triggers: impl IntoIterator<Item = ProximityTrigger>) -> Self {
        Self {
            triggers: triggers.into_iter().collect(),
        }
    }

    /// Adds a proximity zone.
    pub fn add_trigger(&mut self, trigger: ProximityTrigger) {
        self.triggers.push(trigger);
    }

    /// Registered zones.
    #[must_use]
    pub fn triggers(&self) -> &[ProximityTrigger] {
        &self.triggers
    }

    /// Applies an event. Returns `None` if the character is not loaded yet.
    pub fn trigger(&self, event: StoryEvent, roster: &mut CharacterRoster) -> Option<StoryOutcome> {
        let name = CharacterId::from(STORY_CHARACTER);
        match event {
            StoryEvent::ShowCharacter1 => {
                if !roster.toggle(&name, true, Some(Vec3::ZERO), None) {
                    debug!(%name, "Story event skipped, character not loaded");
                    return None;
                }
                let clip = roster
                    .play_animation(&name, STORY_IDLE_CLIP)
                    .then(|| STORY_IDLE_CLIP.to_string());
                info!(?event, "Story event applied");
                Some(StoryOutcome::Shown { name, clip })
            }
            StoryEvent::HideCharacter1 => {
                if !roster.toggle(&name, false, None, None) {
                    debug!(%name, "Story event skipped, character not loaded");
                    return None;
                }
                info!(?event, "Story event applied");
                Some(StoryOutcome::Hidden { name })
            }
        }
    }

    /// Evaluates every zone against the player position.
    ///
    /// A zone fires once per entry. While the player stays inside it keeps
    /// retrying until the event applies; leaving re-arms it.
    pub fn check_player_position(
        &mut self,
        position: Vec3,
        roster: &mut CharacterRoster,
    ) -> Vec<StoryOutcome> {
        let mut outcomes = Vec::new();
        for index in 0..self.triggers.len() {
            let trigger = &self.triggers[index];
            if !trigger.contains(position) {
                self.triggers[index].fired = false;
                continue;
            }
            if trigger.fired {
                continue;
            }
            let event = trigger.event;
            if let Some(outcome) = self.trigger(event, roster) {
                self.triggers[index].fired = true;
                outcomes.push(outcome);
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dormer_common::ModelHandle;

    fn loaded_roster() -> CharacterRoster {
        let mut roster = CharacterRoster::new();
        roster.register(
            CharacterId::from(STORY_CHARACTER),
            ModelHandle::from_raw(1),
            vec!["idle".to_string()],
        );
        roster
    }

    #[test]
    fn test_show_places_and_animates() {
        let director = StoryDirector::new();
        let mut roster = loaded_roster();
        let id = CharacterId::from(STORY_CHARACTER);
        roster.toggle(&id, false, Some(Vec3::ONE), None);

        let outcome = director.trigger(StoryEvent::ShowCharacter1, &mut roster);
        assert_eq!(
            outcome,
            Some(StoryOutcome::Shown {
                name: id.clone(),
                clip: Some("idle".to_string())
            })
        );

        let state = &roster.get(&id).expect("loaded").state;
        assert!(state.visible);
        assert_eq!(state.position, Vec3::ZERO);
        assert_eq!(state.current_animation.as_deref(), Some("idle"));
    }

    #[test]
    fn test_hide() {
        let director = StoryDirector::new();
        let mut roster = loaded_roster();
        director.trigger(StoryEvent::ShowCharacter1, &mut roster);
        director.trigger(StoryEvent::HideCharacter1, &mut roster);

        let state = &roster
            .get(&CharacterId::from(STORY_CHARACTER))
            .expect("loaded")
            .state;
        assert!(!state.visible);
    }

    #[test]
    fn test_events_without_character_are_noops() {
        let director = StoryDirector::new();
        let mut roster = CharacterRoster::new();
        assert!(director.trigger(StoryEvent::ShowCharacter1, &mut roster).is_none());
        assert!(director.trigger(StoryEvent::HideCharacter1, &mut roster).is_none());
    }

    #[test]
    fn test_show_without_idle_clip_still_shows() {
        let director = StoryDirector::new();
        let mut roster = CharacterRoster::new();
        let id = CharacterId::from(STORY_CHARACTER);
        roster.register(id.clone(), ModelHandle::from_raw(1), Vec::new());

        let outcome = director.trigger(StoryEvent::ShowCharacter1, &mut roster);
        assert_eq!(outcome, Some(StoryOutcome::Shown { name: id, clip: None }));
    }

    fn spawn_zone_director() -> StoryDirector {
        StoryDirector::with_triggers([ProximityTrigger::default()])
    }

    #[test]
    fn test_new_director_has_no_zones() {
        let mut director = StoryDirector::new();
        let mut roster = loaded_roster();
        let spawn = Vec3::new(0.0, EYE_HEIGHT, 0.0);

        assert!(director.triggers().is_empty());
        assert!(director.check_player_position(spawn, &mut roster).is_empty());
        assert!(!roster
            .get(&CharacterId::from(STORY_CHARACTER))
            .expect("loaded")
            .state
            .visible);
    }

    #[test]
    fn test_proximity_fires_once_per_entry() {
        let mut director = spawn_zone_director();
        let mut roster = loaded_roster();
        let inside = Vec3::new(0.5, EYE_HEIGHT, 0.5);
        let outside = Vec3::new(0.0, EYE_HEIGHT, 5.0);

        assert_eq!(director.check_player_position(inside, &mut roster).len(), 1);
        assert!(director.check_player_position(inside, &mut roster).is_empty());

        director.check_player_position(outside, &mut roster);
        assert!(!director.triggers()[0].has_fired());
        assert_eq!(director.check_player_position(inside, &mut roster).len(), 1);
    }

    #[test]
    fn test_proximity_retries_until_loaded() {
        let mut director = StoryDirector::new();
        director.add_trigger(ProximityTrigger::default());
        let mut roster = CharacterRoster::new();
        let spawn = Vec3::new(0.0, EYE_HEIGHT, 0.0);

        assert!(director.check_player_position(spawn, &mut roster).is_empty());
        assert!(!director.triggers()[0].has_fired());

        roster.register(
            CharacterId::from(STORY_CHARACTER),
            ModelHandle::from_raw(1),
            vec!["idle".to_string()],
        );
        assert_eq!(director.check_player_position(spawn, &mut roster).len(), 1);
    }

    #[test]
    fn test_zone_boundary_is_exclusive() {
        let trigger = ProximityTrigger::default();
        assert!(trigger.contains(Vec3::new(1.99, EYE_HEIGHT, 0.0)));
        assert!(!trigger.contains(Vec3::new(2.0, EYE_HEIGHT, 0.0)));
    }
}
