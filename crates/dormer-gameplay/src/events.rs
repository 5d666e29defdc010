//! Event bus for reporting scene changes to the engine.

use crossbeam_channel::{bounded, Receiver, Sender};
use dormer_common::CharacterId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Room model finished loading and the camera was placed at spawn
    RoomLoaded,
    /// A model failed to load
    AssetFailed {
        /// File that failed
        path: PathBuf,
        /// Loader message
        reason: String,
    },
    /// A character model finished loading
    CharacterLoaded {
        /// Character name
        name: CharacterId,
    },
    /// A character became visible
    CharacterShown {
        /// Character name
        name: CharacterId,
    },
    /// A character was hidden
    CharacterHidden {
        /// Character name
        name: CharacterId,
    },
    /// A clip started playing
    AnimationStarted {
        /// Character name
        name: CharacterId,
        /// Clip name
        clip: String,
    },
    /// Meter values changed
    MetersChanged {
        /// Sleep value
        sleep: f32,
        /// Wellness value
        wellness: f32,
    },
    /// The cursor was captured
    PointerLocked,
    /// The cursor was released
    PointerUnlocked,
    /// The scene was clicked
    SceneClicked,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<GameEvent>,
    /// Receiver for collecting events
    receiver: Receiver<GameEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event. Dropped if the bus is full.
    pub fn publish(&self, event: GameEvent) {
        let _ = self.sender.try_send(event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }
}
