//! Engine configuration.
//!
//! Provides window, asset, movement, meter and debug settings. Configuration
//! can be loaded from and saved to a TOML file.

use dormer_common::{CharacterId, RoomBounds};
use dormer_gameplay::{
    GameSettings, MeterSettings, ProximityTrigger, DEFAULT_LOOK_SENSITIVITY, DEFAULT_MOVE_SPEED,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "dormer.toml";

/// Directory under the platform config dir.
const CONFIG_DIR_NAME: &str = "dormer";

/// A character model to load at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAsset {
    /// Name scripts refer to the character by
    pub name: CharacterId,
    /// Model file
    pub path: PathBuf,
}

impl CharacterAsset {
    fn new(name: &str, path: &str) -> Self {
        Self {
            name: CharacterId::from(name),
            path: PathBuf::from(path),
        }
    }
}

/// Engine configuration parameters.
///
/// Plain values come before tables so the file serializes cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Window Settings ===
    /// Window width in pixels
    pub window_width: u32,
    /// Window height in pixels
    pub window_height: u32,
    /// Enable VSync
    pub vsync: bool,
    /// Target frames per second (when VSync is off)
    pub target_fps: u32,

    // === Camera and Movement ===
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Distance walked per fixed step
    pub move_speed: f32,
    /// Radians of rotation per pixel of mouse motion
    pub mouse_sensitivity: f32,

    // === Debug Settings ===
    /// Show debug overlay (F3)
    pub show_debug_overlay: bool,
    /// Enable GPU validation layers
    pub gpu_validation: bool,

    // === Assets ===
    /// Room model
    pub room_model: PathBuf,

    /// Walkable area
    pub bounds: RoomBounds,
    /// Sleep and wellness tunables
    pub meters: MeterSettings,
    /// Character models
    pub characters: Vec<CharacterAsset>,
    /// Story zones that fire when the player walks in. None by default.
    pub triggers: Vec<ProximityTrigger>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Window
            window_width: 1280,
            window_height: 720,
            vsync: true,
            target_fps: 60,

            // Camera and movement
            fov_degrees: dormer_kernel::DEFAULT_FOV_Y,
            move_speed: DEFAULT_MOVE_SPEED,
            mouse_sensitivity: DEFAULT_LOOK_SENSITIVITY,

            // Debug
            show_debug_overlay: false,
            gpu_validation: cfg!(debug_assertions),

            // Assets
            room_model: PathBuf::from("assets/models/bedroom.glb"),
            bounds: RoomBounds::default(),
            meters: MeterSettings::default(),
            characters: vec![
                CharacterAsset::new("character1", "assets/models/character1.glb"),
                CharacterAsset::new("character2", "assets/models/character2.glb"),
            ],
            triggers: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let mut contents = String::new();
        if let Err(e) = fs::File::open(path).and_then(|mut f| f.read_to_string(&mut contents)) {
            warn!("Failed to read config file: {e}");
            return Self::default();
        }

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Config file in the platform config dir if one exists there, else
    /// `dormer.toml` in the working directory.
    fn config_path() -> PathBuf {
        Self::config_path_in(dirs::config_dir())
    }

    fn config_path_in(config_dir: Option<PathBuf>) -> PathBuf {
        config_dir
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE))
            .filter(|path| path.exists())
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Window size
        self.window_width = self.window_width.clamp(320, 7680);
        self.window_height = self.window_height.clamp(240, 4320);
        self.target_fps = self.target_fps.clamp(30, 240);

        // Camera and movement
        self.fov_degrees = self.fov_degrees.clamp(30.0, 120.0);
        self.move_speed = self.move_speed.clamp(0.001, 1.0);
        self.mouse_sensitivity = self.mouse_sensitivity.clamp(0.0001, 0.05);

        // Room
        if !self.bounds.is_valid() {
            warn!(bounds = ?self.bounds, "Room bounds are inverted, using defaults");
            self.bounds = RoomBounds::default();
        }

        // Meters
        let meters = &mut self.meters;
        meters.sleep_start = meters.sleep_start.clamp(0.0, dormer_gameplay::METER_MAX);
        meters.wellness_start = meters.wellness_start.clamp(0.0, dormer_gameplay::METER_MAX);
        meters.decay_interval_secs = meters.decay_interval_secs.clamp(0.01, 3600.0);
        meters.sleep_decay = meters.sleep_decay.max(0.0);
        meters.exert_cost = meters.exert_cost.max(0.0);

        // Story zones
        self.triggers.retain(|trigger| {
            let usable = trigger.radius.is_finite() && trigger.radius > 0.0;
            if !usable {
                warn!(?trigger, "Dropping story zone with a non-positive radius");
            }
            usable
        });
    }

    /// Gameplay tunables derived from this config.
    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            bounds: self.bounds,
            move_speed: self.move_speed,
            look_sensitivity: self.mouse_sensitivity,
            meters: self.meters,
            triggers: self.triggers.clone(),
        }
    }
}
