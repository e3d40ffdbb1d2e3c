//! # Persisted Settings
//!
//! Music and sound-effect volumes stored as a small JSON object under the
//! keys `music_volume` and `sfx_volume`.
//!
//! Loading never fails: every key falls back to its default on its own when
//! the file is missing, unreadable, malformed or holds an out-of-range value.

use crate::GravewalkResult;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_MUSIC_VOLUME: f32 = 0.6;
pub const DEFAULT_SFX_VOLUME: f32 = 0.8;

/// Step applied by one volume key press
pub const VOLUME_STEP: f32 = 0.1;

const MUSIC_KEY: &str = "music_volume";
const SFX_KEY: &str = "sfx_volume";

/// Audio volumes, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub music_volume: f32,
    pub sfx_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_volume: DEFAULT_MUSIC_VOLUME,
            sfx_volume: DEFAULT_SFX_VOLUME,
        }
    }
}

impl Settings {
    /// Reads each key independently, keeping the default for anything that is
    /// absent, non-numeric or outside `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravewalk::services::Settings;
    ///
    /// let value = serde_json::json!({ "music_volume": 0.25, "sfx_volume": "loud" });
    /// let settings = Settings::from_value(&value);
    /// assert_eq!(settings.music_volume, 0.25);
    /// assert_eq!(settings.sfx_volume, 0.8);
    /// ```
    pub fn from_value(value: &Value) -> Self {
        Self {
            music_volume: volume_or(value, MUSIC_KEY, DEFAULT_MUSIC_VOLUME),
            sfx_volume: volume_or(value, SFX_KEY, DEFAULT_SFX_VOLUME),
        }
    }

    pub fn adjust_music(&mut self, delta: f32) -> f32 {
        self.music_volume = clamp_volume(self.music_volume + delta);
        self.music_volume
    }

    pub fn adjust_sfx(&mut self, delta: f32) -> f32 {
        self.sfx_volume = clamp_volume(self.sfx_volume + delta);
        self.sfx_volume
    }
}

fn volume_or(value: &Value, key: &str, default: f32) -> f32 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| (0.0..=1.0).contains(v))
        .map(|v| v as f32)
        .unwrap_or(default)
}

/// Clamps to `[0, 1]` and rounds away float drift from repeated steps.
fn clamp_volume(volume: f32) -> f32 {
    (volume.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Loads and saves [`Settings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings, falling back to defaults per key.
    pub fn load(&self) -> Settings {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) => {
                debug!(
                    "No settings at {} ({}); using defaults",
                    self.path.display(),
                    err
                );
                return Settings::default();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Settings::from_value(&value),
            Err(err) => {
                warn!(
                    "Ignoring malformed settings file {}: {}",
                    self.path.display(),
                    err
                );
                Settings::default()
            }
        }
    }

    /// Writes the settings as pretty JSON, creating parent directories.
    pub fn save(&self, settings: &Settings) -> GravewalkResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, text)?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
