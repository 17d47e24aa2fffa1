//! Player preferences
//!
//! Persisted separately from the save document as a small JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Volume change per up/down command
pub const VOLUME_STEP: f32 = 0.05;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master volume (0.0 - 1.0)
    pub volume: f32,
    /// Dark palette for the road and HUD
    pub night_mode: bool,
    /// Wet road: lane changes may slip one lane further
    pub rain: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: 0.25,
            night_mode: false,
            rain: false,
        }
    }
}

impl Settings {
    pub fn volume_up(&mut self) {
        self.set_volume(self.volume + VOLUME_STEP);
    }

    pub fn volume_down(&mut self) {
        self.set_volume(self.volume - VOLUME_STEP);
    }

    /// Set volume, clamped to [0, 1]
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn toggle_night(&mut self) {
        self.night_mode = !self.night_mode;
    }

    pub fn toggle_rain(&mut self) {
        self.rain = !self.rain;
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Settings>(&json) {
                Ok(mut settings) => {
                    settings.set_volume(settings.volume);
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as JSON
    pub fn save(&self, path: &Path) -> Result<(), SimError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| SimError::Persistence(e.to_string()))?;
        fs::write(path, json).map_err(|e| SimError::Persistence(e.to_string()))?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_clamped() {
        let mut s = Settings::default();
        for _ in 0..30 {
            s.volume_up();
        }
        assert_eq!(s.volume, 1.0);
        for _ in 0..30 {
            s.volume_down();
        }
        assert_eq!(s.volume, 0.0);
    }

    #[test]
    fn test_toggles() {
        let mut s = Settings::default();
        s.toggle_rain();
        s.toggle_night();
        assert!(s.rain && s.night_mode);
        s.toggle_rain();
        assert!(!s.rain);
    }

    #[test]
    fn test_load_missing_or_bad_file() {
        let dir = std::env::temp_dir();
        let missing = dir.join(format!("traffic_rush_settings_missing_{}.json", std::process::id()));
        assert_eq!(Settings::load(&missing), Settings::default());

        let bad = dir.join(format!("traffic_rush_settings_bad_{}.json", std::process::id()));
        fs::write(&bad, r#"{"volume": 7.0, "rain": true}"#).unwrap();
        let loaded = Settings::load(&bad);
        assert_eq!(loaded.volume, 1.0);
        assert!(loaded.rain);
        let _ = fs::remove_file(&bad);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("traffic_rush_settings_saved_{}.json", std::process::id()));
        let mut s = Settings::default();
        s.toggle_rain();
        s.set_volume(0.8);
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path), s);
        let _ = fs::remove_file(&path);
    }
}
