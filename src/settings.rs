//! Session settings and preferences
//!
//! Persisted through the storage port under their own key, separate from the
//! profile and leaderboard.

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistenceError, Storage};

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "norm" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            _ => None,
        }
    }

    /// Multiplier on spawned monster health
    pub fn modifier(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 0.75,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 1.5,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: DifficultyPreset,
    /// How long UI events stay on screen (client-defined)
    pub ui_event_lifespan_ms: f64,
    /// Name written to the leaderboard
    pub player_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: DifficultyPreset::Normal,
            ui_event_lifespan_ms: 3000.0,
            player_name: "Survivor".to_string(),
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        Self {
            difficulty: preset,
            ..Self::default()
        }
    }

    /// Storage key
    const STORAGE_KEY: &'static str = "settings";

    /// Load settings, falling back to defaults when absent or malformed
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.read(Self::STORAGE_KEY) {
            Some(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    settings
                }
                Err(err) => {
                    log::warn!("Malformed settings ({err}), using defaults");
                    Self::default()
                }
            },
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(self)?;
        storage.write(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_parse_preset() {
        assert_eq!(DifficultyPreset::parse("HARD"), Some(DifficultyPreset::Hard));
        assert_eq!(DifficultyPreset::parse("nightmare"), None);
    }

    #[test]
    fn test_settings_round_trip_through_storage() {
        let mut storage = MemoryStorage::default();
        let settings = Settings::from_preset(DifficultyPreset::Easy);
        settings.save(&mut storage).unwrap();
        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let mut storage = MemoryStorage::default();
        storage.write("settings", r#"{"difficulty":"Hard"}"#).unwrap();
        let loaded = Settings::load(&storage);
        assert_eq!(loaded.difficulty, DifficultyPreset::Hard);
        assert_eq!(loaded.ui_event_lifespan_ms, 3000.0);
    }
}
