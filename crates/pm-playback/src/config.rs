//! Registry configuration

use std::path::Path;

use pm_core::{PmError, PmResult, SoundCategory};
use serde::{Deserialize, Serialize};

use crate::slot_list::DEFAULT_SLOT_CAPACITY;

/// Default number of idle default-anchor outputs kept across scene loads
pub const DEFAULT_POOLED_OUTPUT_LIMIT: usize = 32;

/// One boolean per sound category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryFlags {
    pub music: bool,
    pub sound: bool,
    #[serde(alias = "ui")]
    pub ui_sound: bool,
}

impl CategoryFlags {
    pub const NONE: Self = Self {
        music: false,
        sound: false,
        ui_sound: false,
    };

    pub const ALL: Self = Self {
        music: true,
        sound: true,
        ui_sound: true,
    };

    #[inline]
    pub fn get(&self, category: SoundCategory) -> bool {
        match category {
            SoundCategory::Music => self.music,
            SoundCategory::Sound => self.sound,
            SoundCategory::UiSound => self.ui_sound,
        }
    }

    pub fn set(&mut self, category: SoundCategory, value: bool) {
        match category {
            SoundCategory::Music => self.music = value,
            SoundCategory::Sound => self.sound = value,
            SoundCategory::UiSound => self.ui_sound = value,
        }
    }
}

/// Playback registry policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Starting a music clip stops every other music clip
    pub only_one_playable_music: bool,
    /// Per category: a request for a clip already active returns the
    /// existing instance instead of creating a new one
    pub ignore_duplicates: CategoryFlags,
    /// Keep playing while the host has no focus
    pub play_in_background: bool,
    /// Initial slot count of each category list
    pub slot_capacity: usize,
    /// Idle default-anchor outputs kept through a scene transition
    pub pooled_output_limit: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            only_one_playable_music: true,
            ignore_duplicates: CategoryFlags::NONE,
            play_in_background: false,
            slot_capacity: DEFAULT_SLOT_CAPACITY,
            pooled_output_limit: DEFAULT_POOLED_OUTPUT_LIMIT,
        }
    }
}

impl RegistryConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> PmResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PmError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> PmResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> PmResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PmError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> PmResult<()> {
        if self.slot_capacity == 0 {
            return Err(PmError::Config("slot_capacity must be at least 1".into()));
        }
        Ok(())
    }
}
