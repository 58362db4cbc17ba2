//! Scenario files
//!
//! A scenario describes one simulated session: registry settings, clip
//! lengths, the sequencers to create, and a timeline of commands.
//!
//! ```json
//! {
//!   "duration_seconds": 8.0,
//!   "clips": [{ "id": 1, "seconds": 0.5 }],
//!   "sequencers": [{ "name": "steps", "sound_clips": [1], "loop_clips": true }],
//!   "events": [{ "at": 0.0, "action": "sequencer", "name": "steps", "command": "Play" }]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use pm_core::{ClipId, SoundCategory};
use pm_playback::{GlobalVolumes, PlaybackRequest, RegistryConfig};
use pm_sequencer::{SequencerCommand, SequencerConfig};
use serde::{Deserialize, Serialize};

/// Registered clip length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipLength {
    pub id: ClipId,
    pub seconds: f32,
}

/// Something the timeline does at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Send a command to one sequencer, or to all of them when `name` is absent
    Sequencer {
        #[serde(default)]
        name: Option<String>,
        command: SequencerCommand,
    },
    /// Direct registry play
    Play { request: PlaybackRequest },
    StopAll {
        #[serde(default)]
        category: Option<SoundCategory>,
    },
    PauseAll {
        #[serde(default)]
        category: Option<SoundCategory>,
    },
    UnpauseAll {
        #[serde(default)]
        category: Option<SoundCategory>,
    },
    /// Global volume when `category` is absent
    SetVolume {
        #[serde(default)]
        category: Option<SoundCategory>,
        volume: f32,
    },
    Focus { focused: bool },
    SceneTransition {
        #[serde(default = "default_keep_pooled")]
        keep_pooled_outputs: bool,
    },
}

fn default_keep_pooled() -> bool {
    true
}

/// Timeline entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Seconds from the start of the run
    pub at: f32,
    #[serde(flatten)]
    pub action: Action,
}

/// Complete simulated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub duration_seconds: f32,
    pub registry: RegistryConfig,
    pub volumes: GlobalVolumes,
    pub clips: Vec<ClipLength>,
    pub sequencers: Vec<SequencerConfig>,
    pub events: Vec<TimedEvent>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            duration_seconds: 10.0,
            registry: RegistryConfig::default(),
            volumes: GlobalVolumes::default(),
            clips: Vec::new(),
            sequencers: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(json).context("invalid scenario JSON")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("in scenario {}", path.display()))
    }

    /// Reject timelines that reference unknown sequencers or bad times
    pub fn validate(&self) -> Result<()> {
        self.registry.validate()?;

        if !self.duration_seconds.is_finite() || self.duration_seconds < 0.0 {
            bail!("duration_seconds must be a non-negative number");
        }

        for (i, event) in self.events.iter().enumerate() {
            if !event.at.is_finite() || event.at < 0.0 {
                bail!("event {} has an invalid time {}", i, event.at);
            }
            if let Action::Sequencer {
                name: Some(name), ..
            } = &event.action
            {
                if !self.sequencers.iter().any(|s| &s.name == name) {
                    bail!("event {} targets unknown sequencer '{}'", i, name);
                }
            }
        }
        Ok(())
    }

    /// Events ordered by time; equal times keep file order
    pub fn sorted_events(&self) -> Vec<TimedEvent> {
        let mut events = self.events.clone();
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        events
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
