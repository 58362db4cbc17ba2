//! Sequencer configuration

use std::path::Path;

use pm_core::{Anchor, ClipId, PmError, PmResult, SoundCategory};
use serde::{Deserialize, Serialize};

/// Accepted range of the base pitch
pub const PITCH_LIMITS: (f32, f32) = (0.0, 3.0);

/// Accepted range of the random pitch offset
pub const RANDOM_PITCH_LIMITS: (f32, f32) = (-3.0, 3.0);

/// Clip lists, dispatch flags and playback parameters of one sequencer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Name used in log messages and errors
    pub name: String,

    pub music_clips: Vec<ClipId>,
    pub sound_clips: Vec<ClipId>,
    #[serde(alias = "ui_clips")]
    pub ui_sound_clips: Vec<ClipId>,

    /// Volume forwarded to every dispatch (instances clamp to 1)
    pub volume: f32,
    /// Base pitch, 0..3
    pub pitch: f32,
    /// Per-dispatch pitch offset drawn from -|r|..|r|
    pub random_pitch: f32,
    pub fade_in_seconds: f32,
    pub fade_out_seconds: f32,
    /// Fade-out for music replaced by this sequencer's music
    pub current_music_fade_out_seconds: Option<f32>,

    /// Restart the queue after the last clip
    pub loop_clips: bool,
    /// Pick a random clip per list instead of the cursor position
    pub random_play_clip: bool,
    /// Dispatch every clip of every list at once
    pub play_all_together: bool,
    /// Dispatch only on explicit play, one step at a time
    pub play_one_clip_only: bool,
    pub persist_on_scene_load: bool,
    pub fade_in_first_clip_only: bool,
    pub fade_in_after_explicit_play_only: bool,
    /// `start()` issues a play
    pub play_on_start: bool,

    /// Placement of music and sound dispatches; UI sounds always use the default
    pub anchor: Anchor,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            name: "sequencer".into(),
            music_clips: Vec::new(),
            sound_clips: Vec::new(),
            ui_sound_clips: Vec::new(),
            volume: 1.0,
            pitch: 1.0,
            random_pitch: 0.0,
            fade_in_seconds: 2.0,
            fade_out_seconds: 2.0,
            current_music_fade_out_seconds: None,
            loop_clips: false,
            random_play_clip: false,
            play_all_together: false,
            play_one_clip_only: false,
            persist_on_scene_load: false,
            fade_in_first_clip_only: false,
            fade_in_after_explicit_play_only: false,
            play_on_start: false,
            anchor: Anchor::Default,
        }
    }
}

impl SequencerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse from JSON and clamp parameters into range
    pub fn from_json_str(json: &str) -> PmResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PmError::Serialization(e.to_string()))?;
        Ok(config.sanitized())
    }

    pub fn from_file(path: impl AsRef<Path>) -> PmResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Copy with volume, pitch, random pitch and fades inside their ranges
    pub fn sanitized(mut self) -> Self {
        self.volume = sanitize_volume(self.volume);
        self.pitch = clamp_pitch(self.pitch);
        self.random_pitch = clamp_random_pitch(self.random_pitch);
        self.fade_in_seconds = self.fade_in_seconds.max(0.0);
        self.fade_out_seconds = self.fade_out_seconds.max(0.0);
        self
    }

    pub fn clips(&self, category: SoundCategory) -> &[ClipId] {
        match category {
            SoundCategory::Music => &self.music_clips,
            SoundCategory::Sound => &self.sound_clips,
            SoundCategory::UiSound => &self.ui_sound_clips,
        }
    }

    pub fn clips_mut(&mut self, category: SoundCategory) -> &mut Vec<ClipId> {
        match category {
            SoundCategory::Music => &mut self.music_clips,
            SoundCategory::Sound => &mut self.sound_clips,
            SoundCategory::UiSound => &mut self.ui_sound_clips,
        }
    }

    /// No clip in any list
    pub fn is_empty(&self) -> bool {
        self.music_clips.is_empty() && self.sound_clips.is_empty() && self.ui_sound_clips.is_empty()
    }

    /// Length of the longest list
    pub fn longest_list(&self) -> usize {
        self.music_clips
            .len()
            .max(self.sound_clips.len())
            .max(self.ui_sound_clips.len())
    }

    /// Number of lists with at least one clip
    pub fn populated_categories(&self) -> usize {
        SoundCategory::ALL
            .iter()
            .filter(|c| !self.clips(**c).is_empty())
            .count()
    }

    // Builder helpers

    pub fn with_clips(mut self, category: SoundCategory, clips: impl IntoIterator<Item = ClipId>) -> Self {
        *self.clips_mut(category) = clips.into_iter().collect();
        self
    }

    pub fn looping(mut self, loop_clips: bool) -> Self {
        self.loop_clips = loop_clips;
        self
    }

    pub fn random(mut self, random_play_clip: bool) -> Self {
        self.random_play_clip = random_play_clip;
        self
    }

    pub fn together(mut self, play_all_together: bool) -> Self {
        self.play_all_together = play_all_together;
        self
    }

    pub fn one_clip_only(mut self, play_one_clip_only: bool) -> Self {
        self.play_one_clip_only = play_one_clip_only;
        self
    }

    pub fn fades(mut self, fade_in_seconds: f32, fade_out_seconds: f32) -> Self {
        self.fade_in_seconds = fade_in_seconds.max(0.0);
        self.fade_out_seconds = fade_out_seconds.max(0.0);
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
}

pub(crate) fn sanitize_volume(volume: f32) -> f32 {
    if volume.is_finite() { volume.max(0.0) } else { 0.0 }
}

pub(crate) fn clamp_pitch(pitch: f32) -> f32 {
    if pitch.is_finite() {
        pitch.clamp(PITCH_LIMITS.0, PITCH_LIMITS.1)
    } else {
        1.0
    }
}

pub(crate) fn clamp_random_pitch(random_pitch: f32) -> f32 {
    if random_pitch.is_finite() {
        random_pitch.clamp(RANDOM_PITCH_LIMITS.0, RANDOM_PITCH_LIMITS.1)
    } else {
        0.0
    }
}
