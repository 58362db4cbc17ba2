//! Identifiers and small value types shared by every pocketmix crate.

use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// SOUND CATEGORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Category of a playback. Each category has its own global volume
/// multiplier and duplicate policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SoundCategory {
    /// Background music
    Music = 0,
    /// One-shot and looping effects
    #[default]
    Sound = 1,
    /// Interface feedback sounds
    #[serde(alias = "UISound")]
    UiSound = 2,
}

impl SoundCategory {
    /// All categories in registry order
    pub const ALL: [SoundCategory; 3] = [
        SoundCategory::Music,
        SoundCategory::Sound,
        SoundCategory::UiSound,
    ];

    /// Dense index, usable for per-category arrays
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`index`](Self::index); `None` when out of range
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SoundCategory::Music),
            1 => Some(SoundCategory::Sound),
            2 => Some(SoundCategory::UiSound),
            _ => None,
        }
    }

    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            SoundCategory::Music => "Music",
            SoundCategory::Sound => "Sound",
            SoundCategory::UiSound => "UISound",
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HANDLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Host-owned audio clip identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub u32);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// Opaque handle to one host output resource (an audio source)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputHandle(pub u32);

/// Host scene object identifier
pub type AnchorId = u64;

/// Where an output resource lives.
///
/// Outputs on the shared default object are pooled and recycled; outputs on
/// any other object are created for one playback and destroyed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Anchor {
    /// The registry's own host object
    #[default]
    Default,
    /// A specific scene object (3D emitter)
    Object(AnchorId),
}

impl Anchor {
    /// Check if this is the shared default anchor
    #[inline]
    pub fn is_default(&self) -> bool {
        matches!(self, Anchor::Default)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NUMERIC HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Volume below this is treated as silence
pub const SILENCE_EPSILON: f32 = 1.0e-4;

/// Clamp to [0, 1]. NaN maps to 0.
#[inline]
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Linear interpolation with `t` clamped to [0, 1]. NaN `t` maps to 1,
/// so a zero-length fade lands on the target.
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
    from + (to - from) * t
}

/// Sanitize a frame delta: negative or non-finite deltas become 0.
#[inline]
pub fn sanitize_delta(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}
