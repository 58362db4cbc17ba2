//! Spatial parameters forwarded to host outputs.
//!
//! pocketmix does no spatial math of its own; these values are clamped to
//! their valid ranges and handed to the host untouched otherwise.

use serde::{Deserialize, Serialize};

/// How an output attenuates over distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum RolloffMode {
    /// Logarithmic falloff (host default)
    #[default]
    Logarithmic = 0,
    /// Linear falloff between min and max distance
    Linear = 1,
    /// Host-defined custom curve
    Custom = 2,
}

/// Per-output spatial and mixing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialParams {
    /// Host voice priority (0 = highest, 256 = lowest)
    pub priority: u16,
    /// Stereo pan (-1 left .. 1 right)
    pub stereo_pan: f32,
    /// 0 = fully 2D, 1 = fully 3D
    pub spatial_blend: f32,
    /// Send amount into reverb zones (0 .. 1.1)
    pub reverb_zone_mix: f32,
    /// Doppler scale (0 .. 5)
    pub doppler_level: f32,
    /// Spread angle in degrees (0 .. 360)
    pub spread: f32,
    /// Distance attenuation model
    pub rolloff: RolloffMode,
    /// Distance within which the output stops getting louder
    pub min_distance: f32,
    /// Distance beyond which the output stops attenuating
    pub max_distance: f32,
}

impl Default for SpatialParams {
    fn default() -> Self {
        Self {
            priority: 128,
            stereo_pan: 0.0,
            spatial_blend: 1.0,
            reverb_zone_mix: 1.0,
            doppler_level: 1.0,
            spread: 0.0,
            rolloff: RolloffMode::Logarithmic,
            min_distance: 1.0,
            max_distance: 500.0,
        }
    }
}

impl SpatialParams {
    /// Return a copy with every field inside its valid range
    pub fn clamped(mut self) -> Self {
        self.priority = self.priority.min(256);
        self.stereo_pan = finite_or(self.stereo_pan, 0.0).clamp(-1.0, 1.0);
        self.spatial_blend = finite_or(self.spatial_blend, 1.0).clamp(0.0, 1.0);
        self.reverb_zone_mix = finite_or(self.reverb_zone_mix, 1.0).clamp(0.0, 1.1);
        self.doppler_level = finite_or(self.doppler_level, 1.0).clamp(0.0, 5.0);
        self.spread = finite_or(self.spread, 0.0).clamp(0.0, 360.0);
        self.min_distance = finite_or(self.min_distance, 1.0).max(0.0);
        self.max_distance = finite_or(self.max_distance, 500.0).max(self.min_distance);
        self
    }

    /// Set min/max 3D distances (clamped so that min <= max)
    pub fn with_distances(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self.clamped()
    }
}

#[inline]
fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
