//! Headless Host
//!
//! Deterministic in-memory [`OutputHost`] used by tests and the scenario
//! runner. Each output keeps a playback clock that advances with
//! [`HeadlessHost::advance`], so clips end naturally after their duration.

use std::collections::HashMap;

use crate::{Anchor, ClipId, OutputHandle, OutputHost, SpatialParams};

/// Clip length used when no duration was registered
pub const DEFAULT_CLIP_SECONDS: f32 = 1.0;

/// Simulated state of one host output
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessOutput {
    pub anchor: Anchor,
    pub clip: Option<ClipId>,
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
    pub mute: bool,
    pub spatial: SpatialParams,
    pub playing: bool,
    pub paused: bool,
    /// Playback position in seconds
    pub position: f32,
    /// Number of times `play` was requested
    pub play_count: u32,
}

impl HeadlessOutput {
    fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            clip: None,
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            mute: false,
            spatial: SpatialParams::default(),
            playing: false,
            paused: false,
            position: 0.0,
            play_count: 0,
        }
    }
}

/// In-memory host output facility
#[derive(Debug)]
pub struct HeadlessHost {
    outputs: HashMap<OutputHandle, HeadlessOutput>,
    clip_durations: HashMap<ClipId, f32>,
    next_handle: u32,
    focused: bool,
    created: usize,
    destroyed: usize,
}

impl HeadlessHost {
    /// Create a focused host with no outputs
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
            clip_durations: HashMap::new(),
            next_handle: 1,
            focused: true,
            created: 0,
            destroyed: 0,
        }
    }

    /// Register the length of a clip in seconds
    pub fn set_clip_duration(&mut self, clip: ClipId, seconds: f32) {
        self.clip_durations.insert(clip, seconds.max(0.0));
    }

    /// Builder form of [`set_clip_duration`](Self::set_clip_duration)
    pub fn with_clip(mut self, clip: ClipId, seconds: f32) -> Self {
        self.set_clip_duration(clip, seconds);
        self
    }

    /// Length of a clip in seconds
    pub fn clip_duration(&self, clip: ClipId) -> f32 {
        self.clip_durations
            .get(&clip)
            .copied()
            .unwrap_or(DEFAULT_CLIP_SECONDS)
    }

    /// Simulate focus gain/loss
    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Advance every unpaused output clock by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        let dt = crate::sanitize_delta(dt);
        let durations = &self.clip_durations;

        for output in self.outputs.values_mut() {
            if !output.playing || output.paused {
                continue;
            }

            let Some(clip) = output.clip else {
                output.playing = false;
                continue;
            };

            let duration = durations.get(&clip).copied().unwrap_or(DEFAULT_CLIP_SECONDS);
            output.position += dt * output.pitch.abs();

            if output.position >= duration {
                if output.looping && duration > 0.0 {
                    output.position %= duration;
                } else {
                    output.position = 0.0;
                    output.playing = false;
                }
            }
        }
    }

    /// Inspect one output
    pub fn output(&self, handle: OutputHandle) -> Option<&HeadlessOutput> {
        self.outputs.get(&handle)
    }

    /// Number of live outputs
    pub fn live_output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Number of live outputs attached to `anchor`
    pub fn outputs_on(&self, anchor: Anchor) -> usize {
        self.outputs.values().filter(|o| o.anchor == anchor).count()
    }

    /// Total outputs ever created
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Total outputs ever destroyed
    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    /// Outputs that are currently audible
    pub fn playing_count(&self) -> usize {
        self.outputs
            .values()
            .filter(|o| o.playing && !o.paused)
            .count()
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputHost for HeadlessHost {
    fn create_output(&mut self, anchor: Anchor) -> OutputHandle {
        let handle = OutputHandle(self.next_handle);
        self.next_handle += 1;
        self.created += 1;
        self.outputs.insert(handle, HeadlessOutput::new(anchor));
        log::trace!("headless: created output {:?} on {:?}", handle, anchor);
        handle
    }

    fn destroy_output(&mut self, handle: OutputHandle) {
        if self.outputs.remove(&handle).is_some() {
            self.destroyed += 1;
            log::trace!("headless: destroyed output {:?}", handle);
        }
    }

    fn play(&mut self, handle: OutputHandle) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            output.playing = output.clip.is_some();
            output.paused = false;
            output.position = 0.0;
            output.play_count += 1;
        }
    }

    fn pause(&mut self, handle: OutputHandle) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            if output.playing {
                output.paused = true;
            }
        }
    }

    fn unpause(&mut self, handle: OutputHandle) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            output.paused = false;
        }
    }

    fn stop(&mut self, handle: OutputHandle) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            output.playing = false;
            output.paused = false;
            output.position = 0.0;
        }
    }

    fn set_clip(&mut self, handle: OutputHandle, clip: Option<ClipId>) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            output.clip = clip;
        }
    }

    fn clip(&self, handle: OutputHandle) -> Option<ClipId> {
        self.outputs.get(&handle).and_then(|o| o.clip)
    }

    fn set_volume(&mut self, handle: OutputHandle, volume: f32) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            output.volume = volume;
        }
    }

    fn set_loop(&mut self, handle: OutputHandle, looping: bool) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            output.looping = looping;
        }
    }

    fn set_mute(&mut self, handle: OutputHandle, mute: bool) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            output.mute = mute;
        }
    }

    fn mute(&self, handle: OutputHandle) -> bool {
        self.outputs.get(&handle).is_some_and(|o| o.mute)
    }

    fn set_pitch(&mut self, handle: OutputHandle, pitch: f32) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            output.pitch = pitch;
        }
    }

    fn set_spatial(&mut self, handle: OutputHandle, params: &SpatialParams) {
        if let Some(output) = self.outputs.get_mut(&handle) {
            output.spatial = *params;
        }
    }

    fn is_playing(&self, handle: OutputHandle) -> bool {
        self.outputs
            .get(&handle)
            .is_some_and(|o| o.playing && !o.paused)
    }

    fn has_focus(&self) -> bool {
        self.focused
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
