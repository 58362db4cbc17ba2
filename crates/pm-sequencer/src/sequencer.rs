//! Clip Sequencer
//!
//! Drives up to three clip lists (music, sound, UI) through the playback
//! registry:
//! - Sequential: one clip per list per step, advancing a shared cursor
//! - Random: a random clip per list per step
//! - Together: every clip of every list at once
//! - Looping, one-step-per-play, and forced early advance
//!
//! ## Sequential timeline (loop, two sound clips)
//!
//! ```text
//! cursor:  0        1        2→0      1
//!          │        │        │        │
//! sound:   ██clip0██ ██clip1██ ██clip0██ ██clip1██ ...
//!          ▲ play    ▲ previous step finished → next dispatch
//! ```
//!
//! A step is dispatched only when every instance from the previous step has
//! finished.

use pm_core::{Anchor, ClipId, OutputHost, PmError, PmResult, SoundCategory};
use pm_playback::{InstanceKey, PlaybackRegistry, PlaybackRequest, PlaybackState};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::binder::{OutputBinder, SharedOutputBinder};
use crate::config::{SequencerConfig, clamp_pitch, clamp_random_pitch, sanitize_volume};
use crate::group::SequencerCommand;

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SequencerState {
    /// Not started, stopped, or dispatch disabled
    #[default]
    Idle = 0,
    /// Dispatching one step at a time
    DispatchingSequential = 1,
    /// Dispatching the whole set at once
    DispatchingTogether = 2,
    /// Tracked instances paused
    Paused = 3,
}

/// Per-entity clip queue
#[derive(Debug)]
pub struct ClipSequencer {
    config: SequencerConfig,
    binder: Box<dyn OutputBinder>,

    /// Position in the lists for the next sequential step
    next_index: usize,
    /// Together-mode dispatched at least once since the last queue reset
    played_together: bool,
    /// An explicit play was requested at least once
    started: bool,
    /// Dispatch allowed (cleared by stop and disable)
    enabled: bool,
    /// Entity usable; cleared on misconfiguration
    active: bool,
    paused: bool,
    /// Treat the current cycle as complete on the next check
    ignore_current: bool,

    /// Instances from the current cycle that have not finished
    dispatched: Vec<InstanceKey>,
    rng: ChaCha8Rng,
}

impl ClipSequencer {
    /// Sequencer routed through the registry's shared outputs
    pub fn new(config: SequencerConfig) -> Self {
        Self::with_binder(config, Box::new(SharedOutputBinder))
    }

    pub fn with_binder(config: SequencerConfig, binder: Box<dyn OutputBinder>) -> Self {
        Self {
            config: config.sanitized(),
            binder,
            next_index: 0,
            played_together: false,
            started: false,
            enabled: true,
            active: true,
            paused: false,
            ignore_current: false,
            dispatched: Vec::new(),
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    /// Use a deterministic random sequence
    pub fn seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed(seed);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn binder(&self) -> &dyn OutputBinder {
        self.binder.as_ref()
    }

    #[inline]
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Instances dispatched by the current cycle that are still tracked
    pub fn dispatched(&self) -> &[InstanceKey] {
        &self.dispatched
    }

    pub fn state(&self) -> SequencerState {
        if self.paused {
            SequencerState::Paused
        } else if !(self.active && self.started && self.enabled) {
            SequencerState::Idle
        } else if self.together_mode() {
            SequencerState::DispatchingTogether
        } else {
            SequencerState::DispatchingSequential
        }
    }

    fn together_mode(&self) -> bool {
        self.config.play_all_together && self.binder.allows_together()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Issue a play if `play_on_start` is set
    pub fn start<H: OutputHost>(&mut self, registry: &mut PlaybackRegistry<H>) -> PmResult<()> {
        if self.config.play_on_start {
            self.play(registry)?;
        }
        Ok(())
    }

    /// Explicit play: enable dispatch and dispatch right away.
    ///
    /// With no clips at all the sequencer deactivates itself.
    pub fn play<H: OutputHost>(&mut self, registry: &mut PlaybackRegistry<H>) -> PmResult<()> {
        if self.config.is_empty() {
            log::warn!("sequencer '{}': no clips set, deactivating", self.config.name);
            self.active = false;
            return Err(PmError::NoClips(self.config.name.clone()));
        }

        if let Err(e) = self.binder.validate(&self.config) {
            self.active = false;
            return Err(e);
        }

        self.active = true;
        self.started = true;
        self.enabled = true;
        self.paused = false;
        self.dispatch(registry, true)
    }

    /// Per-frame dispatch check
    pub fn tick<H: OutputHost>(&mut self, registry: &mut PlaybackRegistry<H>) {
        if !self.active {
            return;
        }
        if let Err(e) = self.dispatch(registry, false) {
            log::warn!("sequencer '{}': dispatch failed: {}", self.config.name, e);
        }
    }

    /// Stop tracked instances, disable dispatch and reset the queue
    pub fn stop<H: OutputHost>(&mut self, registry: &mut PlaybackRegistry<H>) {
        for key in &self.dispatched {
            if let Some(mut control) = registry.control(*key) {
                control.stop();
            }
        }
        self.enabled = false;
        self.paused = false;
        self.reset_queue();
    }

    pub fn reset_queue(&mut self) {
        self.next_index = 0;
        self.played_together = false;
    }

    /// Pause tracked instances; the queue position is kept
    pub fn pause<H: OutputHost>(&mut self, registry: &mut PlaybackRegistry<H>) {
        for key in &self.dispatched {
            if let Some(mut control) = registry.control(*key) {
                control.pause();
            }
        }
        self.paused = true;
    }

    pub fn unpause<H: OutputHost>(&mut self, registry: &mut PlaybackRegistry<H>) {
        for key in &self.dispatched {
            if let Some(mut control) = registry.control(*key) {
                control.unpause();
            }
        }
        self.paused = false;
    }

    /// Let the next dispatch check go ahead even if clips are still playing
    pub fn reset_time_clips_played(&mut self) {
        self.ignore_current = true;
    }

    /// Allow or block further dispatches without touching playing clips
    pub fn set_dispatch_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Run one [`SequencerCommand`]; only `Play` can fail
    pub fn apply<H: OutputHost>(
        &mut self,
        command: SequencerCommand,
        registry: &mut PlaybackRegistry<H>,
    ) -> PmResult<()> {
        match command {
            SequencerCommand::Play => return self.play(registry),
            SequencerCommand::ResetQueue => self.reset_queue(),
            SequencerCommand::Stop => self.stop(registry),
            SequencerCommand::Pause => self.pause(registry),
            SequencerCommand::Unpause => self.unpause(registry),
            SequencerCommand::ResetTimePlayed => self.reset_time_clips_played(),
            SequencerCommand::EnableDispatch => self.set_dispatch_enabled(true),
            SequencerCommand::DisableDispatch => self.set_dispatch_enabled(false),
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PARAMETERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Set the dispatch volume and push it to tracked instances
    pub fn set_volume<H: OutputHost>(&mut self, volume: f32, registry: &mut PlaybackRegistry<H>) {
        self.config.volume = sanitize_volume(volume);
        for key in &self.dispatched {
            if let Some(mut control) = registry.control(*key) {
                control.set_volume(self.config.volume);
            }
        }
    }

    /// Set the base pitch (0..3) and push it to tracked instances
    pub fn set_pitch<H: OutputHost>(&mut self, pitch: f32, registry: &mut PlaybackRegistry<H>) {
        self.config.pitch = clamp_pitch(pitch);
        for key in &self.dispatched {
            if let Some(mut control) = registry.control(*key) {
                control.set_pitch(self.config.pitch);
            }
        }
    }

    /// Set the random pitch offset, clamped to -3..3
    pub fn set_random_pitch(&mut self, random_pitch: f32) {
        self.config.random_pitch = clamp_random_pitch(random_pitch);
    }

    /// Replace one clip list. The cursor is clamped to the new longest list.
    pub fn set_clips(&mut self, category: SoundCategory, clips: Vec<ClipId>) {
        *self.config.clips_mut(category) = clips;
        self.next_index = self.next_index.min(self.config.longest_list());
    }

    /// Mutable access to flags and fades. Clip lists are changed through
    /// [`set_clips`](Self::set_clips).
    pub fn flags_mut(&mut self) -> SequencerFlags<'_> {
        SequencerFlags {
            config: &mut self.config,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DISPATCH
    // ═══════════════════════════════════════════════════════════════════════════

    fn dispatch<H: OutputHost>(
        &mut self,
        registry: &mut PlaybackRegistry<H>,
        explicit: bool,
    ) -> PmResult<()> {
        if !self.enabled || !self.started || self.paused {
            return Ok(());
        }
        if !registry.host().has_focus() {
            return Ok(());
        }

        if self.together_mode() {
            self.dispatch_together(registry, explicit)
        } else {
            self.dispatch_sequential(registry, explicit)
        }
    }

    fn dispatch_sequential<H: OutputHost>(
        &mut self,
        registry: &mut PlaybackRegistry<H>,
        explicit: bool,
    ) -> PmResult<()> {
        if self.next_index >= self.config.longest_list() && (self.config.loop_clips || explicit) {
            self.reset_queue();
        }

        if !self.cycle_complete(registry) || (!explicit && self.config.play_one_clip_only) {
            return Ok(());
        }

        let index = self.next_index;
        let fresh = index == 0;
        let mut dispatched_any = false;

        for category in SoundCategory::ALL {
            let len = self.config.clips(category).len();
            if len <= index {
                continue;
            }

            let pick = if self.config.random_play_clip {
                self.rng.random_range(0..len)
            } else {
                index
            };
            let clip = self.config.clips(category)[pick];
            self.dispatch_clip(registry, category, clip, explicit, fresh)?;
            dispatched_any = true;
        }

        if dispatched_any {
            self.next_index += 1;
        }
        Ok(())
    }

    fn dispatch_together<H: OutputHost>(
        &mut self,
        registry: &mut PlaybackRegistry<H>,
        explicit: bool,
    ) -> PmResult<()> {
        if !((self.played_together && self.config.loop_clips) || explicit) {
            return Ok(());
        }
        if !self.cycle_complete(registry) {
            return Ok(());
        }

        let fresh = !self.played_together;
        for category in SoundCategory::ALL {
            for i in 0..self.config.clips(category).len() {
                let clip = self.config.clips(category)[i];
                self.dispatch_clip(registry, category, clip, explicit, fresh)?;
            }
        }

        self.played_together = true;
        Ok(())
    }

    /// Drop finished keys; true when nothing from the cycle is still alive
    fn cycle_complete<H: OutputHost>(&mut self, registry: &PlaybackRegistry<H>) -> bool {
        self.dispatched
            .retain(|key| registry.playback_state(*key) != PlaybackState::Finished);

        if self.ignore_current {
            self.ignore_current = false;
            return true;
        }
        self.dispatched.is_empty()
    }

    fn fade_in_permitted(&self, explicit: bool, fresh: bool) -> bool {
        let first_only = self.config.fade_in_first_clip_only;
        let explicit_only = self.config.fade_in_after_explicit_play_only;

        if !first_only && !explicit_only {
            return true;
        }
        (first_only && fresh) || (explicit_only && explicit)
    }

    fn dispatch_clip<H: OutputHost>(
        &mut self,
        registry: &mut PlaybackRegistry<H>,
        category: SoundCategory,
        clip: ClipId,
        explicit: bool,
        fresh: bool,
    ) -> PmResult<()> {
        let config = &self.config;

        let request = match category {
            SoundCategory::Music => {
                let fade_in = if self.fade_in_permitted(explicit, fresh) {
                    config.fade_in_seconds
                } else {
                    0.0
                };
                PlaybackRequest::music(clip)
                    .fades(fade_in, config.fade_out_seconds)
                    .current_music_fade_out(config.current_music_fade_out_seconds)
                    .anchor(config.anchor)
            }
            SoundCategory::Sound => PlaybackRequest::sound(clip).anchor(config.anchor),
            SoundCategory::UiSound => PlaybackRequest::ui_sound(clip).anchor(Anchor::Default),
        }
        .volume(config.volume)
        .persist(config.persist_on_scene_load);

        let request = match self.binder.output() {
            Some(handle) => request.output(handle),
            None => request,
        };

        let key = registry.play(&request)?;

        let spread = self.config.random_pitch.abs();
        let offset = if spread > 0.0 {
            self.rng.random_range(-spread..=spread)
        } else {
            0.0
        };
        if let Some(mut control) = registry.control(key) {
            control.set_pitch(self.config.pitch + offset);
        }

        log::debug!(
            "sequencer '{}': dispatched {} {} (step {}, explicit: {})",
            self.config.name,
            category,
            clip,
            self.next_index,
            explicit
        );

        if !self.dispatched.contains(&key) {
            self.dispatched.push(key);
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FLAGS
// ═══════════════════════════════════════════════════════════════════════════════

/// Mutable view over the non-list parts of a sequencer configuration
pub struct SequencerFlags<'a> {
    config: &'a mut SequencerConfig,
}

impl SequencerFlags<'_> {
    pub fn loop_clips(&mut self, value: bool) -> &mut Self {
        self.config.loop_clips = value;
        self
    }

    pub fn random_play_clip(&mut self, value: bool) -> &mut Self {
        self.config.random_play_clip = value;
        self
    }

    pub fn play_all_together(&mut self, value: bool) -> &mut Self {
        self.config.play_all_together = value;
        self
    }

    pub fn play_one_clip_only(&mut self, value: bool) -> &mut Self {
        self.config.play_one_clip_only = value;
        self
    }

    pub fn persist_on_scene_load(&mut self, value: bool) -> &mut Self {
        self.config.persist_on_scene_load = value;
        self
    }

    pub fn fade_in_first_clip_only(&mut self, value: bool) -> &mut Self {
        self.config.fade_in_first_clip_only = value;
        self
    }

    pub fn fade_in_after_explicit_play_only(&mut self, value: bool) -> &mut Self {
        self.config.fade_in_after_explicit_play_only = value;
        self
    }

    pub fn fades(&mut self, fade_in_seconds: f32, fade_out_seconds: f32) -> &mut Self {
        self.config.fade_in_seconds = fade_in_seconds.max(0.0);
        self.config.fade_out_seconds = fade_out_seconds.max(0.0);
        self
    }

    pub fn current_music_fade_out(&mut self, seconds: Option<f32>) -> &mut Self {
        self.config.current_music_fade_out_seconds = seconds;
        self
    }

    pub fn anchor(&mut self, anchor: Anchor) -> &mut Self {
        self.config.anchor = anchor;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
