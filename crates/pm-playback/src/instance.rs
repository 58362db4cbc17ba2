//! Playback Instance
//!
//! One in-flight playback: a clip bound to a host output, plus the volume
//! fade state machine that drives it.
//!
//! ## Fade model
//!
//! ```text
//!  volume
//!   1.0 ┤        ┌───────────── target
//!       │      ╱
//!       │    ╱      t = clamp01(elapsed / duration)
//!       │  ╱        v = lerp(start, target, t)
//!   0.0 ┼╱──────────────────────▶ time
//!       set_volume()
//! ```
//!
//! A decrease uses `fade_out_seconds`, an increase uses `fade_in_seconds`,
//! unless the call that started the transition passed its own duration. That
//! override lasts for one transition only. A zero duration is instantaneous.

use pm_core::{
    Anchor, ClipId, OutputHandle, OutputHost, SILENCE_EPSILON, SoundCategory, SpatialParams,
    clamp01, lerp, sanitize_delta,
};
use serde::{Deserialize, Serialize};

/// Unique identifier of a playback instance
pub type InstanceId = u64;

/// Lowest and highest pitch accepted by an instance
pub const PITCH_RANGE: (f32, f32) = (-3.0, 3.0);

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Queryable playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlaybackState {
    /// Not producing sound and eligible for reclamation (or already reclaimed)
    #[default]
    Finished = 0,
    /// Playing, including while fading out towards a stop
    Playing = 1,
    /// Paused by the caller or by focus loss
    Paused = 2,
}

/// Who is responsible for the output resource once the playback ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum OutputOwnership {
    /// Lives on the shared default anchor; returned to the output pool
    #[default]
    Pooled = 0,
    /// Created for a custom anchor; destroyed through the host
    Owned = 1,
    /// Supplied by the caller; stopped but never destroyed
    Borrowed = 2,
}

/// Everything needed to (re)initialize an instance
#[derive(Debug, Clone, Copy)]
pub struct InstanceSetup {
    pub id: InstanceId,
    pub category: SoundCategory,
    pub clip: ClipId,
    pub volume: f32,
    pub looping: bool,
    pub persist: bool,
    pub fade_in_seconds: f32,
    pub fade_out_seconds: f32,
    pub anchor: Anchor,
    pub output: OutputHandle,
    pub ownership: OutputOwnership,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAYBACK INSTANCE
// ═══════════════════════════════════════════════════════════════════════════════

/// One playback with its own fade/volume state
#[derive(Debug, Clone)]
pub struct PlaybackInstance {
    id: InstanceId,
    category: SoundCategory,
    clip: Option<ClipId>,

    current_volume: f32,
    target_volume: f32,
    initial_volume: f32,
    /// Seconds to reach a higher target volume
    pub fade_in_seconds: f32,
    /// Seconds to reach a lower target volume
    pub fade_out_seconds: f32,
    override_fade_seconds: Option<f32>,
    fade_elapsed: f32,
    fade_start_volume: f32,

    playing: bool,
    paused: bool,
    stopping: bool,
    activated: bool,
    deleted: bool,
    /// Paused by focus loss rather than by the caller
    pub(crate) auto_paused: bool,

    /// Survives scene transitions
    pub persist: bool,
    looping: bool,
    mute: bool,
    pitch: f32,
    spatial: SpatialParams,

    anchor: Anchor,
    output: Option<OutputHandle>,
    ownership: OutputOwnership,
}

impl PlaybackInstance {
    /// Create a dead instance, ready to be initialized from a pool
    pub fn new() -> Self {
        Self {
            id: 0,
            category: SoundCategory::Sound,
            clip: None,
            current_volume: 0.0,
            target_volume: 0.0,
            initial_volume: 0.0,
            fade_in_seconds: 0.0,
            fade_out_seconds: 0.0,
            override_fade_seconds: None,
            fade_elapsed: 0.0,
            fade_start_volume: 0.0,
            playing: false,
            paused: false,
            stopping: false,
            activated: false,
            deleted: true,
            auto_paused: false,
            persist: false,
            looping: false,
            mute: false,
            pitch: 1.0,
            spatial: SpatialParams::default(),
            anchor: Anchor::Default,
            output: None,
            ownership: OutputOwnership::Pooled,
        }
    }

    /// Reset every field and bind the instance to its output.
    ///
    /// The clip, loop flag and a silent volume are pushed to the output right
    /// away so `play()` can follow in the same frame; the remaining
    /// parameters are applied on the first update.
    pub fn init(&mut self, setup: InstanceSetup, host: &mut dyn OutputHost) {
        let volume = clamp01(setup.volume);

        *self = Self {
            id: setup.id,
            category: setup.category,
            clip: Some(setup.clip),
            target_volume: volume,
            initial_volume: volume,
            fade_in_seconds: setup.fade_in_seconds.max(0.0),
            fade_out_seconds: setup.fade_out_seconds.max(0.0),
            deleted: false,
            persist: setup.persist,
            looping: setup.looping,
            anchor: setup.anchor,
            output: Some(setup.output),
            ownership: setup.ownership,
            ..Self::new()
        };

        host.set_clip(setup.output, Some(setup.clip));
        host.set_loop(setup.output, setup.looping);
        host.set_volume(setup.output, 0.0);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    #[inline]
    pub fn category(&self) -> SoundCategory {
        self.category
    }

    #[inline]
    pub fn clip(&self) -> Option<ClipId> {
        self.clip
    }

    /// Current instance volume (before category/global volume)
    #[inline]
    pub fn volume(&self) -> f32 {
        self.current_volume
    }

    #[inline]
    pub fn target_volume(&self) -> f32 {
        self.target_volume
    }

    /// Seconds elapsed in the current fade
    #[inline]
    pub fn fade_elapsed(&self) -> f32 {
        self.fade_elapsed
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// True once the instance has run at least one update
    #[inline]
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    #[inline]
    pub fn is_muted(&self) -> bool {
        self.mute
    }

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    #[inline]
    pub fn spatial(&self) -> &SpatialParams {
        &self.spatial
    }

    #[inline]
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    #[inline]
    pub fn output(&self) -> Option<OutputHandle> {
        self.output
    }

    #[inline]
    pub fn ownership(&self) -> OutputOwnership {
        self.ownership
    }

    /// Playback state derived from the lifecycle flags
    pub fn state(&self) -> PlaybackState {
        if self.deleted {
            PlaybackState::Finished
        } else if self.paused {
            PlaybackState::Paused
        } else if self.playing || self.stopping {
            PlaybackState::Playing
        } else {
            PlaybackState::Finished
        }
    }

    /// Not playing and not paused: the registry will reclaim it
    #[inline]
    pub fn is_finished(&self) -> bool {
        !self.playing && !self.paused
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start from the beginning, fading to the initial volume
    pub fn play_default(&mut self, host: &mut dyn OutputHost) {
        self.play(self.initial_volume, host);
    }

    /// Start from the beginning, fading to `volume`
    pub fn play(&mut self, volume: f32, host: &mut dyn OutputHost) {
        let Some(output) = self.output else {
            return;
        };

        self.playing = true;
        self.stopping = false;
        host.play(output);
        self.set_volume(volume);
    }

    /// Fade out and stop. Does nothing while already stopping.
    pub fn stop(&mut self) {
        if self.stopping {
            return;
        }

        self.stopping = true;
        self.set_volume(0.0);
    }

    /// Stop with a zero-length fade; silent on the next update.
    /// Does nothing while already stopping.
    pub fn stop_instantly(&mut self) {
        if self.stopping {
            return;
        }

        self.stopping = true;
        self.set_volume_with(0.0, Some(0.0), None);
    }

    pub fn pause(&mut self, host: &mut dyn OutputHost) {
        self.paused = true;
        if let Some(output) = self.output {
            host.pause(output);
        }
    }

    pub fn unpause(&mut self, host: &mut dyn OutputHost) {
        if let Some(output) = self.output {
            host.unpause(output);
        }
        self.paused = false;
        self.auto_paused = false;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VOLUME
    // ═══════════════════════════════════════════════════════════════════════════

    /// Fade from the current volume to `volume` using the directional duration
    pub fn set_volume(&mut self, volume: f32) {
        self.set_volume_with(volume, None, None);
    }

    /// Fade to `volume`.
    ///
    /// `fade_seconds` overrides the directional duration for this transition
    /// only. `start_volume` jumps to that level before fading.
    pub fn set_volume_with(
        &mut self,
        volume: f32,
        fade_seconds: Option<f32>,
        start_volume: Option<f32>,
    ) {
        let target = clamp01(volume);
        let start = start_volume.map(clamp01).unwrap_or(self.current_volume);

        let fade = match fade_seconds {
            Some(seconds) => seconds.max(0.0),
            None if target < start => self.fade_out_seconds,
            None => self.fade_in_seconds,
        };

        self.target_volume = target;
        self.current_volume = start;
        self.fade_start_volume = start;
        self.fade_elapsed = 0.0;
        self.override_fade_seconds = Some(fade);
    }

    fn fade_duration(&self) -> f32 {
        match self.override_fade_seconds {
            Some(seconds) => seconds,
            None if self.current_volume > self.target_volume => self.fade_out_seconds,
            None => self.fade_in_seconds,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PARAMETERS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn set_loop(&mut self, looping: bool, host: &mut dyn OutputHost) {
        self.looping = looping;
        if let Some(output) = self.output {
            host.set_loop(output, looping);
        }
    }

    pub fn set_mute(&mut self, mute: bool, host: &mut dyn OutputHost) {
        self.mute = mute;
        if let Some(output) = self.output {
            host.set_mute(output, mute);
        }
    }

    /// Set pitch, clamped to [`PITCH_RANGE`]
    pub fn set_pitch(&mut self, pitch: f32, host: &mut dyn OutputHost) {
        self.pitch = if pitch.is_finite() {
            pitch.clamp(PITCH_RANGE.0, PITCH_RANGE.1)
        } else {
            1.0
        };
        if let Some(output) = self.output {
            host.set_pitch(output, self.pitch);
        }
    }

    pub fn set_spatial(&mut self, params: SpatialParams, host: &mut dyn OutputHost) {
        self.spatial = params.clamped();
        if let Some(output) = self.output {
            host.set_spatial(output, &self.spatial);
        }
    }

    pub fn set_3d_distances(&mut self, min: f32, max: f32, host: &mut dyn OutputHost) {
        let params = self.spatial.with_distances(min, max);
        self.set_spatial(params, host);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UPDATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Advance the fade by `dt` seconds and push the mixed volume.
    ///
    /// `mix` is the product of the category and global volumes. While
    /// `focused`, the host's playing flag is mirrored so that a clip that
    /// ended on its own is seen as finished.
    pub fn update(&mut self, dt: f32, mix: f32, focused: bool, host: &mut dyn OutputHost) {
        let Some(output) = self.output else {
            return;
        };
        let dt = sanitize_delta(dt);

        if !self.activated {
            self.apply_initial_parameters(output, host);
            self.activated = true;
            self.fade_elapsed = -dt;
        }

        if self.current_volume != self.target_volume {
            self.fade_elapsed += dt;

            let duration = self.fade_duration();
            let t = if duration <= 0.0 {
                1.0
            } else {
                self.fade_elapsed / duration
            };

            self.current_volume = if t >= 1.0 {
                self.target_volume
            } else {
                clamp01(lerp(self.fade_start_volume, self.target_volume, t))
            };
        } else if self.override_fade_seconds.is_some() {
            self.override_fade_seconds = None;
        }

        host.set_volume(output, self.current_volume * clamp01(mix));

        if self.stopping && self.current_volume <= SILENCE_EPSILON {
            host.stop(output);
            self.stopping = false;
            self.playing = false;
            self.paused = false;
        }

        if focused {
            let host_playing = host.is_playing(output);
            if host_playing != self.playing {
                self.playing = host_playing;
            }
        }
    }

    fn apply_initial_parameters(&mut self, output: OutputHandle, host: &mut dyn OutputHost) {
        host.set_clip(output, self.clip);
        host.set_loop(output, self.looping);
        host.set_pitch(output, self.pitch);

        match self.ownership {
            OutputOwnership::Pooled | OutputOwnership::Owned => {
                host.set_mute(output, self.mute);
                host.set_spatial(output, &self.spatial);
            }
            // The caller configured this output; keep its settings
            OutputOwnership::Borrowed => {
                self.mute = host.mute(output);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DELETION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Stop the output, clear all flags and unbind it.
    ///
    /// Returns the released handle; the caller routes it according to
    /// [`ownership`](Self::ownership).
    pub fn delete(&mut self, host: &mut dyn OutputHost) -> Option<OutputHandle> {
        let output = self.output.take();
        if let Some(handle) = output {
            host.stop(handle);
        }

        self.stopping = false;
        self.playing = false;
        self.paused = false;
        self.auto_paused = false;
        self.deleted = true;
        output
    }
}

impl Default for PlaybackInstance {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pm_core::HeadlessHost;

    fn setup(host: &mut HeadlessHost, fade_in: f32, fade_out: f32) -> PlaybackInstance {
        let output = host.create_output(Anchor::Default);
        let mut instance = PlaybackInstance::new();
        instance.init(
            InstanceSetup {
                id: 1,
                category: SoundCategory::Music,
                clip: ClipId(10),
                volume: 1.0,
                looping: true,
                persist: false,
                fade_in_seconds: fade_in,
                fade_out_seconds: fade_out,
                anchor: Anchor::Default,
                output,
                ownership: OutputOwnership::Pooled,
            },
            host,
        );
        instance
    }

    fn run(instance: &mut PlaybackInstance, host: &mut HeadlessHost, seconds: f32, dt: f32) {
        let steps = (seconds / dt).round() as usize;
        for _ in 0..steps {
            host.advance(dt);
            instance.update(dt, 1.0, true, host);
        }
    }

    #[test]
    fn test_new_instance_is_dead() {
        let instance = PlaybackInstance::new();
        assert!(instance.is_deleted());
        assert_eq!(instance.state(), PlaybackState::Finished);
        assert!(instance.output().is_none());
    }

    #[test]
    fn test_init_binds_clip() {
        let mut host = HeadlessHost::new();
        let instance = setup(&mut host, 1.0, 1.0);
        let output = instance.output().unwrap();

        assert!(!instance.is_deleted());
        assert_eq!(host.clip(output), Some(ClipId(10)));
        assert!(host.output(output).unwrap().looping);
        assert_eq!(instance.volume(), 0.0);
        assert_eq!(instance.target_volume(), 1.0);
    }

    #[test]
    fn test_first_update_is_fade_offset() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 1.0, 1.0);
        instance.play_default(&mut host);

        instance.update(0.1, 1.0, true, &mut host);
        assert!(instance.is_activated());
        // First step starts the clock at zero
        assert_eq!(instance.fade_elapsed(), 0.0);
        assert_eq!(instance.volume(), 0.0);

        instance.update(0.1, 1.0, true, &mut host);
        assert_relative_eq!(instance.volume(), 0.1, epsilon = 1e-5);
    }

    #[test]
    fn test_fade_reaches_target() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 0.0);
        instance.play(1.0, &mut host);
        instance.update(0.01, 1.0, true, &mut host);

        instance.set_volume_with(0.2, Some(1.0), None);
        run(&mut instance, &mut host, 0.5, 0.05);
        let half = instance.volume();
        assert!(half < 1.0 && half > 0.2, "halfway volume was {}", half);
        assert_relative_eq!(half, 0.6, epsilon = 1e-4);

        run(&mut instance, &mut host, 0.6, 0.05);
        assert_eq!(instance.volume(), 0.2);
    }

    #[test]
    fn test_directional_durations() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 4.0, 1.0);
        instance.play(1.0, &mut host);
        instance.update(0.0, 1.0, true, &mut host);
        run(&mut instance, &mut host, 4.0, 0.1);
        assert_relative_eq!(instance.volume(), 1.0, epsilon = 1e-4);

        // Decrease uses the fade-out duration (1s)
        instance.set_volume(0.0);
        run(&mut instance, &mut host, 0.5, 0.1);
        assert_relative_eq!(instance.volume(), 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_override_is_one_shot() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 2.0, 2.0);
        instance.play(1.0, &mut host);
        instance.update(0.0, 1.0, true, &mut host);

        instance.set_volume_with(0.5, Some(0.0), None);
        instance.update(0.1, 1.0, true, &mut host);
        assert_eq!(instance.volume(), 0.5);

        // Next update clears the override; a new derived transition uses 2s
        instance.update(0.1, 1.0, true, &mut host);
        instance.set_volume(1.0);
        run(&mut instance, &mut host, 1.0, 0.1);
        assert_relative_eq!(instance.volume(), 0.75, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_fade_is_instant() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 0.0);
        instance.play(0.8, &mut host);
        instance.update(0.016, 1.0, true, &mut host);
        assert_eq!(instance.volume(), 0.8);
        assert!(instance.volume().is_finite());
    }

    #[test]
    fn test_volume_clamped() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 0.0);
        instance.play(3.0, &mut host);
        instance.update(0.016, 1.0, true, &mut host);
        assert_eq!(instance.volume(), 1.0);

        instance.set_volume(-2.0);
        instance.update(0.016, 1.0, true, &mut host);
        assert_eq!(instance.volume(), 0.0);
    }

    #[test]
    fn test_stop_fades_then_stops_output() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 0.5);
        instance.play(1.0, &mut host);
        instance.update(0.016, 1.0, true, &mut host);

        instance.stop();
        assert!(instance.is_stopping());
        run(&mut instance, &mut host, 0.3, 0.1);
        assert!(instance.is_playing());

        run(&mut instance, &mut host, 0.3, 0.1);
        assert!(!instance.is_playing());
        assert!(!instance.is_stopping());
        assert!(!host.is_playing(instance.output().unwrap()));
        assert_eq!(instance.state(), PlaybackState::Finished);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 1.0);
        instance.play(1.0, &mut host);
        instance.update(0.016, 1.0, true, &mut host);

        instance.stop();
        run(&mut instance, &mut host, 0.5, 0.1);
        let elapsed = instance.fade_elapsed();

        // Second stop must not restart the fade
        instance.stop();
        assert_eq!(instance.fade_elapsed(), elapsed);
    }

    #[test]
    fn test_stop_instantly() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 10.0);
        instance.play(1.0, &mut host);
        instance.update(0.016, 1.0, true, &mut host);

        instance.stop_instantly();
        instance.update(0.016, 1.0, true, &mut host);
        assert_eq!(instance.volume(), 0.0);
        assert!(!instance.is_playing());
    }

    #[test]
    fn test_stop_instantly_keeps_slow_stop() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 10.0);
        instance.play(1.0, &mut host);
        instance.update(0.016, 1.0, true, &mut host);

        instance.stop();
        instance.update(0.016, 1.0, true, &mut host);
        instance.update(0.016, 1.0, true, &mut host);

        instance.stop_instantly();
        instance.update(0.016, 1.0, true, &mut host);
        assert!(instance.is_playing());
        assert!(instance.is_stopping());
        assert!(instance.volume() > 0.9);
    }

    #[test]
    fn test_mix_applied_to_output() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 0.0);
        instance.play(0.5, &mut host);
        instance.update(0.016, 0.5, true, &mut host);

        let output = instance.output().unwrap();
        assert_relative_eq!(host.output(output).unwrap().volume, 0.25);
    }

    #[test]
    fn test_natural_end_detected() {
        let mut host = HeadlessHost::new().with_clip(ClipId(10), 0.2);
        let mut instance = setup(&mut host, 0.0, 0.0);
        instance.set_loop(false, &mut host);
        instance.play(1.0, &mut host);

        run(&mut instance, &mut host, 0.3, 0.1);
        assert!(!instance.is_playing());
        assert!(instance.is_finished());
    }

    #[test]
    fn test_unfocused_update_does_not_mirror() {
        let mut host = HeadlessHost::new().with_clip(ClipId(10), 0.1);
        let mut instance = setup(&mut host, 0.0, 0.0);
        instance.set_loop(false, &mut host);
        instance.play(1.0, &mut host);

        host.advance(0.5);
        instance.update(0.5, 1.0, false, &mut host);
        assert!(instance.is_playing());

        instance.update(0.0, 1.0, true, &mut host);
        assert!(!instance.is_playing());
    }

    #[test]
    fn test_pitch_and_spatial_clamped() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 0.0);
        let output = instance.output().unwrap();

        instance.set_pitch(9.0, &mut host);
        assert_eq!(instance.pitch(), 3.0);
        assert_eq!(host.output(output).unwrap().pitch, 3.0);

        instance.set_3d_distances(5.0, 2.0, &mut host);
        assert_eq!(instance.spatial().min_distance, 5.0);
        assert_eq!(instance.spatial().max_distance, 5.0);
        assert_eq!(host.output(output).unwrap().spatial.max_distance, 5.0);
    }

    #[test]
    fn test_borrowed_output_keeps_host_settings() {
        let mut host = HeadlessHost::new();
        let output = host.create_output(Anchor::Object(4));
        host.set_mute(output, true);
        let custom = SpatialParams {
            spatial_blend: 0.0,
            ..SpatialParams::default()
        };
        host.set_spatial(output, &custom);

        let mut instance = PlaybackInstance::new();
        instance.init(
            InstanceSetup {
                id: 2,
                category: SoundCategory::Sound,
                clip: ClipId(3),
                volume: 1.0,
                looping: false,
                persist: false,
                fade_in_seconds: 0.0,
                fade_out_seconds: 0.0,
                anchor: Anchor::Object(4),
                output,
                ownership: OutputOwnership::Borrowed,
            },
            &mut host,
        );
        instance.play_default(&mut host);
        instance.update(0.016, 1.0, true, &mut host);

        assert!(instance.is_muted());
        assert_eq!(host.output(output).unwrap().spatial.spatial_blend, 0.0);
    }

    #[test]
    fn test_delete_releases_output() {
        let mut host = HeadlessHost::new();
        let mut instance = setup(&mut host, 0.0, 0.0);
        instance.play(1.0, &mut host);
        let output = instance.output();

        assert_eq!(instance.delete(&mut host), output);
        assert!(instance.is_deleted());
        assert!(instance.output().is_none());
        assert!(!host.is_playing(output.unwrap()));
        assert_eq!(instance.state(), PlaybackState::Finished);
    }
}
