//! Playback Registry
//!
//! Core of the playback system. Handles:
//! - Preparing and starting playbacks per category (Music, Sound, UISound)
//! - Duplicate and single-music policies
//! - Per-tick fade updates and reclamation of finished instances
//! - Output routing (pooled, owned, borrowed) and scene transitions
//! - Global and per-category volume
//! - Focus-loss auto-pause
//!
//! ## Ownership
//!
//! The host owns the registry and passes it to whoever needs to start
//! playbacks. Only one registry may be alive per thread, and it never leaves
//! that thread.

use std::cell::Cell;
use std::marker::PhantomData;
use std::rc::Rc;

use pm_core::{
    Anchor, ClipId, OutputHandle, OutputHost, PmError, PmResult, SoundCategory, SpatialParams,
    clamp01, sanitize_delta,
};
use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::instance::{
    InstanceId, InstanceSetup, OutputOwnership, PlaybackInstance, PlaybackState,
};
use crate::pool::{InstancePool, OutputResourcePool};
use crate::slot_list::FastSlotList;

// ═══════════════════════════════════════════════════════════════════════════════
// KEYS & REQUESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Address of an instance inside the registry.
///
/// A key whose slot was reclaimed (or reused by another instance) resolves
/// to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceKey {
    pub category: SoundCategory,
    pub slot: usize,
    pub id: InstanceId,
}

/// Parameters of a playback to prepare or play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackRequest {
    pub category: SoundCategory,
    pub clip: Option<ClipId>,
    pub volume: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub persist: bool,
    pub fade_in_seconds: f32,
    pub fade_out_seconds: f32,
    /// Fade-out applied to music being replaced (music only)
    pub current_music_fade_out_seconds: Option<f32>,
    pub anchor: Anchor,
    /// Caller-supplied output; never destroyed by the registry
    pub output: Option<OutputHandle>,
    pub pitch: f32,
}

impl Default for PlaybackRequest {
    fn default() -> Self {
        Self {
            category: SoundCategory::Sound,
            clip: None,
            volume: 1.0,
            looping: false,
            persist: false,
            fade_in_seconds: 0.0,
            fade_out_seconds: 0.0,
            current_music_fade_out_seconds: None,
            anchor: Anchor::Default,
            output: None,
            pitch: 1.0,
        }
    }
}

impl PlaybackRequest {
    /// Music with one-second fades
    pub fn music(clip: ClipId) -> Self {
        Self {
            category: SoundCategory::Music,
            clip: Some(clip),
            fade_in_seconds: 1.0,
            fade_out_seconds: 1.0,
            ..Self::default()
        }
    }

    /// Sound effect, no fades
    pub fn sound(clip: ClipId) -> Self {
        Self {
            clip: Some(clip),
            ..Self::default()
        }
    }

    /// UI sound effect, no fades
    pub fn ui_sound(clip: ClipId) -> Self {
        Self {
            category: SoundCategory::UiSound,
            clip: Some(clip),
            ..Self::default()
        }
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn fades(mut self, fade_in_seconds: f32, fade_out_seconds: f32) -> Self {
        self.fade_in_seconds = fade_in_seconds;
        self.fade_out_seconds = fade_out_seconds;
        self
    }

    pub fn current_music_fade_out(mut self, seconds: Option<f32>) -> Self {
        self.current_music_fade_out_seconds = seconds;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn output(mut self, output: OutputHandle) -> Self {
        self.output = Some(output);
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VOLUMES & STATS
// ═══════════════════════════════════════════════════════════════════════════════

/// Global volume multipliers, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalVolumes {
    pub global: f32,
    pub music: f32,
    pub sound: f32,
    pub ui_sound: f32,
}

impl Default for GlobalVolumes {
    fn default() -> Self {
        Self {
            global: 1.0,
            music: 1.0,
            sound: 1.0,
            ui_sound: 1.0,
        }
    }
}

impl GlobalVolumes {
    #[inline]
    pub fn category(&self, category: SoundCategory) -> f32 {
        match category {
            SoundCategory::Music => self.music,
            SoundCategory::Sound => self.sound,
            SoundCategory::UiSound => self.ui_sound,
        }
    }

    /// Multiplier applied to instances of `category`
    #[inline]
    pub fn mix(&self, category: SoundCategory) -> f32 {
        self.category(category) * self.global
    }

    fn clamped(self) -> Self {
        Self {
            global: clamp01(self.global),
            music: clamp01(self.music),
            sound: clamp01(self.sound),
            ui_sound: clamp01(self.ui_sound),
        }
    }
}

/// Snapshot of registry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    pub active_music: usize,
    pub active_sound: usize,
    pub active_ui_sound: usize,
    pub pooled_instances: usize,
    pub pooled_outputs: usize,
    pub instances_created: u64,
    pub instances_reused: u64,
    pub outputs_created: u64,
    pub outputs_reused: u64,
}

impl RegistryStats {
    pub fn active(&self, category: SoundCategory) -> usize {
        match category {
            SoundCategory::Music => self.active_music,
            SoundCategory::Sound => self.active_sound,
            SoundCategory::UiSound => self.active_ui_sound,
        }
    }

    pub fn total_active(&self) -> usize {
        self.active_music + self.active_sound + self.active_ui_sound
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSTANCE CONTROL
// ═══════════════════════════════════════════════════════════════════════════════

/// Mutable access to one live instance together with the host
pub struct InstanceControl<'a> {
    instance: &'a mut PlaybackInstance,
    host: &'a mut dyn OutputHost,
}

impl InstanceControl<'_> {
    pub fn instance(&self) -> &PlaybackInstance {
        self.instance
    }

    pub fn play(&mut self, volume: f32) {
        self.instance.play(volume, self.host);
    }

    pub fn play_default(&mut self) {
        self.instance.play_default(self.host);
    }

    pub fn stop(&mut self) {
        self.instance.stop();
    }

    pub fn stop_instantly(&mut self) {
        self.instance.stop_instantly();
    }

    pub fn pause(&mut self) {
        self.instance.pause(self.host);
        self.instance.auto_paused = false;
    }

    pub fn unpause(&mut self) {
        self.instance.unpause(self.host);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.instance.set_volume(volume);
    }

    pub fn set_volume_with(&mut self, volume: f32, fade_seconds: Option<f32>, start: Option<f32>) {
        self.instance.set_volume_with(volume, fade_seconds, start);
    }

    pub fn set_fades(&mut self, fade_in_seconds: f32, fade_out_seconds: f32) {
        self.instance.fade_in_seconds = fade_in_seconds.max(0.0);
        self.instance.fade_out_seconds = fade_out_seconds.max(0.0);
    }

    pub fn set_persist(&mut self, persist: bool) {
        self.instance.persist = persist;
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.instance.set_loop(looping, self.host);
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.instance.set_mute(mute, self.host);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.instance.set_pitch(pitch, self.host);
    }

    pub fn set_spatial(&mut self, params: SpatialParams) {
        self.instance.set_spatial(params, self.host);
    }

    pub fn set_3d_distances(&mut self, min: f32, max: f32) {
        self.instance.set_3d_distances(min, max, self.host);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLE-INSTANCE GUARD
// ═══════════════════════════════════════════════════════════════════════════════

thread_local! {
    static REGISTRY_ALIVE: Cell<bool> = const { Cell::new(false) };
}

/// Marks the registry alive on this thread; also makes the registry `!Send`
#[derive(Debug)]
struct RegistryGuard {
    _not_send: PhantomData<Rc<()>>,
}

impl RegistryGuard {
    fn acquire() -> PmResult<Self> {
        if REGISTRY_ALIVE.with(|alive| alive.replace(true)) {
            return Err(PmError::RegistryAlreadyExists);
        }
        Ok(Self {
            _not_send: PhantomData,
        })
    }
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        REGISTRY_ALIVE.with(|alive| alive.set(false));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAYBACK REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Owner of every playback instance
pub struct PlaybackRegistry<H: OutputHost> {
    host: H,
    config: RegistryConfig,
    /// Active instances, indexed by `SoundCategory::index()`
    lists: [FastSlotList<PlaybackInstance>; 3],
    instance_pool: InstancePool,
    output_pool: OutputResourcePool,
    volumes: GlobalVolumes,
    next_id: InstanceId,
    /// Everything was paused because focus was lost
    focus_paused: bool,
    _guard: RegistryGuard,
}

impl<H: OutputHost> PlaybackRegistry<H> {
    /// Create the registry for this thread
    pub fn new(host: H, config: RegistryConfig) -> PmResult<Self> {
        config.validate()?;
        let guard = RegistryGuard::acquire()?;

        let capacity = config.slot_capacity;
        log::info!(
            "playback registry created (slots: {}, pooled output limit: {})",
            capacity,
            config.pooled_output_limit
        );

        Ok(Self {
            host,
            lists: [
                FastSlotList::with_capacity(capacity),
                FastSlotList::with_capacity(capacity),
                FastSlotList::with_capacity(capacity),
            ],
            config,
            instance_pool: InstancePool::new(),
            output_pool: OutputResourcePool::new(),
            volumes: GlobalVolumes::default(),
            next_id: 1,
            focus_paused: false,
            _guard: guard,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Replace the policies; slot capacity only affects future growth
    pub fn set_config(&mut self, config: RegistryConfig) {
        self.config = config;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PREPARE / PLAY
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create (or, with the duplicate policy, find) an instance without
    /// starting it. An instance that is not started by the next tick is
    /// reclaimed.
    ///
    /// An explicit output replaces whatever playback was bound to it.
    pub fn prepare(&mut self, request: &PlaybackRequest) -> PmResult<InstanceKey> {
        let category = request.category;
        let clip = request.clip.ok_or(PmError::MissingClip(category))?;

        if self.config.ignore_duplicates.get(category) {
            if let Some(key) = self.find_by_clip(category, clip) {
                log::debug!("{} {} already active, reusing instance {}", category, clip, key.id);
                return Ok(key);
            }
        }

        if let Some(handle) = request.output {
            self.release_borrowed(handle);
        }

        let (output, ownership, anchor) = match request.output {
            Some(handle) => (handle, OutputOwnership::Borrowed, request.anchor),
            None if request.anchor.is_default() => (
                self.output_pool.acquire(&mut self.host),
                OutputOwnership::Pooled,
                Anchor::Default,
            ),
            None => (
                self.host.create_output(request.anchor),
                OutputOwnership::Owned,
                request.anchor,
            ),
        };

        let id = self.next_id;
        self.next_id += 1;

        let mut instance = self.instance_pool.acquire();
        instance.init(
            InstanceSetup {
                id,
                category,
                clip,
                volume: request.volume,
                looping: request.looping,
                persist: request.persist,
                fade_in_seconds: request.fade_in_seconds,
                fade_out_seconds: request.fade_out_seconds,
                anchor,
                output,
                ownership,
            },
            &mut self.host,
        );
        if request.pitch != 1.0 {
            instance.set_pitch(request.pitch, &mut self.host);
        }

        let slot = self.lists[category.index()].insert(instance);
        log::debug!(
            "prepared {} {} as instance {} (slot {}, {:?})",
            category,
            clip,
            id,
            slot,
            ownership
        );

        Ok(InstanceKey { category, slot, id })
    }

    /// Prepare and start a playback.
    ///
    /// With the single-music policy, every current music instance is stopped
    /// first, using the request's replacement fade-out when given.
    pub fn play(&mut self, request: &PlaybackRequest) -> PmResult<InstanceKey> {
        if request.category == SoundCategory::Music && self.config.only_one_playable_music {
            self.stop_all_music_with_fade(request.current_music_fade_out_seconds);
        }

        let key = self.prepare(request)?;
        if let Some(mut control) = self.control(key) {
            control.play(request.volume);
        }

        // Started during focus loss: held until focus returns
        if self.focus_paused {
            if let Some(instance) = self.lists[key.category.index()].get_mut(key.slot) {
                instance.pause(&mut self.host);
                instance.auto_paused = true;
            }
        }
        Ok(key)
    }

    /// Reclaim every instance still bound to a caller-owned output.
    ///
    /// A borrowed output carries one playback at a time; the previous one
    /// would otherwise stop the output when its own fade-out finished.
    fn release_borrowed(&mut self, handle: OutputHandle) {
        for category in SoundCategory::ALL {
            let index = category.index();
            for slot in 0..self.lists[index].capacity() {
                let bound = self.lists[index]
                    .get(slot)
                    .is_some_and(|i| i.output() == Some(handle));
                if bound {
                    log::debug!(
                        "output {:?} rebound, reclaiming previous {} instance",
                        handle,
                        category
                    );
                    self.reclaim(category, slot);
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BULK TRANSPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Stop every instance of `category`, or of every category
    pub fn stop_all(&mut self, category: Option<SoundCategory>) {
        for category in Self::categories(category) {
            for (_, instance) in self.lists[category.index()].iter_mut() {
                instance.stop();
            }
        }
    }

    /// Stop all music, overriding each instance's fade-out when `fade_out_seconds` is given
    pub fn stop_all_music_with_fade(&mut self, fade_out_seconds: Option<f32>) {
        for (_, instance) in self.lists[SoundCategory::Music.index()].iter_mut() {
            if let Some(seconds) = fade_out_seconds.filter(|s| *s >= 0.0) {
                instance.fade_out_seconds = seconds;
            }
            instance.stop();
        }
    }

    pub fn pause_all(&mut self, category: Option<SoundCategory>) {
        for category in Self::categories(category) {
            for (_, instance) in self.lists[category.index()].iter_mut() {
                instance.pause(&mut self.host);
                instance.auto_paused = false;
            }
        }
    }

    pub fn unpause_all(&mut self, category: Option<SoundCategory>) {
        for category in Self::categories(category) {
            for (_, instance) in self.lists[category.index()].iter_mut() {
                instance.unpause(&mut self.host);
            }
        }
    }

    fn categories(category: Option<SoundCategory>) -> &'static [SoundCategory] {
        match category {
            Some(SoundCategory::Music) => &[SoundCategory::Music],
            Some(SoundCategory::Sound) => &[SoundCategory::Sound],
            Some(SoundCategory::UiSound) => &[SoundCategory::UiSound],
            None => &SoundCategory::ALL,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOOKUP
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn instance(&self, key: InstanceKey) -> Option<&PlaybackInstance> {
        self.lists[key.category.index()]
            .get(key.slot)
            .filter(|i| i.id() == key.id && !i.is_deleted())
    }

    /// First active instance of `category` playing `clip`
    pub fn find_by_clip(&self, category: SoundCategory, clip: ClipId) -> Option<InstanceKey> {
        self.lists[category.index()]
            .iter()
            .find(|(_, i)| i.clip() == Some(clip) && !i.is_deleted())
            .map(|(slot, i)| InstanceKey {
                category,
                slot,
                id: i.id(),
            })
    }

    /// State of an instance; unknown or reclaimed keys report `Finished`
    pub fn playback_state(&self, key: InstanceKey) -> PlaybackState {
        self.instance(key)
            .map(PlaybackInstance::state)
            .unwrap_or(PlaybackState::Finished)
    }

    pub fn control(&mut self, key: InstanceKey) -> Option<InstanceControl<'_>> {
        let instance = self.lists[key.category.index()]
            .get_mut(key.slot)
            .filter(|i| i.id() == key.id && !i.is_deleted())?;

        Some(InstanceControl {
            instance,
            host: &mut self.host,
        })
    }

    /// Iterate live instances of one category
    pub fn instances(
        &self,
        category: SoundCategory,
    ) -> impl Iterator<Item = (InstanceKey, &PlaybackInstance)> {
        self.lists[category.index()].iter().map(move |(slot, i)| {
            (
                InstanceKey {
                    category,
                    slot,
                    id: i.id(),
                },
                i,
            )
        })
    }

    pub fn active_count(&self, category: SoundCategory) -> usize {
        self.lists[category.index()].len()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active_music: self.active_count(SoundCategory::Music),
            active_sound: self.active_count(SoundCategory::Sound),
            active_ui_sound: self.active_count(SoundCategory::UiSound),
            pooled_instances: self.instance_pool.len(),
            pooled_outputs: self.output_pool.len(),
            instances_created: self.instance_pool.created(),
            instances_reused: self.instance_pool.reused(),
            outputs_created: self.output_pool.created(),
            outputs_reused: self.output_pool.reused(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DELETION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Force-delete an instance. Returns false for unknown keys.
    pub fn delete(&mut self, key: InstanceKey) -> bool {
        if self.instance(key).is_none() {
            return false;
        }
        self.reclaim(key.category, key.slot);
        true
    }

    fn reclaim(&mut self, category: SoundCategory, slot: usize) {
        let Some(mut instance) = self.lists[category.index()].remove(slot) else {
            return;
        };

        let ownership = instance.ownership();
        if let Some(output) = instance.delete(&mut self.host) {
            match ownership {
                OutputOwnership::Pooled => self.output_pool.release(&mut self.host, output),
                OutputOwnership::Owned => self.host.destroy_output(output),
                OutputOwnership::Borrowed => {}
            }
        }

        log::debug!(
            "reclaimed {} instance {} (slot {}, {:?})",
            category,
            instance.id(),
            slot,
            ownership
        );
        self.instance_pool.release(instance);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TICK
    // ═══════════════════════════════════════════════════════════════════════════

    /// Advance every instance by `dt` seconds and reclaim finished ones
    pub fn tick(&mut self, dt: f32) {
        let dt = sanitize_delta(dt);
        let focused = self.host.has_focus();

        if !focused && !self.config.play_in_background {
            if !self.focus_paused {
                self.auto_pause();
            }
            return;
        }

        if self.focus_paused {
            self.auto_resume();
        }

        for category in SoundCategory::ALL {
            let index = category.index();
            let mix = self.volumes.mix(category);

            for slot in 0..self.lists[index].capacity() {
                let finished = match self.lists[index].get_mut(slot) {
                    Some(instance) if !instance.is_paused() => {
                        instance.update(dt, mix, focused, &mut self.host);
                        instance.is_finished()
                    }
                    _ => false,
                };

                if finished {
                    self.reclaim(category, slot);
                }
            }
        }
    }

    fn auto_pause(&mut self) {
        let mut paused = 0;
        for list in &mut self.lists {
            for (_, instance) in list.iter_mut() {
                if instance.is_paused() {
                    continue;
                }
                instance.pause(&mut self.host);
                instance.auto_paused = true;
                paused += 1;
            }
        }

        self.focus_paused = true;
        log::trace!("focus lost: auto-paused {} instances", paused);
    }

    fn auto_resume(&mut self) {
        let mut resumed = 0;
        for list in &mut self.lists {
            for (_, instance) in list.iter_mut() {
                if instance.auto_paused {
                    instance.unpause(&mut self.host);
                    resumed += 1;
                }
            }
        }

        self.focus_paused = false;
        log::trace!("focus regained: resumed {} instances", resumed);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SCENE TRANSITION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Remove every instance that is not persistent or was never activated,
    /// then release idle default-anchor outputs.
    ///
    /// With `keep_pooled_outputs`, up to `pooled_output_limit` idle outputs
    /// stay pooled; otherwise all of them are destroyed.
    pub fn on_scene_transition(&mut self, keep_pooled_outputs: bool) {
        let mut removed = 0;

        for category in SoundCategory::ALL {
            let index = category.index();
            for slot in 0..self.lists[index].capacity() {
                let remove = self.lists[index]
                    .get(slot)
                    .is_some_and(|i| !i.persist || !i.is_activated());

                if remove {
                    self.reclaim(category, slot);
                    removed += 1;
                }
            }
        }

        let destroyed = if keep_pooled_outputs {
            self.output_pool
                .trim(&mut self.host, self.config.pooled_output_limit)
        } else {
            self.output_pool.drain(&mut self.host)
        };

        log::info!(
            "scene transition: removed {} instances, destroyed {} pooled outputs",
            removed,
            destroyed
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VOLUME
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn volumes(&self) -> GlobalVolumes {
        self.volumes
    }

    pub fn set_volumes(&mut self, volumes: GlobalVolumes) {
        self.volumes = volumes.clamped();
    }

    pub fn global_volume(&self) -> f32 {
        self.volumes.global
    }

    pub fn set_global_volume(&mut self, volume: f32) {
        self.volumes.global = clamp01(volume);
    }

    pub fn category_volume(&self, category: SoundCategory) -> f32 {
        self.volumes.category(category)
    }

    pub fn set_category_volume(&mut self, category: SoundCategory, volume: f32) {
        let volume = clamp01(volume);
        match category {
            SoundCategory::Music => self.volumes.music = volume,
            SoundCategory::Sound => self.volumes.sound = volume,
            SoundCategory::UiSound => self.volumes.ui_sound = volume,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
