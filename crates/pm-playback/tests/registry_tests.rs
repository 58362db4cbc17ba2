//! PlaybackRegistry Integration Tests
//!
//! Tests for:
//! - Fade timing through the registry tick
//! - Stop/reclaim and output routing (pooled, owned, borrowed)
//! - Pause freezing the fade clock
//! - Scene transitions and pooled output bookkeeping
//! - Single-music and duplicate policies
//! - Focus-loss auto-pause and background playback
//! - Category/global volume mixing

use approx::assert_relative_eq;
use pm_core::{Anchor, ClipId, HeadlessHost, OutputHost, SoundCategory};
use pm_playback::{
    InstanceKey, OutputOwnership, PlaybackRegistry, PlaybackRequest, PlaybackState,
    RegistryConfig,
};

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

const DT: f32 = 0.05;

fn create_registry() -> PlaybackRegistry<HeadlessHost> {
    create_registry_with(RegistryConfig::default())
}

fn create_registry_with(config: RegistryConfig) -> PlaybackRegistry<HeadlessHost> {
    PlaybackRegistry::new(HeadlessHost::new(), config).expect("registry")
}

/// Advance host clocks and the registry together for `seconds`
fn run(registry: &mut PlaybackRegistry<HeadlessHost>, seconds: f32) {
    let steps = (seconds / DT).round() as usize;
    for _ in 0..steps {
        registry.host_mut().advance(DT);
        registry.tick(DT);
    }
}

fn volume(registry: &PlaybackRegistry<HeadlessHost>, key: InstanceKey) -> f32 {
    registry.instance(key).expect("live instance").volume()
}

fn looping_sound(clip: u32) -> PlaybackRequest {
    PlaybackRequest::sound(ClipId(clip)).looping(true)
}

// ═══════════════════════════════════════════════════════════════════════════════
// FADES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_music_fades_in() {
    let mut registry = create_registry();
    let key = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true))
        .unwrap();

    // First tick only activates
    run(&mut registry, DT);
    assert_eq!(volume(&registry, key), 0.0);

    run(&mut registry, 0.5);
    let half = volume(&registry, key);
    assert!(half > 0.0 && half < 1.0, "mid-fade volume was {}", half);

    run(&mut registry, 0.6);
    assert_eq!(volume(&registry, key), 1.0);
}

#[test]
fn test_set_volume_with_fade() {
    let mut registry = create_registry();
    let key = registry.play(&looping_sound(1)).unwrap();
    run(&mut registry, DT);
    assert_eq!(volume(&registry, key), 1.0);

    registry
        .control(key)
        .unwrap()
        .set_volume_with(0.2, Some(1.0), None);

    run(&mut registry, 0.5);
    let half = volume(&registry, key);
    assert!(half > 0.2 && half < 1.0);
    assert_relative_eq!(half, 0.6, epsilon = 1e-3);

    run(&mut registry, 0.6);
    assert_eq!(volume(&registry, key), 0.2);
}

#[test]
fn test_volume_stays_in_range() {
    let mut registry = create_registry();
    let key = registry
        .play(&looping_sound(1).fades(0.3, 0.2))
        .unwrap();

    let targets = [1.5, -0.5, 0.7, f32::NAN, 0.0, 1.0, 0.35];
    for (i, target) in targets.into_iter().enumerate() {
        let fade = if i % 2 == 0 { None } else { Some(0.1 * i as f32) };
        registry.control(key).unwrap().set_volume_with(target, fade, None);

        for _ in 0..10 {
            registry.host_mut().advance(DT);
            registry.tick(DT);
            let v = volume(&registry, key);
            assert!((0.0..=1.0).contains(&v), "volume {} out of range", v);
        }
    }
}

#[test]
fn test_pause_freezes_fade() {
    let mut registry = create_registry();
    let key = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true))
        .unwrap();
    run(&mut registry, 0.5);

    registry.control(key).unwrap().pause();
    let before = registry.instance(key).map(|i| (i.volume(), i.fade_elapsed()));
    assert_eq!(registry.playback_state(key), PlaybackState::Paused);

    run(&mut registry, 2.0);
    registry.control(key).unwrap().unpause();
    let after = registry.instance(key).map(|i| (i.volume(), i.fade_elapsed()));

    assert_eq!(before, after);
    assert_eq!(registry.playback_state(key), PlaybackState::Playing);
}

// ═══════════════════════════════════════════════════════════════════════════════
// STOP & RECLAIM
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_stop_returns_output_to_pool() {
    let mut registry = create_registry();
    let key = registry.play(&looping_sound(1).fades(0.0, 0.5)).unwrap();
    run(&mut registry, 0.1);
    let handle = registry.instance(key).and_then(|i| i.output()).unwrap();

    registry.control(key).unwrap().stop();
    run(&mut registry, 0.2);
    assert!(registry.instance(key).is_some_and(|i| i.is_stopping()));

    run(&mut registry, 0.5);
    assert!(registry.instance(key).is_none());
    assert_eq!(registry.playback_state(key), PlaybackState::Finished);

    let stats = registry.stats();
    assert_eq!(stats.active_sound, 0);
    assert_eq!(stats.pooled_outputs, 1);
    assert_eq!(registry.host().clip(handle), None);

    // Next default-anchor playback reuses the same handle
    let next = registry.play(&looping_sound(2)).unwrap();
    assert_eq!(registry.instance(next).and_then(|i| i.output()), Some(handle));
    assert_eq!(registry.stats().outputs_reused, 1);
    assert_eq!(registry.stats().instances_reused, 1);
}

#[test]
fn test_stop_destroys_owned_output() {
    let mut registry = create_registry();
    let anchor = Anchor::Object(7);
    let key = registry.play(&looping_sound(1).anchor(anchor)).unwrap();
    run(&mut registry, 0.1);
    assert_eq!(registry.host().outputs_on(anchor), 1);

    registry.control(key).unwrap().stop();
    run(&mut registry, 0.1);

    assert!(registry.instance(key).is_none());
    assert_eq!(registry.host().outputs_on(anchor), 0);
    assert_eq!(registry.host().destroyed_count(), 1);
    assert_eq!(registry.stats().pooled_outputs, 0);
}

#[test]
fn test_borrowed_output_is_kept() {
    let mut registry = create_registry();
    let handle = registry.host_mut().create_output(Anchor::Object(3));
    let key = registry.play(&looping_sound(1).output(handle)).unwrap();
    assert_eq!(
        registry.instance(key).map(|i| i.ownership()),
        Some(OutputOwnership::Borrowed)
    );

    registry.control(key).unwrap().stop_instantly();
    run(&mut registry, 0.1);

    assert!(registry.instance(key).is_none());
    assert!(registry.host().output(handle).is_some());
    assert_eq!(registry.host().destroyed_count(), 0);
}

#[test]
fn test_rebinding_borrowed_output_replaces_previous() {
    let mut registry = create_registry();
    let handle = registry.host_mut().create_output(Anchor::Object(3));
    let first = registry
        .play(&looping_sound(1).fades(0.0, 0.5).output(handle))
        .unwrap();
    run(&mut registry, 0.2);
    registry.control(first).unwrap().stop();

    // The fading instance must not stop the output under its successor
    let second = registry.play(&looping_sound(2).output(handle)).unwrap();
    assert!(registry.instance(first).is_none());
    assert_eq!(registry.active_count(SoundCategory::Sound), 1);

    run(&mut registry, 1.0);
    assert_eq!(registry.playback_state(second), PlaybackState::Playing);
    let output = registry.host().output(handle).unwrap();
    assert_eq!(output.clip, Some(ClipId(2)));
    assert!(output.playing);
}

#[test]
fn test_natural_end_is_reclaimed() {
    let mut registry = create_registry();
    registry.host_mut().set_clip_duration(ClipId(3), 0.5);
    let key = registry.play(&PlaybackRequest::sound(ClipId(3))).unwrap();

    run(&mut registry, 0.25);
    assert_eq!(registry.playback_state(key), PlaybackState::Playing);

    run(&mut registry, 0.5);
    assert_eq!(registry.playback_state(key), PlaybackState::Finished);
    assert_eq!(registry.stats().pooled_outputs, 1);
    assert_eq!(registry.stats().pooled_instances, 1);
}

#[test]
fn test_prepared_but_not_played_is_reclaimed() {
    let mut registry = create_registry();
    let key = registry.prepare(&looping_sound(1)).unwrap();
    assert_eq!(registry.active_count(SoundCategory::Sound), 1);

    registry.tick(DT);
    assert!(registry.instance(key).is_none());
    assert_eq!(registry.active_count(SoundCategory::Sound), 0);
}

#[test]
fn test_stop_all_category() {
    let mut registry = create_registry();
    let sound = registry.play(&looping_sound(1)).unwrap();
    let ui = registry
        .play(&PlaybackRequest::ui_sound(ClipId(2)).looping(true))
        .unwrap();
    run(&mut registry, 0.1);

    registry.stop_all(Some(SoundCategory::Sound));
    run(&mut registry, 0.1);
    assert!(registry.instance(sound).is_none());
    assert!(registry.instance(ui).is_some());

    registry.stop_all(None);
    run(&mut registry, 0.1);
    assert_eq!(registry.stats().total_active(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCENE TRANSITION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_scene_transition_recycles_prepared_music() {
    let mut registry = create_registry();
    let pooled_before = registry.stats().pooled_outputs;

    registry
        .prepare(&PlaybackRequest::music(ClipId(1)).persist(false))
        .unwrap();
    registry.on_scene_transition(true);

    let stats = registry.stats();
    assert_eq!(stats.active_music, 0);
    assert_eq!(stats.pooled_outputs, pooled_before + 1);
}

#[test]
fn test_scene_transition_keeps_persistent() {
    let mut registry = create_registry();
    let kept = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true).persist(true))
        .unwrap();
    let dropped = registry.play(&looping_sound(2)).unwrap();
    run(&mut registry, 0.1);

    // Persistent but never activated
    let fresh = registry.prepare(&looping_sound(3).persist(true)).unwrap();

    registry.on_scene_transition(false);

    assert!(registry.instance(kept).is_some());
    assert!(registry.instance(dropped).is_none());
    assert!(registry.instance(fresh).is_none());

    // Idle pooled outputs were destroyed
    assert_eq!(registry.stats().pooled_outputs, 0);
    assert_eq!(registry.host().live_output_count(), 1);
}

#[test]
fn test_scene_transition_trims_pool() {
    let config = RegistryConfig {
        pooled_output_limit: 2,
        ..RegistryConfig::default()
    };
    let mut registry = create_registry_with(config);

    for clip in 0..5 {
        registry.prepare(&looping_sound(clip)).unwrap();
    }
    registry.on_scene_transition(true);

    assert_eq!(registry.stats().pooled_outputs, 2);
    assert_eq!(registry.host().live_output_count(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════════
// POLICIES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_only_one_music() {
    let mut registry = create_registry();
    let first = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true))
        .unwrap();
    run(&mut registry, 1.2);

    let second = registry
        .play(&PlaybackRequest::music(ClipId(2)).looping(true))
        .unwrap();
    assert!(registry.instance(first).is_some_and(|i| i.is_stopping()));

    run(&mut registry, 1.2);
    assert!(registry.instance(first).is_none());
    assert!(registry.instance(second).is_some());
    assert_eq!(registry.active_count(SoundCategory::Music), 1);
}

#[test]
fn test_replacement_fade_override() {
    let mut registry = create_registry();
    let first = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true).fades(0.0, 5.0))
        .unwrap();
    run(&mut registry, 0.1);

    registry
        .play(
            &PlaybackRequest::music(ClipId(2))
                .looping(true)
                .current_music_fade_out(Some(0.0)),
        )
        .unwrap();
    run(&mut registry, DT);

    assert!(registry.instance(first).is_none());
}

#[test]
fn test_multiple_music_allowed() {
    let config = RegistryConfig {
        only_one_playable_music: false,
        ..RegistryConfig::default()
    };
    let mut registry = create_registry_with(config);
    let first = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true))
        .unwrap();
    registry
        .play(&PlaybackRequest::music(ClipId(2)).looping(true))
        .unwrap();
    run(&mut registry, 0.2);

    assert!(registry.instance(first).is_some_and(|i| !i.is_stopping()));
    assert_eq!(registry.active_count(SoundCategory::Music), 2);
}

#[test]
fn test_set_config_switches_music_policy() {
    let mut registry = create_registry();
    let config = RegistryConfig {
        only_one_playable_music: false,
        ..registry.config().clone()
    };
    registry.set_config(config);
    assert!(!registry.config().only_one_playable_music);

    let first = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true))
        .unwrap();
    registry
        .play(&PlaybackRequest::music(ClipId(2)).looping(true))
        .unwrap();
    assert!(registry.instance(first).is_some_and(|i| !i.is_stopping()));
    assert_eq!(registry.active_count(SoundCategory::Music), 2);
}

#[test]
fn test_instances_lists_live_keys() {
    let mut registry = create_registry();
    let played: Vec<InstanceKey> = (1..=3)
        .map(|clip| registry.play(&looping_sound(clip)).unwrap())
        .collect();
    registry.delete(played[1]);

    let listed: Vec<InstanceKey> = registry
        .instances(SoundCategory::Sound)
        .map(|(key, _)| key)
        .collect();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&played[0]));
    assert!(listed.contains(&played[2]));
    assert!(listed.iter().all(|key| registry.instance(*key).is_some()));
    assert_eq!(registry.instances(SoundCategory::Music).count(), 0);
}

#[test]
fn test_duplicate_music_restarts_existing() {
    let mut config = RegistryConfig::default();
    config.ignore_duplicates.music = true;
    let mut registry = create_registry_with(config);

    let first = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true))
        .unwrap();
    run(&mut registry, 0.2);
    let again = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true))
        .unwrap();

    assert_eq!(first, again);
    assert!(registry.instance(first).is_some_and(|i| !i.is_stopping()));
    assert_eq!(registry.active_count(SoundCategory::Music), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FOCUS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_focus_loss_auto_pauses() {
    let mut registry = create_registry();
    let playing = registry.play(&looping_sound(1)).unwrap();
    let paused = registry.play(&looping_sound(2)).unwrap();
    run(&mut registry, 0.1);
    registry.control(paused).unwrap().pause();

    registry.host_mut().set_focus(false);
    run(&mut registry, 0.5);
    assert_eq!(registry.playback_state(playing), PlaybackState::Paused);
    assert_eq!(registry.host().playing_count(), 0);

    registry.host_mut().set_focus(true);
    run(&mut registry, DT);
    assert_eq!(registry.playback_state(playing), PlaybackState::Playing);

    // Caller's own pause survives the focus round-trip
    assert_eq!(registry.playback_state(paused), PlaybackState::Paused);
}

#[test]
fn test_play_during_focus_loss_is_held() {
    let mut registry = create_registry();
    registry.host_mut().set_clip_duration(ClipId(4), 0.5);
    registry.host_mut().set_focus(false);
    run(&mut registry, DT);

    let key = registry.play(&PlaybackRequest::sound(ClipId(4))).unwrap();
    run(&mut registry, 1.0);
    assert_eq!(registry.playback_state(key), PlaybackState::Paused);
    assert_eq!(registry.host().playing_count(), 0);

    registry.host_mut().set_focus(true);
    run(&mut registry, DT);
    assert_eq!(registry.playback_state(key), PlaybackState::Playing);

    run(&mut registry, 1.0);
    assert!(registry.instance(key).is_none());
}

#[test]
fn test_play_in_background() {
    let config = RegistryConfig {
        play_in_background: true,
        ..RegistryConfig::default()
    };
    let mut registry = create_registry_with(config);
    let key = registry
        .play(&PlaybackRequest::music(ClipId(1)).looping(true))
        .unwrap();

    registry.host_mut().set_focus(false);
    run(&mut registry, 0.5);

    assert_eq!(registry.playback_state(key), PlaybackState::Playing);
    assert!(volume(&registry, key) > 0.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// VOLUME MIX
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_category_and_global_volume_applied() {
    let mut registry = create_registry();
    registry.set_global_volume(0.5);
    registry.set_category_volume(SoundCategory::Sound, 0.5);

    let key = registry.play(&looping_sound(1)).unwrap();
    run(&mut registry, DT);

    let handle = registry.instance(key).and_then(|i| i.output()).unwrap();
    let output = registry.host().output(handle).unwrap();
    assert_relative_eq!(output.volume, 0.25);
    assert_eq!(volume(&registry, key), 1.0);
}
