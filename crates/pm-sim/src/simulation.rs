//! Fixed-step scenario runner
//!
//! Each frame:
//!
//! ```text
//! due events → host clocks → sequencer ticks → registry tick
//! ```

use anyhow::{Context, Result, bail};
use pm_core::{HeadlessHost, PmResult, SoundCategory};
use pm_playback::{PlaybackRegistry, RegistryStats};
use pm_sequencer::{ClipSequencer, SequencerGroup, SequencerState};
use serde::{Deserialize, Serialize};

use crate::scenario::{Action, Scenario, TimedEvent};

/// Slack for event times that land between frames
const EVENT_TIME_EPSILON: f32 = 1e-4;

/// Keeps `duration / dt` from rounding up a whole extra frame
const FRAME_ROUNDING_SLACK: f32 = 1e-3;

/// Per-sequencer end state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerSummary {
    pub name: String,
    pub state: SequencerState,
    pub next_index: usize,
    pub tracked: usize,
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub frames: u64,
    pub simulated_seconds: f32,
    pub events_applied: usize,
    /// Failed commands, in order
    pub errors: Vec<String>,
    /// Highest simultaneous instance count per category
    pub peak_music: usize,
    pub peak_sound: usize,
    pub peak_ui_sound: usize,
    pub final_stats: RegistryStats,
    pub outputs_live: usize,
    pub outputs_destroyed: usize,
    pub sequencers: Vec<SequencerSummary>,
}

impl Report {
    pub fn peak(&self, category: SoundCategory) -> usize {
        match category {
            SoundCategory::Music => self.peak_music,
            SoundCategory::Sound => self.peak_sound,
            SoundCategory::UiSound => self.peak_ui_sound,
        }
    }

    fn record_peaks(&mut self, stats: &RegistryStats) {
        self.peak_music = self.peak_music.max(stats.active_music);
        self.peak_sound = self.peak_sound.max(stats.active_sound);
        self.peak_ui_sound = self.peak_ui_sound.max(stats.active_ui_sound);
    }
}

/// Registry, sequencers and timeline of one scenario
pub struct Simulation {
    registry: PlaybackRegistry<HeadlessHost>,
    group: SequencerGroup,
    events: Vec<TimedEvent>,
    next_event: usize,
    duration: f32,
    errors: Vec<String>,
}

impl Simulation {
    /// Build the session. `seed` makes every sequencer deterministic
    /// (member `i` uses `seed + i`).
    pub fn new(scenario: &Scenario, seed: Option<u64>) -> Result<Self> {
        let mut host = HeadlessHost::new();
        for clip in &scenario.clips {
            host.set_clip_duration(clip.id, clip.seconds);
        }

        let mut registry = PlaybackRegistry::new(host, scenario.registry.clone())
            .context("failed to create playback registry")?;
        registry.set_volumes(scenario.volumes);

        let mut group = SequencerGroup::new();
        for (i, config) in scenario.sequencers.iter().enumerate() {
            let mut sequencer = ClipSequencer::new(config.clone());
            if let Some(seed) = seed {
                sequencer.seed(seed.wrapping_add(i as u64));
            }
            group.add(sequencer);
        }

        let mut errors = Vec::new();
        if let Err(e) = group.start(&mut registry) {
            log::warn!("sequencer start failed: {}", e);
            errors.push(format!("start: {}", e));
        }

        log::info!(
            "simulation: {} sequencers, {} events, {:.2}s",
            group.len(),
            scenario.events.len(),
            scenario.duration_seconds
        );

        Ok(Self {
            registry,
            group,
            events: scenario.sorted_events(),
            next_event: 0,
            duration: scenario.duration_seconds,
            errors,
        })
    }

    /// Step at `dt` until `duration` (or the scenario's own duration) is reached
    pub fn run(mut self, dt: f32, duration: Option<f32>) -> Result<Report> {
        if !dt.is_finite() || dt <= 0.0 {
            bail!("frame delta must be positive, got {}", dt);
        }
        let duration = duration.unwrap_or(self.duration).max(0.0);
        let frames = (duration / dt - FRAME_ROUNDING_SLACK).ceil().max(0.0) as u64;

        let mut report = Report {
            frames,
            simulated_seconds: frames as f32 * dt,
            events_applied: 0,
            errors: Vec::new(),
            peak_music: 0,
            peak_sound: 0,
            peak_ui_sound: 0,
            final_stats: RegistryStats::default(),
            outputs_live: 0,
            outputs_destroyed: 0,
            sequencers: Vec::new(),
        };
        report.record_peaks(&self.registry.stats());

        for frame in 0..frames {
            let now = frame as f32 * dt;
            report.events_applied += self.apply_due_events(now);

            self.registry.host_mut().advance(dt);
            self.group.tick(&mut self.registry);
            report.record_peaks(&self.registry.stats());
            self.registry.tick(dt);
        }

        report.errors = std::mem::take(&mut self.errors);
        report.final_stats = self.registry.stats();
        report.outputs_live = self.registry.host().live_output_count();
        report.outputs_destroyed = self.registry.host().destroyed_count();
        report.sequencers = self
            .group
            .iter()
            .map(|s| SequencerSummary {
                name: s.name().to_string(),
                state: s.state(),
                next_index: s.next_index(),
                tracked: s.dispatched().len(),
            })
            .collect();

        log::info!(
            "simulation finished: {} frames, {} plays",
            report.frames,
            report.final_stats.instances_created + report.final_stats.instances_reused
        );
        Ok(report)
    }

    fn apply_due_events(&mut self, now: f32) -> usize {
        let mut applied = 0;
        while let Some(event) = self.events.get(self.next_event) {
            if event.at > now + EVENT_TIME_EPSILON {
                break;
            }
            let event = event.clone();
            self.next_event += 1;
            applied += 1;

            log::debug!("t={:.3}s: {:?}", now, event.action);
            if let Err(e) = self.apply(&event.action) {
                log::warn!("t={:.3}s: {:?} failed: {}", now, event.action, e);
                self.errors.push(format!("t={:.3}s: {}", event.at, e));
            }
        }
        applied
    }

    fn apply(&mut self, action: &Action) -> PmResult<()> {
        let registry = &mut self.registry;
        match action {
            Action::Sequencer {
                name: Some(name),
                command,
            } => match self.group.find_mut(name) {
                Some(sequencer) => sequencer.apply(*command, registry)?,
                None => log::warn!("no sequencer named '{}'", name),
            },
            Action::Sequencer {
                name: None,
                command,
            } => self.group.broadcast(*command, registry)?,
            Action::Play { request } => {
                registry.play(request)?;
            }
            Action::StopAll { category } => registry.stop_all(*category),
            Action::PauseAll { category } => registry.pause_all(*category),
            Action::UnpauseAll { category } => registry.unpause_all(*category),
            Action::SetVolume {
                category: Some(category),
                volume,
            } => registry.set_category_volume(*category, *volume),
            Action::SetVolume {
                category: None,
                volume,
            } => registry.set_global_volume(*volume),
            Action::Focus { focused } => {
                log::trace!("focus {}", if *focused { "gained" } else { "lost" });
                registry.host_mut().set_focus(*focused);
            }
            Action::SceneTransition {
                keep_pooled_outputs,
            } => registry.on_scene_transition(*keep_pooled_outputs),
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
