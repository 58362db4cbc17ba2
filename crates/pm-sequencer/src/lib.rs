//! pocketmix sequencer
//!
//! Clip queues ("pockets") that dispatch music, sound and UI clips through a
//! [`PlaybackRegistry`](pm_playback::PlaybackRegistry):
//! - [`ClipSequencer`]: sequential, random and all-at-once dispatch
//! - [`OutputBinder`]: shared or exclusive output routing
//! - [`SequencerGroup`]: command broadcast over several sequencers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pm_core::{ClipId, HeadlessHost, SoundCategory};
//! use pm_playback::{PlaybackRegistry, RegistryConfig};
//! use pm_sequencer::{ClipSequencer, SequencerConfig};
//!
//! let mut registry = PlaybackRegistry::new(HeadlessHost::new(), RegistryConfig::default())?;
//! let config = SequencerConfig::new("footsteps")
//!     .with_clips(SoundCategory::Sound, [ClipId(1), ClipId(2)])
//!     .looping(true);
//! let mut sequencer = ClipSequencer::new(config);
//! sequencer.play(&mut registry)?;
//!
//! // Once per frame, before the registry tick
//! sequencer.tick(&mut registry);
//! registry.tick(1.0 / 60.0);
//! ```

pub mod binder;
pub mod config;
pub mod group;
pub mod sequencer;

// Re-exports
pub use binder::{ExclusiveOutputBinder, OutputBinder, SharedOutputBinder};
pub use config::{PITCH_LIMITS, RANDOM_PITCH_LIMITS, SequencerConfig};
pub use group::{SequencerCommand, SequencerGroup};
pub use sequencer::{ClipSequencer, SequencerFlags, SequencerState};
