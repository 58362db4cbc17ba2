//! pocketmix playback
//!
//! Fade-driven playback instances and the registry that owns them:
//! - [`FastSlotList`]: index-stable active-instance storage
//! - [`PlaybackInstance`]: per-playback volume/fade state machine
//! - [`InstancePool`] / [`OutputResourcePool`]: allocation-free reuse
//! - [`PlaybackRegistry`]: prepare/play/stop, per-tick update and reclaim
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      PLAYBACK REGISTRY                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                                │
//! │   play(request)          tick(dt)                             │
//! │       │                     │                                 │
//! │       ▼                     ▼                                 │
//! │   ┌──────────┐   ┌──────────────────────────────┐             │
//! │   │ Instance │──▶│ Music │ Sound │ UISound lists │             │
//! │   │   pool   │◀──│   (FastSlotList per category) │             │
//! │   └──────────┘   └──────────────┬───────────────┘             │
//! │   ┌──────────┐                  │ update / reclaim            │
//! │   │  Output  │◀─────────────────┘                             │
//! │   │   pool   │        OutputHost (host engine)                │
//! │   └──────────┘                                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pm_core::{ClipId, HeadlessHost};
//! use pm_playback::{PlaybackRegistry, PlaybackRequest, RegistryConfig};
//!
//! let mut registry = PlaybackRegistry::new(HeadlessHost::new(), RegistryConfig::default())?;
//! let key = registry.play(&PlaybackRequest::music(ClipId(1)).looping(true))?;
//!
//! // Once per frame
//! registry.tick(1.0 / 60.0);
//! ```

pub mod config;
pub mod instance;
pub mod pool;
pub mod registry;
pub mod slot_list;

// Re-exports
pub use config::{CategoryFlags, DEFAULT_POOLED_OUTPUT_LIMIT, RegistryConfig};
pub use instance::{
    InstanceId, InstanceSetup, OutputOwnership, PITCH_RANGE, PlaybackInstance, PlaybackState,
};
pub use pool::{InstancePool, OutputResourcePool};
pub use registry::{
    GlobalVolumes, InstanceControl, InstanceKey, PlaybackRegistry, PlaybackRequest, RegistryStats,
};
pub use slot_list::{DEFAULT_SLOT_CAPACITY, FastSlotList};
