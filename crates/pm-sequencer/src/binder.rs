//! Output binding strategies
//!
//! A sequencer asks its binder for the output each dispatch should use.
//! The shared binder lets the registry route by anchor; the exclusive binder
//! pins every dispatch to one caller-owned output (for example a source
//! wired into an external spatializer).

use std::fmt::Debug;

use pm_core::{OutputHandle, PmError, PmResult};

use crate::config::SequencerConfig;

/// Chooses the output handle for sequencer dispatches
pub trait OutputBinder: Debug {
    /// Output for the next dispatch; `None` lets the registry decide
    fn output(&self) -> Option<OutputHandle>;

    /// Whether every-clip-at-once dispatch is possible with this binder
    fn allows_together(&self) -> bool {
        true
    }

    /// Check the sequencer configuration before a play
    fn validate(&self, _config: &SequencerConfig) -> PmResult<()> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED
// ═══════════════════════════════════════════════════════════════════════════════

/// Registry-routed outputs (pooled on the default anchor, owned otherwise)
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedOutputBinder;

impl OutputBinder for SharedOutputBinder {
    fn output(&self) -> Option<OutputHandle> {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXCLUSIVE
// ═══════════════════════════════════════════════════════════════════════════════

/// Every dispatch borrows the same caller-provided output
#[derive(Debug, Clone, Copy)]
pub struct ExclusiveOutputBinder {
    handle: OutputHandle,
}

impl ExclusiveOutputBinder {
    /// Fails when the configuration mixes clip categories or no handle is given
    pub fn new(handle: Option<OutputHandle>, config: &SequencerConfig) -> PmResult<Self> {
        check_single_category(config)?;
        let handle = handle.ok_or_else(|| {
            log::error!("sequencer '{}': no output handle for exclusive binding", config.name);
            PmError::MissingOutput(config.name.clone())
        })?;
        Ok(Self { handle })
    }

    pub fn handle(&self) -> OutputHandle {
        self.handle
    }
}

impl OutputBinder for ExclusiveOutputBinder {
    fn output(&self) -> Option<OutputHandle> {
        Some(self.handle)
    }

    fn allows_together(&self) -> bool {
        false
    }

    fn validate(&self, config: &SequencerConfig) -> PmResult<()> {
        check_single_category(config)
    }
}

fn check_single_category(config: &SequencerConfig) -> PmResult<()> {
    if config.populated_categories() > 1 {
        log::error!(
            "sequencer '{}': more than one clip category with an exclusive output",
            config.name
        );
        return Err(PmError::MixedClipCategories(config.name.clone()));
    }
    Ok(())
}
