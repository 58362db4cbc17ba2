//! Instance and output pools
//!
//! Two LIFO free-lists that keep steady-state playback allocation free:
//! dead [`PlaybackInstance`] objects, and output handles living on the
//! shared default anchor.

use pm_core::{Anchor, OutputHandle, OutputHost};

use crate::instance::PlaybackInstance;

// ═══════════════════════════════════════════════════════════════════════════════
// INSTANCE POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Free-list of dead playback instances
#[derive(Debug, Default)]
pub struct InstancePool {
    free: Vec<PlaybackInstance>,
    created: u64,
    reused: u64,
}

impl InstancePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop a dead instance, constructing one if the pool is empty.
    /// The caller must `init` it before use.
    pub fn acquire(&mut self) -> PlaybackInstance {
        match self.free.pop() {
            Some(instance) => {
                self.reused += 1;
                instance
            }
            None => {
                self.created += 1;
                PlaybackInstance::new()
            }
        }
    }

    /// Return a deleted instance
    pub fn release(&mut self, instance: PlaybackInstance) {
        debug_assert!(instance.is_deleted(), "released instance still bound");
        self.free.push(instance);
    }

    /// Instances waiting for reuse
    #[inline]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Instances constructed because the pool was empty
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Acquisitions served from the free-list
    pub fn reused(&self) -> u64 {
        self.reused
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT RESOURCE POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Free-list of output handles bound to the default anchor
#[derive(Debug, Default)]
pub struct OutputResourcePool {
    free: Vec<OutputHandle>,
    created: u64,
    reused: u64,
}

impl OutputResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop a pooled handle or ask the host for a new default-anchor output
    pub fn acquire(&mut self, host: &mut dyn OutputHost) -> OutputHandle {
        match self.free.pop() {
            Some(handle) => {
                self.reused += 1;
                handle
            }
            None => {
                self.created += 1;
                host.create_output(Anchor::Default)
            }
        }
    }

    /// Clear the handle's clip and make it available again
    pub fn release(&mut self, host: &mut dyn OutputHost, handle: OutputHandle) {
        host.set_clip(handle, None);
        self.free.push(handle);
    }

    /// Destroy the most recently pooled handles beyond `limit`.
    /// Returns how many were destroyed.
    pub fn trim(&mut self, host: &mut dyn OutputHost, limit: usize) -> usize {
        if self.free.len() <= limit {
            return 0;
        }

        let surplus: Vec<_> = self.free.drain(limit..).collect();
        for &handle in &surplus {
            host.destroy_output(handle);
        }
        surplus.len()
    }

    /// Destroy every pooled handle
    pub fn drain(&mut self, host: &mut dyn OutputHost) -> usize {
        self.trim(host, 0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn contains(&self, handle: OutputHandle) -> bool {
        self.free.contains(&handle)
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn reused(&self) -> u64 {
        self.reused
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
