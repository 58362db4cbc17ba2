//! Sequencer groups
//!
//! A group owns several sequencers (for example every clip queue attached to
//! one game object) and forwards commands to all of them.

use pm_core::{OutputHost, PmResult};
use pm_playback::PlaybackRegistry;
use serde::{Deserialize, Serialize};

use crate::sequencer::ClipSequencer;

/// Command broadcast to every member of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerCommand {
    Play,
    ResetQueue,
    Stop,
    Pause,
    Unpause,
    ResetTimePlayed,
    /// Allow dispatch; passes the command gate
    EnableDispatch,
    /// Block dispatch; passes the command gate
    DisableDispatch,
}

impl SequencerCommand {
    /// Commands that are delivered even while the group ignores commands
    pub fn bypasses_gate(&self) -> bool {
        matches!(self, Self::EnableDispatch | Self::DisableDispatch)
    }
}

/// Broadcast container for sequencers
#[derive(Debug)]
pub struct SequencerGroup {
    members: Vec<ClipSequencer>,
    commands_enabled: bool,
}

impl SequencerGroup {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            commands_enabled: true,
        }
    }

    /// Add a member and return its index
    pub fn add(&mut self, sequencer: ClipSequencer) -> usize {
        self.members.push(sequencer);
        self.members.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ClipSequencer> {
        self.members.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ClipSequencer> {
        self.members.get_mut(index)
    }

    pub fn find(&self, name: &str) -> Option<&ClipSequencer> {
        self.members.iter().find(|s| s.name() == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut ClipSequencer> {
        self.members.iter_mut().find(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipSequencer> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn commands_enabled(&self) -> bool {
        self.commands_enabled
    }

    /// Open or close the command gate.
    ///
    /// Opening always re-enables dispatch on every member. Closing also
    /// disables dispatch when `apply_to_dispatch` is set.
    pub fn set_commands_enabled(&mut self, enabled: bool, apply_to_dispatch: bool) {
        self.commands_enabled = enabled;
        if enabled || apply_to_dispatch {
            for member in &mut self.members {
                member.set_dispatch_enabled(enabled);
            }
        }
        log::debug!(
            "sequencer group: commands {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Forward `command` to every member.
    ///
    /// Every member receives the command even if an earlier one fails; the
    /// first error is returned.
    pub fn broadcast<H: OutputHost>(
        &mut self,
        command: SequencerCommand,
        registry: &mut PlaybackRegistry<H>,
    ) -> PmResult<()> {
        if !self.commands_enabled && !command.bypasses_gate() {
            log::trace!("sequencer group: ignored {:?}", command);
            return Ok(());
        }

        let mut first_error = None;
        for member in &mut self.members {
            if let Err(e) = member.apply(command, registry) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Start every member (honouring `play_on_start`); returns the first error
    pub fn start<H: OutputHost>(&mut self, registry: &mut PlaybackRegistry<H>) -> PmResult<()> {
        let mut first_error = None;
        for member in &mut self.members {
            if let Err(e) = member.start(registry) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn tick<H: OutputHost>(&mut self, registry: &mut PlaybackRegistry<H>) {
        for member in &mut self.members {
            member.tick(registry);
        }
    }
}

impl Default for SequencerGroup {
    fn default() -> Self {
        Self::new()
    }
}
