//! Host output boundary.
//!
//! The host engine owns the actual audio sources. pocketmix only ever talks
//! to them through this trait, addressing each one by an [`OutputHandle`].

use crate::{Anchor, ClipId, OutputHandle, SpatialParams};

/// Audio output facility provided by the host engine
pub trait OutputHost {
    /// Create an output resource attached to `anchor`
    fn create_output(&mut self, anchor: Anchor) -> OutputHandle;

    /// Destroy an output resource. Unknown handles are ignored.
    fn destroy_output(&mut self, handle: OutputHandle);

    /// Start playback of the assigned clip from time zero
    fn play(&mut self, handle: OutputHandle);

    /// Pause playback, keeping the position
    fn pause(&mut self, handle: OutputHandle);

    /// Resume paused playback
    fn unpause(&mut self, handle: OutputHandle);

    /// Stop playback and rewind
    fn stop(&mut self, handle: OutputHandle);

    /// Assign (or clear) the clip played by this output
    fn set_clip(&mut self, handle: OutputHandle, clip: Option<ClipId>);

    /// Clip currently assigned to this output
    fn clip(&self, handle: OutputHandle) -> Option<ClipId>;

    /// Final linear output volume (category and global volume already applied)
    fn set_volume(&mut self, handle: OutputHandle, volume: f32);

    fn set_loop(&mut self, handle: OutputHandle, looping: bool);

    fn set_mute(&mut self, handle: OutputHandle, mute: bool);

    /// Current mute state of the output
    fn mute(&self, handle: OutputHandle) -> bool;

    fn set_pitch(&mut self, handle: OutputHandle, pitch: f32);

    fn set_spatial(&mut self, handle: OutputHandle, params: &SpatialParams);

    /// Whether the output is still producing sound
    fn is_playing(&self, handle: OutputHandle) -> bool;

    /// Whether the application currently has input focus
    fn has_focus(&self) -> bool;
}
