//! pm-core: Shared types, traits, and utilities for pocketmix
//!
//! This crate provides the foundational types used across all pocketmix
//! crates: sound categories, clip/output/anchor identifiers, the
//! [`OutputHost`] boundary to the host engine, the error type, and a
//! deterministic [`HeadlessHost`] for tests and offline simulation.

mod error;
mod headless;
mod host;
mod spatial;
mod types;

pub use error::*;
pub use headless::*;
pub use host::*;
pub use spatial::*;
pub use types::*;
