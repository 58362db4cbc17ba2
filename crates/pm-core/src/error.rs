//! Error types for pocketmix

use thiserror::Error;

use crate::SoundCategory;

/// Core error type
#[derive(Error, Debug)]
pub enum PmError {
    #[error("Audio clip is missing for {0} playback")]
    MissingClip(SoundCategory),

    #[error("Sequencer '{0}' has no clips configured")]
    NoClips(String),

    #[error("Sequencer '{0}' uses more than one clip category; an exclusive output allows only one")]
    MixedClipCategories(String),

    #[error("Sequencer '{0}' requires an explicit output handle")]
    MissingOutput(String),

    #[error("A playback registry is already alive on this thread")]
    RegistryAlreadyExists,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type PmResult<T> = Result<T, PmError>;
