use thiserror::Error;

use crate::services::generation_types::GenerationError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("missing or malformed vocabulary field")]
    MissingVocabulary,

    #[error("invalid entry at index {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    #[error("unsupported import file: {0}")]
    UnsupportedFile(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("failed to load vocabulary store: {0}")]
    Load(String),

    #[error("failed to persist vocabulary store: {0}")]
    Persist(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    #[error("Please wait for initialization to complete.")]
    Initializing,

    #[error("Please set your API key to use this feature.")]
    MissingCredential,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("not ready: {0}")]
    NotReady(NotReadyReason),

    #[error("a collection run is already in progress")]
    Busy,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<NotReadyReason> for CoreError {
    fn from(reason: NotReadyReason) -> Self {
        CoreError::NotReady(reason)
    }
}
