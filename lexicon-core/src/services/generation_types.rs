use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Failure of one generation call. Only the message is meaningful to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationError {
    message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Shape the model is asked to answer with. A bare array is tolerated too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GeneratedPayload {
    Document { vocabulary: Vec<Value> },
    Items(Vec<Value>),
}

impl GeneratedPayload {
    pub fn into_items(self) -> Vec<Value> {
        match self {
            GeneratedPayload::Document { vocabulary } => vocabulary,
            GeneratedPayload::Items(items) => items,
        }
    }
}
