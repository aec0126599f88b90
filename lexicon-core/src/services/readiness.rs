use serde::Serialize;

use crate::error::NotReadyReason;

const INITIALIZING_HINT: &str = "Please wait for initialization to complete.";
const EMPTY_DB_HINT: &str = "Add vocabulary using the AI Generator or Import JSON to enable this mode.";
const MISSING_KEY_HINT: &str = "Please set your API key to use this feature.";

/// Which entry points the host may enable. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub db_ready: bool,
    pub ai_ready: bool,
    pub initializing: bool,
}

impl Readiness {
    pub fn derive(persisted_count: usize, credential_set: bool, initializing: bool) -> Self {
        Self {
            db_ready: persisted_count > 0 && !initializing,
            ai_ready: credential_set && !initializing,
            initializing,
        }
    }

    pub fn db_disabled_reason(&self) -> Option<&'static str> {
        if self.db_ready {
            None
        } else if self.initializing {
            Some(INITIALIZING_HINT)
        } else {
            Some(EMPTY_DB_HINT)
        }
    }

    pub fn ai_disabled_reason(&self) -> Option<&'static str> {
        if self.ai_ready {
            None
        } else if self.initializing {
            Some(INITIALIZING_HINT)
        } else {
            Some(MISSING_KEY_HINT)
        }
    }

    pub fn require_ai(&self) -> Result<(), NotReadyReason> {
        if self.initializing {
            Err(NotReadyReason::Initializing)
        } else if !self.ai_ready {
            Err(NotReadyReason::MissingCredential)
        } else {
            Ok(())
        }
    }

    /// Imports populate an empty store, so only initialization blocks them.
    pub fn require_import(&self) -> Result<(), NotReadyReason> {
        if self.initializing {
            Err(NotReadyReason::Initializing)
        } else {
            Ok(())
        }
    }
}
