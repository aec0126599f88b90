use std::fmt;

use serde::{Deserialize, Serialize};

use super::entry::VocabKind;

const WILDCARD: &str = "all";

/// A level or category selection: a concrete value or the "all" wildcard.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    #[default]
    All,
    Only(String),
}

impl Scope {
    pub fn is_all(&self) -> bool {
        matches!(self, Scope::All)
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(WILDCARD) {
            Scope::All
        } else {
            Scope::Only(trimmed.to_string())
        }
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Scope::from(s.to_string())
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::All => WILDCARD.to_string(),
            Scope::Only(v) => v,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str(WILDCARD),
            Scope::Only(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum KindSelection {
    #[default]
    Word,
    Idiom,
    #[serde(rename = "all", alias = "both")]
    Both,
}

impl KindSelection {
    /// The kind every generated entry gets stamped with, if the selection
    /// pins one.
    pub fn fixed_kind(&self) -> Option<VocabKind> {
        match self {
            KindSelection::Word => Some(VocabKind::Word),
            KindSelection::Idiom => Some(VocabKind::Idiom),
            KindSelection::Both => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Some(KindSelection::Word),
            "idiom" => Some(KindSelection::Idiom),
            "all" | "both" => Some(KindSelection::Both),
            _ => None,
        }
    }
}

/// Selection passed through to the generation client untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct GenerationFilter {
    #[serde(default)]
    pub level: Scope,

    #[serde(default)]
    pub category: Scope,

    #[serde(rename = "type", default)]
    pub kind: KindSelection,
}

impl GenerationFilter {
    pub fn new(level: impl Into<Scope>, category: impl Into<Scope>, kind: KindSelection) -> Self {
        Self {
            level: level.into(),
            category: category.into(),
            kind,
        }
    }
}
