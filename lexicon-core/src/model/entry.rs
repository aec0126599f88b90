use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys a raw entry may use for its text, in lookup order.
const TERM_KEYS: [&str; 3] = ["term", "word", "idiom"];

/// Keys that carry a kind claim in raw input. Always replaced by the pipeline.
const KIND_KEYS: [&str; 2] = ["type", "kind"];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum VocabKind {
    Word,
    Idiom,
}

impl VocabKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VocabKind::Word => "word",
            VocabKind::Idiom => "idiom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Some(VocabKind::Word),
            "idiom" => Some(VocabKind::Idiom),
            _ => None,
        }
    }
}

impl Default for VocabKind {
    fn default() -> Self {
        VocabKind::Word
    }
}

impl fmt::Display for VocabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A word or idiom as persisted. Everything besides `term` and `kind` is
/// carried through untouched in `details`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VocabularyEntry {
    pub term: String,

    #[serde(rename = "type", alias = "kind", default)]
    pub kind: VocabKind,

    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl VocabularyEntry {
    pub fn new(term: impl Into<String>, kind: VocabKind) -> Self {
        Self {
            term: term.into(),
            kind,
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Builds an entry from an externally supplied object, stamping `kind`
    /// over whatever the object claims.
    pub fn from_raw(mut raw: Map<String, Value>, kind: VocabKind) -> Result<Self, String> {
        for key in KIND_KEYS {
            raw.remove(key);
        }

        let term = TERM_KEYS
            .iter()
            .filter_map(|key| raw.get(*key).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_default();

        if term.is_empty() {
            return Err("missing term (expected a non-empty `term`, `word` or `idiom` string)".into());
        }

        // `term` is a struct field; alternate spellings stay in the payload
        raw.remove("term");

        Ok(Self {
            term,
            kind,
            details: raw,
        })
    }
}
