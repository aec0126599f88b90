use sha2::{Digest, Sha256};

use super::normalize;
use crate::model::entry::{VocabKind, VocabularyEntry};

const SEPARATOR: char = '\u{1f}';

pub fn hash_norm(norm: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(norm.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable dedup key: kind plus normalized term.
pub fn identity_of(kind: VocabKind, term: &str) -> String {
    let norm = normalize::normalize(term);
    hash_norm(&format!("{}{SEPARATOR}{norm}", kind.as_str()))
}

pub fn identity(entry: &VocabularyEntry) -> String {
    identity_of(entry.kind, &entry.term)
}
