use std::collections::HashMap;

use super::{hash, normalize};
use crate::model::entry::VocabularyEntry;

/// In-memory identity index shared by the store implementations.
#[derive(Debug, Default)]
pub struct EntryIndex {
    entries: HashMap<String, VocabularyEntry>,
}

impl EntryIndex {
    /// Builds an index from persisted records, folding duplicates. Returns the
    /// number of records that were dropped.
    pub fn from_entries(entries: Vec<VocabularyEntry>) -> (Self, usize) {
        let mut index = Self::default();
        let mut removed = 0usize;

        for e in entries {
            let key = hash::identity(&e);

            match index.entries.get_mut(&key) {
                None => {
                    index.entries.insert(key, e);
                }
                Some(existing) => {
                    if pick_better(existing, &e) {
                        *existing = e;
                    }
                    removed += 1;
                }
            }
        }

        (index, removed)
    }

    /// Inserts entries whose identity is absent. Returns the identities added,
    /// in input order.
    pub fn insert_new(&mut self, entries: Vec<VocabularyEntry>) -> Vec<String> {
        let mut added = Vec::new();

        for e in entries {
            let key = hash::identity(&e);
            if self.entries.contains_key(&key) {
                continue;
            }
            self.entries.insert(key.clone(), e);
            added.push(key);
        }

        added
    }

    pub fn rollback(&mut self, keys: &[String]) {
        for key in keys {
            self.entries.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sorted(&self) -> Vec<VocabularyEntry> {
        let mut out: Vec<VocabularyEntry> = self.entries.values().cloned().collect();
        out.sort_by_cached_key(|e| (e.kind, normalize::normalize(&e.term), e.term.clone()));
        out
    }
}

// richer payload wins; ties keep the record already loaded
fn pick_better(current: &VocabularyEntry, candidate: &VocabularyEntry) -> bool {
    candidate.details.len() > current.details.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entry::VocabKind;

    #[test]
    fn from_entries_folds_duplicates_keeping_richer_record() {
        let plain = VocabularyEntry::new("Invoice", VocabKind::Word);
        let rich = VocabularyEntry::new("invoice", VocabKind::Word).with_detail("definition", "a bill");
        let idiom = VocabularyEntry::new("invoice", VocabKind::Idiom);

        let (index, removed) = EntryIndex::from_entries(vec![plain, rich.clone(), idiom]);

        assert_eq!(removed, 1);
        assert_eq!(index.len(), 2);
        assert!(index.sorted().contains(&rich));
    }

    #[test]
    fn insert_new_skips_in_batch_duplicates() {
        let mut index = EntryIndex::default();
        let added = index.insert_new(vec![
            VocabularyEntry::new("agenda", VocabKind::Word),
            VocabularyEntry::new("Agenda", VocabKind::Word),
        ]);

        assert_eq!(added.len(), 1);
        assert_eq!(index.len(), 1);

        index.rollback(&added);
        assert!(index.is_empty());
    }
}
