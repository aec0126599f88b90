use async_trait::async_trait;
use tokio::sync::Mutex;

use super::index::EntryIndex;
use super::VocabularyStore;
use crate::error::StoreError;
use crate::model::entry::VocabularyEntry;

/// Store without a backing file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: Mutex<EntryIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<VocabularyEntry>) -> Self {
        let (index, _) = EntryIndex::from_entries(entries);
        Self {
            index: Mutex::new(index),
        }
    }
}

#[async_trait]
impl VocabularyStore for MemoryStore {
    async fn insert_if_new(&self, entries: Vec<VocabularyEntry>) -> Result<usize, StoreError> {
        let mut index = self.index.lock().await;
        Ok(index.insert_new(entries).len())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.index.lock().await.len())
    }

    async fn list(&self) -> Result<Vec<VocabularyEntry>, StoreError> {
        Ok(self.index.lock().await.sorted())
    }
}
