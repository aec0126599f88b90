use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::entry::VocabularyEntry;

pub mod hash;
pub mod index;
pub mod memory;
pub mod normalize;
pub mod store;

pub use memory::MemoryStore;
pub use store::JsonFileStore;

/// Persistent collection of vocabulary entries with insert-if-absent writes.
#[async_trait]
pub trait VocabularyStore: Send + Sync {
    /// Persists every entry whose identity is not stored yet and returns how
    /// many were persisted. Duplicates inside `entries` count once.
    async fn insert_if_new(&self, entries: Vec<VocabularyEntry>) -> Result<usize, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    async fn list(&self) -> Result<Vec<VocabularyEntry>, StoreError>;
}
