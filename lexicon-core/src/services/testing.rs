//! Generation doubles shared by the collector, session and bridge tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use crate::model::credential::Credential;
use crate::model::entry::{VocabKind, VocabularyEntry};
use crate::model::filter::GenerationFilter;
use crate::services::generation::GenerationClient;
use crate::services::generation_types::GenerationError;
use crate::services::vocabulary_store::VocabularyStore;

/// Replays a fixed list of outcomes, then reports zero new items.
pub struct ScriptedClient {
    outcomes: Mutex<Vec<Result<usize, GenerationError>>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(outcomes: Vec<Result<usize, GenerationError>>) -> Self {
        let mut outcomes = outcomes;
        outcomes.reverse();
        Self {
            outcomes: Mutex::new(outcomes),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, _filter: &GenerationFilter, _credential: &Credential) -> Result<usize, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes.lock().pop().unwrap_or(Ok(0))
    }
}

/// Blocks every call until the test releases a permit.
pub struct GatedClient {
    pub entered: Notify,
    pub release: Semaphore,
    added: usize,
}

impl GatedClient {
    pub fn new(added: usize) -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
            added,
        }
    }
}

#[async_trait]
impl GenerationClient for GatedClient {
    async fn generate(&self, _filter: &GenerationFilter, _credential: &Credential) -> Result<usize, GenerationError> {
        self.entered.notify_one();
        let permit = self
            .release
            .acquire()
            .await
            .map_err(|e| GenerationError::new(e.to_string()))?;
        permit.forget();
        Ok(self.added)
    }
}

/// Writes numbered words into a store, like a real client would.
pub struct StoreBackedClient {
    store: Arc<dyn VocabularyStore>,
    per_batch: usize,
    batch: AtomicUsize,
}

impl StoreBackedClient {
    pub fn new(store: Arc<dyn VocabularyStore>, per_batch: usize) -> Self {
        Self {
            store,
            per_batch,
            batch: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GenerationClient for StoreBackedClient {
    async fn generate(&self, _filter: &GenerationFilter, _credential: &Credential) -> Result<usize, GenerationError> {
        let batch = self.batch.fetch_add(1, Ordering::SeqCst);
        let entries = (0..self.per_batch)
            .map(|i| VocabularyEntry::new(format!("term-{batch}-{i}"), VocabKind::Word))
            .collect();

        self.store
            .insert_if_new(entries)
            .await
            .map_err(|e| GenerationError::new(e.to_string()))
    }
}
