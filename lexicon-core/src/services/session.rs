use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::error::CoreError;
use crate::events::EventSink;
use crate::model::credential::Credential;
use crate::model::entry::{VocabKind, VocabularyEntry};
use crate::model::filter::GenerationFilter;
use crate::model::run::{BatchCount, CollectionRun};
use crate::services::collector::BatchCollector;
use crate::services::generation::GenerationClient;
use crate::services::import::{self, ImportReport};
use crate::services::readiness::Readiness;
use crate::services::vocabulary_store::VocabularyStore;

/// Everything the host drives: one store, one generator, one collector.
pub struct Session {
    store: Arc<dyn VocabularyStore>,
    collector: BatchCollector,
    initializing: AtomicBool,
    sink: Arc<dyn EventSink>,
}

impl Session {
    pub fn new(store: Arc<dyn VocabularyStore>, client: Arc<dyn GenerationClient>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            collector: BatchCollector::new(client),
            initializing: AtomicBool::new(false),
            sink,
        }
    }

    pub fn set_initializing(&self, initializing: bool) {
        info!("[session] initializing = {initializing}");
        self.initializing.store(initializing, Ordering::Release);
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing.load(Ordering::Acquire)
    }

    pub async fn readiness(&self, credential: &Credential) -> Result<Readiness, CoreError> {
        let persisted = self.store.count().await?;
        Ok(Readiness::derive(persisted, credential.is_set(), self.is_initializing()))
    }

    pub async fn count(&self) -> Result<usize, CoreError> {
        Ok(self.store.count().await?)
    }

    pub async fn list(&self) -> Result<Vec<VocabularyEntry>, CoreError> {
        Ok(self.store.list().await?)
    }

    pub async fn import_text(&self, raw_text: &str, kind: VocabKind) -> Result<ImportReport, CoreError> {
        self.readiness(&Credential::unset()).await?.require_import()?;
        import::import_vocabulary(raw_text, kind, self.store.as_ref(), self.sink.as_ref()).await
    }

    pub async fn import_file(&self, path: &Path, kind: VocabKind) -> Result<ImportReport, CoreError> {
        self.readiness(&Credential::unset()).await?.require_import()?;
        import::import_vocabulary_file(path, kind, self.store.as_ref(), self.sink.as_ref()).await
    }

    pub async fn collect(
        &self,
        filter: &GenerationFilter,
        batch_count: BatchCount,
        credential: &Credential,
    ) -> Result<CollectionRun, CoreError> {
        let readiness = self.readiness(credential).await?;
        let run = self
            .collector
            .run_batches(filter, batch_count, credential, &readiness, self.sink.as_ref())
            .await?;

        // generated entries changed the store whether or not the run finished
        let persisted = self.store.count().await?;
        self.sink.emit(crate::events::CoreEvent::StoreChanged { persisted });

        Ok(run)
    }

    pub fn collection_snapshot(&self) -> CollectionRun {
        self.collector.snapshot()
    }

    pub fn is_collecting(&self) -> bool {
        self.collector.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotReadyReason;
    use crate::events::{CoreEvent, NoopSink};
    use crate::services::generation_types::GenerationError;
    use crate::services::testing::{ScriptedClient, StoreBackedClient};
    use crate::services::vocabulary_store::MemoryStore;
    use tokio::sync::mpsc;

    const DOC: &str = r#"{"vocabulary": [{"term": "audit"}, {"term": "forecast"}]}"#;

    fn session_with(client: Arc<dyn GenerationClient>) -> (Session, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone(), client, Arc::new(NoopSink));
        (session, store)
    }

    #[tokio::test]
    async fn import_populates_empty_store_and_opens_db_gate() {
        let (session, _) = session_with(Arc::new(ScriptedClient::new(vec![])));

        assert!(!session.readiness(&Credential::unset()).await.unwrap().db_ready);

        let report = session.import_text(DOC, VocabKind::Word).await.unwrap();
        assert_eq!(report.added, 2);

        let readiness = session.readiness(&Credential::unset()).await.unwrap();
        assert!(readiness.db_ready);
        assert!(!readiness.ai_ready);
    }

    #[tokio::test]
    async fn imports_are_refused_while_initializing() {
        let (session, store) = session_with(Arc::new(ScriptedClient::new(vec![])));
        session.set_initializing(true);

        let err = session.import_text(DOC, VocabKind::Word).await.unwrap_err();

        assert!(matches!(err, CoreError::NotReady(NotReadyReason::Initializing)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn collect_without_credential_never_calls_generator() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(5)]));
        let (session, _) = session_with(client.clone());

        let err = session
            .collect(&GenerationFilter::default(), BatchCount::normalize(3), &Credential::unset())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotReady(NotReadyReason::MissingCredential)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn collect_grows_store_and_reports_change() {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(StoreBackedClient::new(store.clone(), 4));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = Session::new(store.clone(), client, Arc::new(tx));

        let run = session
            .collect(&GenerationFilter::default(), BatchCount::normalize(3), &Credential::new("k"))
            .await
            .unwrap();

        assert_eq!(run.total_added, 12);
        assert_eq!(store.count().await.unwrap(), 12);

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert_eq!(last, Some(CoreEvent::StoreChanged { persisted: 12 }));
    }

    #[tokio::test]
    async fn failed_run_still_reports_partial_total() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(7), Err(GenerationError::new("network down"))]));
        let (session, _) = session_with(client);

        let run = session
            .collect(&GenerationFilter::default(), BatchCount::normalize(4), &Credential::new("k"))
            .await
            .unwrap();

        assert!(run.failed());
        assert_eq!(run.total_added, 7);
        assert_eq!(session.collection_snapshot(), run);
        assert!(!session.is_collecting());
    }
}
