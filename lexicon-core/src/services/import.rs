use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{CoreError, ValidationError};
use crate::events::{CoreEvent, EventSink};
use crate::model::entry::{VocabKind, VocabularyEntry};
use crate::services::encoding;
use crate::services::vocabulary_store::VocabularyStore;

const IMPORT_EXTENSION: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub kind: VocabKind,
    pub added: usize,
    pub total: usize,
}

impl ImportReport {
    pub fn duplicates(&self) -> usize {
        self.total.saturating_sub(self.added)
    }

    pub fn summary(&self) -> String {
        format!(
            "Imported {} new {}s. {} duplicates were skipped.",
            self.added,
            self.kind,
            self.duplicates()
        )
    }
}

/// Validates an import document and maps it to entries of `kind`. Nothing is
/// returned unless the whole document is valid.
pub fn parse_document(raw_text: &str, kind: VocabKind) -> Result<Vec<VocabularyEntry>, ValidationError> {
    let doc: Value = serde_json::from_str(raw_text).map_err(|e| ValidationError::Malformed(e.to_string()))?;

    let items = doc
        .get("vocabulary")
        .and_then(|v| v.as_array())
        .ok_or(ValidationError::MissingVocabulary)?;

    let mut entries = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let raw = match item {
            Value::Object(m) => m.clone(),
            other => {
                return Err(ValidationError::InvalidEntry {
                    index,
                    reason: format!("expected an object, found {}", json_type(other)),
                })
            }
        };

        let entry = VocabularyEntry::from_raw(raw, kind).map_err(|reason| ValidationError::InvalidEntry { index, reason })?;
        entries.push(entry);
    }

    Ok(entries)
}

pub async fn import_vocabulary(
    raw_text: &str,
    kind: VocabKind,
    store: &dyn VocabularyStore,
    sink: &dyn EventSink,
) -> Result<ImportReport, CoreError> {
    let entries = parse_document(raw_text, kind)?;
    let total = entries.len();

    let added = store.insert_if_new(entries).await?;
    let persisted = store.count().await?;

    let report = ImportReport { kind, added, total };
    info!(
        "[import] {kind}: {added} added, {} duplicates, {persisted} stored",
        report.duplicates()
    );

    sink.emit(CoreEvent::StoreChanged { persisted });

    Ok(report)
}

pub async fn import_vocabulary_file(
    path: &Path,
    kind: VocabKind,
    store: &dyn VocabularyStore,
    sink: &dyn EventSink,
) -> Result<ImportReport, CoreError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(IMPORT_EXTENSION));

    if !is_json {
        return Err(ValidationError::UnsupportedFile(format!("{} (expected a .json file)", path.display())).into());
    }

    let bytes = tokio::fs::read(path).await?;
    let decoded = encoding::decode(&bytes);

    import_vocabulary(&decoded.text, kind, store, sink).await
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vocabulary_store::MemoryStore;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    const WORDS: &str = r#"{
        "vocabulary": [
            { "term": "invoice", "definition": "a bill", "type": "idiom" },
            { "word": "shipment", "kind": "idiom" },
            { "term": "Invoice" }
        ]
    }"#;

    #[tokio::test]
    async fn import_stamps_chosen_kind_over_payload() {
        let store = MemoryStore::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let report = import_vocabulary(WORDS, VocabKind::Word, &store, &tx).await.unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.added, 2);
        assert_eq!(report.duplicates(), 1);

        let entries = store.list().await.unwrap();
        assert!(entries.iter().all(|e| e.kind == VocabKind::Word));
    }

    #[tokio::test]
    async fn missing_vocabulary_never_touches_store() {
        let store = MemoryStore::with_entries(vec![VocabularyEntry::new("budget", VocabKind::Word)]);
        let before = store.count().await.unwrap();

        let err = import_vocabulary(r#"{"words": []}"#, VocabKind::Word, &store, &crate::events::NoopSink)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(ValidationError::MissingVocabulary)));
        assert_eq!(store.count().await.unwrap(), before);
    }

    #[tokio::test]
    async fn vocabulary_of_wrong_shape_is_rejected() {
        let store = MemoryStore::new();
        let err = import_vocabulary(r#"{"vocabulary": {"term": "x"}}"#, VocabKind::Idiom, &store, &crate::events::NoopSink)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(ValidationError::MissingVocabulary)));
    }

    #[tokio::test]
    async fn one_bad_element_rejects_whole_document() {
        let store = MemoryStore::new();
        let doc = r#"{"vocabulary": [{"term": "ledger"}, 42]}"#;

        let err = import_vocabulary(doc, VocabKind::Word, &store, &crate::events::NoopSink)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidEntry { index: 1, .. })
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_text_is_validation_error() {
        let store = MemoryStore::new();
        let err = import_vocabulary("not json", VocabKind::Word, &store, &crate::events::NoopSink)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(ValidationError::Malformed(_))));
    }

    #[tokio::test]
    async fn store_changed_is_emitted_even_when_nothing_added() {
        let store = MemoryStore::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        import_vocabulary(WORDS, VocabKind::Word, &store, &tx).await.unwrap();
        let second = import_vocabulary(WORDS, VocabKind::Word, &store, &tx).await.unwrap();

        assert_eq!(second.added, 0);
        assert_eq!(rx.recv().await, Some(CoreEvent::StoreChanged { persisted: 2 }));
        assert_eq!(rx.recv().await, Some(CoreEvent::StoreChanged { persisted: 2 }));
    }

    #[tokio::test]
    async fn same_document_as_idioms_is_not_a_duplicate() {
        let store = MemoryStore::new();

        import_vocabulary(WORDS, VocabKind::Word, &store, &crate::events::NoopSink).await.unwrap();
        let report = import_vocabulary(WORDS, VocabKind::Idiom, &store, &crate::events::NoopSink)
            .await
            .unwrap();

        assert_eq!(report.added, 2);
        assert_eq!(store.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn file_import_requires_json_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, WORDS).unwrap();

        let err = import_vocabulary_file(&path, VocabKind::Word, &MemoryStore::new(), &crate::events::NoopSink)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(ValidationError::UnsupportedFile(_))));
    }

    #[tokio::test]
    async fn file_import_handles_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("idioms.JSON");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(br#"{"vocabulary": [{"idiom": "touch base"}]}"#);
        std::fs::write(&path, bytes).unwrap();

        let store = MemoryStore::new();
        let report = import_vocabulary_file(&path, VocabKind::Idiom, &store, &crate::events::NoopSink)
            .await
            .unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(report.summary(), "Imported 1 new idioms. 0 duplicates were skipped.");
    }

    #[test]
    fn summary_reports_duplicates() {
        let report = ImportReport {
            kind: VocabKind::Word,
            added: 3,
            total: 5,
        };
        assert_eq!(report.summary(), "Imported 3 new words. 2 duplicates were skipped.");
    }
}
