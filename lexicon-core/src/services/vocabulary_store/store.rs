use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::index::EntryIndex;
use super::VocabularyStore;
use crate::error::StoreError;
use crate::model::entry::VocabularyEntry;

/// Vocabulary persisted as one JSON array, rewritten atomically on change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    index: Mutex<EntryIndex>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let (index, removed) = load(&path).await?;

        if removed > 0 {
            warn!("[store] dropped {removed} duplicate records from {}", path.display());
            save(&path, &index).await?;
        }

        info!("[store] loaded {} entries from {}", index.len(), path.display());

        Ok(Self {
            path,
            index: Mutex::new(index),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VocabularyStore for JsonFileStore {
    async fn insert_if_new(&self, entries: Vec<VocabularyEntry>) -> Result<usize, StoreError> {
        let offered = entries.len();
        let mut index = self.index.lock().await;
        let added = index.insert_new(entries);

        if added.is_empty() {
            debug!("[store] all {offered} offered entries already present");
            return Ok(0);
        }

        if let Err(e) = save(&self.path, &index).await {
            index.rollback(&added);
            return Err(e);
        }

        debug!("[store] persisted {} of {offered} offered entries", added.len());
        Ok(added.len())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.index.lock().await.len())
    }

    async fn list(&self) -> Result<Vec<VocabularyEntry>, StoreError> {
        Ok(self.index.lock().await.sorted())
    }
}

async fn load(path: &Path) -> Result<(EntryIndex, usize), StoreError> {
    if !fs::try_exists(path)
        .await
        .map_err(|e| StoreError::Load(e.to_string()))?
    {
        return Ok((EntryIndex::default(), 0));
    }

    let data = fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::Load(format!("{}: {e}", path.display())))?;

    if data.trim().is_empty() {
        return Ok((EntryIndex::default(), 0));
    }

    let entries: Vec<VocabularyEntry> = serde_json::from_str(&data)
        .map_err(|e| StoreError::Load(format!("{}: {e}", path.display())))?;

    Ok(EntryIndex::from_entries(entries))
}

async fn save(path: &Path, index: &EntryIndex) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(&index.sorted()).map_err(|e| StoreError::Persist(e.to_string()))?;
    write_atomic(path, json.as_bytes()).await
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::Persist(e.to_string()))?;
    }

    {
        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|e| StoreError::Persist(format!("failed to create temp file: {e}")))?;
        file.write_all(bytes)
            .await
            .map_err(|e| StoreError::Persist(format!("failed to write: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| StoreError::Persist(format!("failed to sync: {e}")))?;
    }

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(StoreError::Persist(format!("failed to rename: {e}")));
    }

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "vocabulary".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}
