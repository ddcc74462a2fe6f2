use crate::app::ports::{DocumentFilter, DocumentStore, StoreHealth};
use crate::error::{CollectorError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One pretty-printed JSON file per document at `<root>/<collection>/<key>.json`.
pub struct JsonFileStore {
    root: PathBuf,
}

fn check_segment(kind: &str, segment: &str) -> Result<()> {
    if segment.is_empty() || segment.contains(['/', '\\']) || segment.contains("..") {
        return Err(CollectorError::Storage(format!("invalid {kind} name: {segment:?}")));
    }
    Ok(())
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf> {
        check_segment("collection", collection)?;
        Ok(self.root.join(collection))
    }

    async fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn put(&self, collection: &str, key: &str, value: Value) -> Result<()> {
        check_segment("key", key)?;
        let dir = self.collection_dir(collection)?;
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{key}.json"));
        let tmp = dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&value)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Wrote document {}", path.display());
        Ok(())
    }

    async fn get_many(&self, collection: &str, filter: &DocumentFilter) -> Result<Vec<Value>> {
        let dir = self.collection_dir(collection)?;
        let mut documents = Vec::new();
        for path in Self::json_files(&dir).await? {
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(doc) if filter.matches(&doc) => documents.push(doc),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable document {}: {}", path.display(), e),
            }
        }
        Ok(documents)
    }

    async fn health_check(&self) -> Result<StoreHealth> {
        tokio::fs::create_dir_all(&self.root).await?;
        let mut documents = 0;
        let mut collections = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = collections.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                documents += Self::json_files(&entry.path()).await?.len();
            }
        }
        Ok(StoreHealth {
            backend: "file",
            documents,
        })
    }
}
