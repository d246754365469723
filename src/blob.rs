//! Blob storage for uploaded source documents.
//!
//! The pipeline stores the raw upload before indexing so the original bytes
//! survive re-indexing, and reads back only a count for the status metric.
//! Anything richer (listing, download, deletion) is the storage service's
//! own surface, not the pipeline's.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::BlobConfig;
use crate::models::DocumentLabels;

/// External object-store contract.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, overwriting any previous version, along
    /// with the document labels and an upload timestamp.
    async fn put(&self, key: &str, bytes: &[u8], labels: &DocumentLabels) -> Result<()>;

    /// Number of stored documents. Status metric only.
    async fn count(&self) -> Result<usize>;
}

/// Filesystem-backed store: one directory per container, one sidecar JSON
/// file with labels next to each blob.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(config: &BlobConfig) -> Self {
        Self {
            root: config.data_dir.join(&config.container),
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], labels: &DocumentLabels) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating blob container {}", self.root.display()))?;

        let path = self.root.join(key);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing blob {}", path.display()))?;

        let meta = serde_json::json!({
            "labels": labels,
            "upload_date": chrono::Utc::now().to_rfc3339(),
            "processed": false,
        });
        let meta_path = self.root.join(format!("{}.meta.json", key));
        tokio::fs::write(&meta_path, serde_json::to_vec_pretty(&meta)?)
            .await
            .with_context(|| format!("writing blob metadata {}", meta_path.display()))?;

        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(e) => e,
            Err(_) => return Ok(0),
        };

        let mut count = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.ends_with(".meta.json") {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], _labels: &DocumentLabels) -> Result<()> {
        self.blobs
            .write()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.blobs.read().unwrap().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_store_roundtrip_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let config = BlobConfig {
            container: "project-documents".to_string(),
            data_dir: dir.path().to_path_buf(),
        };
        let store = FsBlobStore::new(&config);

        let labels = DocumentLabels {
            project_type: Some("Billing".to_string()),
            technology: Some("Java".to_string()),
            department: Some("DEV".to_string()),
        };

        store.put("spec-a.txt", b"alpha", &labels).await.unwrap();
        store.put("spec-b.txt", b"beta", &labels).await.unwrap();
        // Overwrite is allowed and does not change the count.
        store.put("spec-a.txt", b"alpha v2", &labels).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn count_of_missing_container_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let config = BlobConfig {
            container: "project-documents".to_string(),
            data_dir: dir.path().to_path_buf(),
        };
        let store = FsBlobStore::new(&config);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
