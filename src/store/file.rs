//! JSON-file backed authoritative store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::RemoteStore;
use crate::errors::AppError;
use crate::models::{now_timestamp, Document, DocumentPatch, NewDocument};

/// Stores the whole collection as one pretty-printed JSON array.
///
/// Every operation reads the entire file, mutates the collection in memory
/// and rewrites the entire file. There is no locking and no versioning:
/// two writers interleaving their read and write steps lose one of the
/// updates (last write wins). The store assumes a single logical writer.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the collection. A missing file is an empty collection, or a
    /// freshly written one-record sample when `seed` is set.
    async fn read_collection(&self, seed: bool) -> Result<Vec<Document>, AppError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) if data.trim().is_empty() => Ok(Vec::new()),
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !seed {
                    return Ok(Vec::new());
                }
                let sample = vec![Document::sample(new_id(), now_timestamp())];
                self.write_collection(&sample).await?;
                tracing::info!("Seeded new document store at {:?}", self.path);
                Ok(sample)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file contents via a temporary sibling and a rename.
    ///
    /// Each write gets its own temporary file, so overlapping writers never
    /// move each other's data away; the last rename wins.
    async fn write_collection(&self, documents: &[Document]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_string_pretty(documents)?;
        let tmp = self.temp_path();

        tokio::fs::write(&tmp, data).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// `<path>.<uuid>.tmp`, unique per write.
    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", new_id()));
        PathBuf::from(tmp)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
impl RemoteStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Document>, AppError> {
        self.read_collection(true).await
    }

    async fn get(&self, id: &str) -> Result<Document, AppError> {
        self.read_collection(true)
            .await?
            .into_iter()
            .find(|doc| doc.id == id)
            .ok_or_else(|| AppError::document_not_found(id))
    }

    async fn create(&self, data: &NewDocument) -> Result<Document, AppError> {
        data.validate()?;

        let mut documents = self.read_collection(false).await?;
        let document = data.clone().into_document(new_id(), now_timestamp());
        documents.push(document.clone());
        self.write_collection(&documents).await?;

        tracing::debug!(id = %document.id, "Created document");
        Ok(document)
    }

    async fn update(&self, id: &str, patch: &DocumentPatch) -> Result<Document, AppError> {
        patch.validate()?;

        let mut documents = self.read_collection(false).await?;
        let document = documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| AppError::document_not_found(id))?;

        patch.apply_to(document);
        document.updated_at = now_timestamp();
        let updated = document.clone();
        self.write_collection(&documents).await?;

        tracing::debug!(id, "Updated document");
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<Document, AppError> {
        let mut documents = self.read_collection(false).await?;
        let index = documents
            .iter()
            .position(|doc| doc.id == id)
            .ok_or_else(|| AppError::document_not_found(id))?;

        let removed = documents.remove(index);
        self.write_collection(&documents).await?;

        tracing::debug!(id, "Deleted document");
        Ok(removed)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path().display())
    }
}
