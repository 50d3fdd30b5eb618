//! Policy-checked storage of uploads.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use dormhub_core::result::AppResult;
use dormhub_core::traits::StorageProvider;
use dormhub_core::traits::storage::{ByteStream, StoredFile};
use dormhub_storage::providers::local::mime_from_name;
use dormhub_storage::{UploadCategory, UploadPolicy};

/// An opened stored file.
pub struct Download {
    /// File contents.
    pub stream: ByteStream,
    /// Content type guessed from the name.
    pub mime_type: &'static str,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Accepts uploads into a storage backend and serves them back.
#[derive(Debug, Clone)]
pub struct UploadService {
    storage: Arc<dyn StorageProvider>,
    policy: UploadPolicy,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(storage: Arc<dyn StorageProvider>, policy: UploadPolicy) -> Self {
        Self { storage, policy }
    }

    /// Largest accepted upload.
    pub fn max_size_bytes(&self) -> u64 {
        self.policy.max_size_bytes()
    }

    /// Checks and stores one upload.
    pub async fn store(
        &self,
        category: UploadCategory,
        original_name: &str,
        mime_type: Option<String>,
        data: Bytes,
    ) -> AppResult<StoredFile> {
        self.policy.check(original_name, data.len() as u64)?;
        let mime_type = mime_type.or_else(|| mime_from_name(original_name).map(str::to_string));
        let stored = self
            .storage
            .store(category.as_str(), original_name, mime_type, data)
            .await?;
        info!(category = %category, path = %stored.path, bytes = stored.size_bytes, "Upload stored");
        Ok(stored)
    }

    /// Stores several uploads; on failure the ones already written are
    /// removed again.
    pub async fn store_all(
        &self,
        category: UploadCategory,
        files: Vec<(String, Option<String>, Bytes)>,
    ) -> AppResult<Vec<StoredFile>> {
        let mut stored = Vec::with_capacity(files.len());
        for (name, mime, data) in files {
            match self.store(category, &name, mime, data).await {
                Ok(file) => stored.push(file),
                Err(e) => {
                    for file in &stored {
                        self.discard(&file.path).await;
                    }
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    /// Opens a stored file for download.
    pub async fn open(&self, category: UploadCategory, file_name: &str) -> AppResult<Download> {
        let stream = self.storage.read(category.as_str(), file_name).await?;
        Ok(Download {
            stream,
            mime_type: mime_from_name(file_name).unwrap_or("application/octet-stream"),
        })
    }

    /// Best-effort removal of a stored file.
    pub async fn discard(&self, path: &str) {
        if let Err(e) = self.storage.delete(path).await {
            warn!(path, error = %e, "Failed to remove upload");
        }
    }

    /// Whether the backend is usable.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.storage.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dormhub_core::config::StorageConfig;
    use dormhub_storage::LocalStorageProvider;
    use futures::StreamExt;

    async fn service(dir: &tempfile::TempDir) -> UploadService {
        let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        UploadService::new(
            Arc::new(provider),
            UploadPolicy::from_config(&StorageConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_store_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir).await;
        let stored = svc
            .store(UploadCategory::Receipts, "receipt.pdf", None, Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        assert!(stored.path.starts_with("receipts/"));
        assert_eq!(stored.mime_type.as_deref(), Some("application/pdf"));

        let name = stored.path.trim_start_matches("receipts/");
        let mut download = svc.open(UploadCategory::Receipts, name).await.unwrap();
        assert_eq!(download.mime_type, "application/pdf");
        let chunk = download.stream.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"%PDF");
    }

    #[tokio::test]
    async fn test_rejected_batch_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir).await;
        let result = svc
            .store_all(
                UploadCategory::Forms,
                vec![
                    ("leak.jpg".into(), None, Bytes::from_static(b"jpg")),
                    ("virus.exe".into(), None, Bytes::from_static(b"exe")),
                ],
            )
            .await;
        assert!(result.is_err());
        let forms_dir = dir.path().join("forms");
        let left = std::fs::read_dir(&forms_dir).map(|d| d.count()).unwrap_or(0);
        assert_eq!(left, 0);
    }
}
