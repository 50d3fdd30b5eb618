//! Local filesystem storage provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

use dormhub_core::config::StorageConfig;
use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_core::traits::storage::{ByteStream, StorageProvider, StoredFile};

use crate::policy::{ensure_plain_name, sanitize};

/// Local filesystem storage provider.
///
/// New files are written to `root/<category>/`. Lookups also search the
/// root itself and any legacy roots so files uploaded by older
/// deployments stay reachable.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Root directory for new uploads.
    root: PathBuf,
    /// Older roots searched after `root`.
    legacy: Vec<PathBuf>,
}

impl LocalStorageProvider {
    /// Create a provider rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            legacy: Vec::new(),
        })
    }

    /// Create a provider from storage configuration.
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let mut provider = Self::new(&config.upload_dir).await?;
        provider.legacy = config.legacy_dirs.iter().map(PathBuf::from).collect();
        Ok(provider)
    }

    /// Directories searched for `category`, in order.
    pub fn candidate_dirs(&self, category: &str) -> Vec<PathBuf> {
        let mut dirs = vec![self.root.join(category), self.root.clone()];
        for legacy in &self.legacy {
            dirs.push(legacy.join(category));
            dirs.push(legacy.clone());
        }
        dirs
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Map a stored relative path (`category/name`) to an absolute path.
    fn stored_path(&self, path: &str) -> AppResult<PathBuf> {
        let mut full = self.root.clone();
        for part in path.trim_start_matches('/').split('/') {
            ensure_plain_name(part)?;
            full.push(part);
        }
        Ok(full)
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.exists() && self.root.is_dir())
    }

    async fn store(
        &self,
        category: &str,
        original_name: &str,
        mime_type: Option<String>,
        data: Bytes,
    ) -> AppResult<StoredFile> {
        ensure_plain_name(category)?;
        let file_name = format!("{}_{}", Uuid::new_v4().simple(), sanitize(original_name));
        let full_path = self.root.join(category).join(&file_name);
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write upload: {file_name}"),
                e,
            )
        })?;

        debug!(category, file = %file_name, bytes = data.len(), "Stored upload");
        Ok(StoredFile {
            path: format!("{category}/{file_name}"),
            original_name: original_name.to_string(),
            size_bytes: data.len() as u64,
            mime_type,
        })
    }

    async fn resolve(&self, category: &str, file_name: &str) -> AppResult<PathBuf> {
        ensure_plain_name(category)?;
        ensure_plain_name(file_name)?;

        for dir in self.candidate_dirs(category) {
            let candidate = dir.join(file_name);
            if fs::metadata(&candidate)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
            {
                return Ok(candidate);
            }
        }
        Err(AppError::not_found(format!("File not found: {file_name}")))
    }

    async fn read(&self, category: &str, file_name: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(category, file_name).await?;
        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {file_name}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open file: {file_name}"),
                    e,
                )
            }
        })?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(Bytes::from))))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.stored_path(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path, "Upload already removed");
                Ok(())
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete file: {path}"),
                e,
            )),
        }
    }
}

/// Guess a MIME type from a file name's extension.
pub fn mime_from_name(name: &str) -> Option<&'static str> {
    let ext = crate::policy::extension(name)?;
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_store_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();

        let stored = provider
            .store("forms", "leak photo.jpg", Some("image/jpeg".into()), Bytes::from("jpeg"))
            .await
            .unwrap();
        assert!(stored.path.starts_with("forms/"));
        assert!(stored.path.ends_with("_leak_photo.jpg"));
        assert_eq!(stored.size_bytes, 4);

        let name = stored.path.trim_start_matches("forms/");
        let body = collect(provider.read("forms", name).await.unwrap()).await;
        assert_eq!(body, b"jpeg");

        provider.delete(&stored.path).await.unwrap();
        assert_eq!(
            provider.resolve("forms", name).await.unwrap_err().kind,
            ErrorKind::NotFound
        );
        // Deleting twice is not an error.
        provider.delete(&stored.path).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_searches_root_and_legacy_dirs() {
        let root = tempfile::tempdir().unwrap();
        let legacy = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            upload_dir: root.path().to_str().unwrap().to_string(),
            legacy_dirs: vec![legacy.path().to_str().unwrap().to_string()],
            ..StorageConfig::default()
        };
        let provider = LocalStorageProvider::from_config(&config).await.unwrap();

        std::fs::write(root.path().join("flat.png"), b"a").unwrap();
        std::fs::create_dir_all(legacy.path().join("receipts")).unwrap();
        std::fs::write(legacy.path().join("receipts").join("old.pdf"), b"b").unwrap();

        let flat = provider.resolve("news", "flat.png").await.unwrap();
        assert_eq!(flat, root.path().join("flat.png"));

        let old = provider.resolve("receipts", "old.pdf").await.unwrap();
        assert_eq!(old, legacy.path().join("receipts").join("old.pdf"));
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();

        let err = provider.resolve("forms", "../secret.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(provider.delete("forms/../../etc/passwd").await.is_err());
        assert!(provider
            .store("../x", "a.png", None, Bytes::from("x"))
            .await
            .is_err());
    }

    #[test]
    fn test_mime_detection() {
        assert_eq!(mime_from_name("file.pdf"), Some("application/pdf"));
        assert_eq!(mime_from_name("img.PNG"), Some("image/png"));
        assert_eq!(mime_from_name("noext"), None);
    }
}
