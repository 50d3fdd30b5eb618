//! Storage provider trait for uploaded files.

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored upload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredFile {
    /// Path relative to the upload root, e.g. `forms/3f2a..._leak.jpg`.
    pub path: String,
    /// Original client-supplied file name.
    pub original_name: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// MIME type (if known).
    pub mime_type: Option<String>,
}

/// A byte stream type used for reading file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for upload storage backends.
///
/// The [`StorageProvider`] trait is defined here in `dormhub-core` and
/// implemented in `dormhub-storage`.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and writable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store `data` under `category` and return its metadata.
    async fn store(
        &self,
        category: &str,
        original_name: &str,
        mime_type: Option<String>,
        data: Bytes,
    ) -> AppResult<StoredFile>;

    /// Resolve a stored file name to an absolute path, searching the
    /// known candidate directories.
    async fn resolve(&self, category: &str, file_name: &str) -> AppResult<PathBuf>;

    /// Open a stored file as a byte stream.
    async fn read(&self, category: &str, file_name: &str) -> AppResult<ByteStream>;

    /// Delete a stored file. Missing files are not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;
}
