//! Storage provider trait for the physical file store.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use tokio::io::AsyncRead;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageObjectMeta {
    /// Path relative to the storage root.
    pub path: String,
    /// Size in bytes (directories report the filesystem's value).
    pub size_bytes: u64,
    /// Last modified timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether this is a directory.
    pub is_directory: bool,
}

/// A byte stream type used for writing file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// An open file handle that callers read in chunks of their choosing.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send>>;

/// Trait for the physical file store.
///
/// Every path is relative to the provider's root and uses `/` as the
/// separator, exactly as produced by path resolution.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Open a file for sequential reading.
    async fn open(&self, path: &str) -> AppResult<ByteReader>;

    /// Write a byte stream to a file at the given path, replacing any
    /// existing content. Returns the number of bytes written.
    async fn write_stream(&self, path: &str, stream: ByteStream) -> AppResult<u64>;

    /// Create a directory (and any missing parents).
    async fn create_dir(&self, path: &str) -> AppResult<()>;

    /// Delete a file. Missing files are not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Delete a directory and all its contents. Missing directories are
    /// not an error.
    async fn delete_dir(&self, path: &str) -> AppResult<()>;

    /// Move (rename) a file or directory, creating missing parents of the
    /// target.
    async fn rename(&self, from: &str, to: &str) -> AppResult<()>;

    /// Check whether a file or directory exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Get metadata about a file or directory.
    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta>;
}
