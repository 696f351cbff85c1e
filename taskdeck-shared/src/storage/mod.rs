//! Blob storage for task attachments
//!
//! Attachment bytes are kept outside the database behind the [`BlobStore`]
//! trait. The API server owns one store instance and passes it around via
//! application state.
//!
//! Deleting an absent blob is success by contract: a retried delete or a
//! row whose blob is already gone must not fail the request.
//!
//! # Implementations
//!
//! - [`fs::FsBlobStore`]: files under a configured root directory
//! - [`memory::MemoryBlobStore`]: in-memory map, for tests

pub mod fs;
pub mod memory;

use async_trait::async_trait;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// Error type for blob storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested key is not valid for this store
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A key-addressed blob store
///
/// Keys are generated by the application (UUID-based, see
/// `models::attachment::storage_key_for`) and contain no path separators.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores a blob under the given key, replacing any existing blob
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieves a blob, None if the key doesn't exist
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Deletes a blob; deleting an absent key succeeds
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Rejects keys that could escape the store's namespace
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("550e8400-e29b-41d4-a716-446655440000.pdf").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("a\\b").is_err());
    }
}
