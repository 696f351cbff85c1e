//! In-memory blob store for tests
//!
//! Keeps blobs in a mutex-guarded map. Mirrors the contract of the
//! filesystem store, including idempotent deletes, so tests can swap it in
//! without touching disk.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{validate_key, BlobStore, StorageError};

/// Blob store backed by a HashMap
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    /// True if the store holds no blobs
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        self.blobs.lock().unwrap().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        // Absent key: nothing to do, still success
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryBlobStore::new();

        store.put("k", b"v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(&b"v"[..]));
        assert_eq!(store.len(), 1);

        store.delete("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_succeeds() {
        let store = MemoryBlobStore::new();
        store.delete("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryBlobStore::new();

        store.put("k", b"one").await.unwrap();
        store.put("k", b"two").await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(&b"two"[..]));
        assert_eq!(store.len(), 1);
    }
}
