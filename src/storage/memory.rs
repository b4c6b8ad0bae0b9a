use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{validate_key, BlobReader, BlobStore, StorageError};

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Arc<Vec<u8>>,
    content_type: String,
}

/// Process-local store, used by tests and ephemeral runs
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, StoredBlob>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(|b| b.content_type.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredBlob>> {
        // a poisoned map is still structurally valid
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.lock().insert(
            key.to_string(),
            StoredBlob {
                bytes: Arc::new(bytes.to_vec()),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        Ok(self.lock().contains_key(key))
    }

    async fn open_read(&self, key: &str) -> Result<BlobReader, StorageError> {
        validate_key(key)?;
        let bytes = self
            .lock()
            .get(key)
            .map(|b| Arc::clone(&b.bytes))
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Box::pin(Cursor::new(SharedBytes(bytes))))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
