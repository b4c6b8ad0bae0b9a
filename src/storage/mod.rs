//! Blob storage for uploaded image bytes.
//!
//! Objects are addressed by a flat key (no directories). Public URLs are
//! built from a configured base, so the same keys work against a local
//! emulator or a production bucket.

mod fs;
mod memory;

use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use uuid::Uuid;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

const MAX_FILENAME_LEN: usize = 100;

/// Readable byte stream for a stored blob
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn save(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    async fn open_read(&self, key: &str) -> Result<BlobReader, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Reject keys that could escape a flat namespace
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

/// `<uuid>-<sanitized filename>`; unique even for repeated filenames
pub fn generate_storage_key(original_filename: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_filename(original_filename))
}

/// Last path component, restricted to `[A-Za-z0-9._-]`
fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    // keep the extension when truncating so content types can still be guessed
    let cleaned = if cleaned.len() > MAX_FILENAME_LEN {
        match cleaned.rsplit_once('.') {
            Some((stem, ext)) if ext.len() < 10 => {
                let keep = MAX_FILENAME_LEN.saturating_sub(ext.len() + 1);
                format!("{}.{}", &stem[..keep.min(stem.len())], ext)
            }
            _ => cleaned[..MAX_FILENAME_LEN].to_string(),
        }
    } else {
        cleaned.to_string()
    };

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Builds public URLs as `{base_url}/{bucket}/{key}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlBuilder {
    base_url: String,
    bucket: String,
}

impl PublicUrlBuilder {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into().trim_matches('/').to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn url(&self, key: &str) -> String {
        if self.bucket.is_empty() {
            format!("{}/{}", self.base_url, key)
        } else {
            format!("{}/{}/{}", self.base_url, self.bucket, key)
        }
    }
}
