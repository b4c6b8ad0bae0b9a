//! Upload orchestration: store the bytes, extract EXIF, hand back a URL.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;
use crate::metadata::{ExifExtractor, NormalizedExifData};
use crate::storage::{generate_storage_key, BlobStore, FsBlobStore, PublicUrlBuilder, StorageError};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload is empty")]
    Empty,
    #[error("failed to store upload: {0}")]
    Storage(#[from] StorageError),
}

/// What a caller needs to create a photo record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResult {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub exif: NormalizedExifData,
}

pub struct UploadService {
    store: Arc<dyn BlobStore>,
    extractor: ExifExtractor,
    urls: PublicUrlBuilder,
}

impl UploadService {
    pub fn new(store: Arc<dyn BlobStore>, extractor: ExifExtractor, urls: PublicUrlBuilder) -> Self {
        Self {
            store,
            extractor,
            urls,
        }
    }

    /// Filesystem-backed service for the configured root and bucket
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(FsBlobStore::new(&config.storage.root)),
            ExifExtractor::new(config.exif.coordinate_format),
            PublicUrlBuilder::new(&config.storage.public_base_url, &config.storage.bucket),
        )
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn urls(&self) -> &PublicUrlBuilder {
        &self.urls
    }

    /// Persist `bytes` and extract their metadata.
    ///
    /// Storage failures abort the upload. EXIF problems never do: they
    /// only leave the returned record empty.
    pub async fn upload(
        &self,
        original_filename: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<UploadResult, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        let key = generate_storage_key(original_filename);
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty() && *ct != FALLBACK_CONTENT_TYPE)
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(original_filename)
                    .first_or_octet_stream()
                    .to_string()
            });

        if let Err(e) = self.store.save(&key, bytes, &content_type).await {
            error!(key = %key, error = %e, "Blob storage failed");
            return Err(e.into());
        }

        let exif = self.extract_exif(bytes).await;
        let url = self.urls.url(&key);

        info!(
            key = %key,
            size = bytes.len(),
            content_type = %content_type,
            has_exif = exif.has_any(),
            "Upload stored"
        );

        Ok(UploadResult {
            key,
            url,
            content_type,
            size_bytes: bytes.len() as u64,
            exif,
        })
    }

    /// Parse EXIF on the blocking pool; a failed parse task yields an empty record
    async fn extract_exif(&self, bytes: &[u8]) -> NormalizedExifData {
        let extractor = self.extractor.clone();
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "EXIF extraction task failed");
                NormalizedExifData::default()
            })
    }

    /// Remove a previously uploaded blob
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.store.delete(key).await
    }
}
