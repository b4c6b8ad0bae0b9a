use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::Config;
use crate::db::{Database, NewPhoto, Photo};
use crate::upload::UploadService;

/// Upload a local file into the configured store and catalog it
pub fn run_upload(config: &Config, path: &Path) -> Result<Photo> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", path.display()))?;

    let db = Database::open(&config.database.path)?;
    let uploads = UploadService::from_config(config);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(upload_and_record(&db, &uploads, &filename, &bytes))
}

async fn upload_and_record(
    db: &Database,
    uploads: &UploadService,
    filename: &str,
    bytes: &[u8],
) -> Result<Photo> {
    let uploaded = uploads.upload(filename, bytes, None).await?;

    let inserted = db
        .insert_photo(&NewPhoto {
            storage_key: &uploaded.key,
            url: &uploaded.url,
            original_filename: filename,
            content_type: &uploaded.content_type,
            size_bytes: uploaded.size_bytes as i64,
            exif: &uploaded.exif,
        })
        .and_then(|id| db.get_photo(id));

    match inserted {
        Ok(Some(photo)) => Ok(photo),
        Ok(None) => anyhow::bail!("Inserted photo not found: {}", uploaded.key),
        Err(e) => {
            if let Err(cleanup) = uploads.remove(&uploaded.key).await {
                warn!(key = %uploaded.key, error = %cleanup, "Failed to remove orphaned blob");
            }
            Err(e)
        }
    }
}
