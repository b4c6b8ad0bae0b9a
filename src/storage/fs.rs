use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::{validate_key, BlobReader, BlobStore, StorageError};

/// Stores each blob as one file under a root directory.
///
/// Content types are not persisted; readers guess them from the key's
/// extension, which [`super::generate_storage_key`] preserves.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

fn not_found_as(key: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |e| {
        if e.kind() == ErrorKind::NotFound {
            StorageError::NotFound(key.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn save(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        // write-then-rename so readers never observe a partial blob
        let partial = self.root.join(format!(".{}.partial", key));
        let written = match tokio::fs::write(&partial, bytes).await {
            Ok(()) => tokio::fs::rename(&partial, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        debug!(key, content_type, size = bytes.len(), "Blob saved");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn open_read(&self, key: &str) -> Result<BlobReader, StorageError> {
        let path = self.path_for(key)?;
        let file = tokio::fs::File::open(&path).await.map_err(not_found_as(key))?;
        Ok(Box::pin(file))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path).await.map_err(not_found_as(key))?;
        debug!(key, "Blob deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn test_save_read_delete() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = FsBlobStore::new(temp.path().join("blobs"));

        store.save("a.jpg", b"jpeg bytes", "image/jpeg").await.unwrap();
        assert!(store.exists("a.jpg").await.unwrap());
        assert!(temp.path().join("blobs/a.jpg").is_file());

        let mut reader = store.open_read("a.jpg").await.unwrap();
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"jpeg bytes");

        store.delete("a.jpg").await.unwrap();
        assert!(!store.exists("a.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_blob() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = FsBlobStore::new(temp.path());

        assert!(!store.exists("nope.jpg").await.unwrap());
        assert!(matches!(
            store.open_read("nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = FsBlobStore::new(temp.path().join("blobs"));

        let result = store.save("../escape.jpg", b"x", "image/jpeg").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(!temp.path().join("escape.jpg").exists());
    }

    #[tokio::test]
    async fn test_save_fails_when_root_is_a_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().join("not-a-dir");
        std::fs::write(&root, "occupied").unwrap();
        let store = FsBlobStore::new(&root);

        let result = store.save("a.jpg", b"x", "image/jpeg").await;
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_file() {
        if !std::path::Path::new("/dev/full").exists() {
            return;
        }
        let temp = tempfile::TempDir::new().unwrap();
        let store = FsBlobStore::new(temp.path());

        // every write to /dev/full fails with ENOSPC
        let partial = temp.path().join(".a.jpg.partial");
        std::os::unix::fs::symlink("/dev/full", &partial).unwrap();

        let result = store.save("a.jpg", b"jpeg bytes", "image/jpeg").await;
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(std::fs::symlink_metadata(&partial).is_err());
        assert!(!temp.path().join("a.jpg").exists());
    }
}
