use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::error::{AppError, Result};
use crate::modules::storage::BlobStore;

/// Stores blobs as files in a directory served by the HTTP router
pub struct LocalBlobStore {
    root: PathBuf,
    public_path: String,
}

impl LocalBlobStore {
    /// Create the store, making sure the upload directory exists
    pub async fn new(root: impl Into<PathBuf>, public_path: &str) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create upload directory '{}': {}",
                root.display(),
                e
            ))
        })?;

        info!("Local blob store ready at {}", root.display());

        Ok(Self {
            root,
            public_path: public_path.trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Only the final path component is honoured, so stored paths cannot escape the root.
    fn file_for(&self, path: &str) -> Option<PathBuf> {
        Path::new(path)
            .file_name()
            .filter(|name| *name != "." && *name != "..")
            .map(|name| self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: Vec<u8>, _content_type: &str) -> Result<String> {
        let file = self
            .file_for(name)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid blob name '{}'", name)))?;

        tokio::fs::write(&file, &data).await.map_err(|e| {
            AppError::StorageUnavailable(format!("Failed to write '{}': {}", file.display(), e))
        })?;

        debug!("Stored {} bytes at {}", data.len(), file.display());

        let stored_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("{}/{}", self.public_path, stored_name))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let file = self
            .file_for(path)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid blob path '{}'", path)))?;

        match tokio::fs::remove_file(&file).await {
            Ok(()) => {
                debug!("Deleted blob {}", file.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                format!("Blob '{}' does not exist", path),
            )),
            Err(e) => Err(AppError::StorageUnavailable(format!(
                "Failed to delete '{}': {}",
                file.display(),
                e
            ))),
        }
    }
}
