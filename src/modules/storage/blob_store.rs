use async_trait::async_trait;

use crate::core::error::Result;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `data` under `name` and return the path clients use to retrieve it
    async fn put(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<String>;

    /// Delete the blob behind a path previously returned by `put`
    async fn delete(&self, path: &str) -> Result<()>;
}
