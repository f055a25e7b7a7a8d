//! MinIO/S3-compatible blob store
//!
//! Report images are written under `<prefix>/reports/` and addressed by their public URL, which
//! is what gets recorded on the report.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};
use crate::modules::storage::BlobStore;

const REPORTS_FOLDER: &str = "reports";

pub struct MinIOBlobStore {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    prefix: String,
}

impl MinIOBlobStore {
    /// Connect to the configured bucket, creating it when missing
    pub async fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // http://endpoint/bucket rather than http://bucket.endpoint
        bucket.set_path_style();

        let store = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_string(),
            prefix: config.prefix.trim_matches('/').to_string(),
        };

        store.ensure_bucket_exists().await;

        info!(
            "MinIO blob store initialized for endpoint: {}, bucket: {}, prefix: {}",
            store.endpoint,
            store.bucket.name(),
            store.prefix
        );

        Ok(store)
    }

    /// Existing buckets and creation failures are tolerated; uploads surface real problems.
    async fn ensure_bucket_exists(&self) {
        let created = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(_) => info!("Bucket '{}' created successfully", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    fn object_key(&self, name: &str) -> String {
        object_key(&self.prefix, name)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    /// Accepts URLs on either endpoint as well as bare object keys
    fn key_for(&self, path: &str) -> Option<String> {
        let bucket = self.bucket.name();
        key_from_url(path, &[&self.public_endpoint, &self.endpoint], &bucket)
            .or_else(|| path.starts_with(&format!("{}/", self.prefix)).then(|| path.to_string()))
    }
}

fn object_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        format!("{}/{}", REPORTS_FOLDER, name)
    } else {
        format!("{}/{}/{}", prefix, REPORTS_FOLDER, name)
    }
}

fn key_from_url(url: &str, endpoints: &[&str], bucket: &str) -> Option<String> {
    endpoints.iter().find_map(|endpoint| {
        url.strip_prefix(&format!("{}/{}/", endpoint, bucket))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    })
}

#[async_trait]
impl BlobStore for MinIOBlobStore {
    async fn put(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        let key = self.object_key(name);

        self.bucket
            .put_object_with_content_type(&key, &data, content_type)
            .await
            .map_err(|e| {
                AppError::StorageUnavailable(format!("Failed to upload file '{}': {}", key, e))
            })?;

        debug!("Uploaded file '{}' to bucket '{}'", key, self.bucket.name());
        Ok(self.public_url(&key))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let key = self.key_for(path).ok_or_else(|| {
            AppError::InvalidInput(format!("'{}' is not an object in this bucket", path))
        })?;

        self.bucket.delete_object(&key).await.map_err(|e| {
            AppError::StorageUnavailable(format!("Failed to delete file '{}': {}", key, e))
        })?;

        debug!("Deleted file '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        assert_eq!(
            object_key("public", "20250101120000000000_a.png"),
            "public/reports/20250101120000000000_a.png"
        );
        assert_eq!(object_key("", "a.png"), "reports/a.png");
    }

    #[test]
    fn test_key_from_url() {
        let endpoints = ["https://cdn.example.com", "http://minio:9000"];

        assert_eq!(
            key_from_url(
                "https://cdn.example.com/uploads/public/reports/a.png",
                &endpoints,
                "uploads"
            ),
            Some("public/reports/a.png".to_string())
        );
        assert_eq!(
            key_from_url("http://minio:9000/uploads/public/reports/b.jpg", &endpoints, "uploads"),
            Some("public/reports/b.jpg".to_string())
        );
        assert_eq!(
            key_from_url("http://elsewhere/uploads/a.png", &endpoints, "uploads"),
            None
        );
        assert_eq!(
            key_from_url("https://cdn.example.com/uploads/", &endpoints, "uploads"),
            None
        );
    }
}
