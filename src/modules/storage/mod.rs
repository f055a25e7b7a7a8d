//! Blob storage for uploaded report images
//!
//! `BlobStore` is the seam used by the report ledger; the local-disk backend is the default and
//! the MinIO/S3 backend is selected with `STORAGE_BACKEND=minio`.

mod blob_store;
mod local_store;
mod minio_client;

pub use blob_store::BlobStore;
pub use local_store::LocalBlobStore;
pub use minio_client::MinIOBlobStore;
