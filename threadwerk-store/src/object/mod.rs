//! Flat, key-addressed blob storage.
//!
//! Objects live in buckets and are addressed by `/`-separated string keys.
//! Each single-key operation is expected to be atomic; nothing is assumed
//! about atomicity across keys.

pub mod fs;
pub mod gzip;
pub mod memory;

use std::future::Future;
use thiserror::Error;

pub use fs::FsObjectStore;
pub use gzip::GzipObjectStore;
pub use memory::InMemoryObjectStore;

pub type Result<T, E = ObjectStoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Object {key} was not found in bucket {bucket}")]
    NotFound { bucket: String, key: String },
    #[error("Object key {key:?} is not valid in bucket {bucket:?}")]
    InvalidKey { bucket: String, key: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ObjectStoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn not_found(bucket: &str, key: &str) -> Self {
        Self::NotFound {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        }
    }
}

pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous object.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fails with [`ObjectStoreError::NotFound`] if nothing is stored under `key`.
    fn get(&self, bucket: &str, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Full keys of every object whose key starts with `prefix`, in no
    /// particular order.
    fn list(&self, bucket: &str, prefix: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Fails with [`ObjectStoreError::NotFound`] if nothing is stored under `key`.
    fn delete(&self, bucket: &str, key: &str) -> impl Future<Output = Result<()>> + Send;
}
