use crate::object::{ObjectStore, Result};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use std::io::{self, Read, Write};

/// Gzips object contents on the way into `inner` and unpacks them on the way
/// out. Keys and listings pass through untouched.
#[derive(Debug, Default)]
pub struct GzipObjectStore<O> {
    inner: O,
}

impl<O> GzipObjectStore<O> {
    #[must_use]
    pub fn new(inner: O) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(data).read_to_end(&mut decoded)?;
    Ok(decoded)
}

impl<O: ObjectStore> ObjectStore for GzipObjectStore<O> {
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let compressed = compress(&data)?;
        self.inner.put(bucket, key, compressed).await
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let compressed = self.inner.get(bucket, key).await?;
        Ok(decompress(&compressed)?)
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(bucket, prefix).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner.delete(bucket, key).await
    }
}

#[cfg(test)]
mod tests {
    use crate::object::{GzipObjectStore, InMemoryObjectStore, ObjectStore, ObjectStoreError};

    #[tokio::test]
    async fn contents_round_trip_compressed() {
        let store = GzipObjectStore::new(InMemoryObjectStore::new());

        store
            .put("my-bucket", "my-key", b"my-data".to_vec())
            .await
            .unwrap();

        assert_eq!(store.get("my-bucket", "my-key").await.unwrap(), b"my-data");
        let stored = store.inner().get("my-bucket", "my-key").await.unwrap();
        assert_eq!(stored[..2], [0x1f, 0x8b]);
        assert_eq!(store.list("my-bucket", "my-").await.unwrap(), ["my-key"]);
    }

    #[tokio::test]
    async fn missing_and_corrupt_objects() {
        let store = GzipObjectStore::new(InMemoryObjectStore::new());

        let err = store.get("my-bucket", "missing").await.unwrap_err();
        assert!(err.is_not_found());

        store
            .inner()
            .put("my-bucket", "plain", b"not gzip".to_vec())
            .await
            .unwrap();
        let err = store.get("my-bucket", "plain").await.unwrap_err();
        assert!(matches!(err, ObjectStoreError::Io(_)));

        store.delete("my-bucket", "plain").await.unwrap();
        assert!(store.inner().is_empty());
    }
}
