use crate::object::{ObjectStore, ObjectStoreError, Result};
use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

/// Object store held entirely in memory. Keys list in lexicographic order.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<(String, String), Vec<u8>>>,
}

impl InMemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every key stored in `bucket`, sorted.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(object_bucket, _)| object_bucket == bucket)
            .map(|(_, key)| key.clone())
            .collect()
    }
}

impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((bucket.to_owned(), key.to_owned()), data);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(bucket.to_owned(), key.to_owned()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::not_found(bucket, key))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let keys = objects
            .range((bucket.to_owned(), prefix.to_owned())..)
            .map(|((object_bucket, key), _)| (object_bucket, key))
            .take_while(|(object_bucket, key)| *object_bucket == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect();
        Ok(keys)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(bucket.to_owned(), key.to_owned()))
            .map(drop)
            .ok_or_else(|| ObjectStoreError::not_found(bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use crate::object::{InMemoryObjectStore, ObjectStore};

    #[tokio::test]
    async fn put_get_delete() {
        let store = InMemoryObjectStore::new();

        store.put("bucket", "a/b", b"data".to_vec()).await.unwrap();
        assert_eq!(store.get("bucket", "a/b").await.unwrap(), b"data");
        assert!(store.get("other", "a/b").await.unwrap_err().is_not_found());

        store.put("bucket", "a/b", b"newer".to_vec()).await.unwrap();
        assert_eq!(store.get("bucket", "a/b").await.unwrap(), b"newer");
        assert_eq!(store.len(), 1);

        store.delete("bucket", "a/b").await.unwrap();
        assert!(store.is_empty());
        assert!(store.delete("bucket", "a/b").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_stays_inside_bucket_and_prefix() {
        let store = InMemoryObjectStore::new();
        for key in ["a/1", "a/2", "a/22/x", "ab/1", "b/1"] {
            store.put("bucket", key, Vec::new()).await.unwrap();
        }
        store.put("other", "a/3", Vec::new()).await.unwrap();
        // Sorts right after every `bucket` key.
        store.put("bucket0", "a/4", Vec::new()).await.unwrap();

        assert_eq!(
            store.list("bucket", "a/").await.unwrap(),
            ["a/1", "a/2", "a/22/x"]
        );
        assert_eq!(store.list("bucket", "a/2").await.unwrap(), ["a/2", "a/22/x"]);
        assert!(store.list("bucket", "c/").await.unwrap().is_empty());
        assert_eq!(store.list("other", "").await.unwrap(), ["a/3"]);
    }
}
