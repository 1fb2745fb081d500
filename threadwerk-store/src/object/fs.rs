use crate::object::{ObjectStore, ObjectStoreError, Result};
use std::{
    io::ErrorKind,
    path::PathBuf,
    process,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::fs;
use tracing::debug;

const STAGING_DIR: &str = ".staging";

/// Object store backed by a local directory.
///
/// Bucket `b` and key `k` map to the file `{root}/b/k`. Writes are staged in
/// `{root}/.staging` and renamed into place, so readers never observe a
/// partially written object.
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    staged: AtomicU64,
}

impl FsObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staged: AtomicU64::new(0),
        }
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.is_empty() || bucket.starts_with('.') || bucket.contains(['/', '\\']) {
            return Err(ObjectStoreError::InvalidKey {
                bucket: bucket.to_owned(),
                key: String::new(),
            });
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let mut path = self.bucket_path(bucket)?;
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(ObjectStoreError::InvalidKey {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                });
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn staging_path(&self) -> PathBuf {
        let n = self.staged.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(STAGING_DIR)
            .join(format!("{}-{n}", process::id()))
    }
}

impl ObjectStore for FsObjectStore {
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let staging = self.staging_path();
        if let Some(parent) = staging.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&staging, data).await?;

        if let Err(err) = fs::rename(&staging, &path).await {
            // Best effort, the rename error is the one worth reporting.
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(ObjectStoreError::not_found(bucket, key))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let bucket_path = self.bucket_path(bucket)?;

        // Only the directory holding the prefix's last segment can contain matches.
        let start = match prefix.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        };
        let mut start_path = bucket_path;
        for segment in start.split('/').filter(|segment| !segment.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(ObjectStoreError::InvalidKey {
                    bucket: bucket.to_owned(),
                    key: prefix.to_owned(),
                });
            }
            start_path.push(segment);
        }

        let mut keys = Vec::new();
        let mut pending = vec![(start_path, start.to_owned())];
        while let Some((dir, dir_key)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let Ok(name) = entry.file_name().into_string() else {
                    debug!(path = ?entry.path(), "Skipping non UTF-8 file name");
                    continue;
                };
                let key = if dir_key.is_empty() {
                    name
                } else {
                    format!("{dir_key}/{name}")
                };

                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), key));
                } else if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort_unstable();
        Ok(keys)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(ObjectStoreError::not_found(bucket, key))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::object::{FsObjectStore, ObjectStore, ObjectStoreError};

    #[tokio::test]
    async fn put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        store
            .put("bucket", "posts/p/comments/1/__comment__", b"data".to_vec())
            .await
            .unwrap();
        assert_eq!(
            store
                .get("bucket", "posts/p/comments/1/__comment__")
                .await
                .unwrap(),
            b"data"
        );
        assert!(
            dir.path()
                .join("bucket/posts/p/comments/1/__comment__")
                .is_file()
        );

        store
            .put("bucket", "posts/p/comments/1/__comment__", b"newer".to_vec())
            .await
            .unwrap();
        assert_eq!(
            store
                .get("bucket", "posts/p/comments/1/__comment__")
                .await
                .unwrap(),
            b"newer"
        );

        store
            .delete("bucket", "posts/p/comments/1/__comment__")
            .await
            .unwrap();
        assert!(
            store
                .get("bucket", "posts/p/comments/1/__comment__")
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            store
                .delete("bucket", "posts/p/comments/1/__comment__")
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn empty_objects_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        for key in [
            "posts/p/comments/__toplevel__/comments/2",
            "posts/p/comments/__toplevel__/comments/1",
            "posts/p/comments/1/__comment__",
            "posts/p/comments/1/comments/3",
            "posts/q/comments/__toplevel__/comments/4",
        ] {
            store.put("bucket", key, Vec::new()).await.unwrap();
        }

        assert_eq!(
            store
                .list("bucket", "posts/p/comments/__toplevel__/comments/")
                .await
                .unwrap(),
            [
                "posts/p/comments/__toplevel__/comments/1",
                "posts/p/comments/__toplevel__/comments/2",
            ]
        );
        assert_eq!(
            store.list("bucket", "posts/p/comments/1").await.unwrap(),
            [
                "posts/p/comments/1/__comment__",
                "posts/p/comments/1/comments/3",
            ]
        );
        assert!(
            store
                .list("bucket", "posts/r/comments/")
                .await
                .unwrap()
                .is_empty()
        );
        assert!(store.list("empty", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        for key in ["../outside", "a//b", "", "a/./b", "/abs"] {
            assert!(matches!(
                store.put("bucket", key, Vec::new()).await,
                Err(ObjectStoreError::InvalidKey { .. })
            ));
        }
        assert!(matches!(
            store.put(".staging", "a", Vec::new()).await,
            Err(ObjectStoreError::InvalidKey { .. })
        ));
    }
}
