use crate::cache::codec::{decode, encode};
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use phpscope_api::{ApiResult, Cache};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

type Bucket = Vec<(String, Vec<u8>)>;

const BUCKET_EXT: &str = "bucket";

/// On-disk cache. Keys hash to bucket files; each bucket holds every
/// `(key, value)` pair that hashed to it and is rewritten whole on mutation.
pub struct BucketFileCache {
    dir: PathBuf,
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl BucketFileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            locks: DashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn bucket_path(&self, hash: u64) -> PathBuf {
        self.dir.join(format!("{:016x}.{}", hash, BUCKET_EXT))
    }

    fn lock_for(&self, hash: u64) -> Arc<Mutex<()>> {
        self.locks.entry(hash).or_default().clone()
    }

    /// Forgets the lock of a bucket with no file behind it, unless another
    /// task still holds or waits on it.
    fn release_lock(&self, hash: u64, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(&hash, |_, l| Arc::strong_count(l) == 1);
    }

    async fn load(&self, path: &Path) -> Result<Bucket> {
        match tokio::fs::read(path).await {
            Ok(bytes) => match decode::<Bucket>(&bytes) {
                Ok(bucket) => Ok(bucket),
                Err(e) => {
                    warn!("Discarding corrupt cache bucket {}: {}", path.display(), e);
                    Ok(Vec::new())
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, path: &Path, bucket: &Bucket) -> Result<()> {
        if bucket.is_empty() {
            return match tokio::fs::remove_file(path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        let bytes = encode(bucket)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn mutate<F>(&self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Bucket),
    {
        let hash = xxh3_64(key.as_bytes());
        let lock = self.lock_for(hash);
        let emptied = {
            let _guard = lock.lock().await;
            let path = self.bucket_path(hash);
            let mut bucket = self.load(&path).await?;
            f(&mut bucket);
            self.store(&path, &bucket).await?;
            bucket.is_empty()
        };
        if emptied {
            self.release_lock(hash, lock);
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for BucketFileCache {
    async fn read(&self, key: &str) -> ApiResult<Option<Vec<u8>>> {
        let hash = xxh3_64(key.as_bytes());
        let lock = self.lock_for(hash);
        let bucket = {
            let _guard = lock.lock().await;
            self.load(&self.bucket_path(hash)).await?
        };
        if bucket.is_empty() {
            self.release_lock(hash, lock);
            return Ok(None);
        }
        Ok(bucket
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v))
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> ApiResult<()> {
        self.mutate(key, |bucket| match bucket.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => bucket.push((key.to_string(), value)),
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> ApiResult<()> {
        self.mutate(key, |bucket| bucket.retain(|(k, _)| k != key))
            .await?;
        Ok(())
    }

    async fn flush(&self) -> ApiResult<()> {
        // writes go straight to disk
        Ok(())
    }

    async fn clear(&self) -> ApiResult<()> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_bucket = path
                .extension()
                .map(|ext| ext == BUCKET_EXT || ext == "tmp")
                .unwrap_or(false);
            if is_bucket {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        self.locks.clear();
        debug!("Cleared {} cache buckets in {}", removed, self.dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_from_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = BucketFileCache::new(dir.path()).unwrap();
            cache.write("symbols/a", vec![1, 2, 3]).await.unwrap();
            cache.write("symbols/a", vec![4]).await.unwrap();
        }
        let cache = BucketFileCache::new(dir.path()).unwrap();
        assert_eq!(cache.read("symbols/a").await.unwrap(), Some(vec![4]));
        assert_eq!(cache.read("symbols/b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_empty_bucket_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BucketFileCache::new(dir.path()).unwrap();
        cache.write("k", vec![0]).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        cache.delete("k").await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn locks_are_dropped_with_their_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BucketFileCache::new(dir.path()).unwrap();
        cache.write("k", vec![0]).await.unwrap();
        assert_eq!(cache.locks.len(), 1);
        cache.delete("k").await.unwrap();
        assert!(cache.locks.is_empty());
        assert_eq!(cache.read("missing").await.unwrap(), None);
        assert!(cache.locks.is_empty());
    }

    #[tokio::test]
    async fn corrupt_bucket_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BucketFileCache::new(dir.path()).unwrap();
        let path = cache.bucket_path(xxh3_64(b"k"));
        std::fs::write(&path, b"not msgpack").unwrap();
        assert_eq!(cache.read("k").await.unwrap(), None);
        cache.write("k", vec![9]).await.unwrap();
        assert_eq!(cache.read("k").await.unwrap(), Some(vec![9]));
    }

    #[tokio::test]
    async fn clear_empties_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BucketFileCache::new(dir.path()).unwrap();
        cache.write("a", vec![1]).await.unwrap();
        cache.write("b", vec![2]).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.read("a").await.unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
