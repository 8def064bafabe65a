use async_trait::async_trait;
use dashmap::DashMap;
use phpscope_api::{ApiResult, Cache};

/// Process-local cache. Everything is lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn read(&self, key: &str) -> ApiResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> ApiResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ApiResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn flush(&self) -> ApiResult<()> {
        Ok(())
    }

    async fn clear(&self) -> ApiResult<()> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_delete() {
        let cache = MemoryCache::new();
        cache.write("k", vec![1, 2]).await.unwrap();
        assert_eq!(cache.read("k").await.unwrap(), Some(vec![1, 2]));
        cache.delete("k").await.unwrap();
        assert_eq!(cache.read("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }
}
