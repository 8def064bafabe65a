use crate::error::ApiResult;
use async_trait::async_trait;

/// Persistent key/value storage for evicted per-file data.
///
/// Values are opaque bytes; encoding is the caller's business. A missing key
/// is `Ok(None)`, not an error.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn read(&self, key: &str) -> ApiResult<Option<Vec<u8>>>;

    async fn write(&self, key: &str, value: Vec<u8>) -> ApiResult<()>;

    async fn delete(&self, key: &str) -> ApiResult<()>;

    /// Push buffered writes to the backing medium.
    async fn flush(&self) -> ApiResult<()>;

    /// Drop every entry.
    async fn clear(&self) -> ApiResult<()>;
}

pub fn symbols_key(uri: &str) -> String {
    format!("symbols/{}", uri)
}

pub fn references_key(uri: &str) -> String {
    format!("references/{}", uri)
}

pub const STATE_KEY: &str = "state";
