pub mod bucket;
pub mod codec;
pub mod memory;

pub use bucket::BucketFileCache;
pub use memory::MemoryCache;

use phpscope_api::Cache;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// File cache under `path`, or a memory cache if there is no path or the
/// directory cannot be created.
pub fn create_cache(path: Option<&Path>) -> Arc<dyn Cache> {
    let Some(path) = path else {
        return Arc::new(MemoryCache::new());
    };
    match BucketFileCache::new(path) {
        Ok(cache) => {
            info!("Using file cache at {}", path.display());
            Arc::new(cache)
        }
        Err(e) => {
            warn!(
                "Failed to open file cache at {}: {}. Falling back to memory",
                path.display(),
                e
            );
            Arc::new(MemoryCache::new())
        }
    }
}
