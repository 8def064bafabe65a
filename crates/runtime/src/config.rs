use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory of the file cache. `None` keeps everything in memory.
    pub storage_path: Option<PathBuf>,
    /// Quiet period before an edited document is re-read.
    pub debounce_ms: u64,
    /// Reference tables fetched concurrently by a find-references query.
    pub fetch_window: usize,
    /// Concurrent cache operations during startup and shutdown.
    pub io_concurrency: usize,
    /// Wipe the cache instead of warm-starting from it.
    pub clear_cache: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            debounce_ms: 200,
            fetch_window: 10,
            io_concurrency: 8,
            clear_cache: false,
        }
    }
}

impl EngineConfig {
    /// `~/.phpscope/cache`
    pub fn default_storage_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".phpscope")
            .join("cache")
    }

    /// Defaults with the file cache at `path`.
    pub fn with_storage(path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
