use phpscope_api::Cache;
use phpscope_api::cache::STATE_KEY;
use phpscope_core::cache::codec;
use phpscope_core::error::Result;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// What survives a restart besides the cached tables themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceState {
    /// Seconds since the epoch at the last shutdown.
    pub timestamp: u64,
    pub known_uris: Vec<String>,
}

impl WorkspaceState {
    pub fn now(mut known_uris: Vec<String>) -> Self {
        known_uris.sort();
        known_uris.dedup();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            timestamp,
            known_uris,
        }
    }

    pub async fn load(cache: &dyn Cache) -> Result<Option<Self>> {
        codec::read_value(cache, STATE_KEY).await
    }

    pub async fn save(&self, cache: &dyn Cache) -> Result<()> {
        codec::write_value(cache, STATE_KEY, self).await
    }
}
