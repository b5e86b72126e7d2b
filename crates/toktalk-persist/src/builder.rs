use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::client::RequestStore;
use crate::dbs::{FileStore, MemoryStore};
use crate::error::Result;

pub struct StoreBuilder {
    data_dir: Option<PathBuf>,
    poll_interval: Duration,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            data_dir: None,
            poll_interval: Duration::from_millis(500),
        }
    }
    
    /// Persist under this directory; without it the store lives in memory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }
    
    /// How often other processes' writes are looked for; clamped to `MIN_POLL_INTERVAL`
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
    
    pub async fn build(self) -> Result<RequestStore> {
        match self.data_dir {
            Some(dir) => {
                let store = FileStore::open(dir, self.poll_interval).await?;
                Ok(RequestStore::new(Arc::new(store)))
            }
            None => {
                tracing::warn!("no data directory configured; requests are kept in memory only");
                Ok(RequestStore::new(Arc::new(MemoryStore::new())))
            }
        }
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
