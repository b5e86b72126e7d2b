use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;

/// Identifies one open application instance ("tab") on a shared store
pub type TabId = u64;

/// A write observed on the shared store, as seen by the other tabs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// `None` when the key was deleted from outside the app
    pub new_value: Option<String>,
    pub source_tab: TabId,
}

/// Browser-local-storage semantics: string keys, string values, whole-value writes
///
/// Implementations must deliver a `StorageEvent` to every *other* tab after a
/// write. The writing tab is never notified of its own change.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn tab_id(&self) -> TabId;
    
    async fn get(&self, key: &str) -> Result<Option<String>>;
    
    /// Overwrite the whole value
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    
    /// Changes made by other tabs from now on
    fn subscribe(&self) -> StorageEvents;
}

/// Receiver half of the change feed with the subscriber's own writes filtered out
pub struct StorageEvents {
    rx: broadcast::Receiver<StorageEvent>,
    own_tab: TabId,
}

impl StorageEvents {
    pub fn new(rx: broadcast::Receiver<StorageEvent>, own_tab: TabId) -> Self {
        Self { rx, own_tab }
    }
    
    /// Next foreign event; `None` once the store is gone
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.source_tab == self.own_tab => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "storage event feed lagged; older events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(crate::error::PersistError::InvalidKey(key.to_string()))
    }
}
