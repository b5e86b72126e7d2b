use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::error::{PersistError, Result};
use crate::trait_client::{validate_key, KeyValueStore, StorageEvent, StorageEvents, TabId};

struct SharedMemory {
    data: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
    next_tab: AtomicU64,
}

/// In-process store; every `open_tab` handle sees the same data
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<SharedMemory>,
    tab: TabId,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        let shared = Arc::new(SharedMemory {
            data: Mutex::new(HashMap::new()),
            events,
            next_tab: AtomicU64::new(2),
        });
        
        Self { shared, tab: 1 }
    }
    
    /// Another tab on the same storage
    pub fn open_tab(&self) -> Self {
        let tab = self.shared.next_tab.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::clone(&self.shared),
            tab,
        }
    }
    
    fn write(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        {
            let mut data = self
                .shared
                .data
                .lock()
                .map_err(|_| PersistError::Internal("memory store lock poisoned".to_string()))?;
            data.insert(key.to_string(), value.to_string());
        }
        
        // No subscribers is fine
        let _ = self.shared.events.send(StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
            source_tab: self.tab,
        });
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn tab_id(&self) -> TabId {
        self.tab
    }
    
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let data = self
            .shared
            .data
            .lock()
            .map_err(|_| PersistError::Internal("memory store lock poisoned".to_string()))?;
        Ok(data.get(key).cloned())
    }
    
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, value)
    }
    
    fn subscribe(&self) -> StorageEvents {
        StorageEvents::new(self.shared.events.subscribe(), self.tab)
    }
}
