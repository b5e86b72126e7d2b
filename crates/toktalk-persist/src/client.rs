use std::sync::Arc;

use toktalk_types::CounselingRequest;

use crate::error::Result;
use crate::trait_client::{KeyValueStore, StorageEvents};

/// Key holding the teacher's active class (plain string, not JSON)
pub const ACTIVE_CLASS_KEY: &str = "counselingApp_activeClass";

/// Key holding every class's requests as one JSON array, most recent first
pub const REQUESTS_KEY: &str = "counselingApp_requests";

/// Both persisted records, read once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub requests: Vec<CounselingRequest>,
    pub active_class: Option<String>,
}

/// Typed access to the two records on top of any `KeyValueStore`
#[derive(Clone)]
pub struct RequestStore {
    backend: Arc<dyn KeyValueStore>,
}

impl RequestStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }
    
    pub fn builder() -> crate::builder::StoreBuilder {
        crate::builder::StoreBuilder::new()
    }
    
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }
    
    /// All stored requests; a missing or empty record reads as no requests
    pub async fn load_requests(&self) -> Result<Vec<CounselingRequest>> {
        match self.backend.get(REQUESTS_KEY).await? {
            Some(json) if !json.is_empty() => Ok(serde_json::from_str(&json)?),
            _ => Ok(Vec::new()),
        }
    }
    
    /// Overwrite the whole list
    pub async fn save_requests(&self, requests: &[CounselingRequest]) -> Result<()> {
        let json = serde_json::to_string(requests)?;
        self.backend.set(REQUESTS_KEY, &json).await?;
        tracing::debug!(count = requests.len(), "requests saved");
        Ok(())
    }
    
    pub async fn load_active_class(&self) -> Result<Option<String>> {
        Ok(self
            .backend
            .get(ACTIVE_CLASS_KEY)
            .await?
            .filter(|class| !class.is_empty()))
    }
    
    pub async fn save_active_class(&self, class_name: &str) -> Result<()> {
        self.backend.set(ACTIVE_CLASS_KEY, class_name).await
    }
    
    pub async fn snapshot(&self) -> Result<StoreSnapshot> {
        Ok(StoreSnapshot {
            requests: self.load_requests().await?,
            active_class: self.load_active_class().await?,
        })
    }
    
    pub fn subscribe(&self) -> StorageEvents {
        self.backend.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbs::MemoryStore;
    use chrono::{TimeZone, Utc};
    use toktalk_types::{CounselorType, SessionSelection};

    fn request(name: &str, class_name: &str, second: u32) -> CounselingRequest {
        let selection = SessionSelection::new(name, "고민", CounselorType::Chatbot).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 3, 9, 0, second).unwrap();
        CounselingRequest::new(&selection, "요약", class_name, at)
    }

    #[tokio::test]
    async fn test_empty_store_snapshot() {
        let store = RequestStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.snapshot().await.unwrap(), StoreSnapshot::default());
    }

    #[tokio::test]
    async fn test_empty_string_reads_as_no_requests() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(REQUESTS_KEY, "").await.unwrap();
        let store = RequestStore::new(backend);
        
        assert!(store.load_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(REQUESTS_KEY, "[{").await.unwrap();
        let store = RequestStore::new(backend);
        
        assert!(matches!(
            store.load_requests().await,
            Err(crate::PersistError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_active_class_is_stored_raw() {
        let backend = Arc::new(MemoryStore::new());
        let store = RequestStore::new(backend.clone());
        
        store.save_active_class("3학년 2반").await.unwrap();
        
        assert_eq!(backend.get(ACTIVE_CLASS_KEY).await.unwrap().as_deref(), Some("3학년 2반"));
        assert_eq!(store.load_active_class().await.unwrap().as_deref(), Some("3학년 2반"));
    }

    #[tokio::test]
    async fn test_save_preserves_order() {
        let store = RequestStore::new(Arc::new(MemoryStore::new()));
        let requests = vec![request("b", "1반", 2), request("a", "2반", 1)];
        
        store.save_requests(&requests).await.unwrap();
        
        assert_eq!(store.load_requests().await.unwrap(), requests);
    }
}
