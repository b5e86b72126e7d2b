use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

use toktalk_types::CounselingRequest;

use crate::client::{RequestStore, REQUESTS_KEY};
use crate::trait_client::StorageEvent;

/// In-memory request list shared between the app and the notifier
pub type SharedRequests = Arc<RwLock<Vec<CounselingRequest>>>;

/// What a single storage event did to in-memory state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Whole list replaced; carries the new length
    Replaced(usize),
    /// Other key, or the request key was removed
    Ignored,
    /// Request key held unparsable JSON; state left as it was
    Malformed,
}

/// Mirrors other tabs' writes of the request list into memory
///
/// Last writer wins: the incoming list replaces the local one wholesale, with
/// no merge. A tab that writes from a stale snapshot silently drops records
/// added elsewhere in the meantime.
pub struct CrossTabNotifier {
    handle: JoinHandle<()>,
    changes: watch::Receiver<u64>,
}

impl CrossTabNotifier {
    pub fn spawn(store: &RequestStore, requests: SharedRequests) -> Self {
        let mut events = store.subscribe();
        let (tx, changes) = watch::channel(0u64);
        
        let handle = tokio::spawn(async move {
            let mut generation = 0u64;
            while let Some(event) = events.recv().await {
                let outcome = {
                    let mut current = requests.write().await;
                    Self::apply(&event, &mut current)
                };
                
                match outcome {
                    ApplyOutcome::Replaced(count) => {
                        generation += 1;
                        tracing::info!(count, source_tab = event.source_tab, "requests updated from another tab");
                        let _ = tx.send(generation);
                    }
                    ApplyOutcome::Malformed => {
                        tracing::warn!(source_tab = event.source_tab, "ignoring malformed request list from another tab");
                    }
                    ApplyOutcome::Ignored => {}
                }
            }
            tracing::debug!("storage event feed closed; notifier stopping");
        });
        
        Self { handle, changes }
    }
    
    /// Apply one event to the in-memory list
    pub fn apply(event: &StorageEvent, requests: &mut Vec<CounselingRequest>) -> ApplyOutcome {
        if event.key != REQUESTS_KEY {
            return ApplyOutcome::Ignored;
        }
        let Some(json) = event.new_value.as_deref() else {
            return ApplyOutcome::Ignored;
        };
        
        match serde_json::from_str::<Vec<CounselingRequest>>(json) {
            Ok(incoming) => {
                *requests = incoming;
                ApplyOutcome::Replaced(requests.len())
            }
            Err(_) => ApplyOutcome::Malformed,
        }
    }
    
    /// Bumped every time the list is replaced
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.clone()
    }
    
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for CrossTabNotifier {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
