pub mod trait_client;
pub mod dbs;
pub mod client;
pub mod notifier;
pub mod error;
pub mod builder;

pub use trait_client::{KeyValueStore, StorageEvent, StorageEvents, TabId};
pub use dbs::{FileStore, MemoryStore};
pub use dbs::file::{EXTERNAL_TAB, MIN_POLL_INTERVAL};
pub use client::{RequestStore, StoreSnapshot, ACTIVE_CLASS_KEY, REQUESTS_KEY};
pub use notifier::{ApplyOutcome, CrossTabNotifier, SharedRequests};
pub use error::PersistError;
pub use builder::StoreBuilder;
