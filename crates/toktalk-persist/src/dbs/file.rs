use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::{PersistError, Result};
use crate::trait_client::{validate_key, KeyValueStore, StorageEvent, StorageEvents, TabId};

const FILE_EXTENSION: &str = "json";

/// Source tab reported for changes made by another process
pub const EXTERNAL_TAB: TabId = 0;

/// Shortest poll period; `tokio::time::interval` rejects zero
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

static NEXT_LOCAL_TAB: AtomicU64 = AtomicU64::new(1);

/// Last value this tab wrote per key and has not yet seen come back from disk
type OwnWrites = HashMap<String, String>;

/// Directory-backed store: one `<key>.json` file per key
///
/// Every process that opens the same directory is a separate tab. A polling
/// watcher turns changes written by other processes into `StorageEvent`s.
pub struct FileStore {
    dir: PathBuf,
    poll_interval: Duration,
    tab: TabId,
    events: broadcast::Sender<StorageEvent>,
    /// Writes by this tab the watcher has not seen on disk yet
    own_writes: Arc<Mutex<OwnWrites>>,
    watcher: JoinHandle<()>,
}

impl FileStore {
    /// Open (creating if needed) a store directory and start watching it
    pub async fn open(dir: impl AsRef<Path>, poll_interval: Duration) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        if poll_interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                requested_ms = poll_interval.as_millis() as u64,
                min_ms = MIN_POLL_INTERVAL.as_millis() as u64,
                "storage poll interval too short; using minimum"
            );
        }
        let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);

        let (events, _) = broadcast::channel(256);
        let own_writes = Arc::new(Mutex::new(HashMap::new()));
        let initial = scan_dir(&dir).await?;

        let watcher = tokio::spawn(watch_dir(
            dir.clone(),
            poll_interval,
            initial,
            events.clone(),
            Arc::clone(&own_writes),
        ));

        tracing::debug!(dir = %dir.display(), "file store opened");

        Ok(Self {
            dir,
            poll_interval,
            tab: NEXT_LOCAL_TAB.fetch_add(1, Ordering::Relaxed) << 16 | u64::from(std::process::id() & 0xffff),
            events,
            own_writes,
            watcher,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, FILE_EXTENSION))
    }

    fn remember_write(&self, key: &str, value: &str) -> Result<()> {
        let mut own = self
            .own_writes
            .lock()
            .map_err(|_| PersistError::Internal("own-write table lock poisoned".to_string()))?;
        own.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn tab_id(&self) -> TabId {
        self.tab
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.remember_write(key, value)?;

        // Write-then-rename so readers never observe a half-written value
        let tmp = self.dir.join(format!(".{}.{}.tmp", key, self.tab));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, self.path_for(key)).await?;

        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
            source_tab: self.tab,
        });
        Ok(())
    }

    fn subscribe(&self) -> StorageEvents {
        StorageEvents::new(self.events.subscribe(), self.tab)
    }
}

async fn scan_dir(dir: &Path) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(key) = key_from_path(&path) else {
            continue;
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => {
                values.insert(key, value);
            }
            // Raced with a rename or delete; next poll picks it up
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(values)
}

fn key_from_path(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != FILE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.starts_with('.') || validate_key(stem).is_err() {
        return None;
    }
    Some(stem.to_string())
}

/// Diff two directory snapshots into (key, new value) changes
fn diff_snapshots(
    before: &HashMap<String, String>,
    after: &HashMap<String, String>,
) -> Vec<(String, Option<String>)> {
    let mut changes = Vec::new();

    for (key, value) in after {
        if before.get(key) != Some(value) {
            changes.push((key.clone(), Some(value.clone())));
        }
    }
    for key in before.keys() {
        if !after.contains_key(key) {
            changes.push((key.clone(), None));
        }
    }

    changes.sort_by(|a, b| a.0.cmp(&b.0));
    changes
}

async fn watch_dir(
    dir: PathBuf,
    poll_interval: Duration,
    mut known: HashMap<String, String>,
    events: broadcast::Sender<StorageEvent>,
    own_writes: Arc<Mutex<OwnWrites>>,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let current = match scan_dir(&dir).await {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "storage poll failed");
                continue;
            }
        };

        let changes = diff_snapshots(&known, &current);
        let foreign = match own_writes.lock() {
            Ok(mut own) => settle_own_writes(&mut own, changes, &current),
            Err(_) => {
                tracing::error!("own-write table lock poisoned; reporting every change");
                changes
            }
        };

        for (key, new_value) in foreign {

            tracing::debug!(key = %key, "external storage change");
            let _ = events.send(StorageEvent {
                key,
                new_value,
                source_tab: EXTERNAL_TAB,
            });
        }

        known = current;
    }
}

/// Drop changes this tab made itself and forget writes already visible on disk
///
/// An entry is consumed the first time it is matched, so a later identical
/// value from another process is still reported. A differing value on disk
/// means someone else wrote after us, and our entry is stale.
fn settle_own_writes(
    own: &mut OwnWrites,
    changes: Vec<(String, Option<String>)>,
    current: &HashMap<String, String>,
) -> Vec<(String, Option<String>)> {
    let foreign = changes
        .into_iter()
        .filter(|(key, new_value)| match own.remove(key) {
            Some(written) => new_value.as_ref() != Some(&written),
            None => true,
        })
        .collect();

    // Writes that left the file unchanged never show up in a diff
    own.retain(|key, written| current.get(key) != Some(written));
    foreign
}
