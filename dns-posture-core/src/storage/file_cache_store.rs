//! Cache store persisted as one JSON file per key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};
use crate::traits::{CacheEntry, CacheStore, Clock, SystemClock};

/// Stores each entry in `<dir>/<sha256(key)>.json`.
///
/// Writes go to a temporary sibling and are renamed into place, so readers
/// never see a half-written entry. Like the in-memory store it is unbounded.
pub struct FileCacheStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    tmp_counter: AtomicU64,
}

impl FileCacheStore {
    /// Open (and create if needed) a cache directory.
    pub async fn open(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        Self::open_with_clock(dir, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> CoreResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            CoreError::CacheError(format!("cannot create cache dir {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir,
            clock,
            tmp_counter: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    fn tmp_path_for(&self, path: &Path) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("tmp.{}.{n}", std::process::id()))
    }

    async fn remove_file(path: &Path) -> CoreResult<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::CacheError(format!(
                "cannot remove {}: {e}",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::CacheError(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("[cache] dropping unreadable entry {}: {e}", path.display());
                Self::remove_file(&path).await?;
                return Ok(None);
            }
        };

        if entry.key != key {
            return Ok(None);
        }
        if entry.is_expired(self.clock.now()) {
            Self::remove_file(&path).await?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CoreResult<()> {
        let entry = CacheEntry::new(key, value, self.clock.now(), ttl);
        let body = serde_json::to_vec(&entry)?;

        let path = self.path_for(key);
        let tmp = self.tmp_path_for(&path);
        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            return Err(CoreError::CacheError(format!(
                "cannot write {}: {e}",
                tmp.display()
            )));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CoreError::CacheError(format!(
                "cannot move entry into {}: {e}",
                path.display()
            )));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        Self::remove_file(&self.path_for(key)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::traits::ManualClock;

    async fn store(dir: &Path, clock: &ManualClock) -> FileCacheStore {
        FileCacheStore::open_with_clock(dir, Arc::new(clock.clone()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn set_get_and_expire() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = ManualClock::default();
        let cache = store(tmp.path(), &clock).await;

        cache.set("rate:10.0.0.1", "3".into(), Duration::from_secs(1)).await.unwrap();
        assert_eq!(cache.get("rate:10.0.0.1").await.unwrap().as_deref(), Some("3"));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("rate:10.0.0.1").await.unwrap(), None);
        assert!(!cache.path_for("rate:10.0.0.1").exists());

        cache.set("rate:10.0.0.1", "1".into(), Duration::from_secs(1)).await.unwrap();
        assert_eq!(cache.get("rate:10.0.0.1").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn file_name_is_key_digest() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = store(tmp.path(), &ManualClock::default()).await;
        cache.set("report:example.com:spf", "{}".into(), Duration::from_secs(60)).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        let stem = names[0].strip_suffix(".json").unwrap();
        assert_eq!(stem.len(), 64);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = ManualClock::default();
        store(tmp.path(), &clock)
            .await
            .set("k", "v".into(), Duration::from_secs(60))
            .await
            .unwrap();
        let reopened = store(tmp.path(), &clock).await;
        assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = store(tmp.path(), &ManualClock::default()).await;
        std::fs::write(cache.path_for("k"), "not json").unwrap();

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(!cache.path_for("k").exists());
    }

    #[tokio::test]
    async fn remove_deletes_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = store(tmp.path(), &ManualClock::default()).await;
        cache.set("k", "v".into(), Duration::from_secs(60)).await.unwrap();
        cache.remove("k").await.unwrap();
        cache.remove("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
