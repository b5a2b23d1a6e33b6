//! Request-level cache over the persisted store's key-value table.
//!
//! The cache degrades gracefully: a store failure on read is a miss and
//! a store failure on write is logged and swallowed, so the system stays
//! correct, just slower, while the store is unavailable. Values are
//! whatever serializes to JSON; keys are namespaced by purpose.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::metrics;
use crate::store::MovieStore;

/// Cache key namespaces. A key's prefix decides its metrics label and
/// makes collisions between purposes impossible.
pub mod keys {
    pub const META: &str = "meta:";
    pub const STREAM: &str = "stream_";
    pub const CATALOG: &str = "catalog_";
    pub const METADATA: &str = "metadata_";
}

/// Typed get/set/delete over the store's TTL'd key-value table.
#[derive(Clone)]
pub struct MetaCache {
    store: Arc<dyn MovieStore>,
}

impl MetaCache {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self { store }
    }

    /// Fetch and decode a cached value. Expired entries, decode
    /// failures, and store errors are all misses.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let namespace = namespace_of(key);
        match self.store.get_cache(key) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(decoded) => {
                    metrics::CACHE_HITS.with_label_values(&[namespace]).inc();
                    Some(decoded)
                }
                Err(e) => {
                    warn!(key = key, error = %e, "Discarding undecodable cache entry");
                    let _ = self.store.delete_cache(key);
                    metrics::CACHE_MISSES.with_label_values(&[namespace]).inc();
                    None
                }
            },
            Ok(None) => {
                metrics::CACHE_MISSES.with_label_values(&[namespace]).inc();
                None
            }
            Err(e) => {
                warn!(key = key, error = %e, "Cache read failed, treating as miss");
                metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
                metrics::CACHE_MISSES.with_label_values(&[namespace]).inc();
                None
            }
        }
    }

    /// Store a value with the given TTL. A lost write is acceptable:
    /// the value is recomputable on the next request.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl_minutes: i64) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to encode cache value");
                return;
            }
        };
        if let Err(e) = self.store.set_cache(key, &json, ttl_minutes) {
            warn!(key = key, error = %e, "Cache write failed, value dropped");
            metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
        }
    }

    /// Drop a cache entry.
    pub fn delete(&self, key: &str) {
        if let Err(e) = self.store.delete_cache(key) {
            warn!(key = key, error = %e, "Cache delete failed");
            metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
        }
    }
}

fn namespace_of(key: &str) -> &'static str {
    if key.starts_with(keys::META) {
        "meta"
    } else if key.starts_with(keys::STREAM) {
        "stream"
    } else if key.starts_with(keys::CATALOG) {
        "catalog"
    } else if key.starts_with(keys::METADATA) {
        "metadata"
    } else {
        "other"
    }
}

/// Handle to the background expiry sweeper.
///
/// Exactly one sweeper runs per process. Dropping the handle without
/// calling [`SweeperHandle::stop`] aborts the task on runtime shutdown;
/// calling it cancels the interval promptly, which keeps test runtimes
/// free of leaked timers.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Start the periodic expired-entry sweep.
pub fn start_sweeper(store: Arc<dyn MovieStore>, interval: Duration) -> SweeperHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would sweep an empty table on boot.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match store.clear_expired_cache() {
                        Ok(0) => {}
                        Ok(removed) => {
                            debug!(removed = removed, "Swept expired cache entries");
                            metrics::CACHE_SWEPT.inc_by(removed as u64);
                        }
                        Err(e) => {
                            warn!(error = %e, "Cache sweep failed");
                            metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
                        }
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }
    });

    SweeperHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SqliteStore, StoreError};
    use serde_json::json;

    fn cache_over_memory_store() -> (MetaCache, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        (MetaCache::new(store.clone()), store)
    }

    #[test]
    fn test_get_set_roundtrip() {
        let (cache, _store) = cache_over_memory_store();
        cache.set("meta:cc_x", &json!({"name": "X"}), 30);

        let value: serde_json::Value = cache.get("meta:cc_x").unwrap();
        assert_eq!(value["name"], "X");
    }

    #[test]
    fn test_expired_entry_is_miss() {
        let (cache, _store) = cache_over_memory_store();
        cache.set("meta:cc_x", &json!(1), -1);
        assert!(cache.get::<serde_json::Value>("meta:cc_x").is_none());
    }

    #[test]
    fn test_delete() {
        let (cache, _store) = cache_over_memory_store();
        cache.set("stream_cc_x", &json!([1, 2]), 30);
        cache.delete("stream_cc_x");
        assert!(cache.get::<serde_json::Value>("stream_cc_x").is_none());
    }

    #[test]
    fn test_undecodable_entry_is_miss_and_removed() {
        let (cache, store) = cache_over_memory_store();
        store
            .set_cache("meta:cc_x", &json!("not a struct"), 30)
            .unwrap();

        #[derive(serde::Deserialize)]
        struct Expected {
            #[allow(dead_code)]
            name: String,
        }

        assert!(cache.get::<Expected>("meta:cc_x").is_none());
        // The poisoned entry was dropped, not left to fail every read.
        assert!(store.get_cache("meta:cc_x").unwrap().is_none());
    }

    #[test]
    fn test_store_failure_degrades_to_miss() {
        struct FailingStore;
        impl crate::store::MovieStore for FailingStore {
            fn get_movie(
                &self,
                _: &str,
            ) -> Result<Option<crate::store::MovieRecord>, StoreError> {
                Err(StoreError::Database("down".into()))
            }
            fn save_movie(
                &self,
                _: &str,
                _: &crate::store::MovieRecord,
            ) -> Result<(), StoreError> {
                Err(StoreError::Database("down".into()))
            }
            fn find_movie_by_source_id(
                &self,
                _: &str,
            ) -> Result<Option<(String, crate::store::MovieRecord)>, StoreError> {
                Err(StoreError::Database("down".into()))
            }
            fn get_torrent(
                &self,
                _: &str,
            ) -> Result<Option<crate::torrent::TorrentInfo>, StoreError> {
                Err(StoreError::Database("down".into()))
            }
            fn save_torrent(
                &self,
                _: &str,
                _: &crate::torrent::TorrentInfo,
            ) -> Result<(), StoreError> {
                Err(StoreError::Database("down".into()))
            }
            fn get_cache(&self, _: &str) -> Result<Option<serde_json::Value>, StoreError> {
                Err(StoreError::Database("down".into()))
            }
            fn set_cache(
                &self,
                _: &str,
                _: &serde_json::Value,
                _: i64,
            ) -> Result<(), StoreError> {
                Err(StoreError::Database("down".into()))
            }
            fn delete_cache(&self, _: &str) -> Result<(), StoreError> {
                Err(StoreError::Database("down".into()))
            }
            fn clear_expired_cache(&self) -> Result<u32, StoreError> {
                Err(StoreError::Database("down".into()))
            }
            fn stats(&self) -> Result<crate::store::StoreStats, StoreError> {
                Err(StoreError::Database("down".into()))
            }
        }

        let cache = MetaCache::new(Arc::new(FailingStore));
        assert!(cache.get::<serde_json::Value>("meta:x").is_none());
        // Writes must not panic or propagate
        cache.set("meta:x", &json!(1), 5);
        cache.delete("meta:x");
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_and_stops() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.set_cache("old", &json!(1), -1).unwrap();
        store.set_cache("fresh", &json!(2), 30).unwrap();

        let handle = start_sweeper(store.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(80)).await;
        handle.stop().await;

        assert!(store.get_cache("old").unwrap().is_none());
        assert!(store.get_cache("fresh").unwrap().is_some());
        assert_eq!(store.stats().unwrap().cache_entries, 1);
    }

    #[tokio::test]
    async fn test_sweeper_stop_is_prompt() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        // An hour-long interval must not delay shutdown.
        let handle = start_sweeper(store, Duration::from_secs(3600));
        tokio::time::timeout(Duration::from_secs(1), handle.stop())
            .await
            .expect("sweeper stop should not wait for the interval");
    }
}
