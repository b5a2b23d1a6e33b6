//! Types for the persisted store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::addon::MovieMeta;
use crate::lister::{MovieDetails, Release};
use crate::metadata::ExternalMetadata;
use crate::torrent::TorrentInfo;

/// Everything observed about a movie at resolution time, keyed by the
/// full request identifier.
///
/// Partial records are valid: a record holding only a `release` (seen in
/// a catalog listing, never resolved) is completable later. Once `meta`
/// is populated it is only replaced by a whole new resolution pass, never
/// invalidated piecemeal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<Release>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_details: Option<MovieDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_meta: Option<ExternalMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MovieMeta>,
    pub last_updated: DateTime<Utc>,
}

impl MovieRecord {
    /// Record holding only a listed release.
    pub fn from_release(release: Release) -> Self {
        Self {
            release: Some(release),
            movie_details: None,
            external_meta: None,
            meta: None,
            last_updated: Utc::now(),
        }
    }
}

/// Store contents summary.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub movies: u64,
    pub torrents: u64,
    pub cache_entries: u64,
}

/// Errors from the persisted store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed to encode record: {0}")]
    Serialization(String),
}

/// Durable key-value and entity storage.
///
/// Single-key operations only; a write is last-write-wins and no
/// multi-key atomicity is promised. Implementations allow concurrent
/// readers.
pub trait MovieStore: Send + Sync {
    /// Fetch a movie record by full request id.
    fn get_movie(&self, id: &str) -> Result<Option<MovieRecord>, StoreError>;

    /// Persist a movie record (whole-record replace).
    fn save_movie(&self, id: &str, record: &MovieRecord) -> Result<(), StoreError>;

    /// Catalog scan: find a record whose embedded release slug or
    /// scraped-page slug equals `fragment` (content index, not key).
    fn find_movie_by_source_id(
        &self,
        fragment: &str,
    ) -> Result<Option<(String, MovieRecord)>, StoreError>;

    /// Fetch cached torrent metadata by lowercase hex info hash.
    fn get_torrent(&self, info_hash: &str) -> Result<Option<TorrentInfo>, StoreError>;

    /// Persist torrent metadata (immutable once fetched).
    fn save_torrent(&self, info_hash: &str, info: &TorrentInfo) -> Result<(), StoreError>;

    /// Fetch a cache value; a read past its expiry is a miss.
    fn get_cache(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Store a cache value with a TTL in minutes.
    fn set_cache(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl_minutes: i64,
    ) -> Result<(), StoreError>;

    /// Drop a cache entry.
    fn delete_cache(&self, key: &str) -> Result<(), StoreError>;

    /// Drop all expired cache entries, returning how many went.
    fn clear_expired_cache(&self) -> Result<u32, StoreError>;

    /// Store contents summary.
    fn stats(&self) -> Result<StoreStats, StoreError>;
}
