//! SQLite-backed persisted store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use rusqlite::{params, Connection};

use super::{MovieRecord, MovieStore, StoreError, StoreStats};
use crate::torrent::TorrentInfo;

/// SQLite-backed movie/torrent/cache store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            -- Resolved movie records, keyed by full request id
            CREATE TABLE IF NOT EXISTS movies (
                id TEXT PRIMARY KEY,
                record TEXT NOT NULL,
                last_updated TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_movies_last_updated ON movies(last_updated);

            -- Torrent metadata, keyed by lowercase hex info hash
            CREATE TABLE IF NOT EXISTS torrents (
                info_hash TEXT PRIMARY KEY,
                info TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Generic TTL'd key-value cache
            CREATE TABLE IF NOT EXISTS kv_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_kv_cache_expires ON kv_cache(expires_at);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn decode_record(json: &str) -> Result<MovieRecord, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl MovieStore for SqliteStore {
    fn get_movie(&self, id: &str) -> Result<Option<MovieRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let json: Option<String> = conn
            .query_row(
                "SELECT record FROM movies WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                _ => Err(StoreError::Database(e.to_string())),
            })?;

        json.map(|j| Self::decode_record(&j)).transpose()
    }

    fn save_movie(&self, id: &str, record: &MovieRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let json =
            serde_json::to_string(record).map_err(|e| StoreError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO movies (id, record, last_updated) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET record = excluded.record,
                                           last_updated = excluded.last_updated",
            params![id, &json, record.last_updated.to_rfc3339()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn find_movie_by_source_id(
        &self,
        fragment: &str,
    ) -> Result<Option<(String, MovieRecord)>, StoreError> {
        let conn = self.conn.lock().unwrap();

        // Content index rather than key lookup: the slug is buried in the
        // record JSON, under the listed release or the scraped page.
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT id, record FROM movies
                 WHERE json_extract(record, '$.release.id') = ?1
                    OR json_extract(record, '$.movie_details.id') = ?1
                 LIMIT 1",
                params![fragment],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                _ => Err(StoreError::Database(e.to_string())),
            })?;

        row.map(|(id, json)| Ok((id, Self::decode_record(&json)?)))
            .transpose()
    }

    fn get_torrent(&self, info_hash: &str) -> Result<Option<TorrentInfo>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let info_hash = info_hash.to_lowercase();

        let json: Option<String> = conn
            .query_row(
                "SELECT info FROM torrents WHERE info_hash = ?",
                params![&info_hash],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                _ => Err(StoreError::Database(e.to_string())),
            })?;

        json.map(|j| {
            serde_json::from_str(&j).map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .transpose()
    }

    fn save_torrent(&self, info_hash: &str, info: &TorrentInfo) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let info_hash = info_hash.to_lowercase();
        let json =
            serde_json::to_string(info).map_err(|e| StoreError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO torrents (info_hash, info, created_at) VALUES (?, ?, ?)
             ON CONFLICT(info_hash) DO UPDATE SET info = excluded.info",
            params![&info_hash, &json, Utc::now().to_rfc3339()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_cache(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT value, expires_at FROM kv_cache WHERE key = ?",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                _ => Err(StoreError::Database(e.to_string())),
            })?;

        let Some((json, expires_at)) = row else {
            return Ok(None);
        };

        // Expired rows are misses even before the sweeper gets to them.
        let expired = chrono::DateTime::parse_from_rfc3339(&expires_at)
            .map(|e| e <= Utc::now())
            .unwrap_or(true);
        if expired {
            return Ok(None);
        }

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn set_cache(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl_minutes: i64,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let expires_at = (Utc::now() + Duration::minutes(ttl_minutes)).to_rfc3339();
        let json =
            serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO kv_cache (key, value, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            expires_at = excluded.expires_at",
            params![key, &json, &expires_at],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn delete_cache(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv_cache WHERE key = ?", params![key])
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn clear_expired_cache(&self) -> Result<u32, StoreError> {
        let conn = self.conn.lock().unwrap();
        let removed = conn
            .execute(
                "DELETE FROM kv_cache WHERE expires_at <= ?",
                params![Utc::now().to_rfc3339()],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(removed as u32)
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn.lock().unwrap();

        let count = |table: &str| -> Result<u64, StoreError> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| StoreError::Database(e.to_string()))
        };

        Ok(StoreStats {
            movies: count("movies")?,
            torrents: count("torrents")?,
            cache_entries: count("kv_cache")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lister::{MovieDetails, Release};
    use serde_json::json;

    fn test_store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    fn test_release(id: &str, title: &str) -> Release {
        Release {
            id: id.to_string(),
            title: title.to_string(),
            original_title: None,
            year: Some(2022),
            poster: Some("https://img.example/p.jpg".to_string()),
            details_link: format!("https://example.com/pelicula/{}/", id),
            quality: "1080p".to_string(),
            size_bytes: None,
            category: None,
        }
    }

    fn test_torrent(hash: &str) -> TorrentInfo {
        TorrentInfo {
            display_name: "Test.2022.1080p".to_string(),
            total_size: 0,
            file_count: 0,
            files: Vec::new(),
            main_video_file: None,
            info_hash: hash.to_string(),
            trackers: Vec::new(),
            quality: "1080p".to_string(),
            source: None,
            codec: None,
            language: "Latino".to_string(),
            group: None,
        }
    }

    #[test]
    fn test_movie_roundtrip() {
        let store = test_store();
        let record = MovieRecord::from_release(test_release("la-ballena-2022", "La Ballena"));

        store.save_movie("cc_la-ballena-2022", &record).unwrap();

        let loaded = store.get_movie("cc_la-ballena-2022").unwrap().unwrap();
        assert_eq!(loaded.release.as_ref().unwrap().id, "la-ballena-2022");
        assert!(loaded.meta.is_none());
    }

    #[test]
    fn test_get_movie_missing() {
        let store = test_store();
        assert!(store.get_movie("cc_nope").unwrap().is_none());
    }

    #[test]
    fn test_save_movie_overwrites() {
        let store = test_store();
        let mut record = MovieRecord::from_release(test_release("slug", "Old Title"));
        store.save_movie("cc_slug", &record).unwrap();

        record.release.as_mut().unwrap().title = "New Title".to_string();
        store.save_movie("cc_slug", &record).unwrap();

        let loaded = store.get_movie("cc_slug").unwrap().unwrap();
        assert_eq!(loaded.release.unwrap().title, "New Title");
    }

    #[test]
    fn test_find_by_release_slug() {
        let store = test_store();
        let record = MovieRecord::from_release(test_release("oppenheimer", "Oppenheimer"));
        store.save_movie("cc_oppenheimer", &record).unwrap();

        let (id, found) = store
            .find_movie_by_source_id("oppenheimer")
            .unwrap()
            .unwrap();
        assert_eq!(id, "cc_oppenheimer");
        assert_eq!(found.release.unwrap().id, "oppenheimer");

        assert!(store.find_movie_by_source_id("otra-cosa").unwrap().is_none());
    }

    #[test]
    fn test_find_by_details_slug() {
        let store = test_store();
        let mut record = MovieRecord::from_release(test_release("listing-slug", "Pelicula"));
        record.movie_details = Some(MovieDetails {
            id: Some("detail-slug".to_string()),
            ..MovieDetails::default()
        });
        store.save_movie("cc_listing-slug", &record).unwrap();

        let (id, _) = store.find_movie_by_source_id("detail-slug").unwrap().unwrap();
        assert_eq!(id, "cc_listing-slug");
    }

    #[test]
    fn test_torrent_roundtrip_and_case() {
        let store = test_store();
        let hash = "AABBCCDDEEFF00112233AABBCCDDEEFF00112233";
        store
            .save_torrent(hash, &test_torrent(&hash.to_lowercase()))
            .unwrap();

        let loaded = store.get_torrent(&hash.to_lowercase()).unwrap().unwrap();
        assert_eq!(loaded.quality, "1080p");

        // Lookup works with any case
        assert!(store.get_torrent(hash).unwrap().is_some());
    }

    #[test]
    fn test_cache_roundtrip() {
        let store = test_store();
        store
            .set_cache("meta:cc_x", &json!({"name": "X"}), 30)
            .unwrap();

        let value = store.get_cache("meta:cc_x").unwrap().unwrap();
        assert_eq!(value["name"], "X");

        store.delete_cache("meta:cc_x").unwrap();
        assert!(store.get_cache("meta:cc_x").unwrap().is_none());
    }

    #[test]
    fn test_cache_expired_read_is_miss() {
        let store = test_store();
        store.set_cache("old", &json!(1), -1).unwrap();
        assert!(store.get_cache("old").unwrap().is_none());
    }

    #[test]
    fn test_clear_expired_cache() {
        let store = test_store();
        store.set_cache("old", &json!(1), -1).unwrap();
        store.set_cache("fresh", &json!(2), 30).unwrap();

        let removed = store.clear_expired_cache().unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_cache("fresh").unwrap().is_some());
    }

    #[test]
    fn test_stats() {
        let store = test_store();
        assert_eq!(store.stats().unwrap().movies, 0);

        store
            .save_movie(
                "cc_a",
                &MovieRecord::from_release(test_release("a", "A")),
            )
            .unwrap();
        store
            .save_torrent("aa".repeat(20).as_str(), &test_torrent(&"aa".repeat(20)))
            .unwrap();
        store.set_cache("k", &json!(null), 5).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.movies, 1);
        assert_eq!(stats.torrents, 1);
        assert_eq!(stats.cache_entries, 1);
    }

    #[test]
    fn test_on_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store
                .save_movie(
                    "cc_persisted",
                    &MovieRecord::from_release(test_release("persisted", "P")),
                )
                .unwrap();
        }

        // Reopen and verify durability
        let store = SqliteStore::new(&path).unwrap();
        assert!(store.get_movie("cc_persisted").unwrap().is_some());
    }
}
