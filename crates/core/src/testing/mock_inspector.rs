//! Mock torrent inspector for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent::{magnet_info_hash, InspectError, TorrentInfo, TorrentInspector};

/// Mock implementation of the `TorrentInspector` trait.
///
/// Magnet validity is enforced exactly like the real inspector; valid
/// magnets resolve to the configured `TorrentInfo` for their hash, and
/// unconfigured hashes yield a minimal record.
#[derive(Debug, Default)]
pub struct MockInspector {
    /// Torrent records keyed by lowercase hex info hash.
    torrents: Arc<RwLock<HashMap<String, TorrentInfo>>>,
    inspected: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<InspectError>>>,
}

impl MockInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the record returned for a hash.
    pub async fn add_torrent(&self, info: TorrentInfo) {
        self.torrents
            .write()
            .await
            .insert(info.info_hash.to_lowercase(), info);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: InspectError) {
        *self.next_error.write().await = Some(error);
    }

    /// Magnet URIs inspected so far.
    pub async fn recorded_inspections(&self) -> Vec<String> {
        self.inspected.read().await.clone()
    }

    /// Number of inspections performed.
    pub async fn call_count(&self) -> usize {
        self.inspected.read().await.len()
    }
}

#[async_trait]
impl TorrentInspector for MockInspector {
    async fn inspect(&self, magnet_uri: &str) -> Result<Option<TorrentInfo>, InspectError> {
        self.inspected.write().await.push(magnet_uri.to_string());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let Some(hash) = magnet_info_hash(magnet_uri) else {
            return Ok(None);
        };

        if let Some(info) = self.torrents.read().await.get(&hash) {
            return Ok(Some(info.clone()));
        }

        Ok(Some(TorrentInfo {
            display_name: hash.clone(),
            total_size: 0,
            file_count: 0,
            files: Vec::new(),
            main_video_file: None,
            info_hash: hash,
            trackers: Vec::new(),
            quality: "1080p".to_string(),
            source: None,
            codec: None,
            language: "Latino".to_string(),
            group: None,
        }))
    }
}
