//! Types for torrent inspection.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A magnet URI is only usable if it carries a 32- or 40-character hex
/// btih hash. The capture takes the full hex run so a 36-character hash
/// can't sneak through on a 32-character prefix match.
static MAGNET_HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"xt=urn:btih:([0-9a-fA-F]+)").unwrap());

/// Structured result of inspecting a magnet URI.
///
/// Treated as immutable once fetched: torrent content never changes for
/// a given info hash, so records are cached indefinitely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentInfo {
    pub display_name: String,
    /// Aggregate size in bytes; 0 when the source didn't expose one.
    pub total_size: u64,
    pub file_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<TorrentFileEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_video_file: Option<TorrentFileEntry>,
    /// Lowercase hex info hash.
    pub info_hash: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trackers: Vec<String>,
    pub quality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// A file within a torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentFileEntry {
    pub name: String,
    pub size: u64,
    /// Position within the torrent's file list.
    pub index: u32,
}

/// Errors from torrent inspection.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Failed to parse magnet URI: {0}")]
    ParseError(String),
}

/// Trait for torrent inspectors.
#[async_trait]
pub trait TorrentInspector: Send + Sync {
    /// Inspect a magnet URI. `Ok(None)` means the URI is not a valid
    /// magnet (wrong scheme or malformed hash), which callers treat as
    /// "no streams from this link", not an error.
    async fn inspect(&self, magnet_uri: &str) -> Result<Option<TorrentInfo>, InspectError>;
}

/// Whether a magnet URI carries a usable btih hash.
pub fn is_valid_magnet(uri: &str) -> bool {
    magnet_info_hash(uri).is_some()
}

/// Extract the lowercase hex hash from a magnet URI, if valid.
pub fn magnet_info_hash(uri: &str) -> Option<String> {
    if !uri.starts_with("magnet:?") {
        return None;
    }
    MAGNET_HASH_RE
        .captures(uri)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|h| h.len() == 32 || h.len() == 40)
        .map(|h| h.to_lowercase())
}
