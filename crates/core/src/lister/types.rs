//! Types for the source-site release listing system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Query parameters for a listing or search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    /// Free-text search; `None` lists the site's front pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Number of leading releases to skip (pagination offset).
    #[serde(default)]
    pub skip: u32,
    /// Maximum releases to return (default: one site page).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// A candidate entry discovered on a listing page.
///
/// Created per listing request; never persisted directly but embedded
/// inside a `MovieRecord` once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Site-native slug. Unique within a page, not globally guaranteed.
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    /// URL of the release's detail page; authoritative source for
    /// download links.
    pub details_link: String,
    /// Quality tier tag; the site publishes one tier, so this defaults
    /// to "1080p" when the page doesn't say otherwise.
    pub quality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A download option scraped from a detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub name: String,
    pub url: String,
    pub kind: LinkKind,
}

/// Distinguishes magnet URIs from plain download URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Magnet,
    Http,
}

/// Data scraped from a release's detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    /// Site slug of the release this page belongs to; set by the caller
    /// that matched the release, and indexed by the persisted store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// External cross-reference key, `tt` + at least 7 digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub download_links: Vec<DownloadLink>,
}

/// Errors from the release lister.
#[derive(Debug, Error)]
pub enum ListerError {
    #[error("Site connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Site returned an error: {0}")]
    SiteError(String),

    #[error("Failed to extract data from page: {0}")]
    ParseError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for release listing backends.
///
/// Implementations handle pagination and HTTP retries internally; a
/// returned error means "source unavailable for this attempt", never a
/// fatal condition for the caller.
#[async_trait]
pub trait ReleaseLister: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// List or search releases, in page order.
    async fn query(&self, query: &ListQuery) -> Result<Vec<Release>, ListerError>;

    /// Scrape a release's detail page.
    async fn details(&self, details_link: &str) -> Result<MovieDetails, ListerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_serialization_skips_absent_fields() {
        let release = Release {
            id: "la-matrix".to_string(),
            title: "Matrix".to_string(),
            original_title: None,
            year: None,
            poster: None,
            details_link: "https://example.com/pelicula/la-matrix/".to_string(),
            quality: "1080p".to_string(),
            size_bytes: None,
            category: None,
        };
        let json = serde_json::to_string(&release).unwrap();
        assert!(!json.contains("original_title"));
        assert!(!json.contains("poster"));

        let parsed: Release = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, release);
    }

    #[test]
    fn test_link_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&LinkKind::Magnet).unwrap(),
            "\"magnet\""
        );
        assert_eq!(serde_json::to_string(&LinkKind::Http).unwrap(), "\"http\"");
    }

    #[test]
    fn test_movie_details_default_is_empty() {
        let details = MovieDetails::default();
        assert!(details.imdb_id.is_none());
        assert!(details.download_links.is_empty());
    }
}
