use serde::{Deserialize, Serialize};

/// The normalized, protocol-facing movie record.
///
/// Invariant: every optional field is either absent or already validated
/// by the normalizer (well-formed URL, plausible year, trimmed non-empty
/// strings). Consumers never see null or empty placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieMeta {
    /// Request identifier this meta was resolved for (`tt...` or `cc_...`).
    pub id: String,
    /// Always "movie".
    #[serde(rename = "type")]
    pub media_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cast: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub director: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writer: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_info: Option<String>,
}

impl MovieMeta {
    /// Skeleton meta with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            media_type: "movie".to_string(),
            name: name.into(),
            poster: None,
            background: None,
            year: None,
            description: None,
            genres: Vec::new(),
            cast: Vec::new(),
            director: Vec::new(),
            writer: Vec::new(),
            imdb_rating: None,
            imdb_id: None,
            release_info: None,
        }
    }
}

/// A playable stream descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    /// Multi-line display name (quality / source / codec tags).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Compact single-line title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Torrent info hash; shared across all files of one torrent so a
    /// player can switch files without re-resolving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    /// File position within the torrent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_idx: Option<u32>,
    /// Direct-download URL (non-torrent streams).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior_hints: Option<StreamBehaviorHints>,
}

/// Playback hints attached to a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamBehaviorHints {
    /// Groups stream variants of one logical movie so quality switches
    /// play continuously.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binge_group: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub country_whitelist: Vec<String>,
}

/// Extra properties of a catalog request, parsed from the request path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl CatalogExtra {
    /// Parse the URL-encoded `key=value&key=value` extra path segment.
    /// Unknown keys are ignored; malformed values are dropped.
    pub fn parse(segment: &str) -> Self {
        let mut extra = Self::default();
        for pair in segment.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            match key {
                "search" => extra.search = Some(value),
                "skip" => extra.skip = value.parse().ok(),
                "limit" => extra.limit = value.parse().ok(),
                _ => {}
            }
        }
        extra
    }
}

/// `{"metas": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub metas: Vec<MovieMeta>,
}

/// `{"meta": {...} | null}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaResponse {
    pub meta: Option<MovieMeta>,
}

/// `{"streams": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamsResponse {
    pub streams: Vec<Stream>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_skips_absent_fields() {
        let meta = MovieMeta::new("tt0133093", "The Matrix");
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"type\":\"movie\""));
        assert!(!json.contains("poster"));
        assert!(!json.contains("genres"));
        assert!(!json.contains("imdbRating"));
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let mut meta = MovieMeta::new("tt0133093", "The Matrix");
        meta.imdb_rating = Some(8.7);
        meta.release_info = Some("1080p".to_string());
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"imdbRating\":8.7"));
        assert!(json.contains("\"releaseInfo\":\"1080p\""));
    }

    #[test]
    fn test_stream_behavior_hints_camel_case() {
        let stream = Stream {
            name: Some("Cartelera\n1080p".to_string()),
            title: None,
            info_hash: Some("a".repeat(40)),
            file_idx: Some(0),
            url: None,
            behavior_hints: Some(StreamBehaviorHints {
                binge_group: Some("cartelera-tt0133093".to_string()),
                country_whitelist: vec!["mx".to_string()],
            }),
        };
        let json = serde_json::to_string(&stream).unwrap();
        assert!(json.contains("\"infoHash\""));
        assert!(json.contains("\"fileIdx\":0"));
        assert!(json.contains("\"bingeGroup\""));
        assert!(json.contains("\"countryWhitelist\""));
        assert!(!json.contains("\"url\""));
    }

    #[test]
    fn test_catalog_extra_parse() {
        let extra = CatalogExtra::parse("search=the%20matrix&skip=30");
        assert_eq!(extra.search.as_deref(), Some("the matrix"));
        assert_eq!(extra.skip, Some(30));
        assert_eq!(extra.limit, None);
    }

    #[test]
    fn test_catalog_extra_parse_ignores_junk() {
        let extra = CatalogExtra::parse("genre=Action&skip=notanumber");
        assert_eq!(extra.search, None);
        assert_eq!(extra.skip, None);
    }

    #[test]
    fn test_meta_response_null() {
        let response = MetaResponse { meta: None };
        assert_eq!(serde_json::to_string(&response).unwrap(), "{\"meta\":null}");
    }
}
