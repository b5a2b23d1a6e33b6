//! Cinemeta API client.
//!
//! Cinemeta is Stremio's public metadata service; records are keyed by
//! IMDB id and need no API key. Field types drifted over the years
//! (string years, string ratings, missing arrays), so the wire types
//! here are permissive and the conversion does the coercing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::CinemetaConfig;

use super::{ExternalMetadata, MetadataError, MetadataProvider};

/// Cinemeta API client.
pub struct CinemetaClient {
    client: Client,
    base_url: String,
}

impl CinemetaClient {
    /// Create a new Cinemeta client.
    pub fn new(config: CinemetaConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MetadataProvider for CinemetaClient {
    fn name(&self) -> &str {
        "cinemeta"
    }

    async fn movie_metadata(
        &self,
        imdb_id: &str,
    ) -> Result<Option<ExternalMetadata>, MetadataError> {
        let url = format!("{}/meta/movie/{}.json", self.base_url, imdb_id);

        debug!(imdb_id = imdb_id, "Cinemeta lookup");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                MetadataError::Timeout
            } else if e.is_connect() {
                MetadataError::ConnectionFailed(e.to_string())
            } else {
                MetadataError::ApiError {
                    status: 0,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let envelope: CinemetaEnvelope = response
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;

        Ok(envelope.meta.map(ExternalMetadata::from))
    }
}

// ============================================================================
// Cinemeta API response types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CinemetaEnvelope {
    meta: Option<CinemetaMeta>,
}

#[derive(Debug, Deserialize)]
struct CinemetaMeta {
    imdb_id: Option<String>,
    name: Option<String>,
    #[serde(rename = "originalName")]
    original_name: Option<String>,
    /// String ("1999"), range ("1999-2001"), or number.
    year: Option<Value>,
    poster: Option<String>,
    background: Option<String>,
    description: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    genre: Vec<String>,
    cast: Option<Value>,
    director: Option<Value>,
    writer: Option<Value>,
    /// String ("8.7") or number.
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<Value>,
}

impl From<CinemetaMeta> for ExternalMetadata {
    fn from(m: CinemetaMeta) -> Self {
        let genres = if !m.genres.is_empty() { m.genres } else { m.genre };
        Self {
            imdb_id: m.imdb_id,
            title: m.name,
            original_title: m.original_name,
            year: m.year.as_ref().and_then(coerce_year),
            poster: m.poster,
            background: m.background,
            description: m.description,
            genres,
            cast: m.cast.as_ref().map(coerce_list).unwrap_or_default(),
            director: m.director.as_ref().map(coerce_list).unwrap_or_default(),
            writer: m.writer.as_ref().map(coerce_list).unwrap_or_default(),
            imdb_rating: m.imdb_rating.as_ref().and_then(coerce_rating),
        }
    }
}

/// "1999", "1999-2001", or 1999 all yield 1999.
fn coerce_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().map(|y| y as i32),
        Value::String(s) => {
            let leading: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
            leading.parse().ok()
        }
        _ => None,
    }
}

fn coerce_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
