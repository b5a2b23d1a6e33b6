//! Mock metadata provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::metadata::{ExternalMetadata, MetadataError, MetadataProvider};

/// Mock implementation of the `MetadataProvider` trait.
#[derive(Debug, Default)]
pub struct MockMetadataProvider {
    /// Records keyed by IMDB id.
    movies: Arc<RwLock<HashMap<String, ExternalMetadata>>>,
    /// IMDB ids looked up, in order.
    lookups: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<MetadataError>>>,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for an IMDB id.
    pub async fn add_movie(&self, imdb_id: &str, metadata: ExternalMetadata) {
        self.movies
            .write()
            .await
            .insert(imdb_id.to_string(), metadata);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: MetadataError) {
        *self.next_error.write().await = Some(error);
    }

    /// IMDB ids looked up so far.
    pub async fn recorded_lookups(&self) -> Vec<String> {
        self.lookups.read().await.clone()
    }

    /// Number of lookups performed.
    pub async fn call_count(&self) -> usize {
        self.lookups.read().await.len()
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn movie_metadata(
        &self,
        imdb_id: &str,
    ) -> Result<Option<ExternalMetadata>, MetadataError> {
        self.lookups.write().await.push(imdb_id.to_string());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self.movies.read().await.get(imdb_id).cloned())
    }
}
