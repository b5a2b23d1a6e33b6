//! Mock release lister for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::lister::{ListQuery, ListerError, MovieDetails, Release, ReleaseLister};

/// A recorded lister call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedListerCall {
    Query { search: Option<String>, skip: u32 },
    Details { link: String },
}

/// Mock implementation of the `ReleaseLister` trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable releases and detail pages
/// - Track calls for assertions (notably zero-call assertions)
/// - Simulate failures and slow responses
#[derive(Debug, Default)]
pub struct MockLister {
    releases: Arc<RwLock<Vec<Release>>>,
    /// Detail pages keyed by details link.
    details: Arc<RwLock<HashMap<String, MovieDetails>>>,
    calls: Arc<RwLock<Vec<RecordedListerCall>>>,
    next_error: Arc<RwLock<Option<ListerError>>>,
    /// Artificial latency applied to `query`, for concurrency tests.
    query_delay: Arc<RwLock<Option<Duration>>>,
}

impl MockLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the release list returned by every query.
    pub async fn set_releases(&self, releases: Vec<Release>) {
        *self.releases.write().await = releases;
    }

    /// Register the detail page for a details link.
    pub async fn add_details(&self, link: &str, details: MovieDetails) {
        self.details.write().await.insert(link.to_string(), details);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: ListerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every query by the given duration.
    pub async fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.write().await = Some(delay);
    }

    /// All recorded calls, in order.
    pub async fn recorded_calls(&self) -> Vec<RecordedListerCall> {
        self.calls.read().await.clone()
    }

    /// Total calls of any kind.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Number of `query` calls.
    pub async fn query_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedListerCall::Query { .. }))
            .count()
    }

    async fn take_error(&self) -> Option<ListerError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl ReleaseLister for MockLister {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(&self, query: &ListQuery) -> Result<Vec<Release>, ListerError> {
        self.calls.write().await.push(RecordedListerCall::Query {
            search: query.search.clone(),
            skip: query.skip,
        });

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let delay = *self.query_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut releases = self.releases.read().await.clone();
        let skip = query.skip as usize;
        if skip > 0 {
            releases = releases.into_iter().skip(skip).collect();
        }
        if let Some(limit) = query.limit {
            releases.truncate(limit as usize);
        }
        Ok(releases)
    }

    async fn details(&self, details_link: &str) -> Result<MovieDetails, ListerError> {
        self.calls.write().await.push(RecordedListerCall::Details {
            link: details_link.to_string(),
        });

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.details
            .read()
            .await
            .get(details_link)
            .cloned()
            .ok_or_else(|| ListerError::SiteError(format!("no detail page for {}", details_link)))
    }
}
