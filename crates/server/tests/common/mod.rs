//! Common test utilities for E2E testing with mocks.
//!
//! Builds an in-process addon server over an in-memory store with mock
//! collaborators injected, so protocol behavior can be asserted without
//! network access or a real site.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use cartelera_core::{
    testing::{MockInspector, MockLister, MockMetadataProvider},
    CacheConfig, Config, MetaCache, MovieResolver, SqliteStore,
};
use cartelera_server::api::create_router;
use cartelera_server::state::AppState;

/// Re-export fixtures for test convenience
pub use cartelera_core::testing::fixtures;

/// Test fixture with fully controllable collaborators.
pub struct TestFixture {
    /// The axum router for in-process requests
    pub router: Router,
    /// Mock release lister - configure listings and detail pages
    pub lister: Arc<MockLister>,
    /// Mock metadata provider - configure IMDB records
    pub metadata: Arc<MockMetadataProvider>,
    /// Mock torrent inspector - configure torrent records
    pub inspector: Arc<MockInspector>,
    /// The in-memory store backing cache and records
    pub store: Arc<SqliteStore>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
        let lister = Arc::new(MockLister::new());
        let metadata = Arc::new(MockMetadataProvider::new());
        let inspector = Arc::new(MockInspector::new());

        let resolver = Arc::new(MovieResolver::new(
            store.clone(),
            MetaCache::new(store.clone()),
            lister.clone(),
            metadata.clone(),
            inspector.clone(),
            CacheConfig::default(),
        ));

        let state = Arc::new(AppState::new(Config::default(), resolver));
        let router = create_router(state);

        Self {
            router,
            lister,
            metadata,
            inspector,
            store,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Total calls recorded against every collaborator.
    pub async fn collaborator_calls(&self) -> usize {
        self.lister.call_count().await
            + self.metadata.call_count().await
            + self.inspector.call_count().await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
