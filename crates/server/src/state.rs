use std::sync::Arc;

use cartelera_core::{Config, MovieResolver, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    resolver: Arc<MovieResolver>,
}

impl AppState {
    pub fn new(config: Config, resolver: Arc<MovieResolver>) -> Self {
        Self { config, resolver }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn resolver(&self) -> &MovieResolver {
        &self.resolver
    }
}
