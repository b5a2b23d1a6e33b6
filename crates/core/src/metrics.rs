//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Resolver (resolutions by branch and satisfying step)
//! - Cache layer (hits/misses by namespace, sweep activity)
//! - Collaborators (lister, metadata provider, inspector failures)

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

/// Resolutions by branch ("site", "external") and outcome
/// ("cache", "persisted", "catalog_scan", "scrape", "provider", "miss").
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cartelera_resolutions_total", "Total identifier resolutions"),
        &["branch", "outcome"],
    )
    .unwrap()
});

/// Cache hits by key namespace ("meta", "stream", "catalog", "metadata").
pub static CACHE_HITS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cartelera_cache_hits_total", "Cache hits"),
        &["namespace"],
    )
    .unwrap()
});

/// Cache misses by key namespace.
pub static CACHE_MISSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cartelera_cache_misses_total", "Cache misses"),
        &["namespace"],
    )
    .unwrap()
});

/// Entries removed by the background expiry sweep.
pub static CACHE_SWEPT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cartelera_cache_swept_total",
        "Expired cache entries removed by the sweeper",
    )
    .unwrap()
});

/// Collaborator failures by source ("lister", "metadata", "inspector", "store").
pub static SOURCE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cartelera_source_errors_total",
            "Collaborator failures, each degraded rather than fatal",
        ),
        &["source"],
    )
    .unwrap()
});

/// Registry holding every cartelera metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    registry.register(Box::new(RESOLUTIONS.clone())).unwrap();
    registry.register(Box::new(CACHE_HITS.clone())).unwrap();
    registry.register(Box::new(CACHE_MISSES.clone())).unwrap();
    registry.register(Box::new(CACHE_SWEPT.clone())).unwrap();
    registry.register(Box::new(SOURCE_ERRORS.clone())).unwrap();
    registry
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_gathers_all_families() {
        // Touch each metric so families materialize.
        RESOLUTIONS.with_label_values(&["site", "cache"]).inc();
        CACHE_HITS.with_label_values(&["meta"]).inc();
        CACHE_MISSES.with_label_values(&["meta"]).inc();
        CACHE_SWEPT.inc();
        SOURCE_ERRORS.with_label_values(&["lister"]).inc();

        let families = REGISTRY.gather();
        assert!(families.len() >= 5);
    }
}
