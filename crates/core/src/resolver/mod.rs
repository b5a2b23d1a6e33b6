//! Identifier resolution.
//!
//! The resolver classifies an opaque request id (external `tt...` form
//! or site-native `cc_...` form) and drives a layered lookup: request
//! cache, persisted record, catalog scan over persisted content, and
//! finally a live scrape of the source site. Every internal failure is
//! logged and degrades to the next step or to "not found"; nothing
//! propagates past this boundary, so protocol handlers always produce a
//! well-formed body.

mod matcher;
mod normalizer;
mod title;

pub use matcher::match_release;
pub use normalizer::{
    from_catalog_record, from_external, from_scraped, summary_from_release, ScrapedParts,
};
pub use title::search_phrase;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::addon::{CatalogExtra, MovieMeta, Stream, CATALOG_MOVIES, CATALOG_SEARCH};
use crate::cache::{keys, MetaCache};
use crate::config::CacheConfig;
use crate::lister::{LinkKind, ListQuery, MovieDetails, ReleaseLister};
use crate::metadata::{ExternalMetadata, MetadataProvider};
use crate::metrics;
use crate::store::{MovieRecord, MovieStore};
use crate::torrent::{magnet_info_hash, TorrentInfo, TorrentInspector};
use crate::streams;

static EXTERNAL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^tt\d{7,}$").unwrap());
static SITE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^cc_[a-z0-9-]+$").unwrap());

/// Resolution result broadcast to collapsed duplicate requests.
type InFlightResult = Option<MovieMeta>;

/// The identifier resolver.
///
/// Constructed once at startup with its collaborators and shared by
/// reference; holds no global state beyond the per-key in-flight map.
pub struct MovieResolver {
    store: Arc<dyn MovieStore>,
    cache: MetaCache,
    lister: Arc<dyn ReleaseLister>,
    metadata: Arc<dyn MetadataProvider>,
    inspector: Arc<dyn TorrentInspector>,
    ttl: CacheConfig,
    /// Collapses concurrent resolutions of the same uncached id: the
    /// first request becomes the leader and does the work, the rest
    /// await its broadcast result instead of re-scraping.
    in_flight: Mutex<HashMap<String, watch::Receiver<Option<InFlightResult>>>>,
}

impl MovieResolver {
    pub fn new(
        store: Arc<dyn MovieStore>,
        cache: MetaCache,
        lister: Arc<dyn ReleaseLister>,
        metadata: Arc<dyn MetadataProvider>,
        inspector: Arc<dyn TorrentInspector>,
        ttl: CacheConfig,
    ) -> Self {
        Self {
            store,
            cache,
            lister,
            metadata,
            inspector,
            ttl,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a meta request. Never errors: any internal failure is a
    /// logged `None`.
    pub async fn resolve_meta(&self, kind: &str, id: &str) -> Option<MovieMeta> {
        if kind != "movie" {
            debug!(kind = kind, "Rejecting non-movie meta request");
            return None;
        }

        if EXTERNAL_ID_RE.is_match(id) {
            self.resolve_external(id).await
        } else if SITE_ID_RE.is_match(id) {
            let fragment = id.trim_start_matches("cc_");
            self.resolve_site(id, fragment).await
        } else {
            debug!(id = id, "Rejecting id matching neither known format");
            None
        }
    }

    /// Resolve a stream request. Never errors; an empty list covers both
    /// "no streams" and "every source failed".
    pub async fn resolve_streams(&self, kind: &str, id: &str) -> Vec<Stream> {
        if kind != "movie" || !(EXTERNAL_ID_RE.is_match(id) || SITE_ID_RE.is_match(id)) {
            return Vec::new();
        }

        let stream_key = format!("{}{}", keys::STREAM, id);
        if let Some(streams) = self.cache.get::<Vec<Stream>>(&stream_key) {
            return streams;
        }

        // The record under this id carries the scraped download links;
        // resolve it first if it isn't there yet.
        let mut record = self.load_record(id);
        if record
            .as_ref()
            .map(|r| r.movie_details.is_none())
            .unwrap_or(true)
        {
            self.resolve_meta(kind, id).await;
            record = self.load_record(id);
        }

        let Some(record) = record else {
            self.cache
                .set(&stream_key, &Vec::<Stream>::new(), self.ttl.stream_ttl_minutes);
            return Vec::new();
        };

        let links = record
            .movie_details
            .as_ref()
            .map(|d| d.download_links.clone())
            .unwrap_or_default();

        // All magnet inspections run concurrently; a failed or invalid
        // one contributes zero streams rather than aborting the batch.
        let magnet_futures: Vec<_> = links
            .iter()
            .filter(|l| l.kind == LinkKind::Magnet)
            .map(|l| self.torrent_info(&l.url))
            .collect();
        let inspected = futures::future::join_all(magnet_futures).await;

        let mut result: Vec<Stream> = inspected
            .into_iter()
            .flatten()
            .flat_map(|info| streams::project(&info, &record, id))
            .collect();

        result.extend(
            links
                .iter()
                .filter(|l| l.kind == LinkKind::Http)
                .map(|l| streams::direct_download(l, &record, id)),
        );

        self.cache
            .set(&stream_key, &result, self.ttl.stream_ttl_minutes);
        result
    }

    /// Resolve a catalog request. Only the two known catalog ids produce
    /// entries; anything else is an empty list, not an error.
    pub async fn resolve_catalog(&self, catalog_id: &str, extra: &CatalogExtra) -> Vec<MovieMeta> {
        let search = match catalog_id {
            CATALOG_SEARCH => match extra.search.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => Some(s.to_string()),
                _ => return Vec::new(),
            },
            CATALOG_MOVIES => None,
            _ => {
                debug!(catalog = catalog_id, "Unknown catalog id");
                return Vec::new();
            }
        };

        let skip = extra.skip.unwrap_or(0);
        let catalog_key = format!(
            "{}{}_{}_{}",
            keys::CATALOG,
            catalog_id,
            search.as_deref().unwrap_or(""),
            skip
        );
        if let Some(metas) = self.cache.get::<Vec<MovieMeta>>(&catalog_key) {
            return metas;
        }

        let query = ListQuery {
            search,
            skip,
            limit: extra.limit,
        };
        let releases = match self.lister.query(&query).await {
            Ok(releases) => releases,
            Err(e) => {
                warn!(error = %e, "Catalog listing failed");
                metrics::SOURCE_ERRORS.with_label_values(&["lister"]).inc();
                return Vec::new();
            }
        };

        let mut metas = Vec::with_capacity(releases.len());
        for release in releases {
            let full_id = format!("cc_{}", release.id);

            // Seed the store with partial records so later meta requests
            // can complete them via the catalog scan instead of
            // re-scraping.
            match self.store.get_movie(&full_id) {
                Ok(None) => {
                    if let Err(e) = self
                        .store
                        .save_movie(&full_id, &MovieRecord::from_release(release.clone()))
                    {
                        warn!(id = %full_id, error = %e, "Failed to seed partial record");
                        metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
                    }
                }
                Ok(Some(_)) => {}
                Err(e) => {
                    warn!(id = %full_id, error = %e, "Store read failed during catalog");
                    metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
                }
            }

            metas.push(normalizer::summary_from_release(&full_id, &release));
        }

        self.cache
            .set(&catalog_key, &metas, self.ttl.catalog_ttl_minutes);
        metas
    }

    // ========================================================================
    // External-id branch
    // ========================================================================

    async fn resolve_external(&self, id: &str) -> Option<MovieMeta> {
        let meta_key = format!("{}{}", keys::META, id);
        if let Some(meta) = self.cache.get::<MovieMeta>(&meta_key) {
            metrics::RESOLUTIONS
                .with_label_values(&["external", "cache"])
                .inc();
            return Some(meta);
        }

        let Some(external) = self.fetch_external_metadata(id).await else {
            metrics::RESOLUTIONS
                .with_label_values(&["external", "miss"])
                .inc();
            return None;
        };

        let meta = normalizer::from_external(id, &external);

        let record = MovieRecord {
            release: None,
            movie_details: None,
            external_meta: Some(external),
            meta: Some(meta.clone()),
            last_updated: Utc::now(),
        };
        self.persist(id, &record);
        self.cache.set(&meta_key, &meta, self.ttl.meta_ttl_minutes);

        metrics::RESOLUTIONS
            .with_label_values(&["external", "provider"])
            .inc();
        Some(meta)
    }

    // ========================================================================
    // Site-native branch
    // ========================================================================

    async fn resolve_site(&self, id: &str, fragment: &str) -> Option<MovieMeta> {
        // Step 1: request cache. Hits never touch downstream sources.
        let meta_key = format!("{}{}", keys::META, id);
        if let Some(meta) = self.cache.get::<MovieMeta>(&meta_key) {
            metrics::RESOLUTIONS
                .with_label_values(&["site", "cache"])
                .inc();
            return Some(meta);
        }

        // Steps 2-4 run under a per-key latch so concurrent requests for
        // the same uncached id scrape once, not twice.
        enum Role {
            Leader(watch::Sender<Option<InFlightResult>>),
            Follower(watch::Receiver<Option<InFlightResult>>),
        }

        let role = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(id) {
                Some(rx) => Role::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    in_flight.insert(id.to_string(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Follower(mut rx) => {
                debug!(id = id, "Joining in-flight resolution");
                if rx.changed().await.is_ok() {
                    rx.borrow().clone().flatten()
                } else {
                    // Leader dropped without a result; resolve as a miss
                    // rather than retrying and re-racing.
                    None
                }
            }
            Role::Leader(tx) => {
                let result = self.resolve_site_uncached(id, fragment).await;
                self.in_flight.lock().await.remove(id);
                let _ = tx.send(Some(result.clone()));
                result
            }
        }
    }

    async fn resolve_site_uncached(&self, id: &str, fragment: &str) -> Option<MovieMeta> {
        let meta_key = format!("{}{}", keys::META, id);

        // Step 2: persisted record under the exact key. A complete meta
        // is returned verbatim, no re-validation.
        match self.store.get_movie(id) {
            Ok(Some(record)) => {
                if let Some(meta) = record.meta {
                    self.cache.set(&meta_key, &meta, self.ttl.meta_ttl_minutes);
                    metrics::RESOLUTIONS
                        .with_label_values(&["site", "persisted"])
                        .inc();
                    return Some(meta);
                }
            }
            Ok(None) => {}
            Err(e) => {
                // A failing store read is a miss, not a fatal error.
                warn!(id = id, error = %e, "Store read failed, continuing");
                metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
            }
        }

        // Step 3: catalog scan by embedded content. Completes partial
        // records left behind by catalog listings.
        match self.store.find_movie_by_source_id(fragment) {
            Ok(Some((found_id, mut record))) => {
                let meta = match record.meta.clone() {
                    Some(meta) => meta,
                    None => {
                        let meta = normalizer::from_catalog_record(&record, id);
                        record.meta = Some(meta.clone());
                        record.last_updated = Utc::now();
                        self.persist(&found_id, &record);
                        meta
                    }
                };
                self.cache.set(&meta_key, &meta, self.ttl.meta_ttl_minutes);
                metrics::RESOLUTIONS
                    .with_label_values(&["site", "catalog_scan"])
                    .inc();
                return Some(meta);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(fragment = fragment, error = %e, "Catalog scan failed, continuing");
                metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
            }
        }

        // Step 4: live scrape.
        let result = self.scrape(id, fragment).await;
        if result.is_none() {
            metrics::RESOLUTIONS
                .with_label_values(&["site", "miss"])
                .inc();
        }
        result
    }

    async fn scrape(&self, id: &str, fragment: &str) -> Option<MovieMeta> {
        let phrase = title::search_phrase(fragment);
        if phrase.is_empty() {
            debug!(fragment = fragment, "No usable search phrase");
            return None;
        }

        debug!(id = id, phrase = %phrase, "Scraping site");
        let query = ListQuery {
            search: Some(phrase),
            skip: 0,
            limit: None,
        };
        let releases = match self.lister.query(&query).await {
            Ok(releases) => releases,
            Err(e) => {
                warn!(id = id, error = %e, "Site search failed");
                metrics::SOURCE_ERRORS.with_label_values(&["lister"]).inc();
                return None;
            }
        };

        let release = matcher::match_release(&releases, fragment)?.clone();

        // A failed detail fetch degrades to a release-only meta instead
        // of failing the resolution.
        let mut movie_details = match self.lister.details(&release.details_link).await {
            Ok(details) => Some(details),
            Err(e) => {
                warn!(id = id, error = %e, "Detail page fetch failed");
                metrics::SOURCE_ERRORS.with_label_values(&["lister"]).inc();
                None
            }
        };
        if let Some(details) = movie_details.as_mut() {
            details.id = Some(release.id.clone());
        }

        let external_meta = match scraped_imdb_id(&movie_details) {
            Some(imdb_id) => self.fetch_external_metadata(&imdb_id).await,
            None => None,
        };

        let meta = normalizer::from_scraped(&ScrapedParts {
            id,
            release: Some(&release),
            movie_details: movie_details.as_ref(),
            external_meta: external_meta.as_ref(),
        });

        let record = MovieRecord {
            release: Some(release),
            movie_details,
            external_meta,
            meta: Some(meta.clone()),
            last_updated: Utc::now(),
        };
        self.persist(id, &record);
        self.cache.set(
            &format!("{}{}", keys::META, id),
            &meta,
            self.ttl.meta_ttl_minutes,
        );

        metrics::RESOLUTIONS
            .with_label_values(&["site", "scrape"])
            .inc();
        Some(meta)
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    /// External metadata, via its own cache namespace. Provider failures
    /// and unknown ids both come back as `None`.
    async fn fetch_external_metadata(&self, imdb_id: &str) -> Option<ExternalMetadata> {
        let metadata_key = format!("{}{}", keys::METADATA, imdb_id);
        if let Some(metadata) = self.cache.get::<ExternalMetadata>(&metadata_key) {
            return Some(metadata);
        }

        match self.metadata.movie_metadata(imdb_id).await {
            Ok(Some(mut metadata)) => {
                if metadata.imdb_id.is_none() {
                    metadata.imdb_id = Some(imdb_id.to_string());
                }
                self.cache
                    .set(&metadata_key, &metadata, self.ttl.metadata_ttl_minutes);
                Some(metadata)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(imdb_id = imdb_id, error = %e, "Metadata provider failed");
                metrics::SOURCE_ERRORS
                    .with_label_values(&["metadata"])
                    .inc();
                None
            }
        }
    }

    /// Torrent metadata for one magnet: persisted record first, then a
    /// live inspection with write-back. Any failure is `None`.
    async fn torrent_info(&self, magnet_uri: &str) -> Option<TorrentInfo> {
        let hash = magnet_info_hash(magnet_uri)?;

        match self.store.get_torrent(&hash) {
            Ok(Some(info)) => return Some(info),
            Ok(None) => {}
            Err(e) => {
                warn!(hash = %hash, error = %e, "Torrent read failed, re-inspecting");
                metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
            }
        }

        match self.inspector.inspect(magnet_uri).await {
            Ok(Some(info)) => {
                if let Err(e) = self.store.save_torrent(&hash, &info) {
                    warn!(hash = %hash, error = %e, "Torrent write failed");
                    metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
                }
                Some(info)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Magnet inspection failed");
                metrics::SOURCE_ERRORS
                    .with_label_values(&["inspector"])
                    .inc();
                None
            }
        }
    }

    fn load_record(&self, id: &str) -> Option<MovieRecord> {
        match self.store.get_movie(id) {
            Ok(record) => record,
            Err(e) => {
                warn!(id = id, error = %e, "Store read failed");
                metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
                None
            }
        }
    }

    /// Write-through to the persisted store. A lost write is logged and
    /// swallowed: the record is recomputable on the next request.
    fn persist(&self, id: &str, record: &MovieRecord) {
        if let Err(e) = self.store.save_movie(id, record) {
            warn!(id = id, error = %e, "Record write failed, continuing");
            metrics::SOURCE_ERRORS.with_label_values(&["store"]).inc();
        }
    }
}

/// The enrichment call only happens for a discovered id in external
/// form.
fn scraped_imdb_id(details: &Option<MovieDetails>) -> Option<String> {
    details
        .as_ref()
        .and_then(|d| d.imdb_id.as_deref())
        .filter(|imdb| imdb.starts_with("tt"))
        .map(str::to_string)
}
