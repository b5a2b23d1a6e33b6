//! CineCalidad listing backend.
//!
//! Scrapes the site's paginated listing grid and per-release detail
//! pages. The markup is extracted with regexes rather than a DOM parser:
//! the site renders a stable article grid and the few fields we need
//! survive its template changes better as anchored patterns.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SiteConfig;

use super::{DownloadLink, LinkKind, ListQuery, ListerError, MovieDetails, Release, ReleaseLister};

static ARTICLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<article.*?</article>").unwrap());
static DETAILS_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="([^"]*/pelicula/([a-z0-9-]+)/?)""#).unwrap());
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<h3[^>]*>([^<]+)</h3>").unwrap());
static ALT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"alt="([^"]+)""#).unwrap());
static ORIGINAL_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span[^>]*class="[^"]*original[^"]*"[^>]*>([^<]+)</span>"#).unwrap());
static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span[^>]*class="[^"]*year[^"]*"[^>]*>\s*((?:19|20)\d{2})"#).unwrap());
static POSTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:data-src|src)="([^"]+\.(?:jpg|jpeg|png|webp)[^"]*)""#).unwrap());
static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<h1[^>]*>([^<]+)</h1>").unwrap());
static IMDB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"imdb\.com/title/(tt\d{7,})").unwrap());
static MAGNET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<a[^>]*href="(magnet:\?[^"]+)"[^>]*>([^<]*)</a>"#).unwrap());
static DOWNLOAD_SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<(?:div|table)[^>]*(?:id|class)="[^"]*(?:download|descarga)[^"]*".*?</(?:div|table)>"#)
        .unwrap()
});
static HTTP_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<a[^>]*href="(https?://[^"]+)"[^>]*>([^<]+)</a>"#).unwrap());

/// CineCalidad release lister.
pub struct CineCalidadLister {
    client: Client,
    config: SiteConfig,
}

impl CineCalidadLister {
    /// Create a new lister for the configured site mirror.
    pub fn new(config: SiteConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Build the listing URL for a page (1-based).
    fn page_url(&self, search: Option<&str>, page: u32) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match (search, page) {
            (Some(s), 1) => format!("{}/?s={}", base, urlencoding::encode(s)),
            (Some(s), n) => format!("{}/page/{}/?s={}", base, n, urlencoding::encode(s)),
            (None, 1) => format!("{}/", base),
            (None, n) => format!("{}/page/{}/", base, n),
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ListerError> {
        debug!(url = url, "Fetching site page");

        let response = self.client.get(url).send().await.map_err(map_reqwest_err)?;

        // A missing page past the end of the listing terminates
        // pagination rather than failing the whole query.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(String::new());
        }
        if !response.status().is_success() {
            return Err(ListerError::SiteError(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response.text().await.map_err(map_reqwest_err)
    }
}

#[async_trait]
impl ReleaseLister for CineCalidadLister {
    fn name(&self) -> &str {
        "cinecalidad"
    }

    async fn query(&self, query: &ListQuery) -> Result<Vec<Release>, ListerError> {
        let page_size = self.config.page_size.max(1);
        let limit = query.limit.unwrap_or(page_size) as usize;
        let start_page = query.skip / page_size + 1;
        let mut offset_in_page = (query.skip % page_size) as usize;

        let mut releases: Vec<Release> = Vec::new();
        let mut page = start_page;

        // Pages are fetched strictly in order: whether page N was the
        // last one is only known from page N's content.
        while releases.len() < limit && page < start_page + self.config.max_pages {
            let url = self.page_url(query.search.as_deref(), page);
            let html = self.fetch_page(&url).await?;

            let mut page_releases = parse_listing(&html, "1080p");
            let page_count = page_releases.len();
            debug!(page = page, releases = page_count, "Parsed listing page");

            if page_count == 0 {
                break;
            }

            if offset_in_page > 0 {
                if offset_in_page >= page_releases.len() {
                    // Skip swallowed the whole page; fall through to the
                    // termination check below before advancing.
                    page_releases.clear();
                } else {
                    page_releases.drain(..offset_in_page);
                }
                offset_in_page = 0;
            }

            releases.extend(page_releases);

            // A short page is the site's end-of-listing signal.
            if (page_count as u32) < page_size {
                break;
            }
            page += 1;
        }

        releases.truncate(limit);
        Ok(releases)
    }

    async fn details(&self, details_link: &str) -> Result<MovieDetails, ListerError> {
        let html = self.fetch_page(details_link).await?;
        if html.is_empty() {
            return Err(ListerError::SiteError("detail page not found".to_string()));
        }

        let details = parse_details(&html);
        if details.download_links.is_empty() {
            warn!(url = details_link, "Detail page yielded no download links");
        }
        Ok(details)
    }
}

fn map_reqwest_err(e: reqwest::Error) -> ListerError {
    if e.is_timeout() {
        ListerError::Timeout
    } else if e.is_connect() {
        ListerError::ConnectionFailed(e.to_string())
    } else {
        ListerError::SiteError(e.to_string())
    }
}

/// Extract releases from a listing page.
pub(crate) fn parse_listing(html: &str, default_quality: &str) -> Vec<Release> {
    ARTICLE_RE
        .find_iter(html)
        .filter_map(|article| {
            let block = article.as_str();
            let link = DETAILS_LINK_RE.captures(block)?;
            let details_link = link.get(1)?.as_str().to_string();
            let id = link.get(2)?.as_str().to_string();

            let title = TITLE_RE
                .captures(block)
                .or_else(|| ALT_RE.captures(block))
                .and_then(|c| c.get(1))
                .map(|m| decode_entities(m.as_str().trim()))?;
            if title.is_empty() {
                return None;
            }

            Some(Release {
                id,
                title,
                original_title: ORIGINAL_TITLE_RE
                    .captures(block)
                    .and_then(|c| c.get(1))
                    .map(|m| decode_entities(m.as_str().trim()))
                    .filter(|t| !t.is_empty()),
                year: YEAR_RE
                    .captures(block)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse().ok()),
                poster: POSTER_RE
                    .captures(block)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string()),
                details_link,
                quality: default_quality.to_string(),
                size_bytes: None,
                category: None,
            })
        })
        .collect()
}

/// Extract movie details from a release's detail page.
pub(crate) fn parse_details(html: &str) -> MovieDetails {
    let mut download_links: Vec<DownloadLink> = MAGNET_RE
        .captures_iter(html)
        .filter_map(|c| {
            let url = decode_entities(c.get(1)?.as_str());
            let label = c.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            Some(DownloadLink {
                name: if label.is_empty() {
                    "Torrent".to_string()
                } else {
                    decode_entities(label)
                },
                url,
                kind: LinkKind::Magnet,
            })
        })
        .collect();

    // Direct downloads live in a dedicated section; anchors elsewhere on
    // the page (navigation, related movies) are not download links.
    if let Some(section) = DOWNLOAD_SECTION_RE.find(html) {
        download_links.extend(HTTP_LINK_RE.captures_iter(section.as_str()).filter_map(|c| {
            Some(DownloadLink {
                name: decode_entities(c.get(2)?.as_str().trim()),
                url: c.get(1)?.as_str().to_string(),
                kind: LinkKind::Http,
            })
        }));
    }

    MovieDetails {
        id: None,
        imdb_id: IMDB_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        title: H1_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| decode_entities(m.as_str().trim()))
            .filter(|t| !t.is_empty()),
        year: YEAR_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok()),
        download_links,
    }
}

/// Minimal entity decoding for the handful the site actually emits.
fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&#038;", "&")
        .replace("&quot;", "\"")
        .replace("&#8217;", "'")
        .replace("&#8211;", "-")
}
