use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub cinemeta: CinemetaConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    7000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cartelera.db")
}

/// Source site scraping configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Base URL of the movie site (e.g., "https://www.cinecalidad.ec")
    #[serde(default = "default_site_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 20)
    #[serde(default = "default_site_timeout")]
    pub timeout_secs: u32,
    /// Hard cap on listing pages fetched per query (default: 5)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Releases per listing page as rendered by the site (default: 30)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_site_url(),
            timeout_secs: default_site_timeout(),
            max_pages: default_max_pages(),
            page_size: default_page_size(),
        }
    }
}

fn default_site_url() -> String {
    "https://www.cinecalidad.ec".to_string()
}

fn default_site_timeout() -> u32 {
    20
}

fn default_max_pages() -> u32 {
    5
}

fn default_page_size() -> u32 {
    30
}

/// Cinemeta metadata service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CinemetaConfig {
    /// Base URL (default: "https://v3-cinemeta.strem.io")
    #[serde(default = "default_cinemeta_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_cinemeta_timeout")]
    pub timeout_secs: u32,
}

impl Default for CinemetaConfig {
    fn default() -> Self {
        Self {
            base_url: default_cinemeta_url(),
            timeout_secs: default_cinemeta_timeout(),
        }
    }
}

fn default_cinemeta_url() -> String {
    "https://v3-cinemeta.strem.io".to_string()
}

fn default_cinemeta_timeout() -> u32 {
    10
}

/// Cache TTLs and expiry sweeping
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Interval between expired-entry sweeps, in seconds (default: 300)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// TTL for resolved meta responses, in minutes (default: 30)
    #[serde(default = "default_meta_ttl")]
    pub meta_ttl_minutes: i64,
    /// TTL for stream responses, in minutes (default: 60)
    #[serde(default = "default_stream_ttl")]
    pub stream_ttl_minutes: i64,
    /// TTL for catalog pages, in minutes (default: 15)
    #[serde(default = "default_catalog_ttl")]
    pub catalog_ttl_minutes: i64,
    /// TTL for external metadata, in minutes (default: 1440)
    #[serde(default = "default_metadata_ttl")]
    pub metadata_ttl_minutes: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            meta_ttl_minutes: default_meta_ttl(),
            stream_ttl_minutes: default_stream_ttl(),
            catalog_ttl_minutes: default_catalog_ttl(),
            metadata_ttl_minutes: default_metadata_ttl(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_meta_ttl() -> i64 {
    30
}

fn default_stream_ttl() -> i64 {
    60
}

fn default_catalog_ttl() -> i64 {
    15
}

fn default_metadata_ttl() -> i64 {
    1440
}

/// Sanitized config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub site: SanitizedSiteConfig,
    pub cinemeta: CinemetaConfig,
    pub cache: CacheConfig,
}

/// Sanitized site config (scrape knobs hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSiteConfig {
    pub base_url: String,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            site: SanitizedSiteConfig {
                base_url: config.site.base_url.clone(),
                timeout_secs: config.site.timeout_secs,
            },
            cinemeta: config.cinemeta.clone(),
            cache: config.cache.clone(),
        }
    }
}
