pub mod addon;
pub mod cache;
pub mod config;
pub mod lister;
pub mod metadata;
pub mod metrics;
pub mod resolver;
pub mod store;
pub mod streams;
pub mod testing;
pub mod torrent;

pub use addon::{
    CatalogExtra, CatalogResponse, Manifest, MetaResponse, MovieMeta, Stream,
    StreamBehaviorHints, StreamsResponse, CATALOG_MOVIES, CATALOG_SEARCH,
};
pub use cache::{start_sweeper, MetaCache, SweeperHandle};
pub use config::{
    load_config, load_config_from_str, validate_config, CacheConfig, CinemetaConfig, Config,
    ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig, SiteConfig,
};
pub use lister::{
    CineCalidadLister, DownloadLink, LinkKind, ListQuery, ListerError, MovieDetails, Release,
    ReleaseLister,
};
pub use metadata::{CinemetaClient, ExternalMetadata, MetadataError, MetadataProvider};
pub use resolver::MovieResolver;
pub use store::{MovieRecord, MovieStore, SqliteStore, StoreError, StoreStats};
pub use torrent::{
    is_valid_magnet, magnet_info_hash, InspectError, MagnetInspector, TorrentFileEntry,
    TorrentInfo, TorrentInspector,
};
