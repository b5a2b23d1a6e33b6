//! Mock collaborators and fixtures for testing.
//!
//! Each mock implements the same trait as its production counterpart,
//! records the calls made against it for assertions, and supports
//! one-shot error injection.

mod mock_inspector;
mod mock_lister;
mod mock_metadata;

pub use mock_inspector::MockInspector;
pub use mock_lister::{MockLister, RecordedListerCall};
pub use mock_metadata::MockMetadataProvider;

/// Ready-made test data builders.
pub mod fixtures {
    use crate::lister::{DownloadLink, LinkKind, MovieDetails, Release};
    use crate::metadata::ExternalMetadata;
    use crate::torrent::{TorrentFileEntry, TorrentInfo};

    /// A 40-char hex hash that is obviously fake but structurally valid.
    pub const INFO_HASH: &str = "aabbccddeeff00112233aabbccddeeff00112233";

    pub fn release(id: &str, title: &str) -> Release {
        Release {
            id: id.to_string(),
            title: title.to_string(),
            original_title: None,
            year: Some(2022),
            poster: Some(format!("https://img.example/{}.jpg", id)),
            details_link: format!("https://site.example/pelicula/{}/", id),
            quality: "1080p".to_string(),
            size_bytes: None,
            category: None,
        }
    }

    pub fn magnet(hash: &str, name: &str) -> String {
        format!("magnet:?xt=urn:btih:{}&dn={}", hash, name)
    }

    pub fn movie_details(slug: &str, imdb_id: Option<&str>) -> MovieDetails {
        MovieDetails {
            id: Some(slug.to_string()),
            imdb_id: imdb_id.map(str::to_string),
            title: None,
            year: Some(2022),
            download_links: vec![DownloadLink {
                name: "1080p Latino".to_string(),
                url: magnet(INFO_HASH, slug),
                kind: LinkKind::Magnet,
            }],
        }
    }

    pub fn external_metadata(imdb_id: &str, title: &str) -> ExternalMetadata {
        ExternalMetadata {
            imdb_id: Some(imdb_id.to_string()),
            title: Some(title.to_string()),
            original_title: Some(title.to_string()),
            year: Some(2022),
            poster: Some("https://img.example/poster.jpg".to_string()),
            background: Some("https://img.example/background.jpg".to_string()),
            description: Some("A test movie about testing movies.".to_string()),
            genres: vec!["Drama".to_string()],
            cast: vec!["Actor One".to_string(), "Actor Two".to_string()],
            director: vec!["Director One".to_string()],
            writer: vec!["Writer One".to_string()],
            imdb_rating: Some(7.8),
        }
    }

    pub fn torrent_info(hash: &str, files: Vec<TorrentFileEntry>) -> TorrentInfo {
        TorrentInfo {
            display_name: "Test.Movie.2022.1080p.BluRay.x265-GRP".to_string(),
            total_size: files.iter().map(|f| f.size).sum(),
            file_count: files.len() as u32,
            files,
            main_video_file: None,
            info_hash: hash.to_string(),
            trackers: vec!["udp://tracker.example:6969".to_string()],
            quality: "1080p".to_string(),
            source: Some("BluRay".to_string()),
            codec: Some("x265".to_string()),
            language: "Latino".to_string(),
            group: Some("GRP".to_string()),
        }
    }

    pub fn video_file(name: &str, index: u32) -> TorrentFileEntry {
        TorrentFileEntry {
            name: name.to_string(),
            size: 2_000_000_000,
            index,
        }
    }
}
