//! Torrent-to-stream projection.
//!
//! Turns a resolved torrent's file list into playable stream
//! descriptors: one per contained video file when the listing is known,
//! else a single descriptor for the torrent as a whole. Direct download
//! links bypass projection entirely.

use crate::addon::{Stream, StreamBehaviorHints};
use crate::lister::DownloadLink;
use crate::store::MovieRecord;
use crate::torrent::TorrentInfo;

/// File extensions the projector treats as playable video.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "webm", "m4v", "mov", "wmv", "flv", "m2ts", "ts",
];

/// Country codes attached to every descriptor's playback hints,
/// unconditionally.
pub const COUNTRY_WHITELIST: &[&str] = &["mx", "ar", "co", "cl", "pe", "ve", "ec", "es", "us"];

const ADDON_TAG: &str = "Cartelera";

/// Project a resolved torrent into stream descriptors.
///
/// Multi-file strategy when the torrent's file list contains video
/// files (one descriptor per video file, all sharing the torrent's info
/// hash); otherwise the single-file strategy over `main_video_file` or
/// the aggregate torrent.
pub fn project(info: &TorrentInfo, record: &MovieRecord, request_id: &str) -> Vec<Stream> {
    let hints = behavior_hints(record, request_id);

    let video_files: Vec<_> = info
        .files
        .iter()
        .filter(|f| is_video_file(&f.name))
        .collect();

    if !video_files.is_empty() {
        return video_files
            .into_iter()
            .map(|file| Stream {
                name: Some(display_name(info, Some(file.size))),
                title: Some(format!("{}\n{}", compact_title(info, Some(file.size)), file.name)),
                info_hash: Some(info.info_hash.clone()),
                file_idx: Some(file.index),
                url: None,
                behavior_hints: Some(hints.clone()),
            })
            .collect();
    }

    let size = if info.total_size > 0 {
        Some(info.total_size)
    } else {
        None
    };
    let file_idx = info.main_video_file.as_ref().map(|f| f.index).unwrap_or(0);

    vec![Stream {
        name: Some(display_name(info, size)),
        title: Some(compact_title(info, size)),
        info_hash: Some(info.info_hash.clone()),
        file_idx: Some(file_idx),
        url: None,
        behavior_hints: Some(hints),
    }]
}

/// Descriptor for a non-magnet download link. Quality comes from a
/// case-insensitive probe of the link's label.
pub fn direct_download(link: &DownloadLink, record: &MovieRecord, request_id: &str) -> Stream {
    let quality = quality_from_label(&link.name);

    Stream {
        name: Some(format!("{}\n{} Directo", ADDON_TAG, quality)),
        title: Some(link.name.clone()),
        info_hash: None,
        file_idx: None,
        url: Some(link.url.clone()),
        behavior_hints: Some(behavior_hints(record, request_id)),
    }
}

/// Quality tier inferred from a download label.
pub fn quality_from_label(label: &str) -> &'static str {
    let upper = label.to_uppercase();
    if upper.contains("4K") || upper.contains("2160P") {
        "4K"
    } else if upper.contains("720P") {
        "720p"
    } else {
        "1080p"
    }
}

fn is_video_file(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// The binge group ties every variant of one logical movie together.
/// Precedence: external IMDB id, scraped IMDB id, then the request id
/// itself, which keeps the group unique even with no IMDB id anywhere.
fn behavior_hints(record: &MovieRecord, request_id: &str) -> StreamBehaviorHints {
    let anchor = record
        .external_meta
        .as_ref()
        .and_then(|e| e.imdb_id.as_deref())
        .or_else(|| {
            record
                .movie_details
                .as_ref()
                .and_then(|d| d.imdb_id.as_deref())
        })
        .unwrap_or(request_id);

    StreamBehaviorHints {
        binge_group: Some(format!("cartelera-{}", anchor)),
        country_whitelist: COUNTRY_WHITELIST.iter().map(|c| c.to_string()).collect(),
    }
}

fn display_name(info: &TorrentInfo, size: Option<u64>) -> String {
    let mut tags = vec![info.quality.clone()];
    if let Some(source) = &info.source {
        tags.push(source.clone());
    }
    if let Some(codec) = &info.codec {
        tags.push(codec.clone());
    }

    let mut second_line = vec![info.language.clone()];
    if let Some(size) = size {
        second_line.push(format_size(size));
    }

    format!(
        "{}\n{}\n{}",
        ADDON_TAG,
        tags.join(" "),
        second_line.join(" ")
    )
}

fn compact_title(info: &TorrentInfo, size: Option<u64>) -> String {
    let mut parts = vec![info.quality.clone()];
    if let Some(source) = &info.source {
        parts.push(source.clone());
    }
    if let Some(codec) = &info.codec {
        parts.push(codec.clone());
    }
    parts.push(info.language.clone());
    if let Some(size) = size {
        parts.push(format_size(size));
    }
    parts.join(" · ")
}

fn format_size(bytes: u64) -> String {
    const GB: f64 = 1_073_741_824.0;
    const MB: f64 = 1_048_576.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else {
        format!("{:.0} MB", bytes / MB)
    }
}
