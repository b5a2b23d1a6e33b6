//! Magnet-URI torrent inspector.
//!
//! Uses librqbit-core to parse the magnet (hash, display name, trackers)
//! and derives release tags (quality, source, codec, language, group)
//! from the display name. A bare magnet carries no file listing, so
//! `files` is empty here; a metadata-fetching inspector can slot in
//! behind the same trait later.

use async_trait::async_trait;
use librqbit_core::magnet::Magnet;
use tracing::debug;

use super::{is_valid_magnet, InspectError, TorrentInfo, TorrentInspector};

/// Inspector that works from the magnet URI alone.
#[derive(Debug, Default)]
pub struct MagnetInspector;

impl MagnetInspector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TorrentInspector for MagnetInspector {
    async fn inspect(&self, magnet_uri: &str) -> Result<Option<TorrentInfo>, InspectError> {
        if !is_valid_magnet(magnet_uri) {
            debug!("Rejecting magnet without a 32/40-char hex hash");
            return Ok(None);
        }

        let magnet =
            Magnet::parse(magnet_uri).map_err(|e| InspectError::ParseError(e.to_string()))?;

        let Some(id20) = magnet.as_id20() else {
            // Hex-validated above, so a missing id20 means a v2-only
            // magnet slipped through; treat like an invalid link.
            return Ok(None);
        };
        let info_hash = id20.as_string();

        let display_name = query_param(magnet_uri, "dn")
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| info_hash.clone());

        let trackers: Vec<String> = magnet_uri
            .split(['?', '&'])
            .filter_map(|pair| pair.strip_prefix("tr="))
            .filter_map(|v| urlencoding::decode(v).ok())
            .map(|v| v.into_owned())
            .collect();

        let tags = NameTags::parse(&display_name);

        Ok(Some(TorrentInfo {
            display_name,
            total_size: 0,
            file_count: 0,
            files: Vec::new(),
            main_video_file: None,
            info_hash,
            trackers,
            quality: tags.quality,
            source: tags.source,
            codec: tags.codec,
            language: tags.language,
            group: tags.group,
        }))
    }
}

/// First occurrence of a query parameter in a magnet URI,
/// percent-decoded, with `+` read as a space.
fn query_param(uri: &str, key: &str) -> Option<String> {
    let prefix = format!("{}=", key);
    uri.split(['?', '&'])
        .filter_map(|pair| pair.strip_prefix(prefix.as_str()))
        .next()
        .and_then(|v| urlencoding::decode(v).ok())
        .map(|v| v.replace('+', " "))
}

/// Release tags recovered from a torrent display name.
#[derive(Debug, Clone, PartialEq)]
pub struct NameTags {
    pub quality: String,
    pub source: Option<String>,
    pub codec: Option<String>,
    pub language: String,
    pub group: Option<String>,
}

impl NameTags {
    /// Probe a release name for the usual scene tags. Unknown quality
    /// defaults to the site's single published tier (1080p); language
    /// defaults to Latino for the same reason.
    pub fn parse(name: &str) -> Self {
        let upper = name.to_uppercase();

        let quality = if upper.contains("2160P") || upper.contains("4K") {
            "4K"
        } else if upper.contains("1080P") {
            "1080p"
        } else if upper.contains("720P") {
            "720p"
        } else if upper.contains("480P") {
            "480p"
        } else {
            "1080p"
        }
        .to_string();

        let source = [
            ("BDRIP", "BDRip"),
            ("BLURAY", "BluRay"),
            ("BRRIP", "BRRip"),
            ("WEB-DL", "WEB-DL"),
            ("WEBDL", "WEB-DL"),
            ("WEBRIP", "WEBRip"),
            ("HDTV", "HDTV"),
            ("DVDRIP", "DVDRip"),
            ("CAM", "CAM"),
        ]
        .iter()
        .find(|(probe, _)| upper.contains(probe))
        .map(|(_, tag)| tag.to_string());

        let codec = [
            ("X265", "x265"),
            ("H265", "x265"),
            ("HEVC", "x265"),
            ("X264", "x264"),
            ("H264", "x264"),
            ("AV1", "AV1"),
        ]
        .iter()
        .find(|(probe, _)| upper.contains(probe))
        .map(|(_, tag)| tag.to_string());

        let language = if upper.contains("DUAL") {
            "Dual"
        } else if upper.contains("CASTELLANO") {
            "Castellano"
        } else if upper.contains("SUBTITULADO") || upper.contains("SUB") {
            "Subtitulado"
        } else {
            "Latino"
        }
        .to_string();

        // Scene group: trailing "-GROUP" token.
        let group = name
            .rsplit_once('-')
            .map(|(_, g)| g.trim())
            .filter(|g| {
                !g.is_empty()
                    && g.len() <= 20
                    && g.chars().all(|c| c.is_ascii_alphanumeric())
                    && !g.chars().all(|c| c.is_ascii_digit())
            })
            .map(|g| g.to_string());

        Self {
            quality,
            source,
            codec,
            language,
            group,
        }
    }
}
