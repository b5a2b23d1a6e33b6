//! Canonical meta construction.
//!
//! Three builders share one merge discipline over well-typed optional
//! inputs; they differ only in which source records they consult. Per
//! field, the first non-empty valid candidate wins; invalid values are
//! dropped, never substituted. The emitted [`MovieMeta`] carries no
//! nulls and no empty lists.

use chrono::{Datelike, Utc};

use crate::addon::MovieMeta;
use crate::lister::{MovieDetails, Release};
use crate::metadata::ExternalMetadata;
use crate::store::MovieRecord;

const DEFAULT_NAME: &str = "Unknown Title";
const YEAR_MIN: i32 = 1900;
const DESCRIPTION_MAX: usize = 1000;
const DESCRIPTION_MIN: usize = 10;
const GENRES_MAX: usize = 10;
const CAST_MAX: usize = 8;
const CREW_MAX: usize = 3;

/// Inputs for a freshly scraped resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapedParts<'a> {
    pub id: &'a str,
    pub release: Option<&'a Release>,
    pub movie_details: Option<&'a MovieDetails>,
    pub external_meta: Option<&'a ExternalMetadata>,
}

/// Build a meta trusting the external source fully (external-id branch).
pub fn from_external(id: &str, external: &ExternalMetadata) -> MovieMeta {
    build(id, None, Some(external), Some(id))
}

/// Build a meta from an already-persisted record (catalog-scan branch).
pub fn from_catalog_record(record: &MovieRecord, id: &str) -> MovieMeta {
    build(
        id,
        record.release.as_ref(),
        record.external_meta.as_ref(),
        record
            .movie_details
            .as_ref()
            .and_then(|d| d.imdb_id.as_deref()),
    )
}

/// Build a meta from freshly scraped parts (live-scrape branch).
pub fn from_scraped(parts: &ScrapedParts) -> MovieMeta {
    build(
        parts.id,
        parts.release,
        parts.external_meta,
        parts.movie_details.and_then(|d| d.imdb_id.as_deref()),
    )
}

/// Summary meta for catalog listings: one release, no merging.
pub fn summary_from_release(full_id: &str, release: &Release) -> MovieMeta {
    build(full_id, Some(release), None, None)
}

fn build(
    id: &str,
    release: Option<&Release>,
    external: Option<&ExternalMetadata>,
    imdb_id: Option<&str>,
) -> MovieMeta {
    let mut meta = MovieMeta::new(id, pick_name(release, external));

    meta.poster = [
        external.and_then(|e| e.poster.as_deref()),
        release.and_then(|r| r.poster.as_deref()),
    ]
    .into_iter()
    .flatten()
    .find_map(valid_url);

    meta.background = [
        external.and_then(|e| e.background.as_deref()),
        release.and_then(|r| r.poster.as_deref()),
    ]
    .into_iter()
    .flatten()
    .find_map(valid_url);

    meta.year = [external.and_then(|e| e.year), release.and_then(|r| r.year)]
        .into_iter()
        .flatten()
        .find(|y| valid_year(*y));

    meta.description = external
        .and_then(|e| e.description.as_deref())
        .and_then(clean_description)
        .or_else(|| release.map(synthesized_description));

    meta.genres = external
        .map(|e| e.genres.clone())
        .filter(|g| !g.is_empty())
        .or_else(|| release.and_then(|r| r.category.clone()).map(|c| vec![c]))
        .map(|g| clean_list(g, GENRES_MAX))
        .unwrap_or_default();

    if let Some(external) = external {
        meta.cast = clean_list(external.cast.clone(), CAST_MAX);
        meta.director = clean_list(external.director.clone(), CREW_MAX);
        meta.writer = clean_list(external.writer.clone(), CREW_MAX);
        meta.imdb_rating = external.imdb_rating.and_then(valid_rating);
    }

    meta.imdb_id = imdb_id.map(|i| i.to_string());
    meta.release_info = release.map(|r| r.quality.clone());

    meta
}

/// Name precedence: external original title, external title, release
/// original title, release title; first non-empty trimmed candidate
/// set. Among those, a title without a parenthetical wins so the
/// listing's "Movie (2023)" form doesn't leak into the display name;
/// if every candidate carries one, the first candidate stands.
fn pick_name(release: Option<&Release>, external: Option<&ExternalMetadata>) -> String {
    let candidates: Vec<&str> = [
        external.and_then(|e| e.original_title.as_deref()),
        external.and_then(|e| e.title.as_deref()),
        release.and_then(|r| r.original_title.as_deref()),
        release.map(|r| r.title.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|c| !c.is_empty())
    .collect();

    candidates
        .iter()
        .find(|c| !has_parenthetical(c))
        .or_else(|| candidates.first())
        .map(|c| c.to_string())
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}

fn has_parenthetical(s: &str) -> bool {
    s.contains('(') && s.contains(')')
}

/// Absolute http(s) URL or nothing.
fn valid_url(candidate: &str) -> Option<String> {
    let url = reqwest::Url::parse(candidate).ok()?;
    match url.scheme() {
        "http" | "https" => Some(candidate.to_string()),
        _ => None,
    }
}

fn valid_year(year: i32) -> bool {
    (YEAR_MIN..=Utc::now().year() + 5).contains(&year)
}

fn valid_rating(rating: f64) -> Option<f64> {
    if (0.0..=10.0).contains(&rating) {
        Some((rating * 10.0).round() / 10.0)
    } else {
        None
    }
}

/// Collapse whitespace, trim, truncate to 1000 chars; under 10 chars the
/// cleaned text carries no information and is dropped.
fn clean_description(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() < DESCRIPTION_MIN {
        return None;
    }
    Some(collapsed.chars().take(DESCRIPTION_MAX).collect())
}

/// The only derived-text field: when no external description exists, the
/// listing's quality tier (plus size, when known) stands in.
fn synthesized_description(release: &Release) -> String {
    match release.size_bytes {
        Some(bytes) => format!(
            "{} · {:.2} GB",
            release.quality,
            bytes as f64 / 1_073_741_824.0
        ),
        None => release.quality.clone(),
    }
}

fn clean_list(items: Vec<String>, cap: usize) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(title: &str, original_title: Option<&str>) -> Release {
        Release {
            id: "slug".to_string(),
            title: title.to_string(),
            original_title: original_title.map(str::to_string),
            year: None,
            poster: None,
            details_link: "https://example.com/pelicula/slug/".to_string(),
            quality: "1080p".to_string(),
            size_bytes: None,
            category: None,
        }
    }

    #[test]
    fn test_name_prefers_non_parenthetical() {
        let r = release("Foo (2023)", Some("Foo"));
        let meta = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.name, "Foo");
    }

    #[test]
    fn test_name_falls_back_to_only_candidate() {
        let r = release("Foo (2023)", None);
        let meta = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.name, "Foo (2023)");
    }

    #[test]
    fn test_name_external_original_title_first() {
        let r = release("El Fuego", None);
        let external = ExternalMetadata {
            title: Some("The Fire (dub)".to_string()),
            original_title: Some("The Fire".to_string()),
            ..ExternalMetadata::default()
        };
        let meta = from_scraped(&ScrapedParts {
            id: "cc_el-fuego",
            release: Some(&r),
            external_meta: Some(&external),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.name, "The Fire");
    }

    #[test]
    fn test_name_default_when_no_candidates() {
        let meta = from_scraped(&ScrapedParts {
            id: "cc_x",
            ..ScrapedParts::default()
        });
        assert_eq!(meta.name, "Unknown Title");
    }

    #[test]
    fn test_whitespace_only_candidate_skipped() {
        let r = release("   ", Some("Real Title"));
        let meta = from_scraped(&ScrapedParts {
            id: "cc_x",
            release: Some(&r),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.name, "Real Title");
    }

    #[test]
    fn test_year_window() {
        for (year, expected) in [
            (1850, None),
            (1899, None),
            (1900, Some(1900)),
            (2023, Some(2023)),
            (2099, None),
        ] {
            let external = ExternalMetadata {
                year: Some(year),
                ..ExternalMetadata::default()
            };
            let meta = from_external("tt0000001", &external);
            assert_eq!(meta.year, expected, "year {}", year);
        }
    }

    #[test]
    fn test_year_falls_back_to_release() {
        let mut r = release("Foo", None);
        r.year = Some(2022);
        let external = ExternalMetadata {
            year: Some(1850), // invalid, dropped
            ..ExternalMetadata::default()
        };
        let meta = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            external_meta: Some(&external),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.year, Some(2022));
    }

    #[test]
    fn test_poster_validation_drops_invalid() {
        let mut r = release("Foo", None);
        r.poster = Some("https://img.example/fallback.jpg".to_string());
        let external = ExternalMetadata {
            poster: Some("not a url".to_string()),
            ..ExternalMetadata::default()
        };
        let meta = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            external_meta: Some(&external),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.poster.as_deref(), Some("https://img.example/fallback.jpg"));
    }

    #[test]
    fn test_poster_rejects_non_http_scheme() {
        let external = ExternalMetadata {
            poster: Some("ftp://img.example/p.jpg".to_string()),
            ..ExternalMetadata::default()
        };
        let meta = from_external("tt0000001", &external);
        assert_eq!(meta.poster, None);
    }

    #[test]
    fn test_description_cleaning() {
        let external = ExternalMetadata {
            description: Some("  A  hacker\n\nlearns   the truth.  ".to_string()),
            ..ExternalMetadata::default()
        };
        let meta = from_external("tt0000001", &external);
        assert_eq!(meta.description.as_deref(), Some("A hacker learns the truth."));
    }

    #[test]
    fn test_description_too_short_dropped() {
        let external = ExternalMetadata {
            description: Some("  ok   ".to_string()),
            ..ExternalMetadata::default()
        };
        let meta = from_external("tt0000001", &external);
        assert_eq!(meta.description, None);
    }

    #[test]
    fn test_description_truncated_to_1000() {
        let external = ExternalMetadata {
            description: Some("x".repeat(5000)),
            ..ExternalMetadata::default()
        };
        let meta = from_external("tt0000001", &external);
        assert_eq!(meta.description.unwrap().chars().count(), 1000);
    }

    #[test]
    fn test_description_synthesized_from_release() {
        let mut r = release("Foo", None);
        r.size_bytes = Some(2_308_974_181); // ~2.15 GB
        let meta = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.description.as_deref(), Some("1080p · 2.15 GB"));
    }

    #[test]
    fn test_description_synthesized_quality_only() {
        let r = release("Foo", None);
        let meta = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.description.as_deref(), Some("1080p"));
    }

    #[test]
    fn test_genres_capped_and_cleaned() {
        let external = ExternalMetadata {
            genres: (0..15)
                .map(|i| format!("  Genre{} ", i))
                .chain(["  ".to_string()])
                .collect(),
            ..ExternalMetadata::default()
        };
        let meta = from_external("tt0000001", &external);
        assert_eq!(meta.genres.len(), 10);
        assert_eq!(meta.genres[0], "Genre0");
    }

    #[test]
    fn test_genres_from_release_category() {
        let mut r = release("Foo", None);
        r.category = Some("Terror".to_string());
        let meta = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.genres, vec!["Terror"]);
    }

    #[test]
    fn test_people_caps() {
        let external = ExternalMetadata {
            cast: (0..12).map(|i| format!("Actor {}", i)).collect(),
            director: vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()],
            writer: vec!["W1, W2, W3, W4".to_string()],
            ..ExternalMetadata::default()
        };
        let meta = from_external("tt0000001", &external);
        assert_eq!(meta.cast.len(), 8);
        assert_eq!(meta.director.len(), 3);
        // Comma-joined entry splits before capping
        assert_eq!(meta.writer, vec!["W1", "W2", "W3"]);
    }

    #[test]
    fn test_rating_window_and_rounding() {
        for (rating, expected) in [
            (8.67, Some(8.7)),
            (0.0, Some(0.0)),
            (10.0, Some(10.0)),
            (10.5, None),
            (-1.0, None),
        ] {
            let external = ExternalMetadata {
                imdb_rating: Some(rating),
                ..ExternalMetadata::default()
            };
            let meta = from_external("tt0000001", &external);
            assert_eq!(meta.imdb_rating, expected, "rating {}", rating);
        }
    }

    #[test]
    fn test_imdb_id_only_from_details() {
        let r = release("Foo", None);
        let details = MovieDetails {
            imdb_id: Some("tt7654321".to_string()),
            ..MovieDetails::default()
        };
        let meta = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            movie_details: Some(&details),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.imdb_id.as_deref(), Some("tt7654321"));

        let without_details = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            ..ScrapedParts::default()
        });
        assert_eq!(without_details.imdb_id, None);
    }

    #[test]
    fn test_external_builder_sets_request_id_as_imdb_id() {
        let meta = from_external("tt0133093", &ExternalMetadata::default());
        assert_eq!(meta.imdb_id.as_deref(), Some("tt0133093"));
        assert_eq!(meta.id, "tt0133093");
    }

    #[test]
    fn test_release_info_is_quality_verbatim() {
        let r = release("Foo", None);
        let meta = from_scraped(&ScrapedParts {
            id: "cc_foo",
            release: Some(&r),
            ..ScrapedParts::default()
        });
        assert_eq!(meta.release_info.as_deref(), Some("1080p"));

        let external_only = from_external("tt0000001", &ExternalMetadata::default());
        assert_eq!(external_only.release_info, None);
    }

    #[test]
    fn test_no_empty_placeholders_in_wire_form() {
        let meta = from_external("tt0000001", &ExternalMetadata::default());
        let json = serde_json::to_string(&meta).unwrap();
        assert!(!json.contains("null"));
        assert!(!json.contains("[]"));
    }

    #[test]
    fn test_from_catalog_record_merges_external_over_release() {
        let r = release("La Matrix", None);
        let record = MovieRecord {
            release: Some(r),
            movie_details: None,
            external_meta: Some(ExternalMetadata {
                original_title: Some("The Matrix".to_string()),
                year: Some(1999),
                ..ExternalMetadata::default()
            }),
            meta: None,
            last_updated: Utc::now(),
        };
        let meta = from_catalog_record(&record, "cc_la-matrix");
        assert_eq!(meta.name, "The Matrix");
        assert_eq!(meta.year, Some(1999));
        assert_eq!(meta.id, "cc_la-matrix");
    }
}
