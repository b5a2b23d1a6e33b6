//! Release matching: map an id fragment back to one listed release.
//!
//! Exact slug equality is authoritative. The fuzzy fallback is a
//! deliberately simple prefix/containment heuristic over normalized
//! slugs, NOT a general string-similarity algorithm: list order is
//! significant (first match wins, never best match), and tightening or
//! "improving" it with edit distance changes which release wins for
//! real-world slugs.

use crate::lister::Release;

/// Longest normalized prefix considered by the fuzzy comparison.
const FUZZY_PREFIX_MAX: usize = 15;

/// Find the release a target fragment refers to.
///
/// Returns the exact `id` match if one exists; otherwise the first
/// candidate (in list order) whose normalized id starts with, or
/// contains, the target's normalized prefix. An empty normalized target
/// matches nothing.
pub fn match_release<'a>(releases: &'a [Release], target: &str) -> Option<&'a Release> {
    if let Some(exact) = releases.iter().find(|r| r.id == target) {
        return Some(exact);
    }

    let normalized_target = normalize(target);
    // Without this guard an empty target would prefix-match every
    // candidate and return an arbitrary first release.
    if normalized_target.is_empty() {
        return None;
    }

    releases.iter().find(|candidate| {
        let normalized_candidate = normalize(&candidate.id);
        if normalized_candidate.is_empty() {
            return false;
        }

        let min_length = FUZZY_PREFIX_MAX
            .min(normalized_target.len())
            .min(normalized_candidate.len());
        let target_prefix = &normalized_target[..min_length];

        normalized_candidate.starts_with(target_prefix)
            || normalized_candidate.contains(target_prefix)
    })
}

/// Lowercase and strip separators so slug variants compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(id: &str) -> Release {
        Release {
            id: id.to_string(),
            title: id.to_string(),
            original_title: None,
            year: None,
            poster: None,
            details_link: format!("https://example.com/pelicula/{}/", id),
            quality: "1080p".to_string(),
            size_bytes: None,
            category: None,
        }
    }

    #[test]
    fn test_exact_match_wins() {
        let releases = vec![release("alpha"), release("beta-2023")];
        let matched = match_release(&releases, "beta-2023").unwrap();
        assert_eq!(matched.id, "beta-2023");
    }

    #[test]
    fn test_exact_match_skips_fuzzy() {
        // "beta-2023" exists exactly; the earlier fuzzy-compatible
        // candidate must not shadow it.
        let releases = vec![release("beta-2023-remastered"), release("beta-2023")];
        let matched = match_release(&releases, "beta-2023").unwrap();
        assert_eq!(matched.id, "beta-2023");
    }

    #[test]
    fn test_fuzzy_prefix_match() {
        // No exact match; normalized "beta2023extra" vs candidate
        // "beta2023": min_length = 8, prefix "beta2023" matches.
        let releases = vec![release("alpha"), release("beta-2023")];
        let matched = match_release(&releases, "beta-2023-extra").unwrap();
        assert_eq!(matched.id, "beta-2023");
    }

    #[test]
    fn test_fuzzy_containment_match() {
        // Candidate is longer than the target prefix and carries it in
        // the middle.
        let releases = vec![release("ver-beta-2023-online")];
        let matched = match_release(&releases, "beta-2023").unwrap();
        assert_eq!(matched.id, "ver-beta-2023-online");
    }

    #[test]
    fn test_fuzzy_first_match_wins_in_list_order() {
        let releases = vec![release("beta-2023-parte-1"), release("beta-2023-parte-2")];
        let matched = match_release(&releases, "beta-2023").unwrap();
        assert_eq!(matched.id, "beta-2023-parte-1");
    }

    #[test]
    fn test_separator_variants_compare_equal() {
        let releases = vec![release("la_ballena 2022")];
        let matched = match_release(&releases, "la-ballena-2022").unwrap();
        assert_eq!(matched.id, "la_ballena 2022");
    }

    #[test]
    fn test_prefix_capped_at_15_chars() {
        // Both normalize past 15 chars and share only the first 15.
        let releases = vec![release("una-pelicula-larguisima-v2")];
        let matched = match_release(&releases, "una-pelicula-larga-distinta");
        // normalized target prefix: "unapeliculalarg" (15 chars), which
        // the candidate "unapeliculalarguisimav2" contains.
        assert!(matched.is_some());
    }

    #[test]
    fn test_no_match() {
        let releases = vec![release("alpha"), release("beta")];
        assert!(match_release(&releases, "gamma").is_none());
    }

    #[test]
    fn test_empty_list() {
        assert!(match_release(&[], "beta-2023").is_none());
    }

    #[test]
    fn test_empty_target_rejected() {
        let releases = vec![release("alpha")];
        assert!(match_release(&releases, "").is_none());
        assert!(match_release(&releases, "---").is_none());
    }
}
