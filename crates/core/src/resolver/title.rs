//! Search-phrase extraction from site slugs.
//!
//! Slugs carry SEO padding after the actual title
//! (`la-ballena-online-gratis-hd-latino`); the phrase fed to the site's
//! search box is the slug with that trailing noise stripped.

/// Tokens the site appends to slugs that never belong to a title.
/// Comparison is against the ASCII-folded token, so the encoding-garbled
/// language marker matches in both of its mangled forms.
const NOISE_WORDS: &[&str] = &[
    "online",
    "descarga",
    "descargar",
    "gratis",
    "hd",
    "full",
    "latino",
    "dual",
    "subtitulado",
    "spanish",
    "espanol",
    "espaol",
];

/// Derive a search phrase from an id fragment.
///
/// Splits on `-` and strips trailing noise tokens, stopping at the first
/// non-noise token. If every token is noise, keeps the first 70% of
/// tokens (rounded down, minimum 1) so the phrase is never empty for a
/// non-empty fragment.
pub fn search_phrase(fragment: &str) -> String {
    let tokens: Vec<&str> = fragment.split('-').filter(|t| !t.is_empty()).collect();
    if tokens.is_empty() {
        return String::new();
    }

    let mut end = tokens.len();
    while end > 0 && is_noise(tokens[end - 1]) {
        end -= 1;
    }

    let kept = if end == 0 {
        let keep = ((tokens.len() as f64 * 0.7).floor() as usize).max(1);
        &tokens[..keep.min(tokens.len())]
    } else {
        &tokens[..end]
    };

    kept.join(" ")
}

fn is_noise(token: &str) -> bool {
    let folded: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    NOISE_WORDS.contains(&folded.as_str())
}
