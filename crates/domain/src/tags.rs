//! Trend tag filtering and sampling

use rand::seq::IndexedRandom;
use unicode_normalization::UnicodeNormalization;

/// Leading character marking a tag candidate
const SIGIL: char = '#';

/// Generic navigation labels that show up as anchor text on listing pages
const DENYLIST: [&str; 7] = [
    "home", "about", "contact", "privacy", "terms", "login", "signup",
];

/// Keep the anchor texts that are usable tags.
///
/// Candidates are NFC-normalized first so visually identical tags compare
/// equal, then kept when they start with the sigil, are longer than two
/// characters, are not denylisted navigation words (compared
/// case-insensitively without the sigil), and do not look like a URL.
pub fn filter_candidates(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|candidate| candidate.trim().nfc().collect::<String>())
        .filter(|tag| is_usable_tag(tag))
        .collect()
}

fn is_usable_tag(tag: &str) -> bool {
    if !tag.starts_with(SIGIL) {
        return false;
    }
    if tag.chars().count() <= 2 {
        return false;
    }

    let stripped = tag.trim_start_matches(SIGIL).to_lowercase();
    if DENYLIST.contains(&stripped.as_str()) {
        return false;
    }
    if stripped.starts_with("http") || stripped.starts_with("www") {
        return false;
    }

    true
}

/// Draw `min(count, tags.len())` tags uniformly at random, without
/// replacement. Asking for more tags than exist is not an error, and an
/// empty pool yields an empty selection.
pub fn select(tags: &[String], count: usize) -> Vec<String> {
    if tags.is_empty() {
        return Vec::new();
    }
    let mut rng = rand::rng();
    tags.choose_multiple(&mut rng, count).cloned().collect()
}
