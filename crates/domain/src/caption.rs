//! Caption post-processing and the fixed fallback captions

/// Substituted when the generation service answers but produces no usable
/// text.
pub const DEFAULT_CAPTION: &str = "Something worth a closer look";

/// Substituted when the generation call itself fails. Distinct from
/// [`DEFAULT_CAPTION`] so logs can tell the two apart.
pub const FALLBACK_CAPTION: &str = "Discover something interesting";

/// Normalize a raw generated caption.
///
/// Applied in order: everything up to and including the first colon is
/// dropped (strips lead-in phrases like "Title:"), double quotes are
/// removed, single quotes are trimmed from the ends (contractions survive),
/// and an empty result becomes [`DEFAULT_CAPTION`].
pub fn clean_caption(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(idx) = text.find(':') {
        text = text[idx + 1..].trim();
    }

    let cleaned = text.replace('"', "");
    let cleaned = cleaned.trim_matches('\'').trim();

    if cleaned.is_empty() {
        DEFAULT_CAPTION.to_string()
    } else {
        cleaned.to_string()
    }
}
