//! Text folding shared by every lexicon and pattern match.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold text for matching: NFKD decomposition, combining marks stripped,
/// lower-cased, whitespace runs collapsed to one space, trimmed.
///
/// Total and deterministic. `"  Cărțile   LUI  Rebreanu "` becomes
/// `"cartile lui rebreanu"`.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URL-safe slug of a title: normalized, non-alphanumeric runs become `-`.
///
/// An empty result falls back to `"untitled"`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in normalize(text).chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}
