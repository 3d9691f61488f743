//! Tag text normalization.
//!
//! Two tag values compare equal after normalization when they differ only in
//! letter case, whitespace runs, or diacritics. No other fuzziness is applied:
//! `"Beyoncé  Knowles"` and `"beyonce knowles"` match, `"Beyonce"` and
//! `"Beyonse"` do not.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a tag value for comparison.
///
/// Applies compatibility decomposition (NFKD), strips combining marks,
/// case folds, and collapses whitespace. Returns `None` when nothing but
/// whitespace remains, so an empty tag is never mistaken for a real value.
#[must_use]
pub fn normalize_text(raw: &str) -> Option<String> {
    let folded: String = raw
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .fold(String::new(), |mut out, c| {
            push_folded(&mut out, c);
            out
        });

    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Full case folds that differ from lowercasing.
fn push_folded(out: &mut String, c: char) {
    match c {
        'ß' => out.push_str("ss"),
        'ς' => out.push('σ'),
        _ => out.push(c),
    }
}

/// Normalize an optional tag value.
#[must_use]
pub fn normalize_opt(raw: Option<&str>) -> Option<String> {
    raw.and_then(normalize_text)
}
