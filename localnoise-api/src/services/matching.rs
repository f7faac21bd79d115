//! String normalization and loose matching for track resolution
//!
//! Catalog metadata is messy: casing differs between providers, and
//! accented names ("Café Tacvba") appear with and without diacritics.
//! Matching normalizes both sides and then accepts equality or containment
//! in either direction, so "Champagne Supernova - Remastered" still pairs
//! with "Champagne Supernova". Containment is intentionally the whole
//! rule; candidates are pre-filtered by a combined artist+title search, so
//! a stronger similarity metric has not been needed.

use unicode_normalization::UnicodeNormalization;

/// Normalize for comparison: trim, lowercase, strip combining marks
///
/// NFD decomposition splits accented characters into base + combining
/// mark, then the marks are dropped: "Café" → "cafe".
pub fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn is_combining_mark(c: char) -> bool {
    // U+0300..U+036F covers the combining diacritical marks block
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Loose match: normalized equality, or either side contains the other
pub fn loosely_equal(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    a == b || a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_case_and_accents() {
        assert_eq!(normalize("Café Tacvba"), "cafe tacvba");
        assert_eq!(normalize("  MOTÖRHEAD  "), "motorhead");
        assert_eq!(normalize("Björk"), "bjork");
    }

    #[test]
    fn normalize_is_symmetric_across_accent_variants() {
        assert_eq!(normalize("Café Tacvba"), normalize("cafe tacvba"));
        assert_eq!(normalize("Señor Coconut"), normalize("SENOR COCONUT"));
    }

    #[test]
    fn exact_match_after_normalization() {
        assert!(loosely_equal("Dogleg", "dogleg"));
        assert!(loosely_equal("Mastodon", "  MASTODON "));
    }

    #[test]
    fn containment_matches_in_both_directions() {
        assert!(loosely_equal(
            "Champagne Supernova",
            "Champagne Supernova - Remastered"
        ));
        assert!(loosely_equal(
            "Champagne Supernova - Remastered",
            "Champagne Supernova"
        ));
    }

    #[test]
    fn unrelated_strings_do_not_match() {
        assert!(!loosely_equal("Dogleg", "Turnover"));
        assert!(!loosely_equal("Oasis", "Blur"));
    }
}
