//! Claim-name normalization.
//!
//! The compiler's `name` option and the codec's `normalized` field both
//! funnel through this. Normalization is NFD decomposition with combining
//! marks and whitespace stripped, followed by casefolding — the
//! Unicode-correct equivalent of the original indexer's
//! `unicodedata`-based normalization.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c) && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_lowercases() {
        assert_eq!(normalize_name("Café"), "cafe");
    }

    #[test]
    fn strips_whitespace() {
        assert_eq!(normalize_name("Foo Bar"), "foobar");
    }

    #[test]
    fn idempotent() {
        let once = normalize_name("Ångström");
        let twice = normalize_name(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_string() {
        assert_eq!(normalize_name(""), "");
    }
}
