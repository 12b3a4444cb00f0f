//! Request locale resolution.

use crate::locale::LocaleSnapshot;
use serde::Serialize;
use std::fmt;

/// Header carrying the requested locale on localized reads.
pub const LOCALE_HEADER: &str = "mosaic-locale";

/// The locale tag a request will be served in.
///
/// Computed once per request from the locale header and the snapshot that
/// was current when the request started.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedLocale(String);

impl ResolvedLocale {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResolvedLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map a requested locale tag onto a configured one.
///
/// Empty or unconfigured tags resolve to the snapshot's default tag; any
/// configured tag is returned unchanged. Never fails.
pub fn resolve(requested: &str, snapshot: &LocaleSnapshot) -> ResolvedLocale {
    if !requested.is_empty() && snapshot.contains(requested) {
        ResolvedLocale(requested.to_string())
    } else {
        ResolvedLocale(snapshot.default_tag().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use proptest::prelude::*;

    fn snapshot() -> LocaleSnapshot {
        LocaleSnapshot::from_locales(vec![
            Locale::new("en-US", true),
            Locale::new("de-DE", false),
            Locale::new("et-EE", false),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_empty_returns_default() {
        assert_eq!(resolve("", &snapshot()).as_str(), "en-US");
    }

    #[test]
    fn test_resolve_configured_tag_unchanged() {
        assert_eq!(resolve("de-DE", &snapshot()).as_str(), "de-DE");
        assert_eq!(resolve("et-EE", &snapshot()).as_str(), "et-EE");
        assert_eq!(resolve("en-US", &snapshot()).as_str(), "en-US");
    }

    #[test]
    fn test_resolve_unknown_tag_returns_default() {
        assert_eq!(resolve("asdf", &snapshot()).as_str(), "en-US");
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        // Tags are matched exactly as configured
        assert_eq!(resolve("de-de", &snapshot()).as_str(), "en-US");
    }

    #[test]
    fn test_resolved_locale_display() {
        let resolved = resolve("de-DE", &snapshot());
        assert_eq!(format!("{}", resolved), "de-DE");
        assert_eq!(resolved.into_string(), "de-DE");
    }

    proptest! {
        #[test]
        fn prop_unconfigured_tags_resolve_to_default(tag in "[a-zA-Z-]{0,12}") {
            let snapshot = snapshot();
            prop_assume!(!snapshot.contains(&tag));
            let resolved = resolve(&tag, &snapshot);
            prop_assert_eq!(resolved.as_str(), "en-US");
        }

        #[test]
        fn prop_configured_tags_resolve_to_themselves(index in 0usize..3) {
            let snapshot = snapshot();
            let tag = snapshot.locales()[index].tag.clone();
            let resolved = resolve(&tag, &snapshot);
            prop_assert_eq!(resolved.as_str(), tag.as_str());
        }
    }
}
