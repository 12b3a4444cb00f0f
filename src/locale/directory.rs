use crate::error::{CatalogError, Result};
use arc_swap::ArcSwap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// A configured locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    /// Language tag (e.g., "en-US", "de-DE")
    pub tag: String,

    /// Whether this is the default locale (exactly one per directory)
    pub is_default: bool,
}

impl Locale {
    pub fn new(tag: impl Into<String>, is_default: bool) -> Self {
        Self {
            tag: tag.into(),
            is_default,
        }
    }
}

/// Sync input as delivered by the administrative locale settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleInput {
    pub language_tag: String,
    pub is_default_locale: bool,
}

impl From<LocaleInput> for Locale {
    fn from(input: LocaleInput) -> Self {
        Locale::new(input.language_tag, input.is_default_locale)
    }
}

/// Immutable view of the configured locales at one point in time.
#[derive(Debug, Clone)]
pub struct LocaleSnapshot {
    locales: HashMap<String, Locale>,
    /// Tags in the order they were synced
    order: Vec<String>,
    default_tag: String,
}

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

impl LocaleSnapshot {
    /// Build and validate a snapshot.
    ///
    /// # Errors
    /// `InvalidConfiguration` if a tag is malformed or duplicated, or if the
    /// number of default locales is not exactly one.
    pub fn from_locales(locales: Vec<Locale>) -> Result<Self> {
        let tag_regex = TAG_REGEX.get_or_init(|| {
            Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("locale tag regex is valid")
        });

        let mut map = HashMap::with_capacity(locales.len());
        let mut order = Vec::with_capacity(locales.len());
        let mut defaults = Vec::new();

        for locale in locales {
            if !tag_regex.is_match(&locale.tag) {
                return Err(CatalogError::InvalidConfiguration(format!(
                    "'{}' is not a valid language tag",
                    locale.tag
                )));
            }
            if map.contains_key(&locale.tag) {
                return Err(CatalogError::InvalidConfiguration(format!(
                    "locale '{}' is configured more than once",
                    locale.tag
                )));
            }
            if locale.is_default {
                defaults.push(locale.tag.clone());
            }
            order.push(locale.tag.clone());
            map.insert(locale.tag.clone(), locale);
        }

        let default_tag = match defaults.len() {
            1 => defaults.remove(0),
            0 => {
                return Err(CatalogError::InvalidConfiguration(
                    "no default locale configured".to_string(),
                ))
            }
            n => {
                return Err(CatalogError::InvalidConfiguration(format!(
                    "{} default locales configured ({}), expected exactly one",
                    n,
                    defaults.join(", ")
                )))
            }
        };

        Ok(Self {
            locales: map,
            order,
            default_tag,
        })
    }

    /// Tag of the default locale.
    pub fn default_tag(&self) -> &str {
        &self.default_tag
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.locales.contains_key(tag)
    }

    pub fn get(&self, tag: &str) -> Option<&Locale> {
        self.locales.get(tag)
    }

    /// All configured locales in sync order.
    pub fn locales(&self) -> Vec<&Locale> {
        self.order
            .iter()
            .filter_map(|tag| self.locales.get(tag))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Owned, injectable directory of configured locales.
///
/// Read on every localized request, written only by the administrative sync.
/// A sync validates the complete [`LocaleSnapshot`] first and then swaps the
/// pointer atomically: readers see either the old snapshot or the new one
/// and never wait on a writer.
pub struct LocaleDirectory {
    current: ArcSwap<LocaleSnapshot>,
}

impl LocaleDirectory {
    /// Create a directory from an initial set of locales.
    pub fn new(locales: Vec<Locale>) -> Result<Self> {
        let snapshot = LocaleSnapshot::from_locales(locales)?;
        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
        })
    }

    /// Create a directory that only knows the given default locale.
    pub fn with_default(tag: &str) -> Result<Self> {
        Self::new(vec![Locale::new(tag, true)])
    }

    /// Replace the entire set of configured locales.
    ///
    /// On error the previous snapshot stays installed.
    pub fn sync(&self, locales: Vec<Locale>) -> Result<Arc<LocaleSnapshot>> {
        let snapshot = match LocaleSnapshot::from_locales(locales) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!("Rejected locale sync: {}", e);
                return Err(e);
            }
        };

        self.current.store(Arc::clone(&snapshot));

        info!(
            "Locale directory synced: {} locales, default '{}'",
            snapshot.len(),
            snapshot.default_tag()
        );
        Ok(snapshot)
    }

    /// The snapshot installed at the time of the call.
    pub fn current_snapshot(&self) -> Arc<LocaleSnapshot> {
        self.current.load_full()
    }
}
