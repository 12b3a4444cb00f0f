//! Localized row projection.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One locale's worth of text fields for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedRow {
    pub entity_id: String,
    pub locale: String,
    pub is_default_locale: bool,
    pub fields: BTreeMap<String, String>,
}

impl LocalizedRow {
    pub fn new(entity_id: &str, locale: &str, is_default_locale: bool) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            locale: locale.to_string(),
            is_default_locale,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }
}

/// Select the fields to expose for `entity_id` in the resolved locale.
///
/// The row matching `resolved_locale` wins; otherwise the entity's default
/// row is used. A non-default row for some other locale is never returned,
/// even when the default row is missing.
///
/// # Errors
/// `NoLocalizationAvailable` when neither an exact nor a default row exists.
pub fn project(
    entity_id: &str,
    rows: &[LocalizedRow],
    resolved_locale: &str,
) -> Result<BTreeMap<String, String>> {
    let candidates = || rows.iter().filter(|row| row.entity_id == entity_id);

    candidates()
        .find(|row| row.locale == resolved_locale)
        .or_else(|| candidates().find(|row| row.is_default_locale))
        .map(|row| row.fields.clone())
        .ok_or_else(|| CatalogError::NoLocalizationAvailable {
            entity_id: entity_id.to_string(),
            locale: resolved_locale.to_string(),
        })
}
