use crate::publish::{EntityKind, ImageRef, PublishDto, ScheduleEntry};
use serde::{Deserialize, Serialize};

/// Localized text of an entity for one locale, as published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localization {
    pub language_tag: String,
    pub is_default_locale: bool,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Image details as resolved by the image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedImage {
    pub id: String,
    pub image_type: String,
    pub path: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// Schedule entry as it appears in the published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedScheduleEntry {
    pub id: String,
    pub sort_index: i32,
    pub title: String,
    pub entity_id: String,
    pub entity_type: EntityKind,
    pub video_duration_in_seconds: Option<f64>,
}

impl From<&ScheduleEntry> for PublishedScheduleEntry {
    fn from(entry: &ScheduleEntry) -> Self {
        Self {
            id: entry.id.clone(),
            sort_index: entry.sort_index,
            title: entry.title.clone(),
            entity_id: entry.entity_id.clone(),
            entity_type: entry.entity_type,
            video_duration_in_seconds: entry.video_duration_in_seconds,
        }
    }
}

/// The externally emitted publish event body.
///
/// Collections are kept in canonical order (see [`PublishPayload::canonicalize`])
/// so the emitted payload and its content hash agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPayload {
    pub id: String,
    pub kind: EntityKind,
    pub title: String,
    pub description: Option<String>,
    pub duration_in_seconds: Option<f64>,
    /// Images the entity references and what it uses them for
    pub image_refs: Vec<ImageRef>,
    pub images: Vec<ResolvedImage>,
    pub localizations: Vec<Localization>,
    pub schedule: Vec<PublishedScheduleEntry>,
}

impl PublishPayload {
    /// Sort every collection by its defined key.
    ///
    /// Image references by (image id, usage type) without exact duplicates,
    /// images by (id, type), localizations by language tag, schedule entries
    /// by (sort index, id).
    pub fn canonicalize(&mut self) {
        self.image_refs.sort_by(|a, b| {
            a.image_id
                .cmp(&b.image_id)
                .then_with(|| a.image_type.cmp(&b.image_type))
        });
        self.image_refs.dedup();
        self.images.sort_by(|a, b| {
            a.id.cmp(&b.id)
                .then_with(|| a.image_type.cmp(&b.image_type))
        });
        self.localizations
            .sort_by(|a, b| a.language_tag.cmp(&b.language_tag));
        self.schedule.sort_by(|a, b| {
            a.sort_index
                .cmp(&b.sort_index)
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}

/// Localization synthesized from the entity's own fields when the
/// localization service is not in use.
pub fn default_localization(
    default_locale: &str,
    title: &str,
    description: Option<&str>,
) -> Localization {
    Localization {
        language_tag: default_locale.to_string(),
        is_default_locale: true,
        title: title.to_string(),
        description: description.map(str::to_string),
    }
}

/// Merge the aggregated entity, resolved images and localizations.
pub fn create_publish_payload(
    dto: &PublishDto,
    images: Vec<ResolvedImage>,
    localizations: Vec<Localization>,
) -> PublishPayload {
    let mut payload = PublishPayload {
        id: dto.id.clone(),
        kind: dto.kind,
        title: dto.title.clone(),
        description: dto.description.clone(),
        duration_in_seconds: dto.duration_in_seconds,
        image_refs: dto.images.clone(),
        images,
        localizations,
        schedule: dto.schedule.iter().map(PublishedScheduleEntry::from).collect(),
    };
    payload.canonicalize();
    payload
}
