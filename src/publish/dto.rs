use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of catalog entities that carry localized text and can be published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Movie,
    Episode,
    Season,
    Channel,
    Playlist,
    Interstitial,
}

impl EntityKind {
    /// Upper-case name used on the wire and in schedule entry references.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Movie => "MOVIE",
            EntityKind::Episode => "EPISODE",
            EntityKind::Season => "SEASON",
            EntityKind::Channel => "CHANNEL",
            EntityKind::Playlist => "PLAYLIST",
            EntityKind::Interstitial => "INTERSTITIAL",
        }
    }

    /// Entity type name the localization service registers entities under.
    pub fn localization_type(&self) -> &'static str {
        match self {
            EntityKind::Movie => "movie",
            EntityKind::Episode => "episode",
            EntityKind::Season => "season",
            EntityKind::Channel => "channel",
            EntityKind::Playlist => "playlist",
            EntityKind::Interstitial => "interstitial",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.localization_type())
    }
}

impl FromStr for EntityKind {
    type Err = CatalogError;

    /// Accepts singular or plural names in any case ("episode", "EPISODES").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        match singular {
            "movie" => Ok(EntityKind::Movie),
            "episode" => Ok(EntityKind::Episode),
            "season" => Ok(EntityKind::Season),
            "channel" => Ok(EntityKind::Channel),
            "playlist" => Ok(EntityKind::Playlist),
            "interstitial" => Ok(EntityKind::Interstitial),
            _ => Err(CatalogError::InvalidConfiguration(format!(
                "unknown entity kind '{}'",
                s
            ))),
        }
    }
}

/// Core attributes of a catalog entity as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub kind: EntityKind,
    pub title: String,
    pub description: Option<String>,
    pub duration_in_seconds: Option<f64>,
}

/// Reference from an entity to an image held by the image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub image_id: String,
    /// Usage of the image for this entity (e.g., "COVER", "LOGO")
    pub image_type: String,
}

/// A program slot in a playlist, referencing the catalog entity it plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub playlist_id: String,
    pub title: String,
    pub entity_id: String,
    pub entity_type: EntityKind,
    pub sort_index: i32,
    /// Cached copy of the referenced entity's duration
    pub video_duration_in_seconds: Option<f64>,
}

/// Denormalized entity plus children, assembled fresh per publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishDto {
    pub id: String,
    pub kind: EntityKind,
    pub title: String,
    pub description: Option<String>,
    pub duration_in_seconds: Option<f64>,
    pub images: Vec<ImageRef>,
    pub schedule: Vec<ScheduleEntry>,
}

impl PublishDto {
    /// Distinct referenced image ids in first-seen order.
    pub fn image_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.images.len());
        for image in &self.images {
            if !ids.contains(&image.image_id) {
                ids.push(image.image_id.clone());
            }
        }
        ids
    }
}
