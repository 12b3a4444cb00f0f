use crate::error::{CatalogError, Result};
use crate::publish::{EntityKind, ScheduleEntry};
use crate::store::{CatalogStore, PlaylistStore};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicationState {
    NotPublished,
    Published,
    /// Published, with local changes not yet republished
    Changed,
}

impl PublicationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationState::NotPublished => "NOT_PUBLISHED",
            PublicationState::Published => "PUBLISHED",
            PublicationState::Changed => "CHANGED",
        }
    }
}

impl FromStr for PublicationState {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NOT_PUBLISHED" => Ok(PublicationState::NotPublished),
            "PUBLISHED" => Ok(PublicationState::Published),
            "CHANGED" => Ok(PublicationState::Changed),
            other => Err(CatalogError::Storage(format!(
                "unknown publication state '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub start_date_time: DateTime<Utc>,
    pub calculated_duration_in_seconds: f64,
    pub publication_state: PublicationState,
}

/// Input for a new program in a playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDraft {
    pub title: String,
    pub entity_id: String,
    pub entity_type: EntityKind,
    pub sort_index: i32,
    #[serde(default)]
    pub video_duration_in_seconds: Option<f64>,
}

/// Parse `YYYY-MM-DD` and `HH:MM[:SS]` into a UTC timestamp.
pub fn parse_start_date_time(start_date: &str, start_time: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(start_date.trim(), "%Y-%m-%d").map_err(|e| {
        CatalogError::InvalidConfiguration(format!("invalid start date '{}': {}", start_date, e))
    })?;
    let time = NaiveTime::parse_from_str(start_time.trim(), "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(start_time.trim(), "%H:%M"))
        .map_err(|e| {
            CatalogError::InvalidConfiguration(format!(
                "invalid start time '{}': {}",
                start_time, e
            ))
        })?;
    Ok(date.and_time(time).and_utc())
}

/// Copy a playlist and all of its programs to a new start date and time.
///
/// The copy is titled with the start date and starts out unpublished.
/// Programs keep their order and cached durations but get new ids.
pub async fn duplicate_playlist(
    store: &dyn PlaylistStore,
    playlist_id: &str,
    start_date: &str,
    start_time: &str,
) -> Result<Playlist> {
    let start_date_time = parse_start_date_time(start_date, start_time)?;

    let original = store
        .find_playlist(playlist_id)
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityKind::Playlist, playlist_id))?;

    let copy = Playlist {
        id: Uuid::new_v4().to_string(),
        channel_id: original.channel_id.clone(),
        title: start_date.trim().to_string(),
        start_date_time,
        calculated_duration_in_seconds: original.calculated_duration_in_seconds,
        publication_state: PublicationState::NotPublished,
    };

    let programs: Vec<ScheduleEntry> = store
        .list_programs(playlist_id)
        .await?
        .into_iter()
        .map(|program| ScheduleEntry {
            id: Uuid::new_v4().to_string(),
            playlist_id: copy.id.clone(),
            ..program
        })
        .collect();

    store.insert_playlist(&copy, &programs).await?;

    info!(
        "Duplicated playlist '{}' as '{}' ({} programs)",
        playlist_id,
        copy.id,
        programs.len()
    );
    Ok(copy)
}

/// Add a program to a playlist.
///
/// A draft without a duration takes the duration of the catalog entity it
/// plays, when that entity exists and has one.
pub async fn create_program(
    catalog: &dyn CatalogStore,
    playlists: &dyn PlaylistStore,
    playlist_id: &str,
    draft: ProgramDraft,
) -> Result<ScheduleEntry> {
    if playlists.find_playlist(playlist_id).await?.is_none() {
        return Err(CatalogError::not_found(EntityKind::Playlist, playlist_id));
    }

    let mut video_duration_in_seconds = draft.video_duration_in_seconds;
    if video_duration_in_seconds.is_none() {
        video_duration_in_seconds = catalog
            .find_entity(draft.entity_type, &draft.entity_id)
            .await?
            .and_then(|entity| entity.duration_in_seconds);
        if let Some(duration) = video_duration_in_seconds {
            debug!(
                "Prefilled program duration {}s from {} '{}'",
                duration, draft.entity_type, draft.entity_id
            );
        }
    }

    let program = ScheduleEntry {
        id: Uuid::new_v4().to_string(),
        playlist_id: playlist_id.to_string(),
        title: draft.title,
        entity_id: draft.entity_id,
        entity_type: draft.entity_type,
        sort_index: draft.sort_index,
        video_duration_in_seconds,
    };
    playlists.insert_program(&program).await?;
    Ok(program)
}
