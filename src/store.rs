use crate::error::{CatalogError, Result};
use crate::locale::LocalizedRow;
use crate::playlist::Playlist;
use crate::publish::{EntityKind, EntityRecord, ImageRef, ScheduleEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Read/update access to catalog entities and their children.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_entity(&self, kind: EntityKind, id: &str) -> Result<Option<EntityRecord>>;

    async fn list_images(&self, kind: EntityKind, id: &str) -> Result<Vec<ImageRef>>;

    /// Schedule entries structurally owned by the entity (a playlist's programs).
    async fn list_schedule_entries(&self, kind: EntityKind, id: &str)
        -> Result<Vec<ScheduleEntry>>;

    async fn list_localized_rows(&self, kind: EntityKind, id: &str) -> Result<Vec<LocalizedRow>>;

    /// Set the entity's duration, returning the updated record or `None` if
    /// the entity does not exist.
    async fn update_duration(
        &self,
        kind: EntityKind,
        id: &str,
        duration_in_seconds: f64,
    ) -> Result<Option<EntityRecord>>;
}

/// Playlist and program persistence.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn find_playlist(&self, id: &str) -> Result<Option<Playlist>>;

    async fn list_programs(&self, playlist_id: &str) -> Result<Vec<ScheduleEntry>>;

    /// Insert a playlist together with its programs as one unit.
    async fn insert_playlist(&self, playlist: &Playlist, programs: &[ScheduleEntry])
        -> Result<()>;

    async fn insert_program(&self, program: &ScheduleEntry) -> Result<()>;
}

type EntityKey = (EntityKind, String);

#[derive(Default)]
struct MemoryState {
    entities: HashMap<EntityKey, EntityRecord>,
    images: HashMap<EntityKey, Vec<ImageRef>>,
    rows: HashMap<EntityKey, Vec<LocalizedRow>>,
    playlists: HashMap<String, Playlist>,
    programs: Vec<ScheduleEntry>,
}

/// In-process catalog store.
#[derive(Default)]
pub struct MemoryCatalogStore {
    state: RwLock<MemoryState>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn upsert_entity(&self, record: EntityRecord) {
        let key = (record.kind, record.id.clone());
        self.write().entities.insert(key, record);
    }

    pub fn add_image(&self, kind: EntityKind, id: &str, image: ImageRef) {
        self.write()
            .images
            .entry((kind, id.to_string()))
            .or_default()
            .push(image);
    }

    /// Add or replace the entity's row for `row.locale`.
    pub fn upsert_localized_row(&self, kind: EntityKind, row: LocalizedRow) {
        let mut state = self.write();
        let rows = state.rows.entry((kind, row.entity_id.clone())).or_default();
        rows.retain(|existing| existing.locale != row.locale);
        rows.push(row);
    }

    fn playlist_record(playlist: &Playlist) -> EntityRecord {
        EntityRecord {
            id: playlist.id.clone(),
            kind: EntityKind::Playlist,
            title: playlist.title.clone(),
            description: None,
            duration_in_seconds: Some(playlist.calculated_duration_in_seconds),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn find_entity(&self, kind: EntityKind, id: &str) -> Result<Option<EntityRecord>> {
        Ok(self.read().entities.get(&(kind, id.to_string())).cloned())
    }

    async fn list_images(&self, kind: EntityKind, id: &str) -> Result<Vec<ImageRef>> {
        Ok(self
            .read()
            .images
            .get(&(kind, id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_schedule_entries(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Vec<ScheduleEntry>> {
        if kind != EntityKind::Playlist {
            return Ok(Vec::new());
        }
        self.list_programs(id).await
    }

    async fn list_localized_rows(&self, kind: EntityKind, id: &str) -> Result<Vec<LocalizedRow>> {
        Ok(self
            .read()
            .rows
            .get(&(kind, id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn update_duration(
        &self,
        kind: EntityKind,
        id: &str,
        duration_in_seconds: f64,
    ) -> Result<Option<EntityRecord>> {
        let mut state = self.write();
        Ok(state
            .entities
            .get_mut(&(kind, id.to_string()))
            .map(|record| {
                record.duration_in_seconds = Some(duration_in_seconds);
                record.clone()
            }))
    }
}

#[async_trait]
impl PlaylistStore for MemoryCatalogStore {
    async fn find_playlist(&self, id: &str) -> Result<Option<Playlist>> {
        Ok(self.read().playlists.get(id).cloned())
    }

    async fn list_programs(&self, playlist_id: &str) -> Result<Vec<ScheduleEntry>> {
        let mut programs: Vec<ScheduleEntry> = self
            .read()
            .programs
            .iter()
            .filter(|program| program.playlist_id == playlist_id)
            .cloned()
            .collect();
        programs.sort_by_key(|program| program.sort_index);
        Ok(programs)
    }

    async fn insert_playlist(
        &self,
        playlist: &Playlist,
        programs: &[ScheduleEntry],
    ) -> Result<()> {
        let mut state = self.write();
        if state.playlists.contains_key(&playlist.id) {
            return Err(CatalogError::Storage(format!(
                "playlist '{}' already exists",
                playlist.id
            )));
        }
        state.playlists.insert(playlist.id.clone(), playlist.clone());
        state.entities.insert(
            (EntityKind::Playlist, playlist.id.clone()),
            Self::playlist_record(playlist),
        );
        state.programs.extend(programs.iter().cloned());
        Ok(())
    }

    async fn insert_program(&self, program: &ScheduleEntry) -> Result<()> {
        let mut state = self.write();
        if !state.playlists.contains_key(&program.playlist_id) {
            return Err(CatalogError::not_found(
                EntityKind::Playlist,
                &program.playlist_id,
            ));
        }
        state.programs.push(program.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::PublicationState;
    use chrono::{TimeZone, Utc};

    fn episode(id: &str) -> EntityRecord {
        EntityRecord {
            id: id.to_string(),
            kind: EntityKind::Episode,
            title: "Pilot".to_string(),
            description: None,
            duration_in_seconds: None,
        }
    }

    fn playlist(id: &str) -> Playlist {
        Playlist {
            id: id.to_string(),
            channel_id: "ch-1".to_string(),
            title: "2024-05-01".to_string(),
            start_date_time: Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap(),
            calculated_duration_in_seconds: 3600.0,
            publication_state: PublicationState::NotPublished,
        }
    }

    fn program(id: &str, playlist_id: &str, sort_index: i32) -> ScheduleEntry {
        ScheduleEntry {
            id: id.to_string(),
            playlist_id: playlist_id.to_string(),
            title: id.to_string(),
            entity_id: "ep-1".to_string(),
            entity_type: EntityKind::Episode,
            sort_index,
            video_duration_in_seconds: None,
        }
    }

    #[tokio::test]
    async fn test_entity_round_trip_and_duration_update() {
        let store = MemoryCatalogStore::new();
        store.upsert_entity(episode("ep-1"));

        let updated = store
            .update_duration(EntityKind::Episode, "ep-1", 1500.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.duration_in_seconds, Some(1500.0));

        let missing = store
            .update_duration(EntityKind::Episode, "ep-404", 1500.0)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_entities_keyed_by_kind() {
        let store = MemoryCatalogStore::new();
        store.upsert_entity(episode("1"));
        assert!(store
            .find_entity(EntityKind::Movie, "1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_upsert_localized_row_replaces_same_locale() {
        let store = MemoryCatalogStore::new();
        store.upsert_localized_row(
            EntityKind::Episode,
            LocalizedRow::new("ep-1", "de-DE", false).with_field("title", "Alt"),
        );
        store.upsert_localized_row(
            EntityKind::Episode,
            LocalizedRow::new("ep-1", "de-DE", false).with_field("title", "Neu"),
        );

        let rows = store
            .list_localized_rows(EntityKind::Episode, "ep-1")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields["title"], "Neu");
    }

    #[tokio::test]
    async fn test_playlist_programs_are_schedule_entries() {
        let store = MemoryCatalogStore::new();
        store
            .insert_playlist(
                &playlist("pl-1"),
                &[program("b", "pl-1", 2), program("a", "pl-1", 1)],
            )
            .await
            .unwrap();

        let entries = store
            .list_schedule_entries(EntityKind::Playlist, "pl-1")
            .await
            .unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let record = store
            .find_entity(EntityKind::Playlist, "pl-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.duration_in_seconds, Some(3600.0));
    }

    #[tokio::test]
    async fn test_insert_program_requires_playlist() {
        let store = MemoryCatalogStore::new();
        let result = store.insert_program(&program("a", "pl-404", 0)).await;
        assert!(matches!(result, Err(CatalogError::EntityNotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_playlist_id_rejected() {
        let store = MemoryCatalogStore::new();
        store.insert_playlist(&playlist("pl-1"), &[]).await.unwrap();
        assert!(store.insert_playlist(&playlist("pl-1"), &[]).await.is_err());
    }
}
