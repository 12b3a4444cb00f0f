use crate::error::{CatalogError, Result};
use crate::locale::LocalizedRow;
use crate::playlist::{Playlist, PublicationState};
use crate::publish::{EntityKind, EntityRecord, ImageRef, ScheduleEntry};
use crate::store::{CatalogStore, PlaylistStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS catalog_entities (
        kind TEXT NOT NULL,
        id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        duration_in_seconds DOUBLE PRECISION,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (kind, id)
    )",
    "CREATE TABLE IF NOT EXISTS entity_images (
        entity_kind TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        image_id TEXT NOT NULL,
        image_type TEXT NOT NULL,
        PRIMARY KEY (entity_kind, entity_id, image_id, image_type)
    )",
    "CREATE TABLE IF NOT EXISTS entity_localizations (
        entity_kind TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        locale TEXT NOT NULL,
        is_default_locale BOOLEAN NOT NULL DEFAULT FALSE,
        title TEXT,
        description TEXT,
        synopsis TEXT,
        PRIMARY KEY (entity_kind, entity_id, locale)
    )",
    "CREATE TABLE IF NOT EXISTS playlists (
        id TEXT PRIMARY KEY,
        channel_id TEXT NOT NULL,
        title TEXT NOT NULL,
        start_date_time TIMESTAMPTZ NOT NULL,
        calculated_duration_in_seconds DOUBLE PRECISION NOT NULL DEFAULT 0,
        publication_state TEXT NOT NULL DEFAULT 'NOT_PUBLISHED'
    )",
    "CREATE TABLE IF NOT EXISTS programs (
        id TEXT PRIMARY KEY,
        playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        entity_id TEXT NOT NULL,
        entity_type TEXT NOT NULL,
        sort_index INTEGER NOT NULL,
        video_duration_in_seconds DOUBLE PRECISION
    )",
    "CREATE INDEX IF NOT EXISTS idx_programs_playlist ON programs (playlist_id, sort_index)",
];

type EntityRow = (String, String, String, Option<String>, Option<f64>);
type LocalizationRow = (String, bool, Option<String>, Option<String>, Option<String>);
type PlaylistRow = (String, String, String, DateTime<Utc>, f64, String);
type ProgramRow = (String, String, String, String, String, i32, Option<f64>);

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }
}

fn entity_from_row(row: EntityRow) -> Result<EntityRecord> {
    let (kind, id, title, description, duration_in_seconds) = row;
    Ok(EntityRecord {
        id,
        kind: kind.parse()?,
        title,
        description,
        duration_in_seconds,
    })
}

fn program_from_row(row: ProgramRow) -> Result<ScheduleEntry> {
    let (id, playlist_id, title, entity_id, entity_type, sort_index, video_duration_in_seconds) =
        row;
    Ok(ScheduleEntry {
        id,
        playlist_id,
        title,
        entity_id,
        entity_type: entity_type.parse()?,
        sort_index,
        video_duration_in_seconds,
    })
}

fn localized_row_from_row(entity_id: &str, row: LocalizationRow) -> LocalizedRow {
    let (locale, is_default_locale, title, description, synopsis) = row;
    let mut localized = LocalizedRow::new(entity_id, &locale, is_default_locale);
    for (name, value) in [
        ("title", title),
        ("description", description),
        ("synopsis", synopsis),
    ] {
        if let Some(value) = value {
            localized = localized.with_field(name, &value);
        }
    }
    localized
}

const PROGRAM_COLUMNS: &str =
    "id, playlist_id, title, entity_id, entity_type, sort_index, video_duration_in_seconds";

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_entity(&self, kind: EntityKind, id: &str) -> Result<Option<EntityRecord>> {
        let row: Option<EntityRow> = sqlx::query_as(
            "SELECT kind, id, title, description, duration_in_seconds
             FROM catalog_entities WHERE kind = $1 AND id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(entity_from_row).transpose()
    }

    async fn list_images(&self, kind: EntityKind, id: &str) -> Result<Vec<ImageRef>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT image_id, image_type FROM entity_images
             WHERE entity_kind = $1 AND entity_id = $2
             ORDER BY image_type, image_id",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(image_id, image_type)| ImageRef {
                image_id,
                image_type,
            })
            .collect())
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
        let rows: Vec<LocalizationRow> = sqlx::query_as(
            "SELECT locale, is_default_locale, title, description, synopsis
             FROM entity_localizations
             WHERE entity_kind = $1 AND entity_id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| localized_row_from_row(id, row))
            .collect())
    }

    async fn update_duration(
        &self,
        kind: EntityKind,
        id: &str,
        duration_in_seconds: f64,
    ) -> Result<Option<EntityRecord>> {
        let row: Option<EntityRow> = sqlx::query_as(
            "UPDATE catalog_entities
             SET duration_in_seconds = $3, updated_at = NOW()
             WHERE kind = $1 AND id = $2
             RETURNING kind, id, title, description, duration_in_seconds",
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(duration_in_seconds)
        .fetch_optional(&self.pool)
        .await?;

        row.map(entity_from_row).transpose()
    }
}

#[async_trait]
impl PlaylistStore for PgCatalogStore {
    async fn find_playlist(&self, id: &str) -> Result<Option<Playlist>> {
        let row: Option<PlaylistRow> = sqlx::query_as(
            "SELECT id, channel_id, title, start_date_time, calculated_duration_in_seconds,
                    publication_state
             FROM playlists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, channel_id, title, start_date_time, duration, state)| {
            Ok(Playlist {
                id,
                channel_id,
                title,
                start_date_time,
                calculated_duration_in_seconds: duration,
                publication_state: state.parse::<PublicationState>()?,
            })
        })
        .transpose()
    }

    async fn list_programs(&self, playlist_id: &str) -> Result<Vec<ScheduleEntry>> {
        let rows: Vec<ProgramRow> = sqlx::query_as(&format!(
            "SELECT {} FROM programs WHERE playlist_id = $1 ORDER BY sort_index, id",
            PROGRAM_COLUMNS
        ))
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(program_from_row).collect()
    }

    async fn insert_playlist(&self, playlist: &Playlist, programs: &[ScheduleEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO playlists
                (id, channel_id, title, start_date_time, calculated_duration_in_seconds,
                 publication_state)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&playlist.id)
        .bind(&playlist.channel_id)
        .bind(&playlist.title)
        .bind(playlist.start_date_time)
        .bind(playlist.calculated_duration_in_seconds)
        .bind(playlist.publication_state.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO catalog_entities (kind, id, title, duration_in_seconds)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(EntityKind::Playlist.as_str())
        .bind(&playlist.id)
        .bind(&playlist.title)
        .bind(playlist.calculated_duration_in_seconds)
        .execute(&mut *tx)
        .await?;

        for program in programs {
            insert_program_row(&mut tx, program).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_program(&self, program: &ScheduleEntry) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM playlists WHERE id = $1")
            .bind(&program.playlist_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CatalogError::not_found(
                EntityKind::Playlist,
                &program.playlist_id,
            ));
        }
        insert_program_row(&mut tx, program).await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn insert_program_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    program: &ScheduleEntry,
) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO programs ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        PROGRAM_COLUMNS
    ))
    .bind(&program.id)
    .bind(&program.playlist_id)
    .bind(&program.title)
    .bind(&program.entity_id)
    .bind(program.entity_type.as_str())
    .bind(program.sort_index)
    .bind(program.video_duration_in_seconds)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
