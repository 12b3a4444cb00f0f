use crate::error::{CatalogError, Result};
use crate::publish::{EntityKind, PublishDto};
use crate::store::CatalogStore;
use tracing::debug;

/// Assemble the publish DTO for an entity from storage.
///
/// An entity without images or schedule entries is valid; only a missing
/// root entity is an error.
pub async fn aggregate(store: &dyn CatalogStore, kind: EntityKind, id: &str) -> Result<PublishDto> {
    let entity = store
        .find_entity(kind, id)
        .await?
        .ok_or_else(|| CatalogError::not_found(kind, id))?;

    let (images, schedule) = tokio::try_join!(
        store.list_images(kind, id),
        store.list_schedule_entries(kind, id)
    )?;

    debug!(
        "Aggregated {} '{}': {} images, {} schedule entries",
        kind,
        id,
        images.len(),
        schedule.len()
    );

    Ok(PublishDto {
        id: entity.id,
        kind: entity.kind,
        title: entity.title,
        description: entity.description,
        duration_in_seconds: entity.duration_in_seconds,
        images,
        schedule,
    })
}
