use crate::error::{CatalogError, Result};
use crate::publish::EntityKind;
use crate::services::ScheduleService;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// One schedule entry (or the lookup itself, when `entry_id` is `None`)
/// that could not be refreshed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagationFailure {
    pub entry_id: Option<String>,
    pub error: String,
}

/// Outcome of one propagation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagationReport {
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub new_duration: f64,
    pub updated: Vec<String>,
    pub failures: Vec<PropagationFailure>,
}

impl PropagationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of refreshed entries, or `PartialPropagationFailure` if any
    /// step failed.
    pub fn into_result(self) -> Result<usize> {
        if self.is_complete() {
            return Ok(self.updated.len());
        }
        let failed = self.failures.len();
        Err(CatalogError::PartialPropagationFailure {
            failed,
            total: self.updated.len() + failed,
        })
    }
}

/// Refreshes the cached duration on every schedule entry that plays an entity.
///
/// Each entry is updated independently, so one failed update never blocks
/// its siblings.
pub struct DurationPropagator {
    schedule: Arc<dyn ScheduleService>,
}

impl DurationPropagator {
    pub fn new(schedule: Arc<dyn ScheduleService>) -> Self {
        Self { schedule }
    }

    /// Refresh the cached duration of every schedule entry referencing the
    /// entity. Never fails; failures are collected in the report.
    pub async fn on_duration_changed(
        &self,
        entity_type: EntityKind,
        entity_id: &str,
        new_duration: f64,
    ) -> PropagationReport {
        let mut report = PropagationReport {
            entity_type,
            entity_id: entity_id.to_string(),
            new_duration,
            updated: Vec::new(),
            failures: Vec::new(),
        };

        let entries = match self.schedule.find_entries(entity_type, entity_id).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    "Failed to look up schedule entries for {} '{}': {}",
                    entity_type, entity_id, e
                );
                report.failures.push(PropagationFailure {
                    entry_id: None,
                    error: e.to_string(),
                });
                return report;
            }
        };

        let updates = entries.iter().map(|entry| async move {
            let result = self
                .schedule
                .update_entry_duration(&entry.id, new_duration)
                .await;
            (entry.id.clone(), result)
        });

        for (entry_id, result) in join_all(updates).await {
            match result {
                Ok(()) => report.updated.push(entry_id),
                Err(e) => {
                    warn!("Failed to update duration of schedule entry '{}': {}", entry_id, e);
                    report.failures.push(PropagationFailure {
                        entry_id: Some(entry_id),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Propagated duration {}s of {} '{}' to {}/{} schedule entries",
            new_duration,
            entity_type,
            entity_id,
            report.updated.len(),
            entries.len()
        );
        report
    }

    /// Run propagation in the background so the triggering mutation can
    /// return immediately.
    pub fn spawn(
        self: &Arc<Self>,
        entity_type: EntityKind,
        entity_id: &str,
        new_duration: f64,
    ) -> JoinHandle<PropagationReport> {
        let propagator = Arc::clone(self);
        let entity_id = entity_id.to_string();
        tokio::spawn(async move {
            let report = propagator
                .on_duration_changed(entity_type, &entity_id, new_duration)
                .await;
            if !report.is_complete() {
                error!(
                    "Duration propagation for {} '{}' incomplete: {} failures",
                    entity_type,
                    entity_id,
                    report.failures.len()
                );
            }
            report
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ScheduleEntryRef;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSchedule {
        entries: Vec<ScheduleEntryRef>,
        failing: Vec<String>,
        lookup_fails: bool,
        durations: Mutex<HashMap<String, f64>>,
    }

    impl FakeSchedule {
        fn with_entries(ids: &[&str]) -> Self {
            Self {
                entries: ids
                    .iter()
                    .map(|id| ScheduleEntryRef {
                        id: id.to_string(),
                        video_duration_in_seconds: Some(10.0),
                    })
                    .collect(),
                ..Self::default()
            }
        }

        fn duration_of(&self, id: &str) -> Option<f64> {
            self.durations.lock().unwrap().get(id).copied()
        }
    }

    #[async_trait]
    impl ScheduleService for FakeSchedule {
        async fn find_entries(
            &self,
            _entity_type: EntityKind,
            _entity_id: &str,
        ) -> Result<Vec<ScheduleEntryRef>> {
            if self.lookup_fails {
                return Err(CatalogError::unavailable("schedule service", "down"));
            }
            Ok(self.entries.clone())
        }

        async fn update_entry_duration(&self, entry_id: &str, duration: f64) -> Result<()> {
            if self.failing.iter().any(|id| id == entry_id) {
                return Err(CatalogError::unavailable("schedule service", "HTTP 500"));
            }
            self.durations
                .lock()
                .unwrap()
                .insert(entry_id.to_string(), duration);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_updates_every_referencing_entry() {
        let schedule = Arc::new(FakeSchedule::with_entries(&["p1", "p2", "p3"]));
        let propagator = DurationPropagator::new(schedule.clone());

        let report = propagator
            .on_duration_changed(EntityKind::Interstitial, "int-1", 42.0)
            .await;

        assert!(report.is_complete());
        assert_eq!(report.updated.len(), 3);
        assert_eq!(schedule.duration_of("p2"), Some(42.0));
        assert_eq!(report.into_result().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_siblings() {
        let schedule = Arc::new(FakeSchedule {
            failing: vec!["p2".to_string()],
            ..FakeSchedule::with_entries(&["p1", "p2", "p3"])
        });
        let propagator = DurationPropagator::new(schedule.clone());

        let report = propagator
            .on_duration_changed(EntityKind::Interstitial, "int-1", 42.0)
            .await;

        assert_eq!(report.updated, vec!["p1".to_string(), "p3".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].entry_id.as_deref(), Some("p2"));
        assert_eq!(schedule.duration_of("p3"), Some(42.0));
        assert!(schedule.duration_of("p2").is_none());

        match report.into_result() {
            Err(CatalogError::PartialPropagationFailure { failed, total }) => {
                assert_eq!(failed, 1);
                assert_eq!(total, 3);
            }
            other => panic!("Expected PartialPropagationFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_is_reported() {
        let propagator = DurationPropagator::new(Arc::new(FakeSchedule {
            lookup_fails: true,
            ..FakeSchedule::default()
        }));

        let report = propagator
            .on_duration_changed(EntityKind::Movie, "mv-1", 5400.0)
            .await;

        assert!(report.updated.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].entry_id.is_none());
    }

    #[tokio::test]
    async fn test_no_entries_is_complete() {
        let propagator = DurationPropagator::new(Arc::new(FakeSchedule::default()));

        let report = propagator
            .on_duration_changed(EntityKind::Movie, "mv-1", 5400.0)
            .await;

        assert_eq!(report.into_result().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spawn_runs_in_background() {
        let schedule = Arc::new(FakeSchedule::with_entries(&["p1"]));
        let propagator = Arc::new(DurationPropagator::new(schedule.clone()));

        let handle = propagator.spawn(EntityKind::Interstitial, "int-1", 12.5);
        let report = handle.await.unwrap();

        assert!(report.is_complete());
        assert_eq!(schedule.duration_of("p1"), Some(12.5));
    }
}
