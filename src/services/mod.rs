//! Clients for the collaborator services the pipeline calls out to.
//!
//! Each collaborator is a trait so the orchestrator and the duration trigger
//! can be exercised without a network; the `Http*` types are the production
//! implementations.

mod assets;
mod http;
mod localization;
mod managed;
mod schedule;

pub use assets::{AssetService, HttpAssetService, ImageResolution};
pub use http::{is_retryable_error, HttpStatusError};
pub use localization::{HttpLocalizationService, LocalizationResponse, LocalizationService};
pub use managed::{HttpManagedServices, ManagedServices, LOCALIZATION_SERVICE_ID};
pub use schedule::{HttpScheduleService, ScheduleEntryRef, ScheduleService};
