//! Publish pipeline: aggregation, concurrent validation and content hashing.
//!
//! A publish attempt assembles a [`PublishDto`] from storage, validates its
//! images and localizations against the collaborator services, merges the
//! results into a [`PublishPayload`] and digests that payload so a consumer
//! can tell whether anything actually changed since the last publish.

mod aggregator;
mod dto;
mod hasher;
mod orchestrator;
mod payload;
mod validation;

pub use aggregator::aggregate;
pub use dto::{EntityKind, EntityRecord, ImageRef, PublishDto, ScheduleEntry};
pub use hasher::{canonical_json, hash, sha256_hex};
pub use orchestrator::{PublishSettings, PublishValidationResult, PublishValidator};
pub use payload::{
    create_publish_payload, default_localization, Localization, PublishPayload,
    PublishedScheduleEntry, ResolvedImage,
};
pub use validation::{
    calculate_validation_status, Severity, ValidationContext, ValidationMessage, ValidationStatus,
};
