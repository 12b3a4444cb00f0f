//! Locale resolution for localized catalog reads.
//!
//! This module owns everything needed to answer "which localized row of text
//! should this request see?". All of it is synchronous and free of I/O; row
//! fetching is left to the storage collaborator.
//!
//! # Architecture
//!
//! - `directory`: Refreshable snapshot of configured locales (tag, default flag)
//! - `resolver`: Maps a requested locale header value onto a configured tag
//! - `projector`: Picks the localized row to expose for a resolved tag
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_publish::locale::{project, resolve, Locale, LocaleDirectory};
//!
//! let directory = LocaleDirectory::new(vec![
//!     Locale::new("en-US", true),
//!     Locale::new("de-DE", false),
//! ])?;
//!
//! let snapshot = directory.current_snapshot();
//! let resolved = resolve("fr-FR", &snapshot); // falls back to "en-US"
//! let fields = project("episode-1", &rows, resolved.as_str())?;
//! ```

mod directory;
mod projector;
mod resolver;

pub use directory::{Locale, LocaleDirectory, LocaleInput, LocaleSnapshot};
pub use projector::{project, LocalizedRow};
pub use resolver::{resolve, ResolvedLocale, LOCALE_HEADER};
