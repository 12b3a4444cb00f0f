pub mod config;
pub mod db;
pub mod error;
pub mod locale;
pub mod playlist;
pub mod publish;
pub mod retry;
pub mod security;
pub mod server;
pub mod services;
pub mod store;
pub mod trigger;

pub use error::{CatalogError, Result};
pub use server::{build_router, AppState};
