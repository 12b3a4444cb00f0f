use anyhow::{Context, Result};
use catalog_publish::config::Config;
use catalog_publish::db::PgCatalogStore;
use catalog_publish::locale::LocaleDirectory;
use catalog_publish::publish::PublishValidator;
use catalog_publish::services::{
    HttpAssetService, HttpLocalizationService, HttpManagedServices, HttpScheduleService,
};
use catalog_publish::store::{CatalogStore, MemoryCatalogStore, PlaylistStore};
use catalog_publish::trigger::DurationPropagator;
use catalog_publish::{build_router, AppState};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("catalog_publish=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "Starting catalog publish service ({}, localization enabled: {})",
        config.environment, config.is_localization_enabled
    );

    // Until the first sync only the configured default locale is known
    let directory = Arc::new(
        LocaleDirectory::with_default(&config.default_locale)
            .context("Invalid DEFAULT_LOCALE")?,
    );

    let (catalog, playlists): (Arc<dyn CatalogStore>, Arc<dyn PlaylistStore>) =
        match &config.database_url {
            Some(url) => {
                let store = Arc::new(
                    PgCatalogStore::connect(url)
                        .await
                        .context("Failed to connect to database")?,
                );
                info!("Using PostgreSQL catalog store");
                let catalog: Arc<dyn CatalogStore> = store.clone();
                let playlists: Arc<dyn PlaylistStore> = store;
                (catalog, playlists)
            }
            None => {
                if config.is_production() {
                    warn!("DATABASE_URL not set, catalog data will not survive restarts");
                }
                let store = Arc::new(MemoryCatalogStore::new());
                let catalog: Arc<dyn CatalogStore> = store.clone();
                let playlists: Arc<dyn PlaylistStore> = store;
                (catalog, playlists)
            }
        };

    let client = reqwest::Client::builder()
        .timeout(config.external_call_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let validator = PublishValidator::new(
        catalog.clone(),
        Arc::new(HttpAssetService::new(
            client.clone(),
            &config.image_service_base_url,
        )),
        Arc::new(HttpLocalizationService::new(
            client.clone(),
            &config.localization_service_base_url,
        )),
        Arc::new(HttpManagedServices::new(
            client.clone(),
            &config.managed_services_base_url,
        )),
        config.publish_settings(),
    );

    let propagator = DurationPropagator::new(Arc::new(HttpScheduleService::new(
        client,
        &config.schedule_service_base_url,
        config.schedule_service_token.clone(),
    )));

    let state = AppState {
        directory,
        catalog,
        playlists,
        validator: Arc::new(validator),
        propagator: Some(Arc::new(propagator)),
        admin_api_key: config.admin_api_key.clone(),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, build_router(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
