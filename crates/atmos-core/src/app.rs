use std::sync::Arc;

use atmos_weather::{
    ConfiguredPosition, Dashboard, ExpiringCache, FileStore, MemoryStore, OpenMeteoClient,
    SavedLocations, SqliteStore, Store, WeatherService,
};

use crate::config::{StorageBackend, StorageConfig};
use crate::{AppError, Config};

/// Main application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    store: Arc<dyn Store>,
    cache: ExpiringCache,
    dashboard: Dashboard,
}

impl App {
    /// Create a new application instance from the user's config file
    pub fn new() -> Result<Self, AppError> {
        let config = Config::load()?;
        Self::with_config(config)
    }

    /// Wire the store, cache, API client and dashboard described by `config`
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config.validated()?;

        let store = open_store(&config.storage)?;
        let api = OpenMeteoClient::new(config.api.endpoints(), config.api.timeout())?;
        let cache = ExpiringCache::new(store.clone())
            .with_default_ttl(config.cache.weather_ttl())
            .with_max_entries(config.cache.max_entries);
        let service = WeatherService::new(Arc::new(api), cache.clone())
            .with_historical_ttl(config.cache.historical_ttl());

        let position = ConfiguredPosition::new(config.location.coordinates());
        let dashboard = Dashboard::new(service, store.clone())
            .with_position_source(Arc::new(position))
            .with_locate_timeout(config.location.timeout())
            .with_saved_lists(
                SavedLocations::favorites(store.clone(), config.lists.favorites_cap),
                SavedLocations::recents(store.clone(), config.lists.recents_cap),
            );

        Ok(Self {
            config: Arc::new(config),
            store,
            cache,
            dashboard,
        })
    }

    /// Drop stale cache records left over from previous sessions
    pub fn initialize(&mut self) -> Result<(), AppError> {
        let purged = self.cache.purge_expired();
        let state = self.dashboard.state();
        tracing::info!(
            "Application initialized: {} favorites, {} recents, {} cached entries ({} purged)",
            state.favorites.len(),
            state.recents.len(),
            self.cache.len(),
            purged
        );
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<(), AppError> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }
}

/// Open the configured persistence backend
pub fn open_store(storage: &StorageConfig) -> Result<Arc<dyn Store>, AppError> {
    let store: Arc<dyn Store> = match (storage.backend, storage.resolved_path()) {
        (StorageBackend::File, Some(path)) => {
            tracing::info!("Using file store at {}", path.display());
            Arc::new(FileStore::new(path))
        }
        (StorageBackend::Sqlite, Some(path)) => {
            tracing::info!("Using SQLite store at {}", path.display());
            Arc::new(SqliteStore::new(path)?)
        }
        _ => {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
