//! Weather dashboard core for Atmos
//!
//! Provides Open-Meteo weather data behind an expiring cache, persisted
//! favorites/recents and preferences, and the dashboard state machine.

pub mod cache;
pub mod clock;
pub mod error;
pub mod geocode;
pub mod keys;
pub mod lists;
pub mod location;
pub mod preferences;
pub mod provider;
pub mod service;
pub mod state;
pub mod store;
pub mod types;
pub mod units;

#[cfg(test)]
mod testing;

pub use cache::{CacheEntry, ExpiringCache, HISTORICAL_TTL, WEATHER_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ApiError, ErrorCode, GeolocationError, StoreError};
pub use lists::SavedLocations;
pub use location::{ConfiguredPosition, PositionSource};
pub use preferences::{PreferenceStore, Preferences, PreferencesPatch};
pub use provider::{Endpoints, OpenMeteoClient, WeatherApi};
pub use service::WeatherService;
pub use state::{Action, Dashboard, DashboardState};
pub use store::{FileStore, MemoryStore, SqliteStore, Store};
pub use types::*;
