//! Cache-first fetch orchestration between the UI and the remote API.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{ExpiringCache, HISTORICAL_TTL};
use crate::error::ApiError;
use crate::keys::{historical_key, weather_key};
use crate::provider::WeatherApi;
use crate::types::{Coordinates, DateRange, HistoricalWeather, Location, WeatherData};

/// Queries shorter than this (after trimming) are not sent to the API.
pub const MIN_SEARCH_LEN: usize = 2;

/// Serves weather from the cache when fresh, otherwise from the API.
///
/// Results are cached only after a successful fetch; failures are returned
/// to the caller untouched and leave the cache as it was.
#[derive(Clone)]
pub struct WeatherService {
    api: Arc<dyn WeatherApi>,
    cache: ExpiringCache,
    historical_ttl: Duration,
}

impl WeatherService {
    pub fn new(api: Arc<dyn WeatherApi>, cache: ExpiringCache) -> Self {
        Self {
            api,
            cache,
            historical_ttl: HISTORICAL_TTL,
        }
    }

    pub fn with_historical_ttl(mut self, ttl: Duration) -> Self {
        self.historical_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    /// Current conditions and forecast for `location`.
    pub async fn get_weather(
        &self,
        location: &Location,
        force_refresh: bool,
    ) -> Result<WeatherData, ApiError> {
        let key = weather_key(location.latitude, location.longitude);

        if !force_refresh {
            if let Some(cached) = self.cache.get::<WeatherData>(&key) {
                tracing::debug!("Weather cache hit for {}", key);
                return Ok(cached);
            }
        }

        tracing::info!("Fetching weather for {}", location.display_name());
        let data = self.api.get_weather_data(location).await?;
        self.cache.set(&key, &data);
        Ok(data)
    }

    /// Daily archived observations for `range` at `location`.
    pub async fn get_historical(
        &self,
        location: &Location,
        range: &DateRange,
        force_refresh: bool,
    ) -> Result<Vec<HistoricalWeather>, ApiError> {
        let key = historical_key(location.latitude, location.longitude, range);

        if !force_refresh {
            if let Some(cached) = self.cache.get::<Vec<HistoricalWeather>>(&key) {
                tracing::debug!("Historical cache hit for {}", key);
                return Ok(cached);
            }
        }

        tracing::info!(
            "Fetching history for {} ({})",
            location.display_name(),
            range.label()
        );
        let data = self.api.get_historical_weather(location, range).await?;
        self.cache.set_with_ttl(&key, &data, self.historical_ttl);
        Ok(data)
    }

    /// Location search. Short queries return nothing without a request.
    pub async fn search_locations(&self, query: &str) -> Result<Vec<Location>, ApiError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        self.api.search_locations(query).await
    }

    pub async fn reverse_geocode(
        &self,
        coords: Coordinates,
    ) -> Result<Option<Location>, ApiError> {
        self.api.reverse_geocode(coords).await
    }
}
