//! Dashboard state machine.
//!
//! `DashboardState` is a plain value updated only through `reduce`. The
//! `Dashboard` controller owns one, performs the side effects (fetching,
//! persisting) and dispatches the resulting actions.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{ApiError, GeolocationError};
use crate::lists::{SavedLocations, FAVORITES_CAP, RECENTS_CAP};
use crate::location::{locate, ConfiguredPosition, PositionSource, DEFAULT_LOCATE_TIMEOUT};
use crate::preferences::{PreferenceStore, PreferencesPatch};
use crate::service::WeatherService;
use crate::store::Store;
use crate::types::{
    Appearance, DateRange, HistoricalWeather, Location, TemperatureUnit, ThemeMode,
    WeatherCondition, WeatherData,
};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub current_location: Option<Location>,
    pub weather: Option<WeatherData>,
    pub historical: Option<Vec<HistoricalWeather>>,
    pub is_loading: bool,
    pub is_loading_historical: bool,
    pub error: Option<ApiError>,
    pub temperature_unit: TemperatureUnit,
    pub theme: ThemeMode,
    pub favorites: Vec<Location>,
    pub recents: Vec<Location>,
    pub current_condition: WeatherCondition,
    pub is_day: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            current_location: None,
            weather: None,
            historical: None,
            is_loading: false,
            is_loading_historical: false,
            error: None,
            temperature_unit: TemperatureUnit::default(),
            theme: ThemeMode::default(),
            favorites: Vec::new(),
            recents: Vec::new(),
            current_condition: WeatherCondition::Clear,
            is_day: true,
        }
    }
}

impl DashboardState {
    /// Light or dark, following the theme preference and current sky.
    pub fn appearance(&self) -> Appearance {
        self.theme.resolve(self.current_condition, self.is_day)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetLoading(bool),
    SetLoadingHistorical(bool),
    SetError(Option<ApiError>),
    SetLocation(Location),
    SetWeatherData(WeatherData),
    SetHistoricalData(Option<Vec<HistoricalWeather>>),
    SetTemperatureUnit(TemperatureUnit),
    SetTheme(ThemeMode),
    SetFavorites(Vec<Location>),
    SetRecents(Vec<Location>),
}

pub fn reduce(mut state: DashboardState, action: Action) -> DashboardState {
    match action {
        Action::SetLoading(loading) => {
            state.is_loading = loading;
            if loading {
                state.error = None;
            }
        }
        Action::SetLoadingHistorical(loading) => state.is_loading_historical = loading,
        Action::SetError(error) => {
            state.error = error;
            state.is_loading = false;
        }
        Action::SetLocation(location) => state.current_location = Some(location),
        Action::SetWeatherData(data) => {
            state.current_condition = data.current.condition;
            state.is_day = data.current.is_day;
            state.weather = Some(data);
            state.is_loading = false;
            state.error = None;
        }
        Action::SetHistoricalData(data) => {
            state.historical = data;
            state.is_loading_historical = false;
        }
        Action::SetTemperatureUnit(unit) => state.temperature_unit = unit,
        Action::SetTheme(theme) => state.theme = theme,
        Action::SetFavorites(favorites) => state.favorites = favorites,
        Action::SetRecents(recents) => state.recents = recents,
    }
    state
}

/// Drives the dashboard: runs fetches and persistence, then reduces.
pub struct Dashboard {
    service: WeatherService,
    preferences: PreferenceStore,
    favorites: SavedLocations,
    recents: SavedLocations,
    position: Arc<dyn PositionSource>,
    locate_timeout: Duration,
    state: DashboardState,
}

impl Dashboard {
    /// Build a dashboard, restoring preferences and saved locations.
    pub fn new(service: WeatherService, store: Arc<dyn Store>) -> Self {
        let mut dashboard = Self {
            service,
            preferences: PreferenceStore::new(store.clone()),
            favorites: SavedLocations::favorites(store.clone(), FAVORITES_CAP),
            recents: SavedLocations::recents(store, RECENTS_CAP),
            position: Arc::new(ConfiguredPosition::default()),
            locate_timeout: DEFAULT_LOCATE_TIMEOUT,
            state: DashboardState::default(),
        };
        dashboard.restore();
        dashboard
    }

    pub fn with_position_source(mut self, position: Arc<dyn PositionSource>) -> Self {
        self.position = position;
        self
    }

    pub fn with_locate_timeout(mut self, timeout: Duration) -> Self {
        self.locate_timeout = timeout;
        self
    }

    pub fn with_saved_lists(mut self, favorites: SavedLocations, recents: SavedLocations) -> Self {
        self.favorites = favorites;
        self.recents = recents;
        self.restore();
        self
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        self.state = reduce(std::mem::take(&mut self.state), action);
    }

    fn restore(&mut self) {
        let prefs = self.preferences.load();
        self.dispatch(Action::SetTemperatureUnit(prefs.temperature_unit));
        self.dispatch(Action::SetTheme(prefs.theme));
        self.dispatch(Action::SetFavorites(self.favorites.load()));
        self.dispatch(Action::SetRecents(self.recents.load()));
    }

    /// Make `location` current and load its weather. Success records it
    /// as a recent location; failure is kept in `state().error`.
    pub async fn fetch_weather_for_location(&mut self, location: &Location, force_refresh: bool) {
        self.dispatch(Action::SetLoading(true));
        self.dispatch(Action::SetLocation(location.clone()));

        match self.service.get_weather(location, force_refresh).await {
            Ok(data) => {
                self.dispatch(Action::SetWeatherData(data));
                let recents = self.recents.add(location);
                self.dispatch(Action::SetRecents(recents));
            }
            Err(e) => {
                tracing::warn!("Weather fetch failed for {}: {}", location.id, e);
                self.dispatch(Action::SetError(Some(e)));
            }
        }
    }

    /// Load history for the current location. No-op without one.
    pub async fn fetch_historical(&mut self, range: &DateRange, force_refresh: bool) {
        let Some(location) = self.state.current_location.clone() else {
            return;
        };

        self.dispatch(Action::SetLoadingHistorical(true));
        match self
            .service
            .get_historical(&location, range, force_refresh)
            .await
        {
            Ok(data) => self.dispatch(Action::SetHistoricalData(Some(data))),
            Err(e) => {
                tracing::warn!("History fetch failed for {}: {}", location.id, e);
                self.dispatch(Action::SetError(Some(e)));
                self.dispatch(Action::SetLoadingHistorical(false));
            }
        }
    }

    /// Find the device position, name it, and load its weather.
    pub async fn detect_user_location(&mut self) {
        self.dispatch(Action::SetLoading(true));

        let coords = match locate(self.position.as_ref(), self.locate_timeout).await {
            Ok(coords) => coords,
            Err(e) => {
                tracing::warn!("Location detection failed: {}", e);
                self.dispatch(Action::SetError(Some(ApiError::Geolocation(e))));
                return;
            }
        };

        match self.service.reverse_geocode(coords).await {
            Ok(Some(location)) => self.fetch_weather_for_location(&location, false).await,
            Ok(None) => self.dispatch(Action::SetLoading(false)),
            Err(e) => {
                tracing::warn!("Reverse geocoding failed: {}", e);
                self.dispatch(Action::SetError(Some(ApiError::Geolocation(
                    GeolocationError::Unavailable,
                ))));
            }
        }
    }

    /// Re-fetch the current location, bypassing the cache.
    pub async fn refresh_weather(&mut self) {
        if let Some(location) = self.state.current_location.clone() {
            self.fetch_weather_for_location(&location, true).await;
        }
    }

    pub fn set_temperature_unit(&mut self, unit: TemperatureUnit) {
        self.dispatch(Action::SetTemperatureUnit(unit));
        self.preferences.save(PreferencesPatch::unit(unit));
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.dispatch(Action::SetTheme(theme));
        self.preferences.save(PreferencesPatch::theme(theme));
    }

    pub fn add_favorite(&mut self, location: &Location) {
        let favorites = self.favorites.add(location);
        self.dispatch(Action::SetFavorites(favorites));
    }

    pub fn remove_favorite(&mut self, id: &str) {
        let favorites = self.favorites.remove(id);
        self.dispatch(Action::SetFavorites(favorites));
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    pub fn clear_error(&mut self) {
        self.dispatch(Action::SetError(None));
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Location>, ApiError> {
        self.service.search_locations(query).await
    }
}
