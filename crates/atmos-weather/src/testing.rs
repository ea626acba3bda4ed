//! Scripted `WeatherApi` and fixtures for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;

use crate::error::ApiError;
use crate::geocode::fallback_location;
use crate::provider::WeatherApi;
use crate::types::{
    Coordinates, CurrentWeather, DateRange, HistoricalWeather, Location, WeatherCondition,
    WeatherData,
};

pub(crate) struct FakeApi {
    weather: Mutex<Result<WeatherData, ApiError>>,
    history: Mutex<Result<Vec<HistoricalWeather>, ApiError>>,
    places: Mutex<Vec<Location>>,
    reverse: Mutex<Option<Location>>,
    weather_calls: AtomicUsize,
    history_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self {
            weather: Mutex::new(Err(ApiError::Unknown("no weather scripted".into()))),
            history: Mutex::new(Err(ApiError::Unknown("no history scripted".into()))),
            places: Mutex::new(Vec::new()),
            reverse: Mutex::new(None),
            weather_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_weather(&self, result: Result<WeatherData, ApiError>) {
        *self.weather.lock() = result;
    }

    pub(crate) fn set_history(&self, result: Result<Vec<HistoricalWeather>, ApiError>) {
        *self.history.lock() = result;
    }

    pub(crate) fn set_places(&self, places: Vec<Location>) {
        *self.places.lock() = places;
    }

    pub(crate) fn set_reverse(&self, location: Option<Location>) {
        *self.reverse.lock() = location;
    }

    pub(crate) fn weather_calls(&self) -> usize {
        self.weather_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherApi for FakeApi {
    async fn search_locations(&self, _query: &str) -> Result<Vec<Location>, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.places.lock().clone())
    }

    async fn get_weather_data(&self, location: &Location) -> Result<WeatherData, ApiError> {
        self.weather_calls.fetch_add(1, Ordering::SeqCst);
        self.weather.lock().clone().map(|mut data| {
            data.location = location.clone();
            data
        })
    }

    async fn get_historical_weather(
        &self,
        _location: &Location,
        _range: &DateRange,
    ) -> Result<Vec<HistoricalWeather>, ApiError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history.lock().clone()
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<Location>, ApiError> {
        let scripted = self.reverse.lock().clone();
        Ok(Some(scripted.unwrap_or_else(|| fallback_location(coords))))
    }
}

pub(crate) fn sample_weather(location: &Location) -> WeatherData {
    let time = NaiveDate::from_ymd_opt(2026, 3, 15)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap();
    WeatherData {
        location: location.clone(),
        current: CurrentWeather {
            temperature: 18.4,
            feels_like: 17.9,
            humidity: 64.0,
            pressure: 1016.0,
            wind_speed: 9.0,
            wind_direction: 135.0,
            wind_gusts: 20.0,
            visibility: 24_000.0,
            uv_index: 0.0,
            cloud_cover: 40.0,
            precipitation: 0.0,
            weather_code: 2,
            condition: WeatherCondition::PartlyCloudy,
            condition_text: "Partly cloudy".to_string(),
            is_day: false,
            time,
        },
        hourly: Vec::new(),
        daily: Vec::new(),
        timezone: location.timezone.clone(),
        timezone_abbreviation: "GMT".to_string(),
        last_updated: Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
    }
}

pub(crate) fn sample_history() -> Vec<HistoricalWeather> {
    vec![HistoricalWeather {
        date: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
        temperature_max: 14.0,
        temperature_min: 6.5,
        temperature_mean: 10.1,
        precipitation: 1.2,
        wind_speed_max: 22.0,
        weather_code: 61,
        condition: WeatherCondition::Rain,
        condition_text: "Slight rain".to_string(),
    }]
}
