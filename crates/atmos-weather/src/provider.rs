//! Remote weather and geocoding collaborator.
//!
//! `WeatherApi` is the seam the fetch orchestrator depends on;
//! `OpenMeteoClient` is the production implementation over Open-Meteo
//! (forecast, archive, geocoding) and Nominatim (reverse geocoding).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::geocode;
use crate::types::{
    describe_wmo_code, Coordinates, CurrentWeather, DailyForecast, DateRange, HistoricalWeather,
    HourlyForecast, Location, WeatherCondition, WeatherData,
};

pub const FORECAST_API_BASE: &str = "https://api.open-meteo.com/v1";
pub const ARCHIVE_API_BASE: &str = "https://archive-api.open-meteo.com/v1";
pub const GEOCODING_API_BASE: &str = "https://geocoding-api.open-meteo.com/v1";
pub const REVERSE_GEOCODING_API_BASE: &str = "https://nominatim.openstreetmap.org";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("atmos/", env!("CARGO_PKG_VERSION"));

const SEARCH_RESULT_COUNT: u32 = 10;
const FORECAST_DAYS: u32 = 14;
const FORECAST_HOURS: u32 = 48;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,is_day,\
precipitation,weather_code,cloud_cover,pressure_msl,surface_pressure,wind_speed_10m,\
wind_direction_10m,wind_gusts_10m";
const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation_probability,precipitation,weather_code,visibility,wind_speed_10m,\
wind_direction_10m,uv_index,is_day";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
apparent_temperature_max,apparent_temperature_min,sunrise,sunset,uv_index_max,\
precipitation_sum,precipitation_probability_max,wind_speed_10m_max,wind_gusts_10m_max,\
wind_direction_10m_dominant";
const ARCHIVE_DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
temperature_2m_mean,precipitation_sum,wind_speed_10m_max";

/// Visibility reported when the API omits it (metres).
const DEFAULT_VISIBILITY: f64 = 10_000.0;

/// Typed view of the remote weather/geocoding service.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Find places matching a free-text query.
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, ApiError>;

    /// Current conditions plus hourly and daily forecasts.
    async fn get_weather_data(&self, location: &Location) -> Result<WeatherData, ApiError>;

    /// Daily archived observations for an inclusive date range.
    async fn get_historical_weather(
        &self,
        location: &Location,
        range: &DateRange,
    ) -> Result<Vec<HistoricalWeather>, ApiError>;

    /// Resolve coordinates to a named place.
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<Location>, ApiError>;
}

/// Base URLs for each remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub forecast: String,
    pub archive: String,
    pub geocoding: String,
    pub reverse_geocoding: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            forecast: FORECAST_API_BASE.to_string(),
            archive: ARCHIVE_API_BASE.to_string(),
            geocoding: GEOCODING_API_BASE.to_string(),
            reverse_geocoding: REVERSE_GEOCODING_API_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at one base URL (mock servers).
    pub fn single(base: &str) -> Self {
        Self {
            forecast: base.to_string(),
            archive: base.to_string(),
            geocoding: base.to_string(),
            reverse_geocoding: base.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    endpoints: Endpoints,
}

impl OpenMeteoClient {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.client.get(url).query(query).send().await?;
        handle_response(response).await
    }
}

pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| ApiError::Unknown(format!("JSON parse error: {}", e)))
    } else {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        tracing::warn!("Weather API returned status {}", status);
        Err(ApiError::from_status(status.as_u16(), retry_after))
    }
}

#[async_trait]
impl WeatherApi for OpenMeteoClient {
    #[instrument(skip(self), level = "info")]
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, ApiError> {
        let url = format!("{}/search", self.endpoints.geocoding);
        let params = [
            ("name", query.to_string()),
            ("count", SEARCH_RESULT_COUNT.to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];

        let body: GeocodingResponse = self.get_json(&url, &params).await?;
        Ok(body
            .results
            .unwrap_or_default()
            .into_iter()
            .map(GeocodingResult::into_location)
            .collect())
    }

    #[instrument(skip(self, location), fields(location = %location.id), level = "info")]
    async fn get_weather_data(&self, location: &Location) -> Result<WeatherData, ApiError> {
        let url = format!("{}/forecast", self.endpoints.forecast);
        let params = [
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", FORECAST_DAYS.to_string()),
            ("forecast_hours", FORECAST_HOURS.to_string()),
        ];

        let body: ForecastResponse = self.get_json(&url, &params).await?;
        body.into_weather_data(location.clone())
    }

    #[instrument(skip(self, location), fields(location = %location.id), level = "info")]
    async fn get_historical_weather(
        &self,
        location: &Location,
        range: &DateRange,
    ) -> Result<Vec<HistoricalWeather>, ApiError> {
        let url = format!("{}/archive", self.endpoints.archive);
        let params = [
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("start_date", range.start_str()),
            ("end_date", range.end_str()),
            ("daily", ARCHIVE_DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ];

        let body: ArchiveResponse = self.get_json(&url, &params).await?;
        body.daily.into_history()
    }

    #[instrument(skip(self), level = "info")]
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<Location>, ApiError> {
        let resolved =
            geocode::reverse_geocode(&self.client, &self.endpoints.reverse_geocoding, coords)
                .await;
        Ok(Some(resolved.unwrap_or_else(|| geocode::fallback_location(coords))))
    }
}

// ---- Raw Open-Meteo payloads ----

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: String,
    #[serde(default)]
    country_code: String,
    #[serde(default)]
    timezone: String,
    admin1: Option<String>,
}

impl GeocodingResult {
    fn into_location(self) -> Location {
        let mut location = Location::new(
            self.name,
            self.country,
            self.country_code,
            self.latitude,
            self.longitude,
            self.timezone,
        );
        location.admin1 = self.admin1;
        location
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    timezone: String,
    #[serde(default)]
    timezone_abbreviation: String,
    current: RawCurrent,
    hourly: RawHourly,
    daily: RawDaily,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    time: String,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    is_day: u8,
    precipitation: f64,
    weather_code: i32,
    cloud_cover: f64,
    pressure_msl: f64,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
    wind_gusts_10m: f64,
    visibility: Option<f64>,
    uv_index: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    apparent_temperature: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
    visibility: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
    uv_index: Vec<Option<f64>>,
    is_day: Vec<Option<u8>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDaily {
    time: Vec<String>,
    weather_code: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    apparent_temperature_max: Vec<Option<f64>>,
    apparent_temperature_min: Vec<Option<f64>>,
    sunrise: Vec<String>,
    sunset: Vec<String>,
    uv_index_max: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    precipitation_probability_max: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
    wind_gusts_10m_max: Vec<Option<f64>>,
    wind_direction_10m_dominant: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: RawArchiveDaily,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArchiveDaily {
    time: Vec<String>,
    weather_code: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    temperature_2m_mean: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
}

/// Value at `index`, or `default` when the series is short or holds null.
fn at<T: Copy>(series: &[Option<T>], index: usize, default: T) -> T {
    series.get(index).copied().flatten().unwrap_or(default)
}

/// Open-Meteo local times come without seconds ("2026-01-30T14:00").
fn parse_local_time(raw: &str) -> Result<NaiveDateTime, ApiError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| ApiError::Unknown(format!("Invalid time {:?}: {}", raw, e)))
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ApiError::Unknown(format!("Invalid date {:?}: {}", raw, e)))
}

impl ForecastResponse {
    fn into_weather_data(self, location: Location) -> Result<WeatherData, ApiError> {
        let c = self.current;
        let current = CurrentWeather {
            temperature: c.temperature_2m,
            feels_like: c.apparent_temperature,
            humidity: c.relative_humidity_2m,
            pressure: c.pressure_msl,
            wind_speed: c.wind_speed_10m,
            wind_direction: c.wind_direction_10m,
            wind_gusts: c.wind_gusts_10m,
            visibility: c.visibility.unwrap_or(DEFAULT_VISIBILITY),
            uv_index: c.uv_index.unwrap_or(0.0),
            cloud_cover: c.cloud_cover,
            precipitation: c.precipitation,
            weather_code: c.weather_code,
            condition: WeatherCondition::from_wmo_code(c.weather_code),
            condition_text: describe_wmo_code(c.weather_code).to_string(),
            is_day: c.is_day == 1,
            time: parse_local_time(&c.time)?,
        };

        Ok(WeatherData {
            location,
            current,
            hourly: self.hourly.into_forecasts()?,
            daily: self.daily.into_forecasts()?,
            timezone: self.timezone,
            timezone_abbreviation: self.timezone_abbreviation,
            last_updated: Utc::now(),
        })
    }
}

impl RawHourly {
    fn into_forecasts(self) -> Result<Vec<HourlyForecast>, ApiError> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, time)| {
                let code = at(&self.weather_code, i, -1);
                Ok(HourlyForecast {
                    time: parse_local_time(time)?,
                    temperature: at(&self.temperature_2m, i, 0.0),
                    feels_like: at(&self.apparent_temperature, i, 0.0),
                    humidity: at(&self.relative_humidity_2m, i, 0.0),
                    precipitation: at(&self.precipitation, i, 0.0),
                    precipitation_probability: at(&self.precipitation_probability, i, 0.0),
                    weather_code: code,
                    condition: WeatherCondition::from_wmo_code(code),
                    condition_text: describe_wmo_code(code).to_string(),
                    wind_speed: at(&self.wind_speed_10m, i, 0.0),
                    wind_direction: at(&self.wind_direction_10m, i, 0.0),
                    visibility: at(&self.visibility, i, DEFAULT_VISIBILITY),
                    uv_index: at(&self.uv_index, i, 0.0),
                    is_day: at(&self.is_day, i, 1) == 1,
                })
            })
            .collect()
    }
}

impl RawDaily {
    fn into_forecasts(self) -> Result<Vec<DailyForecast>, ApiError> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let code = at(&self.weather_code, i, -1);
                let date = parse_date(date)?;
                let midnight = date.and_time(chrono::NaiveTime::MIN);
                let sunrise = match self.sunrise.get(i) {
                    Some(raw) => parse_local_time(raw)?,
                    None => midnight,
                };
                let sunset = match self.sunset.get(i) {
                    Some(raw) => parse_local_time(raw)?,
                    None => midnight,
                };
                Ok(DailyForecast {
                    date,
                    temperature_max: at(&self.temperature_2m_max, i, 0.0),
                    temperature_min: at(&self.temperature_2m_min, i, 0.0),
                    apparent_temperature_max: at(&self.apparent_temperature_max, i, 0.0),
                    apparent_temperature_min: at(&self.apparent_temperature_min, i, 0.0),
                    sunrise,
                    sunset,
                    uv_index_max: at(&self.uv_index_max, i, 0.0),
                    precipitation_sum: at(&self.precipitation_sum, i, 0.0),
                    precipitation_probability_max: at(&self.precipitation_probability_max, i, 0.0),
                    wind_speed_max: at(&self.wind_speed_10m_max, i, 0.0),
                    wind_gusts_max: at(&self.wind_gusts_10m_max, i, 0.0),
                    wind_direction_dominant: at(&self.wind_direction_10m_dominant, i, 0.0),
                    weather_code: code,
                    condition: WeatherCondition::from_wmo_code(code),
                    condition_text: describe_wmo_code(code).to_string(),
                })
            })
            .collect()
    }
}

impl RawArchiveDaily {
    fn into_history(self) -> Result<Vec<HistoricalWeather>, ApiError> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let code = at(&self.weather_code, i, -1);
                Ok(HistoricalWeather {
                    date: parse_date(date)?,
                    temperature_max: at(&self.temperature_2m_max, i, 0.0),
                    temperature_min: at(&self.temperature_2m_min, i, 0.0),
                    temperature_mean: at(&self.temperature_2m_mean, i, 0.0),
                    precipitation: at(&self.precipitation_sum, i, 0.0),
                    wind_speed_max: at(&self.wind_speed_10m_max, i, 0.0),
                    weather_code: code,
                    condition: WeatherCondition::from_wmo_code(code),
                    condition_text: describe_wmo_code(code).to_string(),
                })
            })
            .collect()
    }
}
