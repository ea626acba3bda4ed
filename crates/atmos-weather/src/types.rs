use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keys;

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

/// Theme mode preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Auto,
    Light,
    Dark,
}

/// Concrete appearance after resolving a theme mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

impl ThemeMode {
    /// Resolve to a concrete appearance. `Auto` follows the current conditions:
    /// dark at night and under wet or stormy skies.
    pub fn resolve(&self, condition: WeatherCondition, is_day: bool) -> Appearance {
        match self {
            Self::Light => Appearance::Light,
            Self::Dark => Appearance::Dark,
            Self::Auto if !is_day || condition.prefers_dark() => Appearance::Dark,
            Self::Auto => Appearance::Light,
        }
    }
}

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

/// WMO code -> (condition, description).
/// See: https://open-meteo.com/en/docs#weathervariables
const WMO_CODES: &[(i32, WeatherCondition, &str)] = &[
    (0, WeatherCondition::Clear, "Clear sky"),
    (1, WeatherCondition::Clear, "Mainly clear"),
    (2, WeatherCondition::PartlyCloudy, "Partly cloudy"),
    (3, WeatherCondition::Cloudy, "Overcast"),
    (45, WeatherCondition::Fog, "Fog"),
    (48, WeatherCondition::Fog, "Depositing rime fog"),
    (51, WeatherCondition::Drizzle, "Light drizzle"),
    (53, WeatherCondition::Drizzle, "Moderate drizzle"),
    (55, WeatherCondition::Drizzle, "Dense drizzle"),
    (56, WeatherCondition::Drizzle, "Light freezing drizzle"),
    (57, WeatherCondition::Drizzle, "Dense freezing drizzle"),
    (61, WeatherCondition::Rain, "Slight rain"),
    (63, WeatherCondition::Rain, "Moderate rain"),
    (65, WeatherCondition::Rain, "Heavy rain"),
    (66, WeatherCondition::Rain, "Light freezing rain"),
    (67, WeatherCondition::Rain, "Heavy freezing rain"),
    (71, WeatherCondition::Snow, "Slight snow fall"),
    (73, WeatherCondition::Snow, "Moderate snow fall"),
    (75, WeatherCondition::Snow, "Heavy snow fall"),
    (77, WeatherCondition::Snow, "Snow grains"),
    (80, WeatherCondition::Rain, "Slight rain showers"),
    (81, WeatherCondition::Rain, "Moderate rain showers"),
    (82, WeatherCondition::Rain, "Violent rain showers"),
    (85, WeatherCondition::Snow, "Slight snow showers"),
    (86, WeatherCondition::Snow, "Heavy snow showers"),
    (95, WeatherCondition::Thunderstorm, "Thunderstorm"),
    (96, WeatherCondition::Thunderstorm, "Thunderstorm with slight hail"),
    (99, WeatherCondition::Thunderstorm, "Thunderstorm with heavy hail"),
];

fn wmo_entry(code: i32) -> Option<&'static (i32, WeatherCondition, &'static str)> {
    WMO_CODES.iter().find(|(c, _, _)| *c == code)
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    pub fn from_wmo_code(code: i32) -> Self {
        wmo_entry(code).map_or(Self::Unknown, |(_, condition, _)| *condition)
    }

    /// Get a human-readable label for the category
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }

    /// Icon name for the condition; night variants swap the sun for a moon.
    pub fn icon_name(&self, is_day: bool) -> &'static str {
        match (self, is_day) {
            (Self::Clear, true) => "sun",
            (Self::Clear, false) => "moon",
            (Self::PartlyCloudy, true) => "cloud_sun",
            (Self::PartlyCloudy, false) => "cloud_moon",
            (Self::Cloudy, _) => "cloud",
            (Self::Fog, _) => "cloud_fog",
            (Self::Drizzle, _) | (Self::Rain, _) => "cloud_rain",
            (Self::Snow, _) => "cloud_snow",
            (Self::Thunderstorm, _) => "cloud_lightning",
            (Self::Unknown, _) => "question",
        }
    }

    fn prefers_dark(&self) -> bool {
        matches!(
            self,
            Self::Drizzle | Self::Rain | Self::Thunderstorm | Self::Unknown
        )
    }
}

/// Detailed description for a WMO code, e.g. "Moderate rain".
pub fn describe_wmo_code(code: i32) -> &'static str {
    wmo_entry(code).map_or("Unknown", |(_, _, text)| *text)
}

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A named place. Identity is `id`, derived from the rounded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub country: String,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        country_code: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            id: keys::location_id(latitude, longitude),
            name: name.into(),
            country: country.into(),
            country_code: country_code.into(),
            latitude,
            longitude,
            timezone: timezone.into(),
            admin1: None,
            is_favorite: false,
        }
    }

    pub fn with_admin1(mut self, admin1: impl Into<String>) -> Self {
        self.admin1 = Some(admin1.into());
        self
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// "Name, Region, Country" with empty parts omitted
    pub fn display_name(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(admin1) = self.admin1.as_deref().filter(|a| !a.is_empty() && *a != self.name) {
            parts.push(admin1);
        }
        if !self.country.is_empty() {
            parts.push(&self.country);
        }
        parts.join(", ")
    }
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub wind_gusts: f64,
    pub visibility: f64,
    pub uv_index: f64,
    pub cloud_cover: f64,
    pub precipitation: f64,
    pub weather_code: i32,
    pub condition: WeatherCondition,
    pub condition_text: String,
    pub is_day: bool,
    pub time: NaiveDateTime,
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub precipitation_probability: f64,
    pub weather_code: i32,
    pub condition: WeatherCondition,
    pub condition_text: String,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub visibility: f64,
    pub uv_index: f64,
    pub is_day: bool,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub apparent_temperature_max: f64,
    pub apparent_temperature_min: f64,
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
    pub uv_index_max: f64,
    pub precipitation_sum: f64,
    pub precipitation_probability_max: f64,
    pub wind_speed_max: f64,
    pub wind_gusts_max: f64,
    pub wind_direction_dominant: f64,
    pub weather_code: i32,
    pub condition: WeatherCondition,
    pub condition_text: String,
}

/// One day of archived observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalWeather {
    pub date: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub temperature_mean: f64,
    pub precipitation: f64,
    pub wind_speed_max: f64,
    pub weather_code: i32,
    pub condition: WeatherCondition,
    pub condition_text: String,
}

/// Complete weather data bundle for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub location: Location,
    pub current: CurrentWeather,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
    pub timezone: String,
    pub timezone_abbreviation: String,
    pub last_updated: DateTime<Utc>,
}

/// Inclusive calendar date range for archive queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = DateRangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid date range: start {start} is after end {end}")]
pub struct DateRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    /// The seven days ending yesterday.
    pub fn past_week(today: NaiveDate) -> Self {
        Self::trailing_days(today, 7)
    }

    /// The thirty days ending yesterday.
    pub fn past_month(today: NaiveDate) -> Self {
        Self::trailing_days(today, 30)
    }

    fn trailing_days(today: NaiveDate, days: u64) -> Self {
        let end = today.pred_opt().unwrap_or(today);
        let start = end.checked_sub_days(Days::new(days - 1)).unwrap_or(end);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// `YYYY-MM-DD` rendering of the start date
    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DD` rendering of the end date
    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    /// Human label such as "Jan 3 - Jan 9, 2026"
    pub fn label(&self) -> String {
        format!(
            "{} - {}, {}",
            self.start.format("%b %-d"),
            self.end.format("%b %-d"),
            self.end.year()
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_wmo_code_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(1), WeatherCondition::Clear);
    }

    #[test]
    fn test_wmo_code_partly_cloudy_and_cloudy() {
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(3), WeatherCondition::Cloudy);
    }

    #[test]
    fn test_wmo_code_freezing_variants() {
        assert_eq!(WeatherCondition::from_wmo_code(56), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_wmo_code(66), WeatherCondition::Rain);
    }

    #[test]
    fn test_wmo_code_showers() {
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(86), WeatherCondition::Snow);
    }

    #[test]
    fn test_wmo_code_thunderstorm() {
        for code in [95, 96, 99] {
            assert_eq!(WeatherCondition::from_wmo_code(code), WeatherCondition::Thunderstorm);
        }
    }

    #[test]
    fn test_wmo_code_unknown() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Unknown);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Unknown);
        assert_eq!(describe_wmo_code(4), "Unknown");
    }

    #[test]
    fn test_wmo_description() {
        assert_eq!(describe_wmo_code(63), "Moderate rain");
        assert_eq!(describe_wmo_code(99), "Thunderstorm with heavy hail");
    }

    #[test]
    fn test_condition_serializes_kebab_case() {
        let json = serde_json::to_string(&WeatherCondition::PartlyCloudy).unwrap();
        assert_eq!(json, "\"partly-cloudy\"");
    }

    #[test]
    fn test_icon_name_night_variant() {
        assert_eq!(WeatherCondition::Clear.icon_name(true), "sun");
        assert_eq!(WeatherCondition::Clear.icon_name(false), "moon");
        assert_eq!(WeatherCondition::Rain.icon_name(false), "cloud_rain");
    }

    #[test]
    fn test_theme_resolution() {
        assert_eq!(ThemeMode::Light.resolve(WeatherCondition::Rain, false), Appearance::Light);
        assert_eq!(ThemeMode::Dark.resolve(WeatherCondition::Clear, true), Appearance::Dark);
        assert_eq!(ThemeMode::Auto.resolve(WeatherCondition::Clear, true), Appearance::Light);
        assert_eq!(ThemeMode::Auto.resolve(WeatherCondition::Clear, false), Appearance::Dark);
        assert_eq!(
            ThemeMode::Auto.resolve(WeatherCondition::Thunderstorm, true),
            Appearance::Dark
        );
    }

    #[test]
    fn test_location_id_is_rounded() {
        let loc = Location::new("New York", "United States", "US", 40.71427, -74.00597, "America/New_York");
        assert_eq!(loc.id, "40.71_-74.01");
    }

    #[test]
    fn test_display_name() {
        let loc = Location::new("Portland", "United States", "US", 45.52, -122.68, "America/Los_Angeles")
            .with_admin1("Oregon");
        assert_eq!(loc.display_name(), "Portland, Oregon, United States");
    }

    #[test]
    fn test_location_json_uses_camel_case() {
        let loc = Location::new("Oslo", "Norway", "NO", 59.91, 10.75, "Europe/Oslo");
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["countryCode"], "NO");
        assert_eq!(json["isFavorite"], false);
        assert!(json.get("admin1").is_none());
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        assert!(DateRange::new(date(2026, 3, 2), date(2026, 3, 1)).is_err());
        assert!(DateRange::new(date(2026, 3, 1), date(2026, 3, 1)).is_ok());
    }

    #[test]
    fn test_date_range_deserialize_checks_bounds() {
        let range: DateRange =
            serde_json::from_str(r#"{"start":"2026-03-01","end":"2026-03-07"}"#).unwrap();
        assert_eq!(range.len_days(), 7);

        let inverted =
            serde_json::from_str::<DateRange>(r#"{"start":"2026-03-07","end":"2026-03-01"}"#);
        assert!(inverted.unwrap_err().to_string().contains("Invalid date range"));
    }

    #[test]
    fn test_past_week_ends_yesterday() {
        let range = DateRange::past_week(date(2026, 3, 10));
        assert_eq!(range.end(), date(2026, 3, 9));
        assert_eq!(range.start(), date(2026, 3, 3));
        assert_eq!(range.len_days(), 7);
    }

    #[test]
    fn test_past_month_spans_thirty_days() {
        let range = DateRange::past_month(date(2026, 3, 1));
        assert_eq!(range.end(), date(2026, 2, 28));
        assert_eq!(range.len_days(), 30);
        assert_eq!(range.start_str(), "2026-01-30");
    }

    #[test]
    fn test_date_range_label() {
        let range = DateRange::new(date(2026, 1, 3), date(2026, 1, 9)).unwrap();
        assert_eq!(range.label(), "Jan 3 - Jan 9, 2026");
    }
}
