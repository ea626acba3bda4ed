//! Display conversions driven by the temperature-unit preference.
//!
//! Fahrenheit users also get imperial wind, precipitation and visibility.
//! Inputs are always metric as delivered by the API.

use crate::types::TemperatureUnit;

const KMH_TO_MPH: f64 = 0.621371;
const MM_TO_IN: f64 = 0.0393701;
const METRES_PER_MILE: f64 = 1609.34;
const FEET_PER_METRE: f64 = 3.28084;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Nearest integer with halves rounded up, never signed zero.
fn round_half_up(value: f64) -> f64 {
    let rounded = (value + 0.5).floor();
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn convert_temperature(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
    }
}

/// Rounded temperature, e.g. "72°F", or "72°" without the unit letter.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit, show_unit: bool) -> String {
    let rounded = round_half_up(convert_temperature(celsius, unit));
    if show_unit {
        format!("{}°{}", rounded, unit.symbol())
    } else {
        format!("{}°", rounded)
    }
}

pub fn format_speed(kmh: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{} km/h", round_half_up(kmh)),
        TemperatureUnit::Fahrenheit => format!("{} mph", round_half_up(kmh * KMH_TO_MPH)),
    }
}

pub fn format_precipitation(mm: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{:.1} mm", mm),
        TemperatureUnit::Fahrenheit => format!("{:.2} in", mm * MM_TO_IN),
    }
}

pub fn format_visibility(metres: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius if metres >= 1000.0 => format!("{:.1} km", metres / 1000.0),
        TemperatureUnit::Celsius => format!("{} m", round_half_up(metres)),
        TemperatureUnit::Fahrenheit => {
            let miles = metres / METRES_PER_MILE;
            if miles >= 1.0 {
                format!("{:.1} mi", miles)
            } else {
                format!("{} ft", round_half_up(metres * FEET_PER_METRE))
            }
        }
    }
}

pub fn format_pressure(hpa: f64) -> String {
    format!("{} hPa", round_half_up(hpa))
}

pub fn format_percentage(value: f64) -> String {
    format!("{}%", round_half_up(value))
}

/// 16-point compass label for a bearing in degrees.
pub fn wind_direction(degrees: f64) -> &'static str {
    let normalized = degrees.rem_euclid(360.0);
    let index = (normalized / 22.5).round() as usize % COMPASS_POINTS.len();
    COMPASS_POINTS[index]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    use TemperatureUnit::{Celsius, Fahrenheit};

    #[test]
    fn test_convert_temperature() {
        assert_eq!(convert_temperature(0.0, Fahrenheit), 32.0);
        assert_eq!(convert_temperature(100.0, Fahrenheit), 212.0);
        assert_eq!(convert_temperature(-40.0, Fahrenheit), -40.0);
        assert_eq!(convert_temperature(21.5, Celsius), 21.5);
    }

    #[test]
    fn test_format_temperature() {
        assert_eq!(format_temperature(22.4, Celsius, true), "22°C");
        assert_eq!(format_temperature(22.4, Fahrenheit, true), "72°F");
        assert_eq!(format_temperature(-3.6, Celsius, false), "-4°");
    }

    #[test]
    fn test_sub_zero_rounding() {
        assert_eq!(format_temperature(-0.3, Celsius, true), "0°C");
        assert_eq!(format_temperature(-2.5, Celsius, true), "-2°C");
        assert_eq!(format_temperature(2.5, Celsius, true), "3°C");
        assert_eq!(format_temperature(-17.9, Fahrenheit, true), "0°F");
        assert_eq!(format_speed(-0.2, Celsius), "0 km/h");
        assert_eq!(format_percentage(-0.4), "0%");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(20.0, Celsius), "20 km/h");
        assert_eq!(format_speed(20.0, Fahrenheit), "12 mph");
    }

    #[test]
    fn test_format_precipitation() {
        assert_eq!(format_precipitation(2.54, Celsius), "2.5 mm");
        assert_eq!(format_precipitation(25.4, Fahrenheit), "1.00 in");
    }

    #[test]
    fn test_format_visibility() {
        assert_eq!(format_visibility(24_000.0, Celsius), "24.0 km");
        assert_eq!(format_visibility(800.0, Celsius), "800 m");
        assert_eq!(format_visibility(16_093.4, Fahrenheit), "10.0 mi");
        assert_eq!(format_visibility(300.0, Fahrenheit), "984 ft");
    }

    #[test]
    fn test_misc_formats() {
        assert_eq!(format_pressure(1013.25), "1013 hPa");
        assert_eq!(format_percentage(64.6), "65%");
    }

    #[test]
    fn test_wind_direction() {
        assert_eq!(wind_direction(0.0), "N");
        assert_eq!(wind_direction(45.0), "NE");
        assert_eq!(wind_direction(250.0), "WSW");
        assert_eq!(wind_direction(359.0), "N");
        assert_eq!(wind_direction(-90.0), "W");
    }
}
