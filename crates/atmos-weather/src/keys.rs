//! Cache key and location identity derivation.
//!
//! Coordinates are bucketed to two decimal places (~1.1 km), so repeated GPS
//! reads of the same spot share one cache slot. Requests to the remote API
//! still use full precision.

use crate::types::DateRange;

/// Round to two decimals and render. Negative zero is normalised so that
/// `-0.001` and `0.001` land in the same bucket.
fn bucket(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.2}", rounded)
}

/// Identity of a place, e.g. `40.71_-74.01`.
pub fn location_id(latitude: f64, longitude: f64) -> String {
    format!("{}_{}", bucket(latitude), bucket(longitude))
}

/// Cache key for live forecast data.
pub fn weather_key(latitude: f64, longitude: f64) -> String {
    format!("weather_{}_{}", bucket(latitude), bucket(longitude))
}

/// Cache key for an archive query; the literal dates keep distinct ranges apart.
pub fn historical_key(latitude: f64, longitude: f64, range: &DateRange) -> String {
    format!(
        "historical_{}_{}_{}_{}",
        bucket(latitude),
        bucket(longitude),
        range.start_str(),
        range.end_str()
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::NaiveDate;

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(
            NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_weather_key_format() {
        assert_eq!(weather_key(40.7128, -74.006), "weather_40.71_-74.01");
        assert_eq!(weather_key(51.5, 0.0), "weather_51.50_0.00");
    }

    #[test]
    fn test_weather_key_is_stable() {
        let first = weather_key(47.6062, -122.3321);
        for _ in 0..10 {
            assert_eq!(weather_key(47.6062, -122.3321), first);
        }
    }

    #[test]
    fn test_small_perturbations_share_a_bucket() {
        let base = weather_key(35.6812, 139.7671);
        assert_eq!(weather_key(35.6812 + 0.0012, 139.7671 - 0.0011), base);
        assert_eq!(weather_key(35.6795, 139.7682), base);
    }

    #[test]
    fn test_negative_zero_is_normalised() {
        assert_eq!(weather_key(-0.001, 0.001), weather_key(0.001, -0.001));
        assert_eq!(location_id(-0.001, 0.0), "0.00_0.00");
    }

    #[test]
    fn test_historical_key_includes_dates() {
        let key = historical_key(40.7128, -74.006, &range("2026-01-01", "2026-01-07"));
        assert_eq!(key, "historical_40.71_-74.01_2026-01-01_2026-01-07");
    }

    #[test]
    fn test_historical_key_differs_by_either_bound() {
        let a = historical_key(1.0, 2.0, &range("2026-01-01", "2026-01-07"));
        let b = historical_key(1.0, 2.0, &range("2026-01-02", "2026-01-07"));
        let c = historical_key(1.0, 2.0, &range("2026-01-01", "2026-01-08"));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_weather_and_historical_keys_never_collide() {
        let r = range("2026-01-01", "2026-01-01");
        assert!(!historical_key(1.0, 2.0, &r).starts_with("weather_"));
    }
}
