//! Reverse geocoding: convert coordinates to a named location.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use reqwest::Client;
use serde::Deserialize;

use crate::types::{Coordinates, Location};

pub const FALLBACK_NAME: &str = "Current Location";
const FALLBACK_COUNTRY: &str = "Unknown";
const FALLBACK_COUNTRY_CODE: &str = "XX";
/// Let the forecast API pick the zone from the coordinates.
const AUTO_TIMEZONE: &str = "auto";

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

/// Generic location used when coordinates cannot be resolved.
pub fn fallback_location(coords: Coordinates) -> Location {
    Location::new(
        FALLBACK_NAME,
        FALLBACK_COUNTRY,
        FALLBACK_COUNTRY_CODE,
        coords.latitude,
        coords.longitude,
        AUTO_TIMEZONE,
    )
}

/// Reverse geocode coordinates against a Nominatim-compatible `base_url`.
/// Returns `None` on any failure; the caller falls back to a generic location.
pub async fn reverse_geocode(
    client: &Client,
    base_url: &str,
    coords: Coordinates,
) -> Option<Location> {
    let url = format!("{}/reverse", base_url);
    let query = [
        ("lat", coords.latitude.to_string()),
        ("lon", coords.longitude.to_string()),
        ("format", "json".to_string()),
        ("addressdetails", "1".to_string()),
        ("zoom", "10".to_string()),
    ];

    let response = match client.get(&url).query(&query).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("Reverse geocode request failed: {}", e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("Reverse geocode returned status {}", response.status());
        return None;
    }

    let body: NominatimResponse = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Reverse geocode parse error: {}", e);
            return None;
        }
    };

    let addr = body.address?;

    // Prefer city > town > village > municipality for the place name
    let name = addr
        .city
        .or(addr.town)
        .or(addr.village)
        .or(addr.municipality)
        .or(addr.county)
        .or_else(|| addr.state.clone())?;

    let mut location = Location::new(
        name,
        addr.country.unwrap_or_else(|| FALLBACK_COUNTRY.to_string()),
        addr.country_code
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| FALLBACK_COUNTRY_CODE.to_string()),
        coords.latitude,
        coords.longitude,
        AUTO_TIMEZONE,
    );
    location.admin1 = addr.state.filter(|s| !s.is_empty() && *s != location.name);

    tracing::info!("Reverse geocoded to: {}", location.display_name());
    Some(location)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn seattle() -> Coordinates {
        Coordinates {
            latitude: 47.6062,
            longitude: -122.3321,
        }
    }

    #[tokio::test]
    async fn test_reverse_geocode_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "display_name": "Seattle, King County, Washington, United States",
                "address": {
                    "city": "Seattle",
                    "county": "King County",
                    "state": "Washington",
                    "country": "United States",
                    "country_code": "us"
                }
            })))
            .mount(&server)
            .await;

        let location = reverse_geocode(&Client::new(), &server.uri(), seattle())
            .await
            .unwrap();

        assert_eq!(location.name, "Seattle");
        assert_eq!(location.country_code, "US");
        assert_eq!(location.admin1.as_deref(), Some("Washington"));
        assert_eq!(location.id, "47.61_-122.33");
    }

    #[tokio::test]
    async fn test_reverse_geocode_falls_through_to_village() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "address": { "village": "Hallstatt", "country": "Austria", "country_code": "at" }
            })))
            .mount(&server)
            .await;

        let location = reverse_geocode(&Client::new(), &server.uri(), seattle())
            .await
            .unwrap();
        assert_eq!(location.name, "Hallstatt");
        assert!(location.admin1.is_none());
    }

    #[tokio::test]
    async fn test_reverse_geocode_failure_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(reverse_geocode(&Client::new(), &server.uri(), seattle())
            .await
            .is_none());
    }

    #[test]
    fn test_fallback_location() {
        let location = fallback_location(seattle());
        assert_eq!(location.name, FALLBACK_NAME);
        assert_eq!(location.country_code, "XX");
        assert_eq!(location.latitude, 47.6062);
    }
}
