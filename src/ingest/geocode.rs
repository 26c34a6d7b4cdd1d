//! Reverse geocoding client (Nominatim / OpenStreetMap).
//!
//! Resolves a latitude/longitude pair to a human-readable `display_name`.
//! Lookups are best-effort: [`lookup_address`] turns every failure into a
//! logged warning and a `None` address.
//!
//! The public Nominatim instance requires an identifying `User-Agent` and
//! allows at most one request per second.
//!
//! See <https://nominatim.org/release-docs/develop/api/Reverse/>

use serde::Deserialize;
use std::time::Duration;

use crate::config::GeocodeConfig;
use crate::logging::{self, DataSource};
use crate::model::{Coordinates, GeocodeError};

/// Anything that can turn coordinates into an address.
///
/// `Ok(None)` means the service answered but had no address for the point.
pub trait ReverseGeocoder {
    fn reverse(&self, coords: Coordinates) -> Result<Option<String>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Reverse geocoding query parameters, in request order.
pub fn reverse_params(coords: Coordinates, zoom: u8) -> Vec<(&'static str, String)> {
    vec![
        ("lat", coords.latitude.to_string()),
        ("lon", coords.longitude.to_string()),
        ("format", "json".to_string()),
        ("zoom", zoom.to_string()),
        ("addressdetails", "1".to_string()),
    ]
}

/// Parses a reverse geocoding response body.
///
/// Nominatim answers points in the ocean with `{"error": "Unable to geocode"}`
/// and a 200 status; that is reported as `Ok(None)`.
pub fn parse_reverse_response(body: &str) -> Result<Option<String>, GeocodeError> {
    let parsed: ReverseResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

    if let Some(err) = parsed.error {
        logging::debug(DataSource::Geocode, None, &format!("No address: {}", err));
        return Ok(None);
    }

    Ok(parsed.display_name.filter(|name| !name.trim().is_empty()))
}

pub struct NominatimClient {
    http: reqwest::blocking::Client,
    base_url: String,
    zoom: u8,
}

impl NominatimClient {
    pub fn new(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            zoom: config.zoom,
        })
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse(&self, coords: Coordinates) -> Result<Option<String>, GeocodeError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&reverse_params(coords, self.zoom))
            .send()?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        parse_reverse_response(&response.text()?)
    }
}

/// Looks up an address for one record, swallowing every failure.
///
/// Coordinates outside WGS84 bounds are never sent to the geocoder.
pub fn lookup_address(
    geocoder: &dyn ReverseGeocoder,
    record_id: &str,
    coords: Coordinates,
) -> Option<String> {
    if !coords.is_valid() {
        logging::warn(
            DataSource::Geocode,
            Some(record_id),
            &format!(
                "Skipping lookup for invalid coordinates ({}, {})",
                coords.latitude, coords.longitude
            ),
        );
        return None;
    }

    match geocoder.reverse(coords) {
        Ok(address) => address,
        Err(e) => {
            logging::warn(
                DataSource::Geocode,
                Some(record_id),
                &format!(
                    "Address lookup failed ({}, {}): {}",
                    coords.latitude, coords.longitude, e
                ),
            );
            None
        }
    }
}
