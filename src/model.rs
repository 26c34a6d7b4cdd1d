//! Core data types for the campground ingestion service.
//!
//! This module defines the shared domain model imported by all other modules:
//! the enriched campground record and the error families raised by each
//! pipeline stage. It contains no I/O.

use chrono::{DateTime, Utc};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Coordinate bounds
// ---------------------------------------------------------------------------

/// Valid WGS84 latitude range, inclusive.
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid WGS84 longitude range, inclusive.
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// A latitude/longitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `true` when both components fall inside their WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        LATITUDE_RANGE.contains(&self.latitude) && LONGITUDE_RANGE.contains(&self.longitude)
    }
}

/// A validated campground listing, ready for enrichment and persistence.
///
/// Field order mirrors the column order of the `campgrounds` table. Every
/// field is fixed once the listing is fetched except `address`, which the
/// enrichment stage fills in (or leaves `None` when the lookup fails).
#[derive(Debug, Clone, PartialEq)]
pub struct CampgroundRecord {
    pub id: String,
    pub kind: String, // source "type" tag, e.g. "location-search-results"
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub region_name: String,
    pub administrative_area: Option<String>,
    pub nearest_city_name: Option<String>,
    pub accommodation_type_names: Vec<String>,
    pub bookable: bool,
    pub camper_types: Vec<String>,
    pub operator: Option<String>,
    pub photo_url: Option<String>,
    pub photo_urls: Vec<String>,
    pub photos_count: i32,
    pub rating: Option<f64>,
    pub reviews_count: i32,
    pub slug: Option<String>,
    pub price_low: Option<f64>,
    pub price_high: Option<f64>,
    pub availability_updated_at: Option<DateTime<Utc>>,
    pub detail_url: String,
    pub address: Option<String>,
}

impl CampgroundRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching the listing search page.
///
/// The orchestrator recovers from every variant by treating the run as empty.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx HTTP response from the search API.
    #[error("search API returned status {0}")]
    Status(u16),
    /// The response body was not valid JSON.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The response parsed but carried no `data` list.
    #[error("response has no `data` list")]
    MissingData,
}

/// A single problem found while validating one field of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub problem: String,
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// A listing failed schema checks. Every offending field is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid listing {}: {}", .id.as_deref().unwrap_or("<no id>"), join_issues(.issues))]
pub struct ValidationError {
    /// The listing id, when one could be read.
    pub id: Option<String>,
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Names of the offending fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.field.as_str()).collect()
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reverse geocoding failed. Never fatal: the record keeps a `None` address.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// The batch upsert did not commit. Nothing from the batch was written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database connection failed: {0}")]
    Connect(#[source] postgres::Error),
    #[error("database query failed: {0}")]
    Query(#[source] postgres::Error),
    /// The batch needs more bind parameters than one statement may carry.
    #[error("batch of {rows} rows needs {params} bind parameters (limit {limit})")]
    TooManyParameters {
        rows: usize,
        params: usize,
        limit: usize,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
