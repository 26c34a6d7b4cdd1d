//! Listing search API client.
//!
//! Fetches one page of campground search results for a bounding box. The
//! endpoint paginates, but only the configured page is ever requested;
//! following `links.next` would change what a run ingests.
//!
//! Query shape:
//!   GET {base_url}?filter[search][bbox]=W,S,E,N&page[size]=500&page[number]=1&sort=recommended

use serde_json::Value;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::logging::{self, DataSource};
use crate::model::FetchError;

// ============================================================================
// Listing source seam
// ============================================================================

/// Anything that can hand the pipeline a page of raw search result items.
pub trait ListingSource {
    fn fetch_listings(&self) -> Result<Vec<Value>, FetchError>;
}

// ============================================================================
// Query construction
// ============================================================================

/// Query parameters for one search page, in request order.
pub fn search_params(config: &SourceConfig) -> Vec<(&'static str, String)> {
    vec![
        ("filter[search][bbox]", config.bbox.to_query_value()),
        ("page[size]", config.page_size.to_string()),
        ("page[number]", config.page_number.to_string()),
        ("sort", config.sort.clone()),
    ]
}

// ============================================================================
// Response parsing
// ============================================================================

/// Extracts the `data` list from a search response body.
///
/// The items themselves are left as raw JSON; validating them is the
/// transformer's job, so one bad item never fails the whole page.
pub fn parse_search_response(body: &str) -> Result<Vec<Value>, FetchError> {
    let mut json: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    match json.get_mut("data").map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(FetchError::MissingData),
    }
}

// ============================================================================
// HTTP client
// ============================================================================

pub struct SourceClient {
    http: reqwest::blocking::Client,
    config: SourceConfig,
}

impl SourceClient {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }
}

impl ListingSource for SourceClient {
    fn fetch_listings(&self) -> Result<Vec<Value>, FetchError> {
        logging::info(
            DataSource::Source,
            None,
            &format!(
                "Fetching page {} ({} per page) for bbox {}",
                self.config.page_number,
                self.config.page_size,
                self.config.bbox.to_query_value()
            ),
        );

        let response = self
            .http
            .get(&self.config.base_url)
            .query(&search_params(&self.config))
            .header("Accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text()?;
        let items = parse_search_response(&body)?;
        logging::debug(
            DataSource::Source,
            None,
            &format!("Search returned {} items", items.len()),
        );
        Ok(items)
    }
}

// ============================================================================
// Tests
// ============================================================================
