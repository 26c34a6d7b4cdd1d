//! Campground listing ingestion.
//!
//! Fetches one page of campground listings from the search API, validates
//! each item, enriches the survivors with a reverse-geocoded address, and
//! upserts the batch into PostgreSQL keyed by listing id.

pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod schema;
pub mod transform;
