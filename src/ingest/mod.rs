//! Remote data clients.
//!
//! Submodules:
//! - `source`: the listing search API (one page per run).
//! - `geocode`: reverse geocoding for address enrichment.

pub mod geocode;
pub mod source;
