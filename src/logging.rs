//! Structured logging for the campground ingestion service.
//!
//! Messages go through the `log` facade, rendered by `pretty_env_logger`.
//! Each line is tagged with the stage that produced it and, where one
//! applies, the campground id, so a single listing can be traced from
//! fetch to persist with `grep`.

use log::{Level, LevelFilter};
use std::fmt;

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// The listing search API.
    Source,
    /// The reverse geocoding service.
    Geocode,
    Database,
    Pipeline,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Source => write!(f, "SOURCE"),
            DataSource::Geocode => write!(f, "GEOCODE"),
            DataSource::Database => write!(f, "DB"),
            DataSource::Pipeline => write!(f, "PIPELINE"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Initialize the global logger.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies. Calling this
/// twice (e.g. from tests) is harmless.
pub fn init_logger(default_level: LevelFilter) {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(default_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.try_init().ok();
}

/// Renders one tagged log line body.
pub fn format_message(source: DataSource, record_id: Option<&str>, message: &str) -> String {
    let id_part = record_id.map(|id| format!(" [{}]", id)).unwrap_or_default();
    format!("{}{}: {}", source, id_part, message)
}

fn emit(level: Level, source: DataSource, record_id: Option<&str>, message: &str) {
    log::log!(level, "{}", format_message(source, record_id, message));
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

pub fn info(source: DataSource, record_id: Option<&str>, message: &str) {
    emit(Level::Info, source, record_id, message);
}

pub fn warn(source: DataSource, record_id: Option<&str>, message: &str) {
    emit(Level::Warn, source, record_id, message);
}

pub fn error(source: DataSource, record_id: Option<&str>, message: &str) {
    emit(Level::Error, source, record_id, message);
}

pub fn debug(source: DataSource, record_id: Option<&str>, message: &str) {
    emit(Level::Debug, source, record_id, message);
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Picks the level for an end-of-run summary.
///
/// Nothing rejected is routine; some rejected is worth a warning; nothing
/// saved out of a non-empty fetch is an error.
pub fn summary_level(fetched: usize, persisted: usize, rejected: usize) -> Level {
    if fetched > 0 && persisted == 0 {
        Level::Error
    } else if rejected > 0 {
        Level::Warn
    } else {
        Level::Info
    }
}

/// Log a summary of one ingestion run.
pub fn log_run_summary(fetched: usize, persisted: usize, rejected: usize, geocoded: usize) {
    let message = format!(
        "Run complete: {} campgrounds saved/updated, {} fetched, {} rejected, {} addresses resolved",
        persisted, fetched, rejected, geocoded
    );
    emit(
        summary_level(fetched, persisted, rejected),
        DataSource::Pipeline,
        None,
        &message,
    );
}
