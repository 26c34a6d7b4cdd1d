//! Ingestion run orchestration.
//!
//! One run walks three stages in order, with no retries and no parallelism:
//!
//!   Fetching → Enriching (validate + geocode) → Persisting
//!
//! and ends `Completed` (the batch was committed) or `Skipped` (nothing
//! survived validation, the store was never called). Component failures
//! degrade the output instead of stopping the run: a failed fetch is an
//! empty page, an invalid item is dropped, a failed lookup leaves the
//! address empty. Only a persistence failure is returned to the caller.

use std::fmt;

use crate::ingest::geocode::{ReverseGeocoder, lookup_address};
use crate::ingest::source::ListingSource;
use crate::logging::{self, DataSource};
use crate::model::{CampgroundRecord, PersistenceError};
use crate::persist::RecordStore;
use crate::transform::transform;

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Enriching,
    Persisting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetching => write!(f, "fetching"),
            Stage::Enriching => write!(f, "transforming + enriching"),
            Stage::Persisting => write!(f, "persisting"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The batch was handed to the store and committed.
    Completed,
    /// No item survived validation; the store was not called.
    Skipped,
}

/// Counts describing one finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    /// Items on the fetched page (0 when the fetch failed).
    pub fetched: usize,
    pub rejected: usize,
    /// Records that came back from the geocoder with an address.
    pub geocoded: usize,
    /// Rows the store reported as inserted or updated.
    pub persisted: usize,
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Fills in `address` for each record, one lookup at a time, in order.
///
/// Returns how many records received an address.
pub fn enrich(records: &mut [CampgroundRecord], geocoder: &dyn ReverseGeocoder) -> usize {
    let mut resolved = 0;
    for record in records.iter_mut() {
        record.address = lookup_address(geocoder, &record.id, record.coordinates());
        if record.address.is_some() {
            resolved += 1;
        }
    }
    resolved
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline<'a> {
    source: &'a dyn ListingSource,
    geocoder: &'a dyn ReverseGeocoder,
    store: &'a mut dyn RecordStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn ListingSource,
        geocoder: &'a dyn ReverseGeocoder,
        store: &'a mut dyn RecordStore,
    ) -> Self {
        Self {
            source,
            geocoder,
            store,
        }
    }

    fn enter(stage: Stage) {
        logging::info(DataSource::Pipeline, None, &format!("Stage: {}", stage));
    }

    /// Executes one run.
    ///
    /// # Errors
    ///
    /// Returns the [`PersistenceError`] when the batch upsert did not commit.
    /// Nothing from the batch is written in that case.
    pub fn run(&mut self) -> Result<RunReport, PersistenceError> {
        Self::enter(Stage::Fetching);
        let items = match self.source.fetch_listings() {
            Ok(items) => items,
            Err(e) => {
                logging::error(
                    DataSource::Source,
                    None,
                    &format!("Fetch failed, treating run as empty: {}", e),
                );
                Vec::new()
            }
        };
        let fetched = items.len();

        Self::enter(Stage::Enriching);
        let outcome = transform(&items);
        let rejected = outcome.rejected.len();
        let mut records = outcome.records;

        if records.is_empty() {
            logging::warn(
                DataSource::Pipeline,
                None,
                &format!("No valid campgrounds found ({} fetched, {} rejected)", fetched, rejected),
            );
            return Ok(RunReport {
                status: RunStatus::Skipped,
                fetched,
                rejected,
                geocoded: 0,
                persisted: 0,
            });
        }

        let geocoded = enrich(&mut records, self.geocoder);
        logging::info(
            DataSource::Geocode,
            None,
            &format!("Resolved addresses for {}/{} campgrounds", geocoded, records.len()),
        );

        Self::enter(Stage::Persisting);
        let persisted = self.store.upsert_batch(&records)?;

        logging::log_run_summary(fetched, persisted, rejected, geocoded);
        Ok(RunReport {
            status: RunStatus::Completed,
            fetched,
            rejected,
            geocoded,
            persisted,
        })
    }
}
