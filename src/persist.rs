//! Persistence sink: batch upsert of enriched campground records.
//!
//! One call writes one batch in one transaction with a single
//! `INSERT ... ON CONFLICT (id) DO UPDATE` statement. The batch either
//! commits whole or not at all.
//!
//! Which columns an existing row takes from the incoming batch is policy
//! data ([`CONFLICT_UPDATE_COLUMNS`]); the SQL and the in-memory store are
//! both derived from it.

use postgres::types::ToSql;
use postgres::{Client, NoTls};
use std::collections::BTreeMap;

use crate::logging::{self, DataSource};
use crate::model::{CampgroundRecord, PersistenceError};

/// Target table.
pub const TABLE: &str = "campgrounds";

/// PostgreSQL's limit on bind parameters in one statement.
pub const MAX_BIND_PARAMETERS: usize = 65_535;

// ---------------------------------------------------------------------------
// Column policy
// ---------------------------------------------------------------------------

/// A column of the `campgrounds` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Type,
    Name,
    Latitude,
    Longitude,
    RegionName,
    AdministrativeArea,
    NearestCityName,
    AccommodationTypeNames,
    Bookable,
    CamperTypes,
    Operator,
    PhotoUrl,
    PhotoUrls,
    PhotosCount,
    Rating,
    ReviewsCount,
    Slug,
    PriceLow,
    PriceHigh,
    AvailabilityUpdatedAt,
    DetailUrl,
    Address,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Type => "type",
            Column::Name => "name",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::RegionName => "region_name",
            Column::AdministrativeArea => "administrative_area",
            Column::NearestCityName => "nearest_city_name",
            Column::AccommodationTypeNames => "accommodation_type_names",
            Column::Bookable => "bookable",
            Column::CamperTypes => "camper_types",
            Column::Operator => "operator",
            Column::PhotoUrl => "photo_url",
            Column::PhotoUrls => "photo_urls",
            Column::PhotosCount => "photos_count",
            Column::Rating => "rating",
            Column::ReviewsCount => "reviews_count",
            Column::Slug => "slug",
            Column::PriceLow => "price_low",
            Column::PriceHigh => "price_high",
            Column::AvailabilityUpdatedAt => "availability_updated_at",
            Column::DetailUrl => "detail_url",
            Column::Address => "address",
        }
    }

    /// Copies this column's value from `incoming` onto `existing`.
    pub fn copy(self, existing: &mut CampgroundRecord, incoming: &CampgroundRecord) {
        match self {
            Column::Id => existing.id.clone_from(&incoming.id),
            Column::Type => existing.kind.clone_from(&incoming.kind),
            Column::Name => existing.name.clone_from(&incoming.name),
            Column::Latitude => existing.latitude = incoming.latitude,
            Column::Longitude => existing.longitude = incoming.longitude,
            Column::RegionName => existing.region_name.clone_from(&incoming.region_name),
            Column::AdministrativeArea => {
                existing.administrative_area.clone_from(&incoming.administrative_area)
            }
            Column::NearestCityName => {
                existing.nearest_city_name.clone_from(&incoming.nearest_city_name)
            }
            Column::AccommodationTypeNames => existing
                .accommodation_type_names
                .clone_from(&incoming.accommodation_type_names),
            Column::Bookable => existing.bookable = incoming.bookable,
            Column::CamperTypes => existing.camper_types.clone_from(&incoming.camper_types),
            Column::Operator => existing.operator.clone_from(&incoming.operator),
            Column::PhotoUrl => existing.photo_url.clone_from(&incoming.photo_url),
            Column::PhotoUrls => existing.photo_urls.clone_from(&incoming.photo_urls),
            Column::PhotosCount => existing.photos_count = incoming.photos_count,
            Column::Rating => existing.rating = incoming.rating,
            Column::ReviewsCount => existing.reviews_count = incoming.reviews_count,
            Column::Slug => existing.slug.clone_from(&incoming.slug),
            Column::PriceLow => existing.price_low = incoming.price_low,
            Column::PriceHigh => existing.price_high = incoming.price_high,
            Column::AvailabilityUpdatedAt => {
                existing.availability_updated_at = incoming.availability_updated_at
            }
            Column::DetailUrl => existing.detail_url.clone_from(&incoming.detail_url),
            Column::Address => existing.address.clone_from(&incoming.address),
        }
    }
}

/// Every column, in insert order. `Id` is the conflict key.
pub const UPSERT_COLUMNS: [Column; 23] = [
    Column::Id,
    Column::Type,
    Column::Name,
    Column::Latitude,
    Column::Longitude,
    Column::RegionName,
    Column::AdministrativeArea,
    Column::NearestCityName,
    Column::AccommodationTypeNames,
    Column::Bookable,
    Column::CamperTypes,
    Column::Operator,
    Column::PhotoUrl,
    Column::PhotoUrls,
    Column::PhotosCount,
    Column::Rating,
    Column::ReviewsCount,
    Column::Slug,
    Column::PriceLow,
    Column::PriceHigh,
    Column::AvailabilityUpdatedAt,
    Column::DetailUrl,
    Column::Address,
];

/// Columns an existing row takes from the incoming record on `id` conflict.
/// Every other column keeps its stored value.
pub const CONFLICT_UPDATE_COLUMNS: &[Column] = &[
    Column::Name,
    Column::Latitude,
    Column::Longitude,
    Column::RegionName,
    Column::Rating,
    Column::ReviewsCount,
    Column::Address,
];

// ---------------------------------------------------------------------------
// Statement construction
// ---------------------------------------------------------------------------

/// Renders the upsert statement for `rows` records with numbered placeholders.
pub fn build_upsert_statement(rows: usize) -> String {
    let width = UPSERT_COLUMNS.len();
    let columns = UPSERT_COLUMNS
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ");

    let values = (0..rows)
        .map(|row| {
            let placeholders = (1..=width)
                .map(|col| format!("${}", row * width + col))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", placeholders)
        })
        .collect::<Vec<_>>()
        .join(",\n    ");

    let updates = CONFLICT_UPDATE_COLUMNS
        .iter()
        .map(|c| format!("{0} = EXCLUDED.{0}", c.name()))
        .collect::<Vec<_>>()
        .join(",\n    ");

    format!(
        "INSERT INTO {} ({})\nVALUES\n    {}\nON CONFLICT (id) DO UPDATE SET\n    {}",
        TABLE, columns, values, updates
    )
}

/// Bind parameters for one record, in [`UPSERT_COLUMNS`] order.
fn record_params(r: &CampgroundRecord) -> [&(dyn ToSql + Sync); 23] {
    [
        &r.id,
        &r.kind,
        &r.name,
        &r.latitude,
        &r.longitude,
        &r.region_name,
        &r.administrative_area,
        &r.nearest_city_name,
        &r.accommodation_type_names,
        &r.bookable,
        &r.camper_types,
        &r.operator,
        &r.photo_url,
        &r.photo_urls,
        &r.photos_count,
        &r.rating,
        &r.reviews_count,
        &r.slug,
        &r.price_low,
        &r.price_high,
        &r.availability_updated_at,
        &r.detail_url,
        &r.address,
    ]
}

// ---------------------------------------------------------------------------
// Record stores
// ---------------------------------------------------------------------------

/// Create-or-update by primary key, all-or-nothing per call.
pub trait RecordStore {
    /// Upserts the batch and returns the number of rows inserted or updated.
    fn upsert_batch(&mut self, records: &[CampgroundRecord]) -> Result<usize, PersistenceError>;
}

/// PostgreSQL-backed store. Connects per batch and closes on every exit path.
pub struct PostgresStore {
    database_url: String,
}

impl PostgresStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    fn write(&self, records: &[CampgroundRecord]) -> Result<usize, PersistenceError> {
        let params_needed = records.len() * UPSERT_COLUMNS.len();
        if params_needed > MAX_BIND_PARAMETERS {
            return Err(PersistenceError::TooManyParameters {
                rows: records.len(),
                params: params_needed,
                limit: MAX_BIND_PARAMETERS,
            });
        }

        let mut client =
            Client::connect(&self.database_url, NoTls).map_err(PersistenceError::Connect)?;
        // Dropping an uncommitted transaction rolls it back.
        let mut tx = client.transaction().map_err(PersistenceError::Query)?;

        let sql = build_upsert_statement(records.len());
        let params: Vec<&(dyn ToSql + Sync)> = records.iter().flat_map(record_params).collect();
        let affected = tx
            .execute(sql.as_str(), &params)
            .map_err(PersistenceError::Query)?;

        tx.commit().map_err(PersistenceError::Query)?;
        Ok(affected as usize)
    }
}

impl RecordStore for PostgresStore {
    fn upsert_batch(&mut self, records: &[CampgroundRecord]) -> Result<usize, PersistenceError> {
        if records.is_empty() {
            return Ok(0);
        }

        match self.write(records) {
            Ok(affected) => {
                logging::info(
                    DataSource::Database,
                    None,
                    &format!("Committed upsert of {} campgrounds", affected),
                );
                Ok(affected)
            }
            Err(e) => {
                logging::error(
                    DataSource::Database,
                    None,
                    &format!("Upsert of {} campgrounds not committed: {}", records.len(), e),
                );
                Err(e)
            }
        }
    }
}

/// In-memory store with the same conflict policy, keyed by `id`.
///
/// Backs `--dry-run` and lets the pipeline be exercised without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: BTreeMap<String, CampgroundRecord>,
    batches: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&CampgroundRecord> {
        self.rows.get(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of `upsert_batch` calls that reached the store.
    pub fn batches(&self) -> usize {
        self.batches
    }
}

impl RecordStore for MemoryStore {
    fn upsert_batch(&mut self, records: &[CampgroundRecord]) -> Result<usize, PersistenceError> {
        self.batches += 1;
        for record in records {
            match self.rows.get_mut(&record.id) {
                Some(existing) => {
                    for column in CONFLICT_UPDATE_COLUMNS {
                        column.copy(existing, record);
                    }
                }
                None => {
                    self.rows.insert(record.id.clone(), record.clone());
                }
            }
        }
        Ok(records.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
