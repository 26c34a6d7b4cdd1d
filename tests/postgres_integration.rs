//! Integration tests for the PostgreSQL persistence sink.
//!
//! These tests verify:
//! 1. The schema bootstrap is idempotent
//! 2. A batch upsert inserts every row
//! 3. Re-upserting the same batch leaves the row count unchanged
//! 4. On conflict only the seven mutable columns are overwritten
//!
//! Prerequisites:
//! - PostgreSQL reachable at DATABASE_URL (or DB_URL) from .env
//! - A role allowed to CREATE TABLE in the target database
//!
//! They are marked #[ignore] so normal builds do not need a database.
//! Run with: cargo test --test postgres_integration -- --ignored --test-threads=1

use campground_ingest::config::Config;
use campground_ingest::db;
use campground_ingest::model::CampgroundRecord;
use campground_ingest::persist::{PostgresStore, RecordStore};

use chrono::{TimeZone, Utc};
use postgres::Client;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn database_url() -> String {
    Config::default().database_url()
}

fn setup_test_db() -> Client {
    let mut client = db::connect(&database_url()).unwrap_or_else(|e| {
        panic!(
            "Failed to connect to test database: {}\nSet DATABASE_URL in .env before running ignored tests",
            e
        )
    });
    db::ensure_schema(&mut client).expect("Failed to apply sql/001_campgrounds.sql");
    cleanup_test_data(&mut client);
    client
}

fn cleanup_test_data(client: &mut Client) {
    let _ = client.execute("DELETE FROM campgrounds WHERE id LIKE 'TEST%'", &[]);
}

fn test_record(id: &str) -> CampgroundRecord {
    CampgroundRecord {
        id: id.to_string(),
        kind: "location-search-results".to_string(),
        name: format!("Test Campground {}", id),
        latitude: 45.0,
        longitude: -122.0,
        region_name: "Oregon".to_string(),
        administrative_area: Some("Marion County".to_string()),
        nearest_city_name: Some("Salem".to_string()),
        accommodation_type_names: vec!["Tent".to_string(), "RV".to_string()],
        bookable: false,
        camper_types: vec!["tent".to_string()],
        operator: Some("Test Operator".to_string()),
        photo_url: Some("https://images.example.com/a.jpg".to_string()),
        photo_urls: vec!["https://images.example.com/a.jpg".to_string()],
        photos_count: 1,
        rating: Some(4.0),
        reviews_count: 10,
        slug: Some(format!("test-{}", id.to_lowercase())),
        price_low: Some(20.0),
        price_high: Some(35.0),
        availability_updated_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
        detail_url: format!("https://thedyrt.com/api/v6/locations/{}", id),
        address: Some("Salem, Marion County, Oregon, United States".to_string()),
    }
}

fn count_test_rows(client: &mut Client) -> i64 {
    client
        .query_one("SELECT COUNT(*) FROM campgrounds WHERE id LIKE 'TEST%'", &[])
        .expect("Failed to count rows")
        .get(0)
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Requires PostgreSQL
fn test_ensure_schema_is_idempotent() {
    let mut client = setup_test_db();
    db::ensure_schema(&mut client).expect("second ensure_schema should succeed");
    assert!(db::table_exists(&mut client).unwrap());
}

// ---------------------------------------------------------------------------
// Upsert
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Requires PostgreSQL
fn test_upsert_inserts_all_rows() {
    let mut client = setup_test_db();
    let mut store = PostgresStore::new(database_url());

    let records = vec![test_record("TEST1"), test_record("TEST2"), test_record("TEST3")];
    let affected = store.upsert_batch(&records).expect("upsert failed");

    assert_eq!(affected, 3);
    assert_eq!(count_test_rows(&mut client), 3);

    let row = client
        .query_one(
            "SELECT camper_types, availability_updated_at, address FROM campgrounds WHERE id = 'TEST2'",
            &[],
        )
        .unwrap();
    let camper_types: Vec<String> = row.get(0);
    let updated_at: Option<chrono::DateTime<Utc>> = row.get(1);
    let address: Option<String> = row.get(2);
    assert_eq!(camper_types, vec!["tent"]);
    assert_eq!(updated_at, records[1].availability_updated_at);
    assert_eq!(address, records[1].address);

    cleanup_test_data(&mut client);
}

#[test]
#[ignore] // Requires PostgreSQL
fn test_repeated_upsert_keeps_row_count() {
    let mut client = setup_test_db();
    let mut store = PostgresStore::new(database_url());
    let records = vec![test_record("TEST10"), test_record("TEST11")];

    store.upsert_batch(&records).unwrap();
    store.upsert_batch(&records).unwrap();

    assert_eq!(count_test_rows(&mut client), 2);
    cleanup_test_data(&mut client);
}

#[test]
#[ignore] // Requires PostgreSQL
fn test_conflict_updates_only_mutable_columns() {
    let mut client = setup_test_db();
    let mut store = PostgresStore::new(database_url());
    store.upsert_batch(&[test_record("TEST20")]).unwrap();

    let mut changed = test_record("TEST20");
    changed.rating = Some(2.5);
    changed.reviews_count = 42;
    changed.address = None;
    changed.bookable = true;
    changed.operator = Some("New Operator".to_string());
    store.upsert_batch(&[changed]).unwrap();

    let row = client
        .query_one(
            "SELECT rating, reviews_count, address, bookable, operator FROM campgrounds WHERE id = 'TEST20'",
            &[],
        )
        .unwrap();
    let rating: Option<f64> = row.get(0);
    let reviews_count: i32 = row.get(1);
    let address: Option<String> = row.get(2);
    let bookable: bool = row.get(3);
    let operator: Option<String> = row.get(4);

    assert_eq!(rating, Some(2.5));
    assert_eq!(reviews_count, 42);
    assert_eq!(address, None, "address follows the latest lookup, even when empty");
    assert!(!bookable, "bookable keeps its first stored value");
    assert_eq!(operator.as_deref(), Some("Test Operator"));

    cleanup_test_data(&mut client);
}
