//! Database connection and schema bootstrap.
//!
//! The ingestion run itself only needs the `campgrounds` table to exist;
//! `ensure_schema` creates it from `sql/001_campgrounds.sql` when asked
//! (`--init-schema`), and `table_exists` lets the binary fail early with a
//! useful hint instead of a mid-run query error.

use postgres::{Client, NoTls};

use crate::persist::TABLE;

/// Idempotent DDL for the `campgrounds` table.
pub const SCHEMA_SQL: &str = include_str!("../sql/001_campgrounds.sql");

pub fn connect(database_url: &str) -> Result<Client, postgres::Error> {
    Client::connect(database_url, NoTls)
}

/// Creates the `campgrounds` table if it is missing. Existing rows are untouched.
pub fn ensure_schema(client: &mut Client) -> Result<(), postgres::Error> {
    client.batch_execute(SCHEMA_SQL)
}

/// Returns `true` if the `campgrounds` table is visible on the search path.
pub fn table_exists(client: &mut Client) -> Result<bool, postgres::Error> {
    let row = client.query_one("SELECT to_regclass($1::text) IS NOT NULL", &[&TABLE])?;
    Ok(row.get(0))
}

/// Connects and confirms the table exists.
///
/// The error string is meant for an operator: it says what to run next.
pub fn connect_and_verify(database_url: &str) -> Result<Client, String> {
    let mut client = connect(database_url)
        .map_err(|e| format!("Failed to connect to database: {}", e))?;

    match table_exists(&mut client) {
        Ok(true) => Ok(client),
        Ok(false) => Err(format!(
            "Table '{}' does not exist. Run with --init-schema, or apply sql/001_campgrounds.sql",
            TABLE
        )),
        Err(e) => Err(format!("Failed to inspect schema: {}", e)),
    }
}
