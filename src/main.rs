//! Batch entry point: one ingestion run per invocation.
//!
//! Meant to be triggered by a scheduler. Component failures are logged and
//! the process still exits normally; only a broken configuration or a
//! failed `--init-schema` ends it with an error.

use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use campground_ingest::config::Config;
use campground_ingest::db;
use campground_ingest::ingest::geocode::NominatimClient;
use campground_ingest::ingest::source::SourceClient;
use campground_ingest::logging::{self, DataSource};
use campground_ingest::persist::{MemoryStore, PostgresStore, RecordStore};
use campground_ingest::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "campground_ingest")]
#[command(about = "Fetch, geocode and upsert campground listings", long_about = None)]
struct Cli {
    /// TOML config file (defaults to ./campground_ingest.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Create the campgrounds table if it is missing, then run.
    #[arg(long)]
    init_schema: bool,

    /// Fetch and geocode, but keep the batch in memory instead of writing it.
    #[arg(long, conflicts_with = "init_schema")]
    dry_run: bool,

    /// Log debug output (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // RUST_LOG and DB_URL may come from .env
    dotenv::dotenv().ok();
    logging::init_logger(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let config = Config::load(cli.config.as_deref())?;
    let source = SourceClient::new(&config.source)?;
    let geocoder = NominatimClient::new(&config.geocode)?;

    let mut store: Box<dyn RecordStore> = if cli.dry_run {
        logging::info(DataSource::Pipeline, None, "Dry run: nothing will be written");
        Box::new(MemoryStore::new())
    } else {
        let database_url = config.database_url();
        if cli.init_schema {
            let mut client = db::connect(&database_url)?;
            db::ensure_schema(&mut client)?;
            logging::info(DataSource::Database, None, "Schema ready");
        } else if let Err(e) = db::connect_and_verify(&database_url) {
            // The run still happens; the upsert will report the same problem.
            logging::warn(DataSource::Database, None, &e);
        }
        Box::new(PostgresStore::new(database_url))
    };

    let mut pipeline = Pipeline::new(&source, &geocoder, store.as_mut());
    if let Err(e) = pipeline.run() {
        logging::error(
            DataSource::Pipeline,
            None,
            &format!("Run ended without persisting: {}", e),
        );
    }

    Ok(())
}
