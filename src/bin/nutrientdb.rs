//! nutrientdb: Load USDA nutrient database flat files into SQLite
//!
//! Also exports the loaded data as one JSON document per food.
//!
//! Usage:
//!   # Load data/sr25/ into nutrients.db (skipped if it already has data)
//!   nutrientdb
//!
//!   # Force a reload from another release and print documents as JSON lines
//!   nutrientdb --force --path data/sr28/ --export > foods.jsonl
//!
//!   # Upsert documents into MongoDB (needs the `mongo` feature)
//!   nutrientdb --mdb usda --mcoll foods

use anyhow::{Context, Result};
use clap::Parser;
use nutrientdb::config::{ExportTarget, RunConfig, DEFAULT_DATA_DIR, DEFAULT_MONGO_HOST, DEFAULT_MONGO_PORT};
use nutrientdb::store::DEFAULT_DATABASE;
use nutrientdb::{export_documents, load_directory, JsonLinesSink, NutrientDb};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "nutrientdb")]
#[command(
    about = "Parses USDA nutrient database flat files into a SQLite database",
    long_about = "Parses USDA nutrient database flat files and converts them into a SQLite database. \
                  Also exports the nutrient data from the SQLite database as JSON documents."
)]
struct Args {
    /// Path to the nutrient data files
    #[arg(short = 'p', long, default_value = DEFAULT_DATA_DIR)]
    path: PathBuf,

    /// SQLite file to read/write nutrient info
    #[arg(long = "database", default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    /// Reload the database from the flat files even if it already has data
    #[arg(short = 'f', long)]
    force: bool,

    /// Write each food as a JSON document to stdout, one per line
    #[arg(short = 'e', long)]
    export: bool,

    /// MongoDB hostname
    #[arg(long, default_value = DEFAULT_MONGO_HOST)]
    mhost: String,

    /// MongoDB port
    #[arg(long, default_value_t = DEFAULT_MONGO_PORT)]
    mport: u16,

    /// MongoDB database to export into
    #[arg(long)]
    mdb: Option<String>,

    /// MongoDB collection to export into
    #[arg(long)]
    mcoll: Option<String>,

    /// Debug-level logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> RunConfig {
        RunConfig {
            data_dir: self.path,
            database: self.database,
            force: self.force,
            export: ExportTarget::select(self.export, self.mhost, self.mport, self.mdb, self.mcoll),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    nutrientdb::logging::init_logging(args.verbose);

    run(args.into_config())
}

fn run(config: RunConfig) -> Result<()> {
    if config.force && config.database.exists() {
        std::fs::remove_file(&config.database)
            .with_context(|| format!("Failed to remove {}", config.database.display()))?;
    }

    let mut db = NutrientDb::open(&config.database)
        .with_context(|| format!("Failed to open {}", config.database.display()))?;

    let has_data = db.has_data().unwrap_or_else(|e| {
        warn!(error = %e, "could not inspect database, treating it as empty");
        false
    });

    if has_data {
        info!("{} already has data, skipping flat file parsing", config.database.display());
    } else {
        load_directory(&mut db, &config.data_dir)
            .with_context(|| format!("Failed to load flat files from {}", config.data_dir.display()))?;
    }

    match &config.export {
        ExportTarget::None => {}
        ExportTarget::Stdout => {
            let mut sink = JsonLinesSink::new(std::io::stdout().lock());
            export_documents(&db, &mut sink).context("Failed to export documents")?;
        }
        ExportTarget::Mongo(mongo) => export_to_mongo(&db, mongo)?,
    }

    Ok(())
}

#[cfg(feature = "mongo")]
fn export_to_mongo(db: &NutrientDb, mongo: &nutrientdb::MongoConfig) -> Result<()> {
    let mut sink = nutrientdb::export::MongoSink::connect(mongo)
        .with_context(|| format!("Failed to connect to {}", mongo.uri()))?;
    export_documents(db, &mut sink)
        .with_context(|| format!("Failed to export to {}.{}", mongo.database, mongo.collection))?;
    Ok(())
}

#[cfg(not(feature = "mongo"))]
fn export_to_mongo(_db: &NutrientDb, _mongo: &nutrientdb::MongoConfig) -> Result<()> {
    anyhow::bail!("MongoDB export requires building with `--features mongo`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let config = Args::parse_from(["nutrientdb"]).into_config();
        assert_eq!(config.data_dir, PathBuf::from("data/sr25/"));
        assert_eq!(config.database, PathBuf::from("nutrients.db"));
        assert_eq!(config.export, ExportTarget::None);
    }

    #[test]
    fn test_mongo_args() {
        let config = Args::parse_from([
            "nutrientdb", "-f", "--mhost", "db", "--mport", "27018", "--mdb", "usda", "--mcoll", "foods",
        ])
        .into_config();

        assert!(config.force);
        match config.export {
            ExportTarget::Mongo(mongo) => {
                assert_eq!(mongo.uri(), "mongodb://db:27018");
                assert_eq!(mongo.collection, "foods");
            }
            other => panic!("unexpected target: {:?}", other),
        }
    }

    #[test]
    fn test_run_stops_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("FOOD_DES.txt"), "").unwrap();

        let config = RunConfig {
            data_dir: dir.path().to_path_buf(),
            database: dir.path().join("nutrients.db"),
            force: false,
            export: ExportTarget::None,
        };

        // Only FOOD_DES.txt exists, so the load stops at FD_GROUP.txt
        let err = run(config).unwrap_err();
        assert!(format!("{:#}", err).contains("FD_GROUP.txt"));
    }
}
