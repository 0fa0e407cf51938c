//! # nutrientdb - USDA nutrient database loader
//!
//! Loads the USDA Standard Reference flat files into SQLite and re-projects
//! the relational data into one JSON document per food.
//!
//! ## Modules
//!
//! - **load**: parse the caret-delimited, cp1252-encoded files into tables
//! - **export**: join the tables into per-food documents and write them out
//! - **store**: the SQLite store both sides share
//!
//! ## Quick Start
//!
//! ```no_run
//! use nutrientdb::{export_documents, load_directory, JsonLinesSink, NutrientDb};
//!
//! # fn main() -> nutrientdb::Result<()> {
//! let mut db = NutrientDb::open("nutrients.db")?;
//! if !db.has_data()? {
//!     load_directory(&mut db, "data/sr25/")?;
//! }
//!
//! let mut sink = JsonLinesSink::new(std::io::stdout().lock());
//! let count = export_documents(&db, &mut sink)?;
//! eprintln!("exported {} foods", count);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use tracing::info;

pub mod config;
pub mod error;
pub mod export;
pub mod load;
pub mod logging;
pub mod store;

// Re-export commonly used types for convenience
pub use config::{ExportTarget, MongoConfig, RunConfig};
pub use error::{NutrientError, Result};
pub use export::{Aggregator, DocumentSink, FoodDocument, JsonLinesSink, MemoryCollection};
pub use load::{LoadSummary, Loader, Table, TableSchema, SCHEMAS};
pub use store::NutrientDb;

/// Rebuild every table from the flat files in `dir`
pub fn load_directory<P: AsRef<Path>>(db: &mut NutrientDb, dir: P) -> Result<LoadSummary> {
    info!("Refreshing database from flat files...");
    let summary = db.loader().refresh_all(dir)?;
    info!(rows = summary.total_rows(), "load complete");
    Ok(summary)
}

/// Assemble every food document and hand it to `sink`
pub fn export_documents<S: DocumentSink + ?Sized>(db: &NutrientDb, sink: &mut S) -> Result<usize> {
    let aggregator = db.aggregator();
    aggregator.ensure_tables()?;

    let count = aggregator.for_each_document(|document| sink.write(&document))?;
    sink.flush()?;

    info!(documents = count, "export complete");
    Ok(count)
}
