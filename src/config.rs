use crate::store::DEFAULT_DATABASE;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data/sr25/";
pub const DEFAULT_MONGO_HOST: &str = "localhost";
pub const DEFAULT_MONGO_PORT: u16 = 27017;

/// Connection parameters for the MongoDB export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub collection: String,
}

impl MongoConfig {
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }
}

/// Where documents go after loading
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportTarget {
    /// Load only
    #[default]
    None,
    /// JSON lines on stdout
    Stdout,
    Mongo(MongoConfig),
}

/// Configuration for one run of the loader and exporter
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory holding the flat files
    pub data_dir: PathBuf,

    /// SQLite store file
    pub database: PathBuf,

    /// Delete the store and reload even if it already has data
    pub force: bool,

    pub export: ExportTarget,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database: PathBuf::from(DEFAULT_DATABASE),
            force: false,
            export: ExportTarget::None,
        }
    }
}

impl ExportTarget {
    /// Stdout wins over MongoDB; MongoDB needs both a database and a collection
    pub fn select(
        stdout: bool,
        host: String,
        port: u16,
        database: Option<String>,
        collection: Option<String>,
    ) -> Self {
        if stdout {
            return ExportTarget::Stdout;
        }
        match (database, collection) {
            (Some(database), Some(collection)) if !host.is_empty() => {
                ExportTarget::Mongo(MongoConfig {
                    host,
                    port,
                    database,
                    collection,
                })
            }
            _ => ExportTarget::None,
        }
    }
}
