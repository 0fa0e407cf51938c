use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading flat files or assembling documents
#[derive(Error, Debug)]
pub enum NutrientError {
    #[error("input file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("{source_name}:{line}: expected {expected} fields, found {found}")]
    FieldCount {
        source_name: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("table {0} has not been loaded")]
    MissingTable(&'static str),

    #[error("NDB number is not numeric: {0:?}")]
    InvalidNdbNo(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document store error: {0}")]
    DocumentStore(String),
}

/// Result type for nutrientdb operations
pub type Result<T> = std::result::Result<T, NutrientError>;
