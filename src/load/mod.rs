//! Flat file loading - rebuild relational tables from the USDA text files
//!
//! Each source file maps to exactly one table. A load drops the table,
//! recreates it from the static catalogue in [`tables`], and inserts one row
//! per line inside a single transaction.

pub mod tables;
pub mod parser;
pub mod loader;

pub use tables::{schema_for, IndexSpec, Table, TableSchema, SCHEMAS};
pub use parser::{decode_cp1252, parse_line};
pub use loader::{LoadSummary, Loader};
