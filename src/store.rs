use crate::error::Result;
use crate::export::Aggregator;
use crate::load::{schema_for, Loader, Table, TableSchema, SCHEMAS};
use rusqlite::{params, Connection};
use std::path::Path;

/// Default store file name
pub const DEFAULT_DATABASE: &str = "nutrients.db";

/// File-backed SQLite store holding the loaded tables
pub struct NutrientDb {
    conn: Connection,
    schemas: &'static [TableSchema],
}

impl NutrientDb {
    /// Open (or create) the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self::with_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::with_connection(conn))
    }

    fn with_connection(conn: Connection) -> Self {
        NutrientDb {
            conn,
            schemas: &SCHEMAS,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn loader(&mut self) -> Loader<'_> {
        Loader::new(&mut self.conn, self.schemas)
    }

    pub fn aggregator(&self) -> Aggregator<'_> {
        Aggregator::new(&self.conn, self.schemas)
    }

    /// Whether the food table exists and holds at least one row
    pub fn has_data(&self) -> Result<bool> {
        let table = schema_for(self.schemas, Table::FoodDes)?.name;
        if !self.table_exists(table)? {
            return Ok(false);
        }

        let sql = format!("SELECT EXISTS (SELECT 1 FROM {})", table);
        let exists: bool = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(exists)
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn row_count(&self, table: Table) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", schema_for(self.schemas, table)?.name);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
