use crate::error::{NutrientError, Result};
use crate::load::parser::{is_blank, parse_line, read_line};
use crate::load::tables::{schema_for, Table, TableSchema};
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Row counts per table after a full refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows: BTreeMap<&'static str, usize>,
}

impl LoadSummary {
    pub fn total_rows(&self) -> usize {
        self.rows.values().sum()
    }
}

/// Rebuilds relational tables from the flat files
pub struct Loader<'a> {
    conn: &'a mut Connection,
    schemas: &'a [TableSchema],
}

impl<'a> Loader<'a> {
    pub fn new(conn: &'a mut Connection, schemas: &'a [TableSchema]) -> Self {
        Loader { conn, schemas }
    }

    /// Load every table from `dir`, in [`Table::ALL`] order
    ///
    /// Stops at the first failing file; tables loaded before it stay committed.
    pub fn refresh_all<P: AsRef<Path>>(&mut self, dir: P) -> Result<LoadSummary> {
        let dir = dir.as_ref();
        let mut summary = LoadSummary::default();

        for table in Table::ALL {
            let schema = schema_for(self.schemas, table)?;
            let rows = self.refresh(table, dir.join(schema.file_name))?;
            summary.rows.insert(schema.name, rows);
        }

        Ok(summary)
    }

    /// Drop and recreate `table`, then fill it from the file at `path`
    pub fn refresh<P: AsRef<Path>>(&mut self, table: Table, path: P) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => NutrientError::MissingFile(path.to_path_buf()),
            _ => NutrientError::Io(e),
        })?;

        info!("Parsing {}...", path.display());
        let rows = self.refresh_from_reader(table, BufReader::new(file), &path.display().to_string())?;
        info!(table = ?table, rows, "Done");

        Ok(rows)
    }

    /// Drop and recreate `table`, then insert one row per non-blank line of `reader`
    ///
    /// Lines may end in `\n`, `\r\n` or a bare `\r`.
    /// Everything runs in one transaction. A line with the wrong number of fields
    /// aborts the load and leaves the table as it was before the call.
    pub fn refresh_from_reader<R: BufRead>(
        &mut self,
        table: Table,
        mut reader: R,
        source_name: &str,
    ) -> Result<usize> {
        let schema = schema_for(self.schemas, table)?;
        let expected = schema.columns.len();

        let tx = self.conn.transaction()?;
        tx.execute_batch(&schema.create_sql())?;

        let mut rows = 0;
        {
            let mut insert = tx.prepare(&schema.insert_sql())?;
            let mut line = Vec::new();
            let mut line_no = 0;

            while read_line(&mut reader, &mut line)? {
                line_no += 1;

                if is_blank(&line) {
                    continue;
                }

                let fields = parse_line(&line);
                if fields.len() != expected {
                    return Err(NutrientError::FieldCount {
                        source_name: source_name.to_string(),
                        line: line_no,
                        expected,
                        found: fields.len(),
                    });
                }

                insert.execute(params_from_iter(fields.iter()))?;
                rows += 1;
            }
        }

        tx.commit()?;
        debug!(table = schema.name, rows, "committed");

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::tables::SCHEMAS;
    use std::io::Cursor;

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    fn dump(conn: &Connection, table: &str) -> Vec<Vec<String>> {
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM {} ORDER BY rowid", table))
            .unwrap();
        let columns = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                (0..columns)
                    .map(|i| row.get(i))
                    .collect::<rusqlite::Result<Vec<String>>>()
            })
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();
        rows
    }

    #[test]
    fn test_refresh_inserts_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        let data = "~0100~^~Dairy and Egg Products~\r\n~0200~^~Spices and Herbs~\r\n";

        let rows = Loader::new(&mut conn, &SCHEMAS)
            .refresh_from_reader(Table::FdGroup, Cursor::new(data), "FD_GROUP.txt")
            .unwrap();

        assert_eq!(rows, 2);
        let desc: String = conn
            .query_row(
                "SELECT FdGrp_Desc FROM fd_group WHERE FdGrp_Cd = '0200'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(desc, "Spices and Herbs");
    }

    #[test]
    fn test_values_stored_as_text() {
        let mut conn = Connection::open_in_memory().unwrap();
        Loader::new(&mut conn, &SCHEMAS)
            .refresh_from_reader(Table::DatSrcLn, Cursor::new("~01001~^~203~^~S1234~\n"), "t")
            .unwrap();

        let (ndb, kind): (String, String) = conn
            .query_row("SELECT NDB_No, typeof(Nutr_No) FROM datsrcln", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(ndb, "01001");
        assert_eq!(kind, "text");
    }

    #[test]
    fn test_cp1252_round_trip() {
        let mut conn = Connection::open_in_memory().unwrap();
        let data: &[u8] = b"~B1234~^~Jalape\xf1o pepper~\n";
        Loader::new(&mut conn, &SCHEMAS)
            .refresh_from_reader(Table::LangDesc, Cursor::new(data), "LANGDESC.txt")
            .unwrap();

        let desc: String = conn
            .query_row("SELECT Description FROM langdesc", [], |r| r.get(0))
            .unwrap();
        assert_eq!(desc, "Jalapeño pepper");
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        let data = "~1~^~Analytical~\n~4~^~Calculated~\n";

        Loader::new(&mut conn, &SCHEMAS)
            .refresh_from_reader(Table::SrcCd, Cursor::new(data), "SRC_CD.txt")
            .unwrap();
        let first = dump(&conn, "src_cd");

        Loader::new(&mut conn, &SCHEMAS)
            .refresh_from_reader(Table::SrcCd, Cursor::new(data), "SRC_CD.txt")
            .unwrap();

        assert_eq!(count(&conn, "src_cd"), 2);
        assert_eq!(dump(&conn, "src_cd"), first);
        assert_eq!(first[1], vec!["4", "Calculated"]);
    }

    #[test]
    fn test_bare_carriage_return_lines() {
        let mut conn = Connection::open_in_memory().unwrap();
        let rows = Loader::new(&mut conn, &SCHEMAS)
            .refresh_from_reader(
                Table::SrcCd,
                Cursor::new("~1~^~Analytical~\r~4~^~Calculated~\r"),
                "SRC_CD.txt",
            )
            .unwrap();

        assert_eq!(rows, 2);
        assert_eq!(
            dump(&conn, "src_cd"),
            vec![vec!["1", "Analytical"], vec!["4", "Calculated"]]
        );
    }

    #[test]
    fn test_uses_passed_catalogue() {
        let renamed = [TableSchema {
            name: "food_groups",
            ..*Table::FdGroup.schema()
        }];
        let mut conn = Connection::open_in_memory().unwrap();
        let mut loader = Loader::new(&mut conn, &renamed);

        loader
            .refresh_from_reader(Table::FdGroup, Cursor::new("~0100~^~Dairy and Egg Products~\n"), "t")
            .unwrap();
        let err = loader
            .refresh_from_reader(Table::Weight, Cursor::new(""), "t")
            .unwrap_err();

        assert!(matches!(err, NutrientError::UnknownTable(_)));
        assert_eq!(count(&conn, "food_groups"), 1);
    }

    #[test]
    fn test_refresh_all_keys_summary_by_catalogue_name() {
        let dir = tempfile::tempdir().unwrap();
        let renamed: Vec<TableSchema> = SCHEMAS
            .iter()
            .map(|s| TableSchema {
                name: if s.table == Table::Footnote { "footnotes" } else { s.name },
                ..*s
            })
            .collect();
        for schema in &renamed {
            std::fs::write(dir.path().join(schema.file_name), "").unwrap();
        }

        let mut conn = Connection::open_in_memory().unwrap();
        let summary = Loader::new(&mut conn, &renamed).refresh_all(dir.path()).unwrap();

        assert_eq!(summary.rows.get("footnotes"), Some(&0));
        assert!(!summary.rows.contains_key("footnote"));
        assert_eq!(count(&conn, "footnotes"), 0);
    }

    #[test]
    fn test_field_count_mismatch_is_fatal() {
        let mut conn = Connection::open_in_memory().unwrap();
        let mut loader = Loader::new(&mut conn, &SCHEMAS);
        loader
            .refresh_from_reader(Table::SrcCd, Cursor::new("~1~^~Analytical~\n"), "SRC_CD.txt")
            .unwrap();

        let err = loader
            .refresh_from_reader(
                Table::SrcCd,
                Cursor::new("~4~^~Calculated~\n~5~\n"),
                "SRC_CD.txt",
            )
            .unwrap_err();

        match err {
            NutrientError::FieldCount { line, expected, found, .. } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Rolled back to the previous load
        let desc: String = conn
            .query_row("SELECT SrcCd_Desc FROM src_cd", [], |r| r.get(0))
            .unwrap();
        assert_eq!(desc, "Analytical");
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        let err = Loader::new(&mut conn, &SCHEMAS)
            .refresh_from_reader(Table::NutrDef, Cursor::new(
                "~203~^~g~^~PROCNT~^~Protein~^~2~^~600~\n~203~^~g~^~PROCNT~^~Protein~^~2~^~600~\n",
            ), "NUTR_DEF.txt")
            .unwrap_err();
        assert!(matches!(err, NutrientError::Store(_)));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut conn = Connection::open_in_memory().unwrap();
        let rows = Loader::new(&mut conn, &SCHEMAS)
            .refresh_from_reader(Table::DerivCd, Cursor::new("~A~^~Analytical data~\r\n\r\n"), "t")
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = Connection::open_in_memory().unwrap();
        let err = Loader::new(&mut conn, &SCHEMAS)
            .refresh(Table::Weight, dir.path().join("WEIGHT.txt"))
            .unwrap_err();
        assert!(matches!(err, NutrientError::MissingFile(_)));
    }

    #[test]
    fn test_refresh_all_stops_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("FOOD_DES.txt"),
            "~01001~^~0100~^~Butter, salted~^~BUTTER,WITH SALT~^~~^~~^~Y~^~~^0^~~^6.38^4.27^8.79^3.87\n",
        )
        .unwrap();

        let mut conn = Connection::open_in_memory().unwrap();
        let err = Loader::new(&mut conn, &SCHEMAS)
            .refresh_all(dir.path())
            .unwrap_err();

        assert!(matches!(err, NutrientError::MissingFile(ref p) if p.ends_with("FD_GROUP.txt")));
        assert_eq!(count(&conn, "food_des"), 1);
    }
}
