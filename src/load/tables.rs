//! Static catalogue of the relational tables built from the flat files
//!
//! Column order matches the field order of the source files, so inserts bind
//! parsed fields positionally. Index names and uniqueness are fixed; the join
//! queries in `export::aggregator` rely on them.

use crate::error::{NutrientError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One relational table per source flat file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    FoodDes,
    FdGroup,
    Langual,
    LangDesc,
    NutData,
    NutrDef,
    SrcCd,
    DerivCd,
    Weight,
    Footnote,
    DataSrc,
    DatSrcLn,
}

impl Table {
    /// Load order used by a full refresh
    pub const ALL: [Table; 12] = [
        Table::FoodDes,
        Table::FdGroup,
        Table::Langual,
        Table::LangDesc,
        Table::NutData,
        Table::NutrDef,
        Table::SrcCd,
        Table::DerivCd,
        Table::Weight,
        Table::Footnote,
        Table::DataSrc,
        Table::DatSrcLn,
    ];

    /// Schema in the built-in catalogue; `SCHEMAS` is declared in variant order
    ///
    /// Components that take a catalogue resolve through [`schema_for`] instead.
    pub fn schema(self) -> &'static TableSchema {
        &SCHEMAS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.schema().name
    }

    pub fn file_name(self) -> &'static str {
        self.schema().file_name
    }

    /// Resolve a table from its SQL name (e.g. "nut_data")
    pub fn from_name(name: &str) -> Result<Table> {
        TABLES_BY_NAME
            .get(name)
            .copied()
            .ok_or_else(|| NutrientError::UnknownTable(name.to_string()))
    }
}

/// Secondary or unique index over a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub unique: bool,
}

/// Column list and indexes for one table
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub table: Table,
    pub name: &'static str,
    pub file_name: &'static str,
    pub columns: &'static [&'static str],
    pub indexes: &'static [IndexSpec],
}

impl TableSchema {
    /// Script that drops the table if present and recreates it with its indexes
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} TEXT", c))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "DROP TABLE IF EXISTS {name};\nCREATE TABLE {name} ({columns});\n",
            name = self.name,
        );
        for index in self.indexes {
            sql.push_str(&format!(
                "CREATE {unique}INDEX {index} ON {name} ({column});\n",
                unique = if index.unique { "UNIQUE " } else { "" },
                index = index.name,
                name = self.name,
                column = index.column,
            ));
        }
        sql
    }

    /// Parameterised insert binding every column positionally
    pub fn insert_sql(&self) -> String {
        let params = (1..=self.columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        format!("INSERT INTO {} VALUES ({})", self.name, params)
    }
}

/// Look up a table's schema in a catalogue
pub fn schema_for(schemas: &[TableSchema], table: Table) -> Result<&TableSchema> {
    schemas
        .iter()
        .find(|s| s.table == table)
        .ok_or_else(|| NutrientError::UnknownTable(format!("{:?}", table)))
}

const fn index(name: &'static str, column: &'static str) -> IndexSpec {
    IndexSpec { name, column, unique: false }
}

const fn unique(name: &'static str, column: &'static str) -> IndexSpec {
    IndexSpec { name, column, unique: true }
}

pub static SCHEMAS: [TableSchema; 12] = [
    TableSchema {
        table: Table::FoodDes,
        name: "food_des",
        file_name: "FOOD_DES.txt",
        columns: &[
            "NDB_No", "FdGrp_Cd", "Long_Desc", "Shrt_Desc", "ComName", "ManufacName", "Survey",
            "Ref_desc", "Refuse", "SciName", "N_Factor", "Pro_Factor", "Fat_Factor", "CHO_Factor",
        ],
        indexes: &[unique("food_des_ndb_no_idx", "NDB_No")],
    },
    TableSchema {
        table: Table::FdGroup,
        name: "fd_group",
        file_name: "FD_GROUP.txt",
        columns: &["FdGrp_Cd", "FdGrp_Desc"],
        indexes: &[unique("fd_group_FdGrp_Cd_idx", "FdGrp_Cd")],
    },
    TableSchema {
        table: Table::Langual,
        name: "langual",
        file_name: "LANGUAL.txt",
        columns: &["NDB_No", "Factor_Code"],
        indexes: &[index("langual_ndb_no_idx", "NDB_No")],
    },
    TableSchema {
        table: Table::LangDesc,
        name: "langdesc",
        file_name: "LANGDESC.txt",
        columns: &["Factor_Code", "Description"],
        indexes: &[index("langdesc_Factor_Code_idx", "Factor_Code")],
    },
    TableSchema {
        table: Table::NutData,
        name: "nut_data",
        file_name: "NUT_DATA.txt",
        columns: &[
            "NDB_No", "Nutr_No", "Nutr_Val", "Num_Data_Pts", "Std_Error", "Src_Cd", "Deriv_Cd",
            "Ref_NDB_No", "Add_Nutr_Mark", "Num_Studies", "Min", "Max", "DF", "Low_EB", "Up_EB",
            "Stat_cmt", "AddMod_Date", "CC",
        ],
        indexes: &[index("nut_data_NDB_No_idx", "NDB_No")],
    },
    TableSchema {
        table: Table::NutrDef,
        name: "nutr_def",
        file_name: "NUTR_DEF.txt",
        columns: &["Nutr_No", "Units", "Tagname", "NutrDesc", "Num_Dec", "SR_Order"],
        indexes: &[unique("nutr_def_Nutr_No_idx", "Nutr_No")],
    },
    TableSchema {
        table: Table::SrcCd,
        name: "src_cd",
        file_name: "SRC_CD.txt",
        columns: &["Src_Cd", "SrcCd_Desc"],
        indexes: &[unique("src_cd_Src_Cd_idx", "Src_Cd")],
    },
    TableSchema {
        table: Table::DerivCd,
        name: "deriv_cd",
        file_name: "DERIV_CD.txt",
        columns: &["Deriv_Cd", "Deriv_Desc"],
        indexes: &[unique("deriv_cd_Deriv_Cd_idx", "Deriv_Cd")],
    },
    TableSchema {
        table: Table::Weight,
        name: "weight",
        file_name: "WEIGHT.txt",
        columns: &["NDB_No", "Seq", "Amount", "Msre_Desc", "Gm_Wgt", "Num_Data_Pts", "Std_Dev"],
        indexes: &[index("weight_NDB_No_idx", "NDB_No")],
    },
    TableSchema {
        table: Table::Footnote,
        name: "footnote",
        file_name: "FOOTNOTE.txt",
        columns: &["NDB_No", "Footnt_No", "Footnt_Typ", "Nutr_No", "Footnt_Txt"],
        indexes: &[index("footnote_NDB_No_idx", "NDB_No")],
    },
    TableSchema {
        table: Table::DataSrc,
        name: "data_src",
        file_name: "DATA_SRC.txt",
        columns: &[
            "DataSrc_ID", "Authors", "Title", "Year", "Journal", "Vol_City", "Issue_State",
            "Start_Page", "End_Page",
        ],
        indexes: &[unique("data_src_DataSrc_ID_idx", "DataSrc_ID")],
    },
    TableSchema {
        table: Table::DatSrcLn,
        name: "datsrcln",
        file_name: "DATSRCLN.txt",
        columns: &["NDB_No", "Nutr_No", "DataSrc_ID"],
        indexes: &[index("datsrcln_NDB_No_idx", "NDB_No")],
    },
];

static TABLES_BY_NAME: Lazy<HashMap<&'static str, Table>> =
    Lazy::new(|| SCHEMAS.iter().map(|s| (s.name, s.table)).collect());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_has_a_schema() {
        for table in Table::ALL {
            let schema = schema_for(&SCHEMAS, table).unwrap();
            assert_eq!(schema.table, table);
            assert_eq!(table.schema().table, table);
            assert!(!schema.columns.is_empty());
        }
        assert_eq!(SCHEMAS.len(), Table::ALL.len());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Table::from_name("nut_data").unwrap(), Table::NutData);
        assert_eq!(Table::from_name("datsrcln").unwrap(), Table::DatSrcLn);
        assert!(matches!(
            Table::from_name("nutrients"),
            Err(NutrientError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_schema_for_missing_table() {
        let partial = [*Table::FdGroup.schema()];
        assert!(schema_for(&partial, Table::FdGroup).is_ok());
        assert!(schema_for(&partial, Table::Weight).is_err());
    }

    #[test]
    fn test_create_sql() {
        let sql = Table::FdGroup.schema().create_sql();
        assert!(sql.starts_with("DROP TABLE IF EXISTS fd_group;"));
        assert!(sql.contains("CREATE TABLE fd_group (FdGrp_Cd TEXT, FdGrp_Desc TEXT);"));
        assert!(sql.contains("CREATE UNIQUE INDEX fd_group_FdGrp_Cd_idx ON fd_group (FdGrp_Cd);"));

        let sql = Table::Langual.schema().create_sql();
        assert!(sql.contains("CREATE INDEX langual_ndb_no_idx ON langual (NDB_No);"));
    }

    #[test]
    fn test_insert_sql() {
        let sql = Table::DatSrcLn.schema().insert_sql();
        assert_eq!(sql, "INSERT INTO datsrcln VALUES (?1, ?2, ?3)");

        let food = Table::FoodDes.schema();
        assert_eq!(food.columns.len(), 14);
        assert!(food.insert_sql().ends_with("?14)"));
    }

    #[test]
    fn test_nutrient_value_columns() {
        let nut = Table::NutData.schema();
        assert_eq!(nut.columns.len(), 18);
        assert_eq!(nut.columns[16], "AddMod_Date");
    }
}
