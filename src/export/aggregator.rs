use crate::error::{NutrientError, Result};
use crate::export::document::{
    split_common_names, split_mod_date, FoodDocument, FoodMeta, FoodName, Footnote, LangualTerm,
    Nutrient, NutrientMeta, Portion,
};
use crate::load::TableSchema;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

/// LanguaL codes with this prefix classify the food source
pub const FOOD_SOURCE_PREFIX: &str = "B";

// Join queries name the built-in tables of `SCHEMAS`; a renamed catalogue only
// affects `ensure_tables`.
const FOOD_IDS_SQL: &str = "
    SELECT f.NDB_No
    FROM food_des f
    JOIN fd_group g ON f.FdGrp_Cd = g.FdGrp_Cd
    ORDER BY f.rowid";

const FOOD_SQL: &str = "
    SELECT f.NDB_No, g.FdGrp_Desc, f.ManufacName, f.Long_Desc, f.ComName, f.SciName,
           f.N_Factor, f.Pro_Factor, f.Fat_Factor, f.CHO_Factor, f.Survey, f.Ref_desc, f.Refuse
    FROM food_des f
    JOIN fd_group g ON f.FdGrp_Cd = g.FdGrp_Cd
    WHERE f.NDB_No = ?1";

const NUTRIENTS_SQL: &str = "
    SELECT d.Nutr_No, n.NutrDesc, n.Tagname, d.Nutr_Val, n.Units,
           d.Ref_NDB_No, d.Add_Nutr_Mark, n.Num_Dec, d.CC, d.AddMod_Date,
           d.Low_EB, d.Up_EB, d.Std_Error, d.Num_Data_Pts, d.Min, d.Max, d.DF, d.Stat_cmt,
           s.SrcCd_Desc, v.Deriv_Desc, d.Num_Studies
    FROM nut_data d
    JOIN nutr_def n ON d.Nutr_No = n.Nutr_No
    LEFT JOIN src_cd s ON d.Src_Cd = s.Src_Cd
    LEFT JOIN deriv_cd v ON d.Deriv_Cd = v.Deriv_Cd
    WHERE d.NDB_No = ?1
    ORDER BY d.rowid";

const SOURCES_SQL: &str = "
    SELECT DataSrc_ID FROM datsrcln
    WHERE NDB_No = ?1 AND Nutr_No = ?2
    ORDER BY rowid";

const PORTIONS_SQL: &str = "
    SELECT Amount, Msre_Desc, Gm_Wgt FROM weight
    WHERE NDB_No = ?1
    ORDER BY rowid";

const FOOTNOTES_SQL: &str = "
    SELECT Nutr_No, Footnt_Typ, Footnt_Txt FROM footnote
    WHERE NDB_No = ?1
    ORDER BY rowid";

const LANGUAL_SQL: &str = "
    SELECT l.Factor_Code, d.Description
    FROM langual l
    JOIN langdesc d ON l.Factor_Code = d.Factor_Code
    WHERE l.NDB_No = ?1 AND l.Factor_Code NOT LIKE ?2
    ORDER BY l.rowid";

const FOOD_SOURCE_SQL: &str = "
    SELECT d.Description
    FROM langual l
    JOIN langdesc d ON l.Factor_Code = d.Factor_Code
    WHERE l.NDB_No = ?1 AND l.Factor_Code LIKE ?2
    ORDER BY l.rowid";

/// Food-level columns before the per-food lists are attached
struct FoodRow {
    ndb_no: String,
    group: String,
    manufacturer: String,
    long_desc: String,
    common_names: String,
    sci_name: String,
    nitrogen_factor: String,
    protein_factor: String,
    fat_factor: String,
    carb_factor: String,
    survey: String,
    ref_desc: String,
    refuse: String,
}

/// Assembles one [`FoodDocument`] per food by joining the loaded tables
///
/// Nothing is cached between foods; every document re-issues its own queries.
pub struct Aggregator<'a> {
    conn: &'a Connection,
    schemas: &'a [TableSchema],
}

impl<'a> Aggregator<'a> {
    pub fn new(conn: &'a Connection, schemas: &'a [TableSchema]) -> Self {
        Aggregator { conn, schemas }
    }

    /// Fail early if any catalogue table has not been loaded
    pub fn ensure_tables(&self) -> Result<()> {
        for schema in self.schemas {
            let exists: bool = self.conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                params![schema.name],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(NutrientError::MissingTable(schema.name));
            }
        }
        Ok(())
    }

    /// NDB numbers of every food whose group resolves, in load order
    pub fn food_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(FOOD_IDS_SQL)?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    /// Build every document in load order, handing each to `f`
    pub fn for_each_document<F>(&self, mut f: F) -> Result<usize>
    where
        F: FnMut(FoodDocument) -> Result<()>,
    {
        let mut count = 0;
        for ndb_no in self.food_ids()? {
            if let Some(document) = self.document_for(&ndb_no)? {
                f(document)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Build the document for one food
    ///
    /// Returns `None` when the food does not exist or its group does not resolve.
    pub fn document_for(&self, ndb_no: &str) -> Result<Option<FoodDocument>> {
        let Some(food) = self.food(ndb_no)? else {
            return Ok(None);
        };
        debug!(ndb_no, "assembling document");

        let ndb_number: i64 = food
            .ndb_no
            .parse()
            .map_err(|_| NutrientError::InvalidNdbNo(food.ndb_no.clone()))?;

        let mut common = split_common_names(&food.common_names);
        common.extend(self.food_sources(ndb_no)?);

        Ok(Some(FoodDocument {
            group: food.group,
            manufacturer: food.manufacturer,
            name: FoodName {
                long: food.long_desc,
                common,
                sci: food.sci_name,
            },
            nutrients: self.nutrients(ndb_no)?,
            portions: self.portions(ndb_no)?,
            meta: FoodMeta {
                ndb_no: ndb_number,
                nitrogen_factor: food.nitrogen_factor,
                protein_factor: food.protein_factor,
                fat_factor: food.fat_factor,
                carb_factor: food.carb_factor,
                fndds_survey: food.survey,
                ref_desc: food.ref_desc,
                ref_per: food.refuse,
                footnotes: self.footnotes(ndb_no)?,
                langual: self.langual(ndb_no)?,
            },
        }))
    }

    fn food(&self, ndb_no: &str) -> Result<Option<FoodRow>> {
        let mut stmt = self.conn.prepare_cached(FOOD_SQL)?;
        let row = stmt
            .query_row(params![ndb_no], |row| {
                Ok(FoodRow {
                    ndb_no: row.get(0)?,
                    group: row.get(1)?,
                    manufacturer: row.get(2)?,
                    long_desc: row.get(3)?,
                    common_names: row.get(4)?,
                    sci_name: row.get(5)?,
                    nitrogen_factor: row.get(6)?,
                    protein_factor: row.get(7)?,
                    fat_factor: row.get(8)?,
                    carb_factor: row.get(9)?,
                    survey: row.get(10)?,
                    ref_desc: row.get(11)?,
                    refuse: row.get(12)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    fn nutrients(&self, ndb_no: &str) -> Result<Vec<Nutrient>> {
        let mut stmt = self.conn.prepare_cached(NUTRIENTS_SQL)?;
        let mut nutrients = stmt
            .query_map(params![ndb_no], |row| {
                let (mod_month, mod_year) = split_mod_date(&row.get::<_, String>(9)?);
                Ok(Nutrient {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    abbr: row.get(2)?,
                    value: row.get(3)?,
                    units: row.get(4)?,
                    meta: NutrientMeta {
                        imputed: row.get(5)?,
                        is_add: row.get(6)?,
                        rounded: row.get(7)?,
                        conf: row.get(8)?,
                        mod_month,
                        mod_year,
                        lower_error: row.get(10)?,
                        upper_error: row.get(11)?,
                        std_error: row.get(12)?,
                        data_points: row.get(13)?,
                        minval: row.get(14)?,
                        maxval: row.get(15)?,
                        degrees_of_freedom: row.get(16)?,
                        stat_comments: row.get(17)?,
                        sources: Vec::new(),
                        source_type: row.get(18)?,
                        derivation: row.get(19)?,
                        studies: row.get(20)?,
                    },
                })
            })?
            .collect::<rusqlite::Result<Vec<Nutrient>>>()?;

        for nutrient in &mut nutrients {
            nutrient.meta.sources = self.sources(ndb_no, &nutrient.code)?;
        }

        Ok(nutrients)
    }

    fn sources(&self, ndb_no: &str, nutr_no: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(SOURCES_SQL)?;
        let ids = stmt
            .query_map(params![ndb_no, nutr_no], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    fn portions(&self, ndb_no: &str) -> Result<Vec<Portion>> {
        let mut stmt = self.conn.prepare_cached(PORTIONS_SQL)?;
        let portions = stmt
            .query_map(params![ndb_no], |row| {
                Ok(Portion {
                    amt: row.get(0)?,
                    unit: row.get(1)?,
                    g: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<Portion>>>()?;
        Ok(portions)
    }

    fn footnotes(&self, ndb_no: &str) -> Result<Vec<Footnote>> {
        let mut stmt = self.conn.prepare_cached(FOOTNOTES_SQL)?;
        let footnotes = stmt
            .query_map(params![ndb_no], |row| {
                Ok(Footnote {
                    n_code: row.get(0)?,
                    kind: row.get(1)?,
                    text: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<Footnote>>>()?;
        Ok(footnotes)
    }

    fn langual(&self, ndb_no: &str) -> Result<Vec<LangualTerm>> {
        let mut stmt = self.conn.prepare_cached(LANGUAL_SQL)?;
        let terms = stmt
            .query_map(params![ndb_no, food_source_pattern()], |row| {
                Ok(LangualTerm {
                    code: row.get(0)?,
                    description: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<LangualTerm>>>()?;
        Ok(terms)
    }

    fn food_sources(&self, ndb_no: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(FOOD_SOURCE_SQL)?;
        let descriptions = stmt
            .query_map(params![ndb_no, food_source_pattern()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(descriptions)
    }
}

fn food_source_pattern() -> String {
    format!("{}%", FOOD_SOURCE_PREFIX)
}
