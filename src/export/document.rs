use serde::{Deserialize, Serialize};

/// Denormalized view of one food, as exported to JSON lines or MongoDB
///
/// Field names follow the published document layout, not the SQL columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodDocument {
    pub group: String,
    pub manufacturer: String,
    pub name: FoodName,
    pub nutrients: Vec<Nutrient>,
    pub portions: Vec<Portion>,
    pub meta: FoodMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodName {
    pub long: String,
    /// Common names followed by LanguaL food source descriptions
    pub common: Vec<String>,
    pub sci: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub code: String,
    pub name: String,
    pub abbr: String,
    pub value: String,
    pub units: String,
    pub meta: NutrientMeta,
}

/// Sample statistics and provenance for one nutrient value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientMeta {
    pub imputed: String,
    pub is_add: String,
    pub rounded: String,
    pub conf: String,
    pub mod_month: String,
    pub mod_year: String,
    pub lower_error: String,
    pub upper_error: String,
    pub std_error: String,
    pub data_points: String,
    pub minval: String,
    pub maxval: String,
    pub degrees_of_freedom: String,
    pub stat_comments: String,
    pub sources: Vec<String>,
    /// `None` when the source code has no description
    pub source_type: Option<String>,
    /// `None` when the derivation code has no description
    pub derivation: Option<String>,
    pub studies: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portion {
    pub amt: String,
    pub unit: String,
    pub g: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodMeta {
    pub ndb_no: i64,
    pub nitrogen_factor: String,
    pub protein_factor: String,
    pub fat_factor: String,
    pub carb_factor: String,
    pub fndds_survey: String,
    pub ref_desc: String,
    pub ref_per: String,
    pub footnotes: Vec<Footnote>,
    pub langual: Vec<LangualTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footnote {
    pub n_code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangualTerm {
    pub code: String,
    pub description: String,
}

/// Split the comma-delimited common name field, dropping empty entries
pub fn split_common_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a last-modified stamp into (month, year)
///
/// Positional: the first two characters are the month and everything from
/// the fourth character on is the year, so `"01/2019"` gives `("01", "2019")`.
pub fn split_mod_date(raw: &str) -> (String, String) {
    let month = raw.chars().take(2).collect();
    let year = raw.chars().skip(3).collect();
    (month, year)
}
