//! Document export - re-project the relational tables into one document per food
//!
//! The [`Aggregator`] joins nutrient values, portions, footnotes and LanguaL
//! terms for each food; a [`DocumentSink`] receives the results.

pub mod document;
pub mod aggregator;
pub mod sink;
#[cfg(feature = "mongo")]
pub mod mongo;

pub use document::{
    FoodDocument, FoodMeta, FoodName, Footnote, LangualTerm, Nutrient, NutrientMeta, Portion,
};
pub use aggregator::{Aggregator, FOOD_SOURCE_PREFIX};
pub use sink::{DocumentSink, JsonLinesSink, MemoryCollection};
#[cfg(feature = "mongo")]
pub use mongo::MongoSink;
