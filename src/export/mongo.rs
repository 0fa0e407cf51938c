//! MongoDB document sink, compiled with the `mongo` feature

use crate::config::MongoConfig;
use crate::error::{NutrientError, Result};
use crate::export::document::FoodDocument;
use crate::export::sink::DocumentSink;
use mongodb::bson::{doc, to_document, Document};
use mongodb::options::ReplaceOptions;
use mongodb::sync::{Client, Collection};
use tracing::debug;

/// Upserts documents into a collection, keyed on `meta.ndb_no`
pub struct MongoSink {
    collection: Collection<Document>,
}

impl MongoSink {
    pub fn connect(config: &MongoConfig) -> Result<Self> {
        let client = Client::with_uri_str(config.uri()).map_err(store_error)?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);
        Ok(MongoSink { collection })
    }
}

impl DocumentSink for MongoSink {
    fn write(&mut self, document: &FoodDocument) -> Result<()> {
        debug!(ndb_no = document.meta.ndb_no, "Adding to mongo");

        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(upsert_filter(document), replacement(document)?, options)
            .map_err(store_error)?;
        Ok(())
    }
}

/// Matches the stored copy of `document`, if any
fn upsert_filter(document: &FoodDocument) -> Document {
    doc! { "meta.ndb_no": document.meta.ndb_no }
}

/// Full replacement body; no field of the previous copy survives
fn replacement(document: &FoodDocument) -> Result<Document> {
    to_document(document).map_err(|e| NutrientError::DocumentStore(e.to_string()))
}

fn store_error(err: mongodb::error::Error) -> NutrientError {
    NutrientError::DocumentStore(err.to_string())
}
