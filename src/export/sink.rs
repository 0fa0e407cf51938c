use crate::error::Result;
use crate::export::document::FoodDocument;
use std::collections::BTreeMap;
use std::io::Write;

/// Destination for assembled food documents
pub trait DocumentSink {
    fn write(&mut self, document: &FoodDocument) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes one compact JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentSink for JsonLinesSink<W> {
    fn write(&mut self, document: &FoodDocument) -> Result<()> {
        serde_json::to_writer(&mut self.writer, document)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// In-process collection with upsert semantics keyed on `meta.ndb_no`
#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: BTreeMap<i64, FoodDocument>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, ndb_no: i64) -> Option<&FoodDocument> {
        self.documents.get(&ndb_no)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FoodDocument> {
        self.documents.values()
    }
}

impl DocumentSink for MemoryCollection {
    fn write(&mut self, document: &FoodDocument) -> Result<()> {
        self.documents.insert(document.meta.ndb_no, document.clone());
        Ok(())
    }
}
