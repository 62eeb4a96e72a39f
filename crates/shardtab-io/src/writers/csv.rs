//! CSV writer for a table's local shard.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use shardtab_core::partition::Row;
use shardtab_core::schema::Schema;
use shardtab_core::types::ValueRef;

use crate::error::Result;

pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// Header row from `schema`, then one record per row. Nulls are empty cells.
    pub fn write_rows<'a, I>(&mut self, schema: &Schema, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = Row<'a>>,
    {
        self.writer
            .write_record(schema.fields.iter().map(|f| f.name.as_str()))?;
        let mut record: Vec<String> = Vec::with_capacity(schema.len());
        for row in rows {
            record.clear();
            for i in 0..schema.len() {
                record.push(match row.get(i)? {
                    ValueRef::Null => String::new(),
                    v => v.to_string(),
                });
            }
            self.writer.write_record(&record)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}
