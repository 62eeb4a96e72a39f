//! CSV ingestion.
//!
//! Every rank parses the whole file: the schema is inferred from all rows so
//! ranks agree on it without talking to each other, then only the rank's
//! contiguous row range is materialized.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use shardtab_core::id::Rank;
use shardtab_core::partition::Partition;
use shardtab_core::schema::{DataType, Field, Schema};
use shardtab_core::types::{ColumnBuilder, ValueRef};

use crate::error::{Error, Result};
use crate::source::{check_shard, shard_range, TableSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvReadOptions {
    pub delimiter: u8,
    pub has_header: bool,
    /// Skip inference and parse with this schema.
    pub schema: Option<Schema>,
    /// Cell contents treated as null (in addition to nothing at all).
    pub null_values: Vec<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            schema: None,
            null_values: vec!["".into(), "null".into(), "NULL".into()],
        }
    }
}

impl CsvReadOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_null_values(mut self, null_values: Vec<String>) -> Self {
        self.null_values = null_values;
        self
    }

    fn is_null(&self, cell: &str) -> bool {
        self.null_values.iter().any(|n| n == cell)
    }
}

/// A CSV file shared by all ranks.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    options: CsvReadOptions,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_options(path, CsvReadOptions::default())
    }

    pub fn with_options(path: impl AsRef<Path>, options: CsvReadOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for CsvSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn schema(&self) -> Option<Schema> {
        self.options.schema.clone()
    }

    fn load_shard(&self, rank: Rank, world_size: usize) -> Result<Partition> {
        let file = File::open(&self.path)?;
        let partition = read_shard(file, &self.options, rank.get(), world_size)?;
        tracing::debug!(
            path = %self.path.display(),
            rank = rank.get(),
            rows = partition.num_rows(),
            "loaded csv shard"
        );
        Ok(partition)
    }
}

/// Parse `reader` and materialize the shard for `rank` of `world_size`.
pub fn read_shard<R: Read>(
    reader: R,
    options: &CsvReadOptions,
    rank: usize,
    world_size: usize,
) -> Result<Partition> {
    check_shard(rank, world_size)?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .from_reader(reader);

    let headers: Option<Vec<String>> = if options.has_header {
        Some(rdr.headers()?.iter().map(|h| h.trim().to_string()).collect())
    } else {
        None
    };

    let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;

    let width = headers
        .as_ref()
        .map(|h| h.len())
        .or_else(|| records.first().map(|r| r.len()))
        .unwrap_or(0);
    let names: Vec<String> = match headers {
        Some(h) => h,
        None => (0..width).map(|i| format!("c{i}")).collect(),
    };

    let schema = match &options.schema {
        Some(schema) => {
            if schema.len() != width {
                return Err(Error::Schema(format!(
                    "schema has {} fields but the file has {} columns",
                    schema.len(),
                    width
                )));
            }
            schema.clone()
        }
        None => infer_schema(&names, &records, options),
    };

    let range = shard_range(records.len(), rank, world_size);
    let shard = &records[range];

    let mut builders: Vec<ColumnBuilder> = schema
        .fields
        .iter()
        .map(|f| ColumnBuilder::with_capacity(f.clone(), shard.len()))
        .collect();

    for record in shard {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        for (builder, cell) in builders.iter_mut().zip(record.iter()) {
            push_cell(builder, cell, line, options)?;
        }
    }

    let columns = builders.into_iter().map(ColumnBuilder::finish).collect();
    Ok(Partition::build(columns)?)
}

fn push_cell(
    builder: &mut ColumnBuilder,
    cell: &str,
    line: u64,
    options: &CsvReadOptions,
) -> Result<()> {
    let cell = cell.trim();
    if options.is_null(cell) {
        return Ok(builder.push_null()?);
    }

    let field = builder.field();
    let parse_err = || Error::Parse {
        line,
        column: field.name.clone(),
        value: cell.to_string(),
        data_type: field.data_type,
    };
    let value = match field.data_type {
        DataType::Boolean => ValueRef::Bool(parse_bool(cell).ok_or_else(parse_err)?),
        DataType::Int32 => ValueRef::I32(cell.parse().map_err(|_| parse_err())?),
        DataType::Int64 => ValueRef::I64(cell.parse().map_err(|_| parse_err())?),
        DataType::Float32 => ValueRef::F32(cell.parse().map_err(|_| parse_err())?),
        DataType::Float64 => ValueRef::F64(cell.parse().map_err(|_| parse_err())?),
        DataType::Utf8 => ValueRef::Str(cell),
    };
    Ok(builder.push(value)?)
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Narrowest type every non-null cell of a column parses as:
/// bool, then int64, then double, falling back to string.
fn infer_schema(names: &[String], records: &[StringRecord], options: &CsvReadOptions) -> Schema {
    let fields = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut nullable = false;
            let (mut is_bool, mut is_int, mut is_float) = (true, true, true);
            let mut seen_value = false;

            for cell in records.iter().filter_map(|r| r.get(idx)).map(str::trim) {
                if options.is_null(cell) {
                    nullable = true;
                    continue;
                }
                seen_value = true;
                is_bool &= parse_bool(cell).is_some();
                is_int &= cell.parse::<i64>().is_ok();
                is_float &= cell.parse::<f64>().is_ok();
            }

            let data_type = match (seen_value, is_bool, is_int, is_float) {
                (false, ..) => DataType::Utf8,
                (true, true, _, _) => DataType::Boolean,
                (true, _, true, _) => DataType::Int64,
                (true, _, _, true) => DataType::Float64,
                _ => DataType::Utf8,
            };
            Field::new(name.clone(), data_type, nullable)
        })
        .collect();
    Schema::new(fields)
}
