//! `DistributedTable`: a schema plus this process's shard of the rows.
//!
//! Tables are only produced by ingestion (`from_source`) or by an operator
//! (`select`). Their data never changes in place.

use std::io::Write;

use shardtab_core::partition::{Partition, Row, Rows};
use shardtab_core::schema::Schema;
use shardtab_io::{CsvWriter, PrettyWriter, TableSource};
use shardtab_operators::{select, RowPredicate};

use crate::context::DistributedContext;
use crate::error::{ExecError, Result};
use crate::metrics::emit_span;

#[derive(Debug, Clone)]
pub struct DistributedTable<'ctx> {
    ctx: &'ctx DistributedContext,
    schema: Schema,
    partition: Partition,
}

impl<'ctx> DistributedTable<'ctx> {
    /// Materialize this process's shard of `source`.
    ///
    /// The source decides which rows belong to the caller's rank. If it
    /// declares a schema up front, the loaded shard must match it.
    pub fn from_source<S>(ctx: &'ctx DistributedContext, source: &S) -> Result<Self>
    where
        S: TableSource + ?Sized,
    {
        let group = ctx.ensure_ready()?;
        let (rank, world_size) = (group.rank(), group.world_size());

        let partition =
            source
                .load_shard(rank, world_size)
                .map_err(|error| ExecError::Ingestion {
                    location: source.describe(),
                    error,
                })?;
        let schema = partition.schema();

        if let Some(declared) = source.schema() {
            if declared != schema {
                return Err(ExecError::SchemaMismatch(format!(
                    "{} declared {declared} but loaded {schema}",
                    source.describe()
                )));
            }
        }

        tracing::info!(
            source = %source.describe(),
            rank = rank.get(),
            rows = partition.num_rows(),
            columns = schema.len(),
            "table ingested"
        );
        Ok(Self {
            ctx,
            schema,
            partition,
        })
    }

    /// Keep rows for which `predicate` returns true, in their original order.
    ///
    /// Purely local: no other process is contacted. `self` is untouched and
    /// the result shares nothing with it but a copy of the schema. The first
    /// predicate error aborts the call with the failing row index.
    pub fn select<F>(&self, predicate: F) -> Result<DistributedTable<'ctx>>
    where
        F: Fn(&Row<'_>) -> shardtab_core::Result<bool>,
    {
        self.select_with(&predicate)
    }

    /// `select` for any `RowPredicate`, e.g. a parsed `ComparePredicate`.
    pub fn select_with<P>(&self, predicate: &P) -> Result<DistributedTable<'ctx>>
    where
        P: RowPredicate + ?Sized,
    {
        self.ctx.ensure_ready()?;
        let partition = select(&self.partition, predicate)?;

        emit_span(
            "select",
            &[
                ("rows_in", self.partition.num_rows().to_string()),
                ("rows_out", partition.num_rows().to_string()),
            ],
        );
        Ok(DistributedTable {
            ctx: self.ctx,
            schema: self.schema.clone(),
            partition,
        })
    }

    /// Lazy, restartable iteration over the local rows.
    pub fn rows(&self) -> Rows<'_> {
        self.partition.rows()
    }

    /// Render the local shard to stdout.
    pub fn print(&self) -> Result<()> {
        self.print_to(std::io::stdout().lock())
    }

    pub fn print_to<W: Write>(&self, writer: W) -> Result<()> {
        self.render(PrettyWriter::new(writer))
    }

    /// Like `print_to`, but renders at most `limit` rows.
    pub fn print_head_to<W: Write>(&self, writer: W, limit: usize) -> Result<()> {
        self.render(PrettyWriter::new(writer).with_limit(limit))
    }

    fn render<W: Write>(&self, mut writer: PrettyWriter<W>) -> Result<()> {
        writer
            .write_rows(&self.schema, self.partition.rows())
            .map_err(ExecError::Output)
    }

    /// Write the local shard as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = CsvWriter::to_writer(writer);
        w.write_rows(&self.schema, self.partition.rows())
            .map_err(ExecError::Output)
    }

    pub fn num_rows(&self) -> usize {
        self.partition.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.len()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn context(&self) -> &'ctx DistributedContext {
        self.ctx
    }
}
