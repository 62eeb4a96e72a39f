//! Aligned, human-readable table rendering.

use std::io::Write;

use shardtab_core::partition::Row;
use shardtab_core::schema::Schema;

use crate::error::Result;

pub struct PrettyWriter<W: Write> {
    writer: W,
    /// Maximum number of rows rendered; the footer still reports the total.
    limit: Option<usize>,
}

impl<W: Write> PrettyWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Render `rows` under a `name:type` header followed by a row-count footer.
    pub fn write_rows<'a, I>(&mut self, schema: &Schema, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = Row<'a>>,
    {
        let header: Vec<String> = schema
            .fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.data_type))
            .collect();
        let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();

        let mut total = 0usize;
        let mut cells: Vec<Vec<String>> = Vec::new();
        for row in rows {
            total += 1;
            if self.limit.is_some_and(|l| cells.len() >= l) {
                continue;
            }
            let rendered: Vec<String> = (0..schema.len())
                .map(|i| row.get(i).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            for (w, cell) in widths.iter_mut().zip(&rendered) {
                *w = (*w).max(cell.chars().count());
            }
            cells.push(rendered);
        }

        self.write_line(&header, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(self.writer, "{}", rule.join("-+-"))?;
        for row in &cells {
            self.write_line(row, &widths)?;
        }
        if cells.len() < total {
            writeln!(self.writer, "... {} more rows", total - cells.len())?;
        }
        writeln!(self.writer, "({} rows)", total)?;
        self.writer.flush()?;
        Ok(())
    }

    fn write_line(&mut self, cells: &[String], widths: &[usize]) -> Result<()> {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect();
        writeln!(self.writer, "{}", padded.join(" | ").trim_end())?;
        Ok(())
    }
}
