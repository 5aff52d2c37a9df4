//! CSV data source.
//!
//! A headed CSV file is one table; each column is a string column. Rows are
//! cut into row groups of `row_group_size` rows and every (column, row
//! group) pair becomes one [`ColumnChunk`] with its own arena.
//!
//! CSV has no NULL of its own. Fields missing from a short record are NULL,
//! and so are empty fields unless the table sets `empty_is_null: false`.
//! NULLs count toward `n_rows` but are not stored.
//! Chunks smaller than `min_rows` rows or with fewer than
//! `min_non_empty_rows` stored values are dropped.

use csv::{ByteRecord, ReaderBuilder};
use tracing::{debug, info};

use crate::arena::ByteArena;
use crate::config::{BenchmarkConfig, TableConfig};
use crate::error::{Error, Result};

/// Rows of one column within one row group, nulls removed.
#[derive(Debug, Clone)]
pub struct ColumnChunk {
    pub table: String,
    pub column: String,
    pub row_group: u64,
    /// Rows in the row group, nulls included.
    pub n_rows: usize,
    pub arena: ByteArena,
}

impl ColumnChunk {
    pub fn n_rows_not_empty(&self) -> usize {
        self.arena.len()
    }
}

pub struct CsvTableSource {
    table: TableConfig,
    row_group_size: usize,
    min_rows: usize,
    min_non_empty_rows: usize,
}

impl CsvTableSource {
    pub fn new(table: TableConfig, config: &BenchmarkConfig) -> Self {
        Self {
            table,
            row_group_size: config.row_group_size,
            min_rows: config.min_rows,
            min_non_empty_rows: config.min_non_empty_rows,
        }
    }

    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    /// Read the whole file and return every chunk large enough to measure,
    /// ordered by row group, then by column.
    pub fn read_chunks(&self) -> Result<Vec<ColumnChunk>> {
        let table_name = self.table.display_name();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.table.path)?;

        let headers = reader.byte_headers()?.clone();
        let columns = self.select_columns(&headers)?;

        let mut arenas: Vec<ByteArena> = columns
            .iter()
            .map(|_| ByteArena::with_capacity(0, self.row_group_size))
            .collect();
        let mut chunks = Vec::new();
        let mut rows_in_group = 0;
        let mut row_group = 0u64;

        let empty_is_null = self.table.empty_is_null;
        let mut record = ByteRecord::new();
        while reader.read_byte_record(&mut record)? {
            for ((field_idx, _), arena) in columns.iter().zip(arenas.iter_mut()) {
                match record.get(*field_idx) {
                    Some(value) if !(empty_is_null && value.is_empty()) => {
                        arena.push(value);
                    }
                    _ => {}
                }
            }
            rows_in_group += 1;
            if rows_in_group == self.row_group_size {
                self.flush(&table_name, &columns, &mut arenas, row_group, rows_in_group, &mut chunks);
                row_group += 1;
                rows_in_group = 0;
            }
        }
        if rows_in_group > 0 {
            self.flush(&table_name, &columns, &mut arenas, row_group, rows_in_group, &mut chunks);
        }

        info!(
            table = %table_name,
            columns = columns.len(),
            chunks = chunks.len(),
            "read CSV table"
        );
        Ok(chunks)
    }

    fn select_columns(&self, headers: &ByteRecord) -> Result<Vec<(usize, String)>> {
        let all: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx, String::from_utf8_lossy(name).into_owned()))
            .collect();
        if self.table.columns.is_empty() {
            return Ok(all);
        }
        self.table
            .columns
            .iter()
            .map(|wanted| {
                all.iter()
                    .find(|(_, name)| name == wanted)
                    .cloned()
                    .ok_or_else(|| {
                        Error::InvalidConfig(format!(
                            "column '{}' not found in {}",
                            wanted,
                            self.table.path.display()
                        ))
                    })
            })
            .collect()
    }

    fn flush(
        &self,
        table: &str,
        columns: &[(usize, String)],
        arenas: &mut [ByteArena],
        row_group: u64,
        n_rows: usize,
        chunks: &mut Vec<ColumnChunk>,
    ) {
        for ((_, column), arena) in columns.iter().zip(arenas.iter_mut()) {
            let arena = std::mem::replace(arena, ByteArena::with_capacity(0, self.row_group_size));
            if n_rows < self.min_rows || arena.len() < self.min_non_empty_rows {
                debug!(
                    table,
                    column = %column,
                    row_group,
                    n_rows,
                    non_empty = arena.len(),
                    "skipping chunk below size thresholds"
                );
                continue;
            }
            chunks.push(ColumnChunk {
                table: table.to_string(),
                column: column.clone(),
                row_group,
                n_rows,
                arena,
            });
        }
    }
}
