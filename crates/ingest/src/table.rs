//! Raw string tables and CSV loading

use crate::error::IngestError;
use crate::Result;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Version of the column mapping a table has been normalized to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    V1,
}

/// A heterogeneous table of string cells as delivered by the data vendor
///
/// `schema` is `None` until [`crate::normalize_columns`] has been applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub schema: Option<SchemaVersion>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            columns,
            rows,
            schema: None,
        }
    }

    /// Build a table from string literals
    pub fn from_strs(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Trimmed, non-empty cell value. Short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    /// Cell parsed as a finite float. `nan`, `inf` and text read as undefined.
    pub fn float(&self, row: usize, col: Option<usize>) -> Option<f64> {
        col.and_then(|c| self.cell(row, c))
            .and_then(|c| c.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Cell parsed as a non-negative count. Accepts `12` and `12.0`.
    pub fn count(&self, row: usize, col: Option<usize>) -> Option<u64> {
        self.float(row, col)
            .filter(|v| *v >= 0.0)
            .map(|v| v.round() as u64)
    }
}

/// Load a CSV table from any reader. The first record is the header.
pub fn load_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|rec| rec.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(columns = columns.len(), rows = rows.len(), "Loaded CSV table");
    Ok(RawTable::new(columns, rows))
}

/// Load a CSV table from a file path
pub fn load_table_from_path<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| IngestError::Csv {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    load_table(file).map_err(|e| match e {
        IngestError::Reader(source) => IngestError::Csv {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}
