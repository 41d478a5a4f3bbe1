//! Snapshot sources
//!
//! A [`SnapshotSource`] yields everything the engine needs for one
//! `(symbol, date)`. [`DirectorySource`] reads the on-disk layout
//!
//! ```text
//! <root>/<SYMBOL>/<YYYYMMDD>/greeks.csv
//! <root>/<SYMBOL>/<YYYYMMDD>/open_interest.csv
//! <root>/<SYMBOL>/<YYYYMMDD>/prices.csv
//! <root>/<SYMBOL>/stock_history.csv
//! ```

use crate::error::IngestError;
use crate::normalize::normalize_columns;
use crate::rows::{into_contract_rows, into_quotes, TableReport};
use crate::table::{load_table_from_path, RawTable};
use crate::Result;
use chrono::NaiveDate;
use common::ChainSnapshot;
use config::NormalizerConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const OPTION_TABLES: [&str; 3] = ["greeks", "open_interest", "prices"];
const HISTORY_FILE: &str = "stock_history.csv";

/// Ingestion accounting for one snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct SnapshotReport {
    pub tables: Vec<TableReport>,
    /// Option tables absent on disk, read as empty
    pub missing_files: Vec<String>,
}

impl SnapshotReport {
    pub fn dropped_total(&self) -> usize {
        self.tables.iter().map(TableReport::dropped_total).sum()
    }
}

/// Provider of chain snapshots
pub trait SnapshotSource: Send + Sync {
    fn load_snapshot(&self, symbol: &str, date: NaiveDate) -> Result<(ChainSnapshot, SnapshotReport)>;
}

/// Snapshot source backed by a directory of CSV files
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    normalizer: NormalizerConfig,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P, normalizer: NormalizerConfig) -> Self {
        Self {
            root: root.into(),
            normalizer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn snapshot_dir(&self, symbol: &str, date: NaiveDate) -> PathBuf {
        self.root
            .join(symbol)
            .join(date.format("%Y%m%d").to_string())
    }

    fn read_normalized(&self, path: &Path) -> Result<RawTable> {
        let raw = load_table_from_path(path)?;
        Ok(normalize_columns(&raw, &self.normalizer))
    }
}

impl SnapshotSource for DirectorySource {
    fn load_snapshot(&self, symbol: &str, date: NaiveDate) -> Result<(ChainSnapshot, SnapshotReport)> {
        let mut report = SnapshotReport::default();

        let history_path = self.root.join(symbol).join(HISTORY_FILE);
        if !history_path.exists() {
            return Err(IngestError::MissingHistory(history_path));
        }
        let (mut history, history_report) =
            into_quotes(&self.read_normalized(&history_path)?, symbol);
        report.tables.push(history_report);
        history.retain(|q| q.date <= date);

        let spot = history
            .iter()
            .rev()
            .find(|q| q.date == date)
            .cloned()
            .ok_or_else(|| IngestError::MissingSpot {
                symbol: symbol.to_string(),
                date,
            })?;

        let mut snapshot = ChainSnapshot::new(spot);
        snapshot.history = history;

        let dir = self.snapshot_dir(symbol, date);
        for name in OPTION_TABLES {
            let path = dir.join(format!("{}.csv", name));
            let table = if path.exists() {
                self.read_normalized(&path)?
            } else {
                warn!(symbol, %date, path = %path.display(), "Option table missing, reading as empty");
                report.missing_files.push(name.to_string());
                RawTable::default()
            };

            let (rows, table_report) = into_contract_rows(&table, name, date);
            debug!(symbol, table = name, rows = rows.len(), "Converted option table");
            report.tables.push(table_report);
            match name {
                "greeks" => snapshot.greeks = rows,
                "open_interest" => snapshot.open_interest = rows,
                _ => snapshot.prices = rows,
            }
        }

        info!(
            symbol,
            %date,
            greeks = snapshot.greeks.len(),
            open_interest = snapshot.open_interest.len(),
            prices = snapshot.prices.len(),
            history = snapshot.history.len(),
            dropped = report.dropped_total(),
            "Loaded snapshot"
        );
        Ok((snapshot, report))
    }
}
