//! Versioned column mapping and unit corrections
//!
//! Vendor tables disagree on column names (`vol` vs `volume`, `cp` vs
//! `right`), on the encoding of the right (`C`/`P` vs `CALL`/`PUT`), on
//! implied volatility units and on strike units. [`normalize_columns`]
//! resolves all of this once, so calculators only ever see canonical
//! lower-case columns.

use crate::table::{RawTable, SchemaVersion};
use common::parse_date;
use config::NormalizerConfig;
use std::collections::HashSet;
use tracing::debug;

/// Alias table for [`SchemaVersion::V1`]: `(vendor name, canonical name)`
pub const COLUMN_ALIASES_V1: &[(&str, &str)] = &[
    ("vol", "volume"),
    ("size", "volume"),
    ("daily_volume", "volume"),
    ("oi", "open_interest"),
    ("openinterest", "open_interest"),
    ("type", "right"),
    ("cp", "right"),
    ("exp", "expiration"),
    ("expiry", "expiration"),
];

const DATE_COLUMNS: &[&str] = &["date", "expiration"];

fn canonical_name(raw: &str) -> String {
    let name = raw.trim().to_lowercase();
    COLUMN_ALIASES_V1
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(name)
}

/// Apply the V1 column mapping and unit corrections
///
/// A table already at [`SchemaVersion::V1`] is returned unchanged, which
/// makes the operation idempotent. When two source columns map to the same
/// canonical name, the first one is kept.
pub fn normalize_columns(table: &RawTable, config: &NormalizerConfig) -> RawTable {
    if table.schema == Some(SchemaVersion::V1) {
        return table.clone();
    }

    // Column renaming, keeping the first of any colliding pair
    let mut seen = HashSet::new();
    let mut keep = Vec::with_capacity(table.columns.len());
    let mut columns = Vec::with_capacity(table.columns.len());
    for (idx, raw) in table.columns.iter().enumerate() {
        let name = canonical_name(raw);
        if seen.insert(name.clone()) {
            keep.push(idx);
            columns.push(name);
        } else {
            debug!(column = %raw, canonical = %name, "Dropping duplicate column after aliasing");
        }
    }

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            keep.iter()
                .map(|&idx| row.get(idx).map(|c| c.trim().to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut out = RawTable::new(columns, rows);

    normalize_right(&mut out);
    derive_iv_pct(&mut out);
    correct_milli_strikes(&mut out, config);
    for name in DATE_COLUMNS {
        coerce_dates(&mut out, name);
    }

    out.schema = Some(SchemaVersion::V1);
    out
}

fn normalize_right(table: &mut RawTable) {
    let Some(col) = table.column_index("right") else {
        return;
    };
    for row in table.rows.iter_mut() {
        if let Some(cell) = row.get_mut(col) {
            let upper = cell.trim().to_uppercase();
            *cell = match upper.as_str() {
                "P" => "PUT".to_string(),
                "C" => "CALL".to_string(),
                _ => upper,
            };
        }
    }
}

fn derive_iv_pct(table: &mut RawTable) {
    if table.has_column("iv_pct") {
        return;
    }
    let Some(src) = table.column_index("implied_vol") else {
        return;
    };
    let values: Vec<String> = (0..table.len())
        .map(|r| {
            table
                .float(r, Some(src))
                .map(|v| (v * 100.0).to_string())
                .unwrap_or_default()
        })
        .collect();
    let width = table.columns.len();
    table.columns.push("iv_pct".to_string());
    for (row, value) in table.rows.iter_mut().zip(values) {
        row.resize(width, String::new());
        row.push(value);
    }
}

fn correct_milli_strikes(table: &mut RawTable, config: &NormalizerConfig) {
    let Some(col) = table.column_index("strike") else {
        return;
    };
    let max_strike = (0..table.len())
        .filter_map(|r| table.float(r, Some(col)))
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    let Some(max_strike) = max_strike else {
        return;
    };
    if max_strike <= config.milli_strike_threshold {
        return;
    }

    debug!(max_strike, divisor = config.milli_strike_divisor, "Correcting milli-strikes");
    for r in 0..table.len() {
        if let Some(v) = table.float(r, Some(col)) {
            table.rows[r][col] = (v / config.milli_strike_divisor).to_string();
        }
    }
}

fn coerce_dates(table: &mut RawTable, name: &str) {
    let Some(col) = table.column_index(name) else {
        return;
    };
    for row in table.rows.iter_mut() {
        if let Some(cell) = row.get_mut(col) {
            *cell = parse_date(cell)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
        }
    }
}
