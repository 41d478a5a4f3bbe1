//! Typed conversion of normalized tables
//!
//! Rows that cannot become a [`ContractRow`] or [`UnderlyingQuote`] are
//! dropped and counted per reason in a [`TableReport`]; conversion itself
//! never fails.

use crate::table::RawTable;
use chrono::{Days, NaiveDate};
use common::{parse_date, ContractRow, OptionRight, UnderlyingQuote};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Row accounting for one converted table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows_in: usize,
    pub rows_out: usize,
    /// Dropped row counts keyed by reason
    pub dropped: BTreeMap<String, usize>,
    /// Required columns absent from the table
    pub missing_columns: Vec<String>,
}

impl TableReport {
    fn new(table: &str, rows_in: usize) -> Self {
        Self {
            table: table.to_string(),
            rows_in,
            ..Default::default()
        }
    }

    fn drop_row(&mut self, reason: &str) {
        *self.dropped.entry(reason.to_string()).or_default() += 1;
    }

    fn drop_all(&mut self, column: &str) {
        self.missing_columns.push(column.to_string());
        if self.rows_in > 0 {
            *self.dropped.entry("missing_column".to_string()).or_default() += self.rows_in;
        }
    }

    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

struct ContractColumns {
    strike: Option<usize>,
    right: Option<usize>,
    expiration: Option<usize>,
    dte: Option<usize>,
    delta: Option<usize>,
    gamma: Option<usize>,
    iv_pct: Option<usize>,
    bid: Option<usize>,
    ask: Option<usize>,
    close: Option<usize>,
    volume: Option<usize>,
    open_interest: Option<usize>,
}

impl ContractColumns {
    fn resolve(table: &RawTable) -> Self {
        Self {
            strike: table.column_index("strike"),
            right: table.column_index("right"),
            expiration: table.column_index("expiration"),
            dte: table.column_index("dte"),
            delta: table.column_index("delta"),
            gamma: table.column_index("gamma"),
            iv_pct: table.column_index("iv_pct"),
            bid: table.column_index("bid"),
            ask: table.column_index("ask"),
            close: table.column_index("close"),
            volume: table.column_index("volume"),
            open_interest: table.column_index("open_interest"),
        }
    }
}

/// Convert a normalized option table into [`ContractRow`]s
///
/// `strike` and `right` are required. The expiration comes from the
/// `expiration` column, or from `observation_date + dte` when only a `dte`
/// column is present. A `dte` column, when present, overrides the derived
/// days to expiration. Contracts that expired before `observation_date`
/// are dropped, as are `dte` cells outside the `u32` range or pointing past
/// the last representable date.
pub fn into_contract_rows(
    table: &RawTable,
    label: &str,
    observation_date: NaiveDate,
) -> (Vec<ContractRow>, TableReport) {
    let mut report = TableReport::new(label, table.len());
    let cols = ContractColumns::resolve(table);

    let (Some(strike_col), Some(right_col)) = (cols.strike, cols.right) else {
        for (name, col) in [("strike", cols.strike), ("right", cols.right)] {
            if col.is_none() {
                report.drop_all(name);
            }
        }
        debug!(table = label, missing = ?report.missing_columns, "Table lacks required columns");
        return (Vec::new(), report);
    };
    if cols.expiration.is_none() && cols.dte.is_none() {
        report.drop_all("expiration");
        return (Vec::new(), report);
    }

    let mut rows = Vec::with_capacity(table.len());
    for r in 0..table.len() {
        let Some(strike) = table.float(r, Some(strike_col)).filter(|s| *s > 0.0) else {
            report.drop_row("invalid_strike");
            continue;
        };
        let Some(right) = table.cell(r, right_col).and_then(OptionRight::parse) else {
            report.drop_row("invalid_right");
            continue;
        };

        let dte_cell = match table.count(r, cols.dte).map(u32::try_from) {
            Some(Ok(dte)) => Some(dte),
            Some(Err(_)) => {
                report.drop_row("invalid_dte");
                continue;
            }
            None => None,
        };
        let expiration = cols
            .expiration
            .and_then(|c| table.cell(r, c))
            .and_then(|c| parse_date(c).ok())
            .or_else(|| {
                dte_cell.and_then(|d| observation_date.checked_add_days(Days::new(u64::from(d))))
            });
        let Some(expiration) = expiration else {
            report.drop_row("invalid_expiration");
            continue;
        };
        if expiration < observation_date {
            report.drop_row("expired");
            continue;
        }

        let mut row = ContractRow::new(strike, right, expiration, observation_date);
        if let Some(dte) = dte_cell {
            row.days_to_expiration = dte;
        }
        row.delta = table.float(r, cols.delta);
        row.gamma = table.float(r, cols.gamma);
        row.implied_vol_pct = table.float(r, cols.iv_pct);
        row.bid = table.float(r, cols.bid);
        row.ask = table.float(r, cols.ask);
        row.close = table.float(r, cols.close);
        row.volume = table.count(r, cols.volume);
        row.open_interest = table.count(r, cols.open_interest);
        rows.push(row);
    }

    report.rows_out = rows.len();
    if report.dropped_total() > 0 {
        debug!(table = label, dropped = ?report.dropped, "Dropped unconvertible rows");
    }
    (rows, report)
}

/// Convert a normalized underlying history table into [`UnderlyingQuote`]s,
/// sorted by date. `date` and `close` are required.
pub fn into_quotes(table: &RawTable, symbol: &str) -> (Vec<UnderlyingQuote>, TableReport) {
    let mut report = TableReport::new("stock_history", table.len());
    let date_col = table.column_index("date");
    let close_col = table.column_index("close");

    let (Some(date_col), Some(close_col)) = (date_col, close_col) else {
        for (name, col) in [("date", date_col), ("close", close_col)] {
            if col.is_none() {
                report.drop_all(name);
            }
        }
        return (Vec::new(), report);
    };

    let open = table.column_index("open");
    let high = table.column_index("high");
    let low = table.column_index("low");
    let volume = table.column_index("volume");

    let mut quotes = Vec::with_capacity(table.len());
    for r in 0..table.len() {
        let Some(date) = table.cell(r, date_col).and_then(|c| parse_date(c).ok()) else {
            report.drop_row("invalid_date");
            continue;
        };
        let Some(close) = table.float(r, Some(close_col)) else {
            report.drop_row("invalid_close");
            continue;
        };
        let mut quote = UnderlyingQuote::new(symbol, date, close);
        quote.open = table.float(r, open);
        quote.high = table.float(r, high);
        quote.low = table.float(r, low);
        quote.volume = table.count(r, volume);
        quotes.push(quote);
    }
    quotes.sort_by_key(|q| q.date);

    report.rows_out = quotes.len();
    (quotes, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize_columns;
    use config::NormalizerConfig;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn normalized(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        normalize_columns(&RawTable::from_strs(columns, rows), &NormalizerConfig::default())
    }

    #[test]
    fn test_contract_rows() {
        let table = normalized(
            &["strike", "right", "expiration", "delta", "gamma", "implied_vol", "vol", "oi"],
            &[
                &["430000", "C", "20250203", "0.52", "0.01", "0.2", "12", "100"],
                &["425000", "P", "20250203", "-0.41", "", "0.22", "3.0", "50"],
            ],
        );
        let (rows, report) = into_contract_rows(&table, "greeks", date(2025, 1, 27));
        assert_eq!(rows.len(), 2);
        assert_eq!(report.rows_out, 2);
        assert_eq!(report.dropped_total(), 0);

        let call = &rows[0];
        assert_eq!(call.strike, 430.0);
        assert_eq!(call.right, OptionRight::Call);
        assert_eq!(call.days_to_expiration, 7);
        assert!((call.implied_vol_pct.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(call.volume, Some(12));
        assert_eq!(call.open_interest, Some(100));

        let put = &rows[1];
        assert_eq!(put.gamma, None);
        assert_eq!(put.volume, Some(3));
    }

    #[test]
    fn test_bad_rows_are_counted() {
        let table = normalized(
            &["strike", "right", "expiration"],
            &[
                &["430", "X", "20250203"],
                &["", "C", "20250203"],
                &["430", "C", "20250120"],
                &["430", "C", "garbage"],
                &["430", "C", "20250127"],
            ],
        );
        let (rows, report) = into_contract_rows(&table, "greeks", date(2025, 1, 27));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].days_to_expiration, 0);
        assert_eq!(report.dropped.get("invalid_right"), Some(&1));
        assert_eq!(report.dropped.get("invalid_strike"), Some(&1));
        assert_eq!(report.dropped.get("expired"), Some(&1));
        assert_eq!(report.dropped.get("invalid_expiration"), Some(&1));
    }

    #[test]
    fn test_dte_column_wins() {
        let table = normalized(
            &["strike", "right", "expiration", "dte"],
            &[&["430", "C", "20250203", "8"]],
        );
        let (rows, _) = into_contract_rows(&table, "greeks", date(2025, 1, 27));
        assert_eq!(rows[0].days_to_expiration, 8);

        let table = normalized(&["strike", "right", "dte"], &[&["430", "P", "30"]]);
        let (rows, _) = into_contract_rows(&table, "greeks", date(2025, 1, 27));
        assert_eq!(rows[0].expiration, date(2025, 2, 26));
        assert_eq!(rows[0].days_to_expiration, 30);
    }

    #[test]
    fn test_out_of_range_dte_is_dropped() {
        // past the last representable date
        let table = normalized(&["strike", "right", "dte"], &[&["430", "P", "100000000"]]);
        let (rows, report) = into_contract_rows(&table, "greeks", date(2025, 1, 27));
        assert!(rows.is_empty());
        assert_eq!(report.dropped.get("invalid_expiration"), Some(&1));

        // does not fit a u32 day count
        let table = normalized(
            &["strike", "right", "expiration", "dte"],
            &[&["430", "P", "20250203", "4294967303"], &["430", "C", "20250203", "7"]],
        );
        let (rows, report) = into_contract_rows(&table, "greeks", date(2025, 1, 27));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].right, OptionRight::Call);
        assert_eq!(report.dropped.get("invalid_dte"), Some(&1));
    }

    #[test]
    fn test_missing_required_columns() {
        let table = normalized(&["strike", "delta"], &[&["430", "0.5"]]);
        let (rows, report) = into_contract_rows(&table, "greeks", date(2025, 1, 27));
        assert!(rows.is_empty());
        assert_eq!(report.missing_columns, vec!["right".to_string()]);
        assert_eq!(report.dropped.get("missing_column"), Some(&1));

        let (rows, report) = into_contract_rows(&RawTable::default(), "prices", date(2025, 1, 27));
        assert!(rows.is_empty());
        assert_eq!(report.dropped_total(), 0);
    }

    #[test]
    fn test_quotes_sorted_by_date() {
        let table = normalized(
            &["date", "open", "high", "low", "close", "volume"],
            &[
                &["20250128", "601", "605", "600", "604", "1000"],
                &["20250127", "598", "602", "597", "600", "900"],
                &["20250129", "", "", "", "", ""],
            ],
        );
        let (quotes, report) = into_quotes(&table, "SPY");
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].date, date(2025, 1, 27));
        assert_eq!(quotes[1].close, 604.0);
        assert_eq!(quotes[1].volume, Some(1000));
        assert_eq!(report.dropped.get("invalid_close"), Some(&1));
    }
}
