//! Rolling annualized realized volatility
//!
//! Log returns between consecutive closes, then a rolling sample standard
//! deviation per window, annualized by `sqrt(trading_days)` and expressed
//! in percent.

use crate::diagnostics::{stage, Diagnostics};
use chrono::NaiveDate;
use common::UnderlyingQuote;
use config::RealizedVolConfig;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// One date with every configured window defined
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealizedVolRow {
    pub date: NaiveDate,
    pub close: f64,
    /// Annualized volatility in percent, keyed by window length
    pub hv: BTreeMap<usize, f64>,
}

/// Realized volatility as of the snapshot date, one value per window
///
/// Serializes flat as `hv_{window}d`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealizedVol {
    pub windows: Vec<(usize, Option<f64>)>,
}

impl RealizedVol {
    pub fn window(&self, window: usize) -> Option<f64> {
        self.windows
            .iter()
            .find(|(w, _)| *w == window)
            .and_then(|(_, v)| *v)
    }
}

impl Serialize for RealizedVol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.windows.len()))?;
        for (window, value) in &self.windows {
            map.serialize_entry(&format!("hv_{}d", window), value)?;
        }
        map.end()
    }
}

/// Log returns aligned with `closes`; the first entry and any return
/// touching a non-positive close are undefined
pub fn log_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    out.push(None);
    out.extend(closes.windows(2).map(|w| {
        if w[0] > 0.0 && w[1] > 0.0 {
            Some((w[1] / w[0]).ln())
        } else {
            None
        }
    }));
    out.truncate(closes.len());
    out
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Rolling sample standard deviation aligned with `series`; a value is
/// defined only when all `window` inputs ending at that index are
pub fn rolling_std(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|end| {
            if window == 0 || end + 1 < window {
                return None;
            }
            let slice = &series[end + 1 - window..=end];
            let values: Option<Vec<f64>> = slice.iter().copied().collect();
            values.and_then(|v| sample_std(&v))
        })
        .collect()
}

pub struct RealizedVolCalculator {
    config: RealizedVolConfig,
}

impl RealizedVolCalculator {
    pub fn new(config: RealizedVolConfig) -> Self {
        Self { config }
    }

    fn annualize(&self) -> f64 {
        self.config.trading_days_per_year.sqrt() * 100.0
    }

    /// Per-window series aligned with the date-sorted history up to `as_of`
    fn series<'a>(
        &self,
        history: &'a [UnderlyingQuote],
        as_of: NaiveDate,
    ) -> (Vec<&'a UnderlyingQuote>, Vec<Vec<Option<f64>>>) {
        let mut quotes: Vec<&UnderlyingQuote> = history.iter().filter(|q| q.date <= as_of).collect();
        quotes.sort_by_key(|q| q.date);

        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let returns = log_returns(&closes);
        let factor = self.annualize();
        let per_window = self
            .config
            .windows
            .iter()
            .map(|&w| {
                rolling_std(&returns, w)
                    .into_iter()
                    .map(|v| v.map(|s| s * factor))
                    .collect()
            })
            .collect();
        (quotes, per_window)
    }

    /// Rows where every configured window is defined
    pub fn table(&self, history: &[UnderlyingQuote], as_of: NaiveDate) -> Vec<RealizedVolRow> {
        let (quotes, per_window) = self.series(history, as_of);
        quotes
            .iter()
            .enumerate()
            .filter_map(|(i, q)| {
                let hv: Option<BTreeMap<usize, f64>> = self
                    .config
                    .windows
                    .iter()
                    .zip(&per_window)
                    .map(|(&w, series)| series[i].map(|v| (w, v)))
                    .collect();
                hv.map(|hv| RealizedVolRow {
                    date: q.date,
                    close: q.close,
                    hv,
                })
            })
            .collect()
    }

    /// Latest value of each window at `as_of`
    ///
    /// Windows longer than the available history are undefined while the
    /// shorter ones are still reported.
    pub fn latest(
        &self,
        history: &[UnderlyingQuote],
        as_of: NaiveDate,
        diag: &mut Diagnostics,
    ) -> RealizedVol {
        let (quotes, per_window) = self.series(history, as_of);
        if quotes.len() < 2 {
            diag.neutral(stage::REALIZED_VOL, "insufficient_history");
        }

        let windows: Vec<(usize, Option<f64>)> = self
            .config
            .windows
            .iter()
            .zip(&per_window)
            .map(|(&w, series)| (w, series.last().copied().flatten()))
            .collect();

        let undefined = windows.iter().filter(|(_, v)| v.is_none()).count();
        if undefined > 0 && quotes.len() >= 2 {
            diag.neutral(stage::REALIZED_VOL, "window_longer_than_history");
        }
        debug!(history = quotes.len(), undefined, "Realized volatility computed");
        RealizedVol { windows }
    }
}
