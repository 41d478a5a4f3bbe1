//! Bid/ask spread liquidity and the stress index
//!
//! ```text
//! spread_pct   = (ask - bid) / close * 100
//! stress_index = min(avg_spread_pct / scale * 50 + illiquid / rows * 50, 100)
//! ```
//!
//! Rows without a full quote and a positive close have a zero spread. Rows
//! at or above the artifact threshold are discarded before aggregation.

use crate::diagnostics::{stage, Diagnostics};
use common::ContractRow;
use config::LiquidityConfig;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LiquidityMetrics {
    #[serde(rename = "liquidity_avg_spread_pct")]
    pub avg_spread_pct: f64,
    #[serde(rename = "liquidity_median_spread_pct")]
    pub median_spread_pct: f64,
    #[serde(rename = "liquidity_max_spread_pct")]
    pub max_spread_pct: f64,
    #[serde(rename = "liquidity_total_volume")]
    pub total_volume: u64,
    #[serde(rename = "liquidity_avg_volume")]
    pub avg_volume: f64,
    #[serde(rename = "liquidity_illiquid_contracts")]
    pub illiquid_contracts: usize,
    #[serde(rename = "liquidity_zero_volume_contracts")]
    pub zero_volume_contracts: usize,
    #[serde(rename = "liquidity_stress_index")]
    pub stress_index: f64,
}

/// Quoted spread as a percentage of the close
pub fn spread_pct(row: &ContractRow) -> f64 {
    match (row.bid, row.ask, row.close) {
        (Some(bid), Some(ask), Some(close)) if close > 0.0 => (ask - bid) / close * 100.0,
        _ => 0.0,
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

pub struct LiquidityAnalyzer {
    config: LiquidityConfig,
}

impl LiquidityAnalyzer {
    pub fn new(config: LiquidityConfig) -> Self {
        Self { config }
    }

    /// Spread statistics over price rows. Missing volume counts as zero.
    pub fn compute(&self, prices: &[ContractRow], diag: &mut Diagnostics) -> LiquidityMetrics {
        let kept: Vec<(f64, u64)> = prices
            .iter()
            .map(|r| (spread_pct(r), r.volume.unwrap_or(0)))
            .filter(|(spread, _)| *spread < self.config.artifact_spread_pct)
            .collect();
        diag.drop_rows(stage::LIQUIDITY, "spread_artifact", prices.len() - kept.len());

        if kept.is_empty() {
            diag.neutral(stage::LIQUIDITY, "empty_input");
            return LiquidityMetrics::default();
        }

        let n = kept.len() as f64;
        let mut spreads: Vec<f64> = kept.iter().map(|(s, _)| *s).collect();
        spreads.sort_by(f64::total_cmp);

        let total_volume: u64 = kept.iter().map(|(_, v)| *v).sum();
        let avg_spread_pct = spreads.iter().sum::<f64>() / n;
        let illiquid_contracts = spreads
            .iter()
            .filter(|s| **s > self.config.illiquid_spread_pct)
            .count();

        let metrics = LiquidityMetrics {
            avg_spread_pct,
            median_spread_pct: median(&spreads),
            max_spread_pct: spreads.last().copied().unwrap_or(0.0),
            total_volume,
            avg_volume: total_volume as f64 / n,
            illiquid_contracts,
            zero_volume_contracts: kept.iter().filter(|(_, v)| *v == 0).count(),
            stress_index: self.stress_index(avg_spread_pct, illiquid_contracts, kept.len()),
        };

        debug!(
            rows = kept.len(),
            avg_spread_pct = metrics.avg_spread_pct,
            stress_index = metrics.stress_index,
            "Liquidity computed"
        );
        metrics
    }

    /// Clamped to `[0, 100]`; zero rows give zero
    pub fn stress_index(&self, avg_spread_pct: f64, illiquid: usize, rows: usize) -> f64 {
        if rows == 0 {
            return 0.0;
        }
        let spread_part = avg_spread_pct / self.config.stress_spread_scale * 50.0;
        let illiquid_part = illiquid as f64 / rows as f64 * 50.0;
        let score = spread_part + illiquid_part;
        if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Contracts meeting the minimum volume, open interest and bid
    pub fn investable_contracts(&self, merged: &[ContractRow]) -> usize {
        merged
            .iter()
            .filter(|r| {
                r.volume.map_or(false, |v| v >= self.config.min_volume)
                    && r.open_interest.map_or(false, |oi| oi >= self.config.min_open_interest)
                    && r.bid.map_or(false, |b| b >= self.config.min_bid)
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::OptionRight;

    fn quote(bid: f64, ask: f64, close: f64, volume: u64) -> ContractRow {
        let d = NaiveDate::from_ymd_opt(2025, 1, 27).unwrap();
        ContractRow::new(100.0, OptionRight::Call, d, d)
            .with_quote(bid, ask)
            .with_close(close)
            .with_volume(volume)
    }

    fn analyzer() -> LiquidityAnalyzer {
        LiquidityAnalyzer::new(LiquidityConfig::default())
    }

    #[test]
    fn test_spread_pct() {
        assert!((spread_pct(&quote(1.0, 1.1, 1.0, 1)) - 10.0).abs() < 1e-9);
        assert_eq!(spread_pct(&quote(1.0, 1.1, 0.0, 1)), 0.0);
        let d = NaiveDate::from_ymd_opt(2025, 1, 27).unwrap();
        assert_eq!(spread_pct(&ContractRow::new(1.0, OptionRight::Put, d, d).with_close(1.0)), 0.0);
    }

    #[test]
    fn test_liquidity_metrics() {
        let prices = vec![
            quote(1.00, 1.02, 1.0, 100), // 2%
            quote(1.00, 1.04, 1.0, 0),   // 4%
            quote(1.00, 1.30, 1.0, 50),  // 30%
            quote(0.10, 1.50, 1.0, 10),  // 140%, artifact
        ];
        let mut diag = Diagnostics::default();
        let m = analyzer().compute(&prices, &mut diag);

        assert_eq!(diag.dropped_count(stage::LIQUIDITY, "spread_artifact"), 1);
        assert!((m.avg_spread_pct - 12.0).abs() < 1e-9);
        assert!((m.median_spread_pct - 4.0).abs() < 1e-9);
        assert!((m.max_spread_pct - 30.0).abs() < 1e-9);
        assert_eq!(m.total_volume, 150);
        assert!((m.avg_volume - 50.0).abs() < 1e-9);
        assert_eq!(m.illiquid_contracts, 1);
        assert_eq!(m.zero_volume_contracts, 1);
        // 12 / 5 * 50 = 120, capped
        assert_eq!(m.stress_index, 100.0);
    }

    #[test]
    fn test_stress_index_bounds() {
        let a = analyzer();
        assert_eq!(a.stress_index(0.0, 0, 0), 0.0);
        assert!((a.stress_index(1.0, 1, 4) - 22.5).abs() < 1e-9);
        assert_eq!(a.stress_index(-50.0, 0, 3), 0.0);
        assert_eq!(a.stress_index(1e9, 3, 3), 100.0);

        let mut diag = Diagnostics::default();
        let empty = a.compute(&[], &mut diag);
        assert_eq!(empty.stress_index, 0.0);
        assert!(diag.has_neutral(stage::LIQUIDITY, "empty_input"));
    }

    #[test]
    fn test_investable_contracts() {
        let rows = vec![
            quote(0.50, 0.55, 0.5, 10).with_open_interest(100),
            quote(0.50, 0.55, 0.5, 4).with_open_interest(100),
            quote(0.50, 0.55, 0.5, 10).with_open_interest(9),
            quote(0.00, 0.05, 0.5, 10).with_open_interest(100),
            quote(0.50, 0.55, 0.5, 10),
        ];
        assert_eq!(analyzer().investable_contracts(&rows), 1);
    }
}
