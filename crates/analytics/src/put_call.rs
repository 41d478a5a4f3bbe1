//! Put/call ratios and sentiment
//!
//! Price rows are left-joined with Greeks and then with open interest, so
//! every traded contract counts even when its Greeks or OI are missing.
//! Denominators are floored at 1.

use crate::diagnostics::{stage, Diagnostics};
use crate::join::left_join;
use common::ContractRow;
use config::{EngineConfig, PutCallConfig};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Bearish,
    Bullish,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Classify a put/call volume ratio
    pub fn classify(pc_volume: f64, config: &PutCallConfig) -> Self {
        if pc_volume > config.bearish_above {
            Sentiment::Bearish
        } else if pc_volume < config.bullish_below {
            Sentiment::Bullish
        } else {
            Sentiment::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PutCallRatios {
    pub pc_volume: f64,
    pub pc_oi: f64,
    /// Undefined when no row carries both a close and a volume
    pub pc_premium: Option<f64>,
    /// Undefined when no row carries both a delta and open interest
    pub pc_delta: Option<f64>,
    pub sentiment: Sentiment,
}

#[derive(Default)]
struct SideTotals {
    volume: f64,
    open_interest: f64,
    premium: f64,
    delta_oi: f64,
}

/// Merge prices with Greeks and open interest, keeping every price row
pub fn merge_chain(
    prices: &[ContractRow],
    greeks: &[ContractRow],
    open_interest: &[ContractRow],
) -> Vec<ContractRow> {
    let with_greeks = left_join(prices, greeks);
    left_join(&with_greeks.rows, open_interest).rows
}

pub struct PutCallAnalyzer {
    config: PutCallConfig,
    contract_multiplier: f64,
}

impl PutCallAnalyzer {
    pub fn new(config: PutCallConfig, engine: &EngineConfig) -> Self {
        Self {
            config,
            contract_multiplier: engine.contract_multiplier,
        }
    }

    /// Ratios over already merged price rows (see [`merge_chain`])
    pub fn compute(&self, merged: &[ContractRow], diag: &mut Diagnostics) -> PutCallRatios {
        if merged.is_empty() {
            diag.neutral(stage::PUT_CALL, "empty_input");
            return PutCallRatios::default();
        }

        let mut puts = SideTotals::default();
        let mut calls = SideTotals::default();
        let mut has_premium = false;
        let mut has_delta = false;

        for row in merged {
            let side = if row.is_put() { &mut puts } else { &mut calls };
            side.volume += row.volume.unwrap_or(0) as f64;
            side.open_interest += row.open_interest.unwrap_or(0) as f64;
            if let (Some(close), Some(volume)) = (row.close, row.volume) {
                side.premium += close * volume as f64 * self.contract_multiplier;
                has_premium = true;
            }
            if let (Some(delta), Some(oi)) = (row.delta, row.open_interest) {
                side.delta_oi += delta.abs() * oi as f64;
                has_delta = true;
            }
        }

        let pc_volume = floored_ratio(puts.volume, calls.volume);
        let ratios = PutCallRatios {
            pc_volume,
            pc_oi: floored_ratio(puts.open_interest, calls.open_interest),
            pc_premium: has_premium.then(|| floored_ratio(puts.premium, calls.premium)),
            pc_delta: has_delta.then(|| floored_ratio(puts.delta_oi, calls.delta_oi)),
            sentiment: Sentiment::classify(pc_volume, &self.config),
        };

        debug!(
            pc_volume = ratios.pc_volume,
            pc_oi = ratios.pc_oi,
            sentiment = ?ratios.sentiment,
            "Put/call ratios computed"
        );
        ratios
    }
}

fn floored_ratio(numerator: f64, denominator: f64) -> f64 {
    numerator / denominator.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::OptionRight;

    fn obs() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 27).unwrap()
    }

    fn exp() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
    }

    fn analyzer() -> PutCallAnalyzer {
        PutCallAnalyzer::new(PutCallConfig::default(), &EngineConfig::default())
    }

    #[test]
    fn test_sentiment_thresholds() {
        let cfg = PutCallConfig::default();
        assert_eq!(Sentiment::classify(1.8, &cfg), Sentiment::Bearish);
        assert_eq!(Sentiment::classify(0.5, &cfg), Sentiment::Bullish);
        assert_eq!(Sentiment::classify(1.0, &cfg), Sentiment::Neutral);
        assert_eq!(Sentiment::classify(1.5, &cfg), Sentiment::Neutral);
        assert_eq!(Sentiment::classify(0.7, &cfg), Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Sentiment::Bearish).unwrap(), "\"BEARISH\"");
    }

    #[test]
    fn test_ratios_over_merged_chain() {
        let prices = vec![
            ContractRow::new(100.0, OptionRight::Put, exp(), obs()).with_close(2.0).with_volume(300),
            ContractRow::new(100.0, OptionRight::Call, exp(), obs()).with_close(1.0).with_volume(200),
            ContractRow::new(110.0, OptionRight::Call, exp(), obs()).with_volume(0),
        ];
        let greeks = vec![
            ContractRow::new(100.0, OptionRight::Put, exp(), obs()).with_delta(-0.4),
            ContractRow::new(100.0, OptionRight::Call, exp(), obs()).with_delta(0.6),
        ];
        let oi = vec![
            ContractRow::new(100.0, OptionRight::Put, exp(), obs()).with_open_interest(500),
            ContractRow::new(100.0, OptionRight::Call, exp(), obs()).with_open_interest(250),
        ];

        let merged = merge_chain(&prices, &greeks, &oi);
        assert_eq!(merged.len(), 3);

        let mut diag = Diagnostics::default();
        let r = analyzer().compute(&merged, &mut diag);
        assert!((r.pc_volume - 1.5).abs() < 1e-12);
        assert!((r.pc_oi - 2.0).abs() < 1e-12);
        // 2.0 * 300 * 100 / (1.0 * 200 * 100)
        assert!((r.pc_premium.unwrap() - 3.0).abs() < 1e-12);
        // 0.4 * 500 / (0.6 * 250)
        assert!((r.pc_delta.unwrap() - 200.0 / 150.0).abs() < 1e-12);
        assert_eq!(r.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_denominator_floor() {
        let prices = vec![ContractRow::new(100.0, OptionRight::Put, exp(), obs()).with_volume(5)];
        let mut diag = Diagnostics::default();
        let r = analyzer().compute(&prices, &mut diag);
        assert_eq!(r.pc_volume, 5.0);
        assert_eq!(r.pc_oi, 0.0);
        assert_eq!(r.pc_premium, None);
        assert_eq!(r.pc_delta, None);
        assert_eq!(r.sentiment, Sentiment::Bearish);
    }

    #[test]
    fn test_empty_prices() {
        let mut diag = Diagnostics::default();
        let r = analyzer().compute(&[], &mut diag);
        assert_eq!(r, PutCallRatios::default());
        assert_eq!(r.sentiment, Sentiment::Neutral);
        assert!(diag.has_neutral(stage::PUT_CALL, "empty_input"));
    }
}
