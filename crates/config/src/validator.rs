use crate::*;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a positive number")]
    InvalidPositiveFloat { field: String },

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("Skew: {message}")]
    InvalidSkew { message: String },

    #[error("No term structure buckets defined")]
    NoDteBuckets,

    #[error("Duplicate term structure bucket for target {0} DTE")]
    DuplicateDteBucket(u32),

    #[error("Term spread leg {field} = {dte} does not match any bucket target")]
    UnknownSpreadLeg { field: String, dte: u32 },

    #[error("Put/call: bullish_below ({bullish}) must be lower than bearish_above ({bearish})")]
    InvertedSentimentThresholds { bullish: f64, bearish: f64 },

    #[error("Liquidity: {message}")]
    InvalidLiquidity { message: String },

    #[error("No realized volatility windows defined")]
    NoVolWindows,

    #[error("Realized volatility window {0} is too short, need at least 2 returns")]
    VolWindowTooShort(usize),
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &AnalyticsConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_engine(&config.engine, &config.normalizer, &mut report);
    validate_skew(&config.skew, &mut report);
    validate_term_structure(&config.term_structure, &mut report);
    validate_put_call(&config.put_call, &mut report);
    validate_liquidity(&config.liquidity, &mut report);
    validate_realized_vol(&config.realized_vol, &mut report);

    report
}

fn validate_engine(engine: &EngineConfig, normalizer: &NormalizerConfig, report: &mut ValidationReport) {
    if !(engine.contract_multiplier > 0.0) {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "engine.contract_multiplier".to_string(),
        });
    }

    if !(normalizer.milli_strike_threshold > 0.0) {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "normalizer.milli_strike_threshold".to_string(),
        });
    }

    if !(normalizer.milli_strike_divisor > 0.0) {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "normalizer.milli_strike_divisor".to_string(),
        });
    }
}

fn validate_skew(skew: &SkewConfig, report: &mut ValidationReport) {
    for (field, value) in [
        ("atm_delta", skew.atm_delta),
        ("wing_delta", skew.wing_delta),
        ("tail_delta", skew.tail_delta),
    ] {
        if !(value > 0.0 && value < 1.0) {
            report.add_error(ValidationError::InvalidSkew {
                message: format!("{} must be between 0 and 1, got: {}", field, value),
            });
        }
    }

    if !(skew.tail_delta < skew.wing_delta && skew.wing_delta < skew.atm_delta) {
        report.add_error(ValidationError::InvalidSkew {
            message: "deltas must be ordered tail_delta < wing_delta < atm_delta".to_string(),
        });
    }
}

fn validate_term_structure(ts: &TermStructureConfig, report: &mut ValidationReport) {
    if ts.buckets.is_empty() {
        report.add_error(ValidationError::NoDteBuckets);
        return;
    }

    let mut seen = HashSet::new();
    for bucket in &ts.buckets {
        if !seen.insert(bucket.target_dte) {
            report.add_error(ValidationError::DuplicateDteBucket(bucket.target_dte));
        }
    }

    for (field, dte) in [
        ("spread_short_dte", ts.spread_short_dte),
        ("spread_long_dte", ts.spread_long_dte),
    ] {
        if !seen.contains(&dte) {
            report.add_error(ValidationError::UnknownSpreadLeg {
                field: format!("term_structure.{}", field),
                dte,
            });
        }
    }

    let mut sorted: Vec<DteBucket> = ts.buckets.clone();
    sorted.sort_by_key(|b| b.target_dte);
    for pair in sorted.windows(2) {
        let (_, prev_hi) = pair[0].window();
        let (next_lo, _) = pair[1].window();
        if next_lo <= prev_hi {
            report.add_warning(
                "term_structure.buckets",
                &format!(
                    "Buckets {} and {} DTE overlap; one expiration may serve both",
                    pair[0].target_dte, pair[1].target_dte
                ),
            );
        }
    }
}

fn validate_put_call(pc: &PutCallConfig, report: &mut ValidationReport) {
    if !(pc.bullish_below < pc.bearish_above) {
        report.add_error(ValidationError::InvertedSentimentThresholds {
            bullish: pc.bullish_below,
            bearish: pc.bearish_above,
        });
    }
}

fn validate_liquidity(liq: &LiquidityConfig, report: &mut ValidationReport) {
    for (field, value) in [
        ("liquidity.illiquid_spread_pct", liq.illiquid_spread_pct),
        ("liquidity.artifact_spread_pct", liq.artifact_spread_pct),
        ("liquidity.stress_spread_scale", liq.stress_spread_scale),
    ] {
        if !(value > 0.0) {
            report.add_error(ValidationError::InvalidPositiveFloat {
                field: field.to_string(),
            });
        }
    }

    if liq.illiquid_spread_pct >= liq.artifact_spread_pct {
        report.add_error(ValidationError::InvalidLiquidity {
            message: format!(
                "illiquid_spread_pct ({}) must be below artifact_spread_pct ({})",
                liq.illiquid_spread_pct, liq.artifact_spread_pct
            ),
        });
    }

    if liq.min_bid < 0.0 {
        report.add_error(ValidationError::InvalidLiquidity {
            message: format!("min_bid must not be negative, got: {}", liq.min_bid),
        });
    }
}

fn validate_realized_vol(rv: &RealizedVolConfig, report: &mut ValidationReport) {
    if rv.windows.is_empty() {
        report.add_error(ValidationError::NoVolWindows);
    }

    for &window in &rv.windows {
        if window < 2 {
            report.add_error(ValidationError::VolWindowTooShort(window));
        } else if window as f64 > rv.trading_days_per_year {
            report.add_warning(
                "realized_vol.windows",
                &format!("Window {} is longer than one trading year", window),
            );
        }
    }

    if !(rv.trading_days_per_year > 0.0) {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "realized_vol.trading_days_per_year".to_string(),
        });
    }

    if rv.iv_spread_window == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "realized_vol.iv_spread_window".to_string(),
        });
    } else if !rv.windows.contains(&rv.iv_spread_window) {
        report.add_warning(
            "realized_vol.iv_spread_window",
            &format!(
                "Window {} is not computed; iv_hv_spread will be undefined",
                rv.iv_spread_window
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_config_is_valid() {
        let report = validate_config(&AnalyticsConfig::default());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unordered_deltas() {
        let mut config = AnalyticsConfig::default();
        config.skew.tail_delta = 0.3;
        let report = validate_config(&config);
        assert!(!report.is_valid());
        assert_matches!(report.errors[0], ValidationError::InvalidSkew { .. });
    }

    #[test]
    fn test_duplicate_bucket_and_unknown_leg() {
        let mut config = AnalyticsConfig::default();
        config.term_structure.buckets = vec![
            DteBucket { target_dte: 7, tolerance: 2 },
            DteBucket { target_dte: 7, tolerance: 3 },
        ];
        let report = validate_config(&config);
        assert!(report.errors.contains(&ValidationError::DuplicateDteBucket(7)));
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownSpreadLeg { dte: 60, .. })));
    }

    #[test]
    fn test_overlapping_buckets_warn() {
        let mut config = AnalyticsConfig::default();
        config.term_structure.buckets.push(DteBucket { target_dte: 10, tolerance: 2 });
        let report = validate_config(&config);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.field == "term_structure.buckets"));
    }

    #[test]
    fn test_inverted_sentiment() {
        let mut config = AnalyticsConfig::default();
        config.put_call.bullish_below = 2.0;
        let report = validate_config(&config);
        assert_matches!(
            report.errors[0],
            ValidationError::InvertedSentimentThresholds { .. }
        );
    }

    #[test]
    fn test_vol_windows() {
        let mut config = AnalyticsConfig::default();
        config.realized_vol.windows = vec![1, 500];
        let report = validate_config(&config);
        assert!(report.errors.contains(&ValidationError::VolWindowTooShort(1)));
        assert!(report.warnings.iter().any(|w| w.message.contains("500")));
        // iv_spread_window 20 is no longer computed
        assert!(report
            .warnings
            .iter()
            .any(|w| w.field == "realized_vol.iv_spread_window"));

        config.realized_vol.windows.clear();
        let report = validate_config(&config);
        assert!(report.errors.contains(&ValidationError::NoVolWindows));
    }
}
