//! Implied-volatility skew from one chain slice
//!
//! All values are interpolated at fixed absolute deltas on each side of
//! the smile. Any value that cannot be interpolated is undefined, and
//! derived values are undefined whenever one of their inputs is.

use crate::diagnostics::{stage, Diagnostics};
use crate::interpolation::{interpolate_iv_at_delta, smile_points};
use common::{ContractRow, OptionRight};
use config::SkewConfig;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SkewMetrics {
    pub iv_atm: Option<f64>,
    pub iv_25d_put: Option<f64>,
    pub iv_25d_call: Option<f64>,
    pub rr25: Option<f64>,
    pub iv_10d_put: Option<f64>,
    pub bf25: Option<f64>,
}

/// 25-delta risk reversal: put wing minus call wing
pub fn risk_reversal(put: Option<f64>, call: Option<f64>) -> Option<f64> {
    Some(put? - call?)
}

/// 25-delta butterfly: average wing minus ATM
pub fn butterfly(put: Option<f64>, call: Option<f64>, atm: Option<f64>) -> Option<f64> {
    Some((put? + call?) / 2.0 - atm?)
}

/// Mean of the defined values, undefined when none are
pub fn mean_defined(values: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

#[derive(Debug, Clone)]
pub struct SkewEngine {
    config: SkewConfig,
}

impl SkewEngine {
    pub fn new(config: SkewConfig) -> Self {
        Self { config }
    }

    /// Skew over `rows`, recording empty input and unusable rows
    pub fn compute(&self, rows: &[ContractRow], diag: &mut Diagnostics) -> SkewMetrics {
        if rows.is_empty() {
            diag.neutral(stage::SKEW, "empty_input");
            return SkewMetrics::default();
        }

        let calls = smile_points(rows, OptionRight::Call);
        let puts = smile_points(rows, OptionRight::Put);
        diag.drop_rows(stage::SKEW, "unusable_smile_point", rows.len() - calls.len() - puts.len());

        let metrics = self.from_points(&calls, &puts);
        if metrics.rr25.is_none() {
            diag.neutral(stage::SKEW, "rr25_undefined");
        }
        metrics
    }

    /// Skew over `rows` without diagnostics
    pub fn compute_slice(&self, rows: &[ContractRow]) -> SkewMetrics {
        let calls = smile_points(rows, OptionRight::Call);
        let puts = smile_points(rows, OptionRight::Put);
        self.from_points(&calls, &puts)
    }

    fn from_points(&self, calls: &[(f64, f64)], puts: &[(f64, f64)]) -> SkewMetrics {
        let cfg = &self.config;

        let iv_atm_call = interpolate_iv_at_delta(calls, cfg.atm_delta);
        let iv_atm_put = interpolate_iv_at_delta(puts, cfg.atm_delta);
        let iv_atm = mean_defined(&[iv_atm_call, iv_atm_put]);

        let iv_25d_put = interpolate_iv_at_delta(puts, cfg.wing_delta);
        let iv_25d_call = interpolate_iv_at_delta(calls, cfg.wing_delta);
        let iv_10d_put = interpolate_iv_at_delta(puts, cfg.tail_delta);

        SkewMetrics {
            iv_atm,
            iv_25d_put,
            iv_25d_call,
            rr25: risk_reversal(iv_25d_put, iv_25d_call),
            iv_10d_put,
            bf25: butterfly(iv_25d_put, iv_25d_call, iv_atm),
        }
    }
}
