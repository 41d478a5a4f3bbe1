//! Dealer net delta and gamma exposure
//!
//! Greeks are inner-joined with open interest. Per contract:
//!
//! ```text
//! delta_exposure = delta * open_interest * multiplier
//! gamma_exposure = gamma * open_interest * multiplier * spot
//! ```
//!
//! Net delta sums both rights as reported. Net gamma subtracts the put leg,
//! following the convention that dealers are short gamma on puts.
//!
//! Rows are matched on `(expiration, strike, right)` rather than on
//! `(strike, right)` alone, so the same strike listed in two expirations
//! never pairs Greeks from one with open interest from the other.

use crate::diagnostics::{stage, Diagnostics};
use crate::join::inner_join;
use common::ContractRow;
use config::EngineConfig;
use serde::Serialize;
use tracing::debug;

/// Aggregate dealer exposure. The default value is the all-zero result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetExposure {
    pub net_delta: f64,
    pub net_gamma: f64,
    pub net_delta_calls: f64,
    pub net_delta_puts: f64,
    pub net_gamma_calls: f64,
    pub net_gamma_puts: f64,
    pub total_oi: u64,
    pub call_oi: u64,
    pub put_oi: u64,
    pub net_gamma_billions: f64,
    pub net_delta_millions: f64,
}

pub struct ExposureCalculator {
    contract_multiplier: f64,
}

impl ExposureCalculator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            contract_multiplier: config.contract_multiplier,
        }
    }

    pub fn net_exposure(
        &self,
        greeks: &[ContractRow],
        open_interest: &[ContractRow],
        spot: f64,
        diag: &mut Diagnostics,
    ) -> NetExposure {
        if greeks.is_empty() || open_interest.is_empty() {
            diag.neutral(stage::NET_EXPOSURE, "empty_input");
            return NetExposure::default();
        }

        let joined = inner_join(greeks, open_interest);
        diag.drop_rows(stage::NET_EXPOSURE, "unmatched_greeks", joined.unmatched_left);
        diag.drop_rows(stage::NET_EXPOSURE, "unmatched_open_interest", joined.unmatched_right);
        if joined.rows.is_empty() {
            diag.neutral(stage::NET_EXPOSURE, "empty_join");
            return NetExposure::default();
        }

        let mut out = NetExposure::default();
        let mut missing_greeks = 0usize;
        let mut non_positive_oi = 0usize;

        for row in &joined.rows {
            let (Some(delta), Some(gamma)) = (row.delta, row.gamma) else {
                missing_greeks += 1;
                continue;
            };
            let oi = match row.open_interest {
                Some(oi) if oi > 0 => oi,
                _ => {
                    non_positive_oi += 1;
                    continue;
                }
            };

            let contracts = oi as f64 * self.contract_multiplier;
            let delta_exposure = delta * contracts;
            let gamma_exposure = gamma * contracts * spot;

            out.total_oi += oi;
            if row.is_call() {
                out.net_delta_calls += delta_exposure;
                out.net_gamma_calls += gamma_exposure;
                out.call_oi += oi;
            } else {
                out.net_delta_puts += delta_exposure;
                out.net_gamma_puts += gamma_exposure;
                out.put_oi += oi;
            }
        }

        diag.drop_rows(stage::NET_EXPOSURE, "missing_greeks", missing_greeks);
        diag.drop_rows(stage::NET_EXPOSURE, "non_positive_oi", non_positive_oi);

        out.net_delta = out.net_delta_calls + out.net_delta_puts;
        out.net_gamma = out.net_gamma_calls - out.net_gamma_puts;
        out.net_gamma_billions = out.net_gamma / 1e9;
        out.net_delta_millions = out.net_delta / 1e6;

        debug!(
            net_delta = out.net_delta,
            net_gamma = out.net_gamma,
            total_oi = out.total_oi,
            "Net exposure computed"
        );
        out
    }
}
