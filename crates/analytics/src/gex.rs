//! Gamma exposure distribution by strike
//!
//! Per contract `gex = gamma * open_interest * multiplier * spot`, negated
//! for puts, then summed per strike across every expiration. The call wall
//! is the strike with the largest positive total, the put wall the strike
//! with the most negative total. Ties go to the lowest strike.
//!
//! Greeks and open interest are matched on `(expiration, strike, right)`,
//! not `(strike, right)` alone; expirations merge only when summing per strike.

use crate::diagnostics::{stage, Diagnostics};
use crate::join::inner_join;
use common::ContractRow;
use config::EngineConfig;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GexBucket {
    pub strike: f64,
    #[serde(rename = "gex")]
    pub signed_gamma_exposure: f64,
    #[serde(rename = "open_interest")]
    pub open_interest_sum: u64,
    pub is_call_wall: bool,
    pub is_put_wall: bool,
    pub spot_price: f64,
    pub distance_to_spot: f64,
    pub gex_billions: f64,
}

/// Per-strike table, sorted by strike ascending
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GexDistribution {
    pub buckets: Vec<GexBucket>,
}

impl GexDistribution {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn call_wall(&self) -> Option<f64> {
        self.buckets.iter().find(|b| b.is_call_wall).map(|b| b.strike)
    }

    pub fn put_wall(&self) -> Option<f64> {
        self.buckets.iter().find(|b| b.is_put_wall).map(|b| b.strike)
    }

    pub fn bucket(&self, strike: f64) -> Option<&GexBucket> {
        self.buckets.iter().find(|b| b.strike == strike)
    }

    /// Build the table from per-strike totals and flag the walls
    pub fn from_strike_totals<I>(totals: I, spot: f64) -> Self
    where
        I: IntoIterator<Item = (f64, f64, u64)>,
    {
        let mut by_strike: BTreeMap<OrderedFloat<f64>, (f64, u64)> = BTreeMap::new();
        for (strike, gex, oi) in totals {
            let entry = by_strike.entry(OrderedFloat(strike)).or_insert((0.0, 0));
            entry.0 += gex;
            entry.1 += oi;
        }

        let mut buckets: Vec<GexBucket> = by_strike
            .into_iter()
            .map(|(strike, (gex, oi))| GexBucket {
                strike: strike.0,
                signed_gamma_exposure: gex,
                open_interest_sum: oi,
                is_call_wall: false,
                is_put_wall: false,
                spot_price: spot,
                distance_to_spot: strike.0 - spot,
                gex_billions: gex / 1e9,
            })
            .collect();

        // strict comparisons keep the lowest strike on ties
        let mut max_idx: Option<usize> = None;
        let mut min_idx: Option<usize> = None;
        for (i, b) in buckets.iter().enumerate() {
            let gex = b.signed_gamma_exposure;
            if max_idx.map_or(true, |m| gex > buckets[m].signed_gamma_exposure) {
                max_idx = Some(i);
            }
            if min_idx.map_or(true, |m| gex < buckets[m].signed_gamma_exposure) {
                min_idx = Some(i);
            }
        }
        if let Some(i) = max_idx.filter(|&i| buckets[i].signed_gamma_exposure > 0.0) {
            buckets[i].is_call_wall = true;
        }
        if let Some(i) = min_idx.filter(|&i| buckets[i].signed_gamma_exposure < 0.0) {
            buckets[i].is_put_wall = true;
        }

        Self { buckets }
    }
}

pub struct GexBuilder {
    contract_multiplier: f64,
}

impl GexBuilder {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            contract_multiplier: config.contract_multiplier,
        }
    }

    /// Rows lacking gamma or open interest contribute zero to their strike
    pub fn build(
        &self,
        greeks: &[ContractRow],
        open_interest: &[ContractRow],
        spot: f64,
        diag: &mut Diagnostics,
    ) -> GexDistribution {
        let joined = inner_join(greeks, open_interest);
        diag.drop_rows(stage::GEX, "unmatched_greeks", joined.unmatched_left);
        diag.drop_rows(stage::GEX, "unmatched_open_interest", joined.unmatched_right);
        if joined.rows.is_empty() {
            diag.neutral(stage::GEX, "empty_join");
            return GexDistribution::default();
        }

        let mut incomplete = 0usize;
        let totals: Vec<(f64, f64, u64)> = joined
            .rows
            .iter()
            .map(|row| {
                let oi = row.open_interest.unwrap_or(0);
                let gex = match (row.gamma, row.open_interest) {
                    (Some(gamma), Some(oi)) => {
                        let gex = gamma * oi as f64 * self.contract_multiplier * spot;
                        if row.is_put() {
                            -gex
                        } else {
                            gex
                        }
                    }
                    _ => {
                        incomplete += 1;
                        0.0
                    }
                };
                (row.strike, gex, oi)
            })
            .collect();
        diag.drop_rows(stage::GEX, "missing_gamma_or_oi", incomplete);

        let dist = GexDistribution::from_strike_totals(totals, spot);
        debug!(
            strikes = dist.len(),
            call_wall = ?dist.call_wall(),
            put_wall = ?dist.put_wall(),
            "GEX distribution built"
        );
        dist
    }
}
