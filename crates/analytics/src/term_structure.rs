//! Skew term structure across fixed maturity buckets
//!
//! For each configured bucket the expiration closest to the target DTE
//! within the bucket's tolerance window is selected, its rows are passed
//! through a liquidity filter and the skew is recomputed on that slice.
//! Equidistant expirations resolve to the earlier one.

use crate::diagnostics::{stage, Diagnostics};
use crate::skew::SkewEngine;
use chrono::NaiveDate;
use common::ContractRow;
use config::{DteBucket, TermStructureConfig};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

/// Skew measured at one maturity bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermBucketMetrics {
    pub target_dte: u32,
    /// DTE of the selected expiration, undefined when none fell in the window
    pub actual_dte: Option<u32>,
    pub expiration: Option<NaiveDate>,
    pub rr25: Option<f64>,
    pub iv_atm: Option<f64>,
    /// Rows of the selected expiration that passed the liquidity filter
    pub contracts_used: usize,
}

impl TermBucketMetrics {
    fn empty(target_dte: u32) -> Self {
        Self {
            target_dte,
            actual_dte: None,
            expiration: None,
            rr25: None,
            iv_atm: None,
            contracts_used: 0,
        }
    }
}

/// Per-bucket skew plus cross-maturity spreads
///
/// Serializes flat as `rr25_{n}dte`, `iv_atm_{n}dte`, `actual_dte_{n}`,
/// `rr25_term_spread` and `iv_term_spread`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermStructure {
    pub buckets: Vec<TermBucketMetrics>,
    pub rr25_term_spread: Option<f64>,
    pub iv_term_spread: Option<f64>,
}

impl TermStructure {
    pub fn bucket(&self, target_dte: u32) -> Option<&TermBucketMetrics> {
        self.buckets.iter().find(|b| b.target_dte == target_dte)
    }

    pub fn rr25(&self, target_dte: u32) -> Option<f64> {
        self.bucket(target_dte).and_then(|b| b.rr25)
    }

    pub fn iv_atm(&self, target_dte: u32) -> Option<f64> {
        self.bucket(target_dte).and_then(|b| b.iv_atm)
    }
}

impl Serialize for TermStructure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len() * 3 + 2))?;
        for b in &self.buckets {
            map.serialize_entry(&format!("rr25_{}dte", b.target_dte), &b.rr25)?;
            map.serialize_entry(&format!("iv_atm_{}dte", b.target_dte), &b.iv_atm)?;
            map.serialize_entry(&format!("actual_dte_{}", b.target_dte), &b.actual_dte)?;
        }
        map.serialize_entry("rr25_term_spread", &self.rr25_term_spread)?;
        map.serialize_entry("iv_term_spread", &self.iv_term_spread)?;
        map.end()
    }
}

/// Rows liquid enough to trust for a per-maturity skew
pub fn is_liquid(row: &ContractRow) -> bool {
    row.implied_vol_pct.map_or(false, |iv| iv > 0.0)
        && row.delta.is_some()
        && row.volume.map_or(false, |v| v > 0)
        && row.bid.map_or(false, |b| b > 0.0)
}

/// Expiration closest to the bucket target within its window
pub fn nearest_expiration(rows: &[ContractRow], bucket: &DteBucket) -> Option<(NaiveDate, u32)> {
    rows.iter()
        .filter(|r| bucket.contains(r.days_to_expiration))
        .map(|r| (r.days_to_expiration.abs_diff(bucket.target_dte), r.expiration, r.days_to_expiration))
        .min_by_key(|(diff, expiration, _)| (*diff, *expiration))
        .map(|(_, expiration, dte)| (expiration, dte))
}

#[derive(Debug, Clone)]
pub struct TermStructureEngine {
    config: TermStructureConfig,
    skew: SkewEngine,
}

impl TermStructureEngine {
    pub fn new(config: TermStructureConfig, skew: SkewEngine) -> Self {
        Self { config, skew }
    }

    pub fn compute(&self, greeks: &[ContractRow], diag: &mut Diagnostics) -> TermStructure {
        let buckets: Vec<TermBucketMetrics> = self
            .config
            .buckets
            .iter()
            .map(|bucket| self.compute_bucket(greeks, bucket, diag))
            .collect();

        let mut ts = TermStructure {
            buckets,
            ..Default::default()
        };
        let (short, long) = (self.config.spread_short_dte, self.config.spread_long_dte);
        ts.rr25_term_spread = spread(ts.rr25(long), ts.rr25(short));
        ts.iv_term_spread = spread(ts.iv_atm(long), ts.iv_atm(short));
        ts
    }

    fn compute_bucket(
        &self,
        greeks: &[ContractRow],
        bucket: &DteBucket,
        diag: &mut Diagnostics,
    ) -> TermBucketMetrics {
        let Some((expiration, actual_dte)) = nearest_expiration(greeks, bucket) else {
            debug!(target_dte = bucket.target_dte, "No expiration within tolerance");
            diag.neutral(stage::TERM_STRUCTURE, "no_expiration_in_window");
            return TermBucketMetrics::empty(bucket.target_dte);
        };

        let slice: Vec<ContractRow> = greeks
            .iter()
            .filter(|r| r.expiration == expiration)
            .cloned()
            .collect();
        let liquid: Vec<ContractRow> = slice.iter().filter(|r| is_liquid(r)).cloned().collect();
        diag.drop_rows(stage::TERM_STRUCTURE, "illiquid", slice.len() - liquid.len());

        let skew = self.skew.compute_slice(&liquid);
        debug!(
            target_dte = bucket.target_dte,
            actual_dte,
            %expiration,
            contracts = liquid.len(),
            rr25 = ?skew.rr25,
            "Term bucket selected"
        );
        if skew.rr25.is_none() {
            diag.neutral(stage::TERM_STRUCTURE, "rr25_undefined");
        }

        TermBucketMetrics {
            target_dte: bucket.target_dte,
            actual_dte: Some(actual_dte),
            expiration: Some(expiration),
            rr25: skew.rr25,
            iv_atm: skew.iv_atm,
            contracts_used: liquid.len(),
        }
    }
}

fn spread(long: Option<f64>, short: Option<f64>) -> Option<f64> {
    Some(long? - short?)
}
