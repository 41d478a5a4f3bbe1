//! Structured data-quality reporting
//!
//! Calculators never fail. When they drop rows or fall back to a neutral
//! value they say so here, and every entry is mirrored to a Prometheus
//! counter and a `debug!` event.

use observability::EngineMetrics;
use serde::Serialize;
use tracing::debug;

/// Stage labels used in diagnostics and metric labels
pub mod stage {
    pub const NET_EXPOSURE: &str = "net_exposure";
    pub const GEX: &str = "gex";
    pub const SKEW: &str = "skew";
    pub const TERM_STRUCTURE: &str = "term_structure";
    pub const PUT_CALL: &str = "put_call";
    pub const LIQUIDITY: &str = "liquidity";
    pub const REALIZED_VOL: &str = "realized_vol";
}

/// Rows excluded by one stage for one reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropRecord {
    pub stage: &'static str,
    pub reason: &'static str,
    pub count: u64,
}

/// A metric group returned as its documented neutral value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeutralResult {
    pub stage: &'static str,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub dropped: Vec<DropRecord>,
    pub neutral: Vec<NeutralResult>,
    #[serde(skip)]
    metrics: EngineMetrics,
}

impl Diagnostics {
    pub fn new(metrics: EngineMetrics) -> Self {
        Self {
            dropped: Vec::new(),
            neutral: Vec::new(),
            metrics,
        }
    }

    /// Record `count` rows dropped. Zero counts are ignored.
    pub fn drop_rows(&mut self, stage: &'static str, reason: &'static str, count: usize) {
        if count == 0 {
            return;
        }
        let count = count as u64;
        debug!(stage, reason, count, "Rows dropped");
        self.metrics.rows_dropped(stage, reason, count);

        match self
            .dropped
            .iter_mut()
            .find(|d| d.stage == stage && d.reason == reason)
        {
            Some(existing) => existing.count += count,
            None => self.dropped.push(DropRecord { stage, reason, count }),
        }
    }

    pub fn neutral(&mut self, stage: &'static str, reason: &'static str) {
        debug!(stage, reason, "Neutral result");
        self.metrics.neutral_result(stage, reason);
        self.neutral.push(NeutralResult { stage, reason });
    }

    pub fn dropped_count(&self, stage: &str, reason: &str) -> u64 {
        self.dropped
            .iter()
            .filter(|d| d.stage == stage && d.reason == reason)
            .map(|d| d.count)
            .sum()
    }

    pub fn has_neutral(&self, stage: &str, reason: &str) -> bool {
        self.neutral
            .iter()
            .any(|n| n.stage == stage && n.reason == reason)
    }

    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty() && self.neutral.is_empty()
    }
}
