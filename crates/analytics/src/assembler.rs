//! Metrics assembly for one symbol and date
//!
//! Runs every calculator over a [`ChainSnapshot`] and merges the results
//! into one [`MetricsRecord`]. Each metric group is computed independently,
//! so a group that falls back to its neutral value never affects another.

use crate::diagnostics::Diagnostics;
use crate::exposure::ExposureCalculator;
use crate::gex::{GexBuilder, GexDistribution};
use crate::liquidity::LiquidityAnalyzer;
use crate::put_call::{merge_chain, PutCallAnalyzer};
use crate::realized_vol::RealizedVolCalculator;
use crate::record::{iv_hv_spread, MetricsRecord, SpotFields};
use crate::skew::SkewEngine;
use crate::term_structure::TermStructureEngine;
use common::ChainSnapshot;
use config::AnalyticsConfig;
use observability::EngineMetrics;
use serde::Serialize;
use tracing::{info, instrument};

/// Everything produced for one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct AssembledMetrics {
    pub record: MetricsRecord,
    pub gex: GexDistribution,
    pub diagnostics: Diagnostics,
}

pub struct MetricsAssembler {
    config: AnalyticsConfig,
    metrics: EngineMetrics,
    exposure: ExposureCalculator,
    gex: GexBuilder,
    skew: SkewEngine,
    term_structure: TermStructureEngine,
    put_call: PutCallAnalyzer,
    liquidity: LiquidityAnalyzer,
    realized_vol: RealizedVolCalculator,
}

impl MetricsAssembler {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self::with_metrics(config, EngineMetrics::new())
    }

    pub fn with_metrics(config: AnalyticsConfig, metrics: EngineMetrics) -> Self {
        let skew = SkewEngine::new(config.skew.clone());
        Self {
            exposure: ExposureCalculator::new(&config.engine),
            gex: GexBuilder::new(&config.engine),
            term_structure: TermStructureEngine::new(config.term_structure.clone(), skew.clone()),
            skew,
            put_call: PutCallAnalyzer::new(config.put_call.clone(), &config.engine),
            liquidity: LiquidityAnalyzer::new(config.liquidity.clone()),
            realized_vol: RealizedVolCalculator::new(config.realized_vol.clone()),
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    #[instrument(skip(self, snapshot), fields(symbol = %snapshot.symbol, date = %snapshot.date))]
    pub fn assemble(&self, snapshot: &ChainSnapshot) -> AssembledMetrics {
        let _timer = self.metrics.start_assembly();
        let mut diag = Diagnostics::new(self.metrics.clone());
        let spot = snapshot.spot.close;

        let mut record = MetricsRecord::new(
            snapshot.symbol.clone(),
            snapshot.date,
            SpotFields::from(&snapshot.spot),
        );
        record.expiration_count = snapshot.expiration_count();

        record.exposure =
            self.exposure
                .net_exposure(&snapshot.greeks, &snapshot.open_interest, spot, &mut diag);

        // global skew blends every expiration
        record.skew = self.skew.compute(&snapshot.greeks, &mut diag);
        record.term_structure = self.term_structure.compute(&snapshot.greeks, &mut diag);

        let merged = merge_chain(&snapshot.prices, &snapshot.greeks, &snapshot.open_interest);
        record.put_call = self.put_call.compute(&merged, &mut diag);

        let gex = self
            .gex
            .build(&snapshot.greeks, &snapshot.open_interest, spot, &mut diag);
        record.top_call_wall = gex.call_wall();
        record.top_put_wall = gex.put_wall();

        record.liquidity = self.liquidity.compute(&snapshot.prices, &mut diag);
        record.investable_contracts = self.liquidity.investable_contracts(&merged);

        record.realized_vol = self
            .realized_vol
            .latest(&snapshot.history, snapshot.date, &mut diag);
        record.iv_hv_spread = iv_hv_spread(
            record.skew.iv_atm,
            record.realized_vol.window(self.config.realized_vol.iv_spread_window),
        );

        info!(
            net_gamma_billions = record.exposure.net_gamma_billions,
            rr25 = ?record.skew.rr25,
            pc_volume = record.put_call.pc_volume,
            stress_index = record.liquidity.stress_index,
            strikes = gex.len(),
            dropped = diag.dropped.len(),
            neutral = diag.neutral.len(),
            "Metrics assembled"
        );

        AssembledMetrics {
            record,
            gex,
            diagnostics: diag,
        }
    }
}
