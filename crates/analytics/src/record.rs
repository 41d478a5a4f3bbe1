//! The flat per-(symbol, date) metrics record

use crate::exposure::NetExposure;
use crate::liquidity::LiquidityMetrics;
use crate::put_call::PutCallRatios;
use crate::realized_vol::RealizedVol;
use crate::skew::SkewMetrics;
use crate::term_structure::TermStructure;
use chrono::NaiveDate;
use common::UnderlyingQuote;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpotFields {
    pub spot_price: f64,
    pub spot_open: Option<f64>,
    pub spot_high: Option<f64>,
    pub spot_low: Option<f64>,
    pub spot_volume: Option<u64>,
}

impl From<&UnderlyingQuote> for SpotFields {
    fn from(quote: &UnderlyingQuote) -> Self {
        Self {
            spot_price: quote.close,
            spot_open: quote.open,
            spot_high: quote.high,
            spot_low: quote.low,
            spot_volume: quote.volume,
        }
    }
}

/// One metric set for one symbol and date
///
/// Metric groups are typed; serialization flattens them into a single
/// mapping of named fields. Undefined values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub symbol: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub spot: SpotFields,
    pub expiration_count: usize,
    #[serde(flatten)]
    pub exposure: NetExposure,
    #[serde(flatten)]
    pub skew: SkewMetrics,
    #[serde(flatten)]
    pub term_structure: TermStructure,
    #[serde(flatten)]
    pub put_call: PutCallRatios,
    pub top_call_wall: Option<f64>,
    pub top_put_wall: Option<f64>,
    #[serde(flatten)]
    pub liquidity: LiquidityMetrics,
    pub investable_contracts: usize,
    #[serde(flatten)]
    pub realized_vol: RealizedVol,
    pub iv_hv_spread: Option<f64>,
}

impl MetricsRecord {
    /// A record with only the identifying and spot fields set
    pub fn new(symbol: impl Into<String>, date: NaiveDate, spot: SpotFields) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            spot,
            expiration_count: 0,
            exposure: NetExposure::default(),
            skew: SkewMetrics::default(),
            term_structure: TermStructure::default(),
            put_call: PutCallRatios::default(),
            top_call_wall: None,
            top_put_wall: None,
            liquidity: LiquidityMetrics::default(),
            investable_contracts: 0,
            realized_vol: RealizedVol::default(),
            iv_hv_spread: None,
        }
    }
}

/// ATM implied volatility minus realized volatility
pub fn iv_hv_spread(iv_atm: Option<f64>, hv: Option<f64>) -> Option<f64> {
    Some(iv_atm? - hv?)
}
