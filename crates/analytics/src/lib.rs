//! Options analytics engine
//!
//! Turns one normalized option-chain snapshot into a flat set of
//! market-structure metrics. Every calculator is a pure function of its
//! inputs and its configuration section; none of them fail. Conditions that
//! make a metric uncomputable produce its neutral value (zero, undefined or
//! an empty table) and are recorded in [`Diagnostics`].
//!
//! # Modules
//!
//! - [`interpolation`] - Delta-target IV interpolation without extrapolation
//! - [`join`] - Keyed inner/left joins across Greeks, OI and price tables
//! - [`exposure`] - Dealer net delta and gamma exposure
//! - [`gex`] - Gamma exposure by strike and wall detection
//! - [`skew`] - ATM IV, 25-delta risk reversal and butterfly
//! - [`term_structure`] - Skew per maturity bucket and term spreads
//! - [`put_call`] - Put/call ratios and sentiment
//! - [`liquidity`] - Spread statistics and the liquidity stress index
//! - [`realized_vol`] - Rolling annualized realized volatility
//! - [`record`] - The flat metrics record
//! - [`history`] - Summary statistics over a run of records
//! - [`assembler`] - Orchestration for one symbol and date
//! - [`diagnostics`] - Dropped-row and neutral-result reporting

pub mod assembler;
pub mod diagnostics;
pub mod exposure;
pub mod gex;
pub mod history;
pub mod interpolation;
pub mod join;
pub mod liquidity;
pub mod put_call;
pub mod realized_vol;
pub mod record;
pub mod skew;
pub mod term_structure;

pub use assembler::{AssembledMetrics, MetricsAssembler};
pub use diagnostics::{DropRecord, Diagnostics, NeutralResult};
pub use exposure::{ExposureCalculator, NetExposure};
pub use gex::{GexBucket, GexBuilder, GexDistribution};
pub use history::{summarize_history, HistorySummary, Rr25Summary};
pub use interpolation::interpolate_iv_at_delta;
pub use liquidity::{LiquidityAnalyzer, LiquidityMetrics};
pub use put_call::{PutCallAnalyzer, PutCallRatios, Sentiment};
pub use realized_vol::{RealizedVol, RealizedVolCalculator, RealizedVolRow};
pub use record::{MetricsRecord, SpotFields};
pub use skew::{SkewEngine, SkewMetrics};
pub use term_structure::{TermBucketMetrics, TermStructure, TermStructureEngine};
