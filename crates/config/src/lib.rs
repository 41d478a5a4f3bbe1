//! Configuration for the options analytics engine
//!
//! Every calculator receives its section of [`AnalyticsConfig`] explicitly;
//! nothing is read from global state. All fields are optional in YAML and
//! fall back to the functions in [`defaults`].

use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use validator::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub skew: SkewConfig,
    #[serde(default)]
    pub term_structure: TermStructureConfig,
    #[serde(default)]
    pub put_call: PutCallConfig,
    #[serde(default)]
    pub liquidity: LiquidityConfig,
    #[serde(default)]
    pub realized_vol: RealizedVolConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineConfig {
    /// Shares per contract used in every exposure formula
    #[serde(default = "default_contract_multiplier")]
    pub contract_multiplier: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            contract_multiplier: default_contract_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NormalizerConfig {
    /// Strikes are treated as milli-strikes when the table maximum exceeds this
    #[serde(default = "default_milli_strike_threshold")]
    pub milli_strike_threshold: f64,
    #[serde(default = "default_milli_strike_divisor")]
    pub milli_strike_divisor: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            milli_strike_threshold: default_milli_strike_threshold(),
            milli_strike_divisor: default_milli_strike_divisor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SkewConfig {
    #[serde(default = "default_atm_delta")]
    pub atm_delta: f64,
    #[serde(default = "default_wing_delta")]
    pub wing_delta: f64,
    #[serde(default = "default_tail_delta")]
    pub tail_delta: f64,
}

impl Default for SkewConfig {
    fn default() -> Self {
        Self {
            atm_delta: default_atm_delta(),
            wing_delta: default_wing_delta(),
            tail_delta: default_tail_delta(),
        }
    }
}

/// One target maturity bucket and its half-width in days
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct DteBucket {
    pub target_dte: u32,
    pub tolerance: u32,
}

impl DteBucket {
    /// Inclusive `[target - tolerance, target + tolerance]`, floored at zero
    pub fn window(&self) -> (u32, u32) {
        (
            self.target_dte.saturating_sub(self.tolerance),
            self.target_dte.saturating_add(self.tolerance),
        )
    }

    pub fn contains(&self, dte: u32) -> bool {
        let (lo, hi) = self.window();
        dte >= lo && dte <= hi
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TermStructureConfig {
    #[serde(default = "default_dte_buckets")]
    pub buckets: Vec<DteBucket>,
    /// Short leg of the term spreads
    #[serde(default = "default_spread_short_dte")]
    pub spread_short_dte: u32,
    /// Long leg of the term spreads
    #[serde(default = "default_spread_long_dte")]
    pub spread_long_dte: u32,
}

impl Default for TermStructureConfig {
    fn default() -> Self {
        Self {
            buckets: default_dte_buckets(),
            spread_short_dte: default_spread_short_dte(),
            spread_long_dte: default_spread_long_dte(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PutCallConfig {
    #[serde(default = "default_bearish_above")]
    pub bearish_above: f64,
    #[serde(default = "default_bullish_below")]
    pub bullish_below: f64,
}

impl Default for PutCallConfig {
    fn default() -> Self {
        Self {
            bearish_above: default_bearish_above(),
            bullish_below: default_bullish_below(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LiquidityConfig {
    /// Rows quoted wider than this spread percentage count as illiquid
    #[serde(default = "default_illiquid_spread_pct")]
    pub illiquid_spread_pct: f64,
    /// Rows at or above this spread percentage are discarded as artifacts
    #[serde(default = "default_artifact_spread_pct")]
    pub artifact_spread_pct: f64,
    /// Average spread percentage that contributes half of the stress index
    #[serde(default = "default_stress_spread_scale")]
    pub stress_spread_scale: f64,
    #[serde(default = "default_min_volume")]
    pub min_volume: u64,
    #[serde(default = "default_min_open_interest")]
    pub min_open_interest: u64,
    #[serde(default = "default_min_bid")]
    pub min_bid: f64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            illiquid_spread_pct: default_illiquid_spread_pct(),
            artifact_spread_pct: default_artifact_spread_pct(),
            stress_spread_scale: default_stress_spread_scale(),
            min_volume: default_min_volume(),
            min_open_interest: default_min_open_interest(),
            min_bid: default_min_bid(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RealizedVolConfig {
    #[serde(default = "default_vol_windows")]
    pub windows: Vec<usize>,
    #[serde(default = "default_trading_days_per_year")]
    pub trading_days_per_year: f64,
    /// Realized-vol window subtracted from ATM IV for the IV-HV spread
    #[serde(default = "default_iv_spread_window")]
    pub iv_spread_window: usize,
}

impl Default for RealizedVolConfig {
    fn default() -> Self {
        Self {
            windows: default_vol_windows(),
            trading_days_per_year: default_trading_days_per_year(),
            iv_spread_window: default_iv_spread_window(),
        }
    }
}
