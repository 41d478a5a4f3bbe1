use super::DteBucket;

pub fn default_contract_multiplier() -> f64 {
    100.0
}

pub fn default_milli_strike_threshold() -> f64 {
    10_000.0
}

pub fn default_milli_strike_divisor() -> f64 {
    1_000.0
}

pub fn default_atm_delta() -> f64 {
    0.50
}

pub fn default_wing_delta() -> f64 {
    0.25
}

pub fn default_tail_delta() -> f64 {
    0.10
}

pub fn default_dte_buckets() -> Vec<DteBucket> {
    vec![
        DteBucket { target_dte: 0, tolerance: 1 },
        DteBucket { target_dte: 7, tolerance: 2 },
        DteBucket { target_dte: 30, tolerance: 5 },
        DteBucket { target_dte: 60, tolerance: 5 },
    ]
}

pub fn default_spread_short_dte() -> u32 {
    7
}

pub fn default_spread_long_dte() -> u32 {
    60
}

pub fn default_bearish_above() -> f64 {
    1.5
}

pub fn default_bullish_below() -> f64 {
    0.7
}

pub fn default_illiquid_spread_pct() -> f64 {
    10.0
}

pub fn default_artifact_spread_pct() -> f64 {
    100.0
}

pub fn default_stress_spread_scale() -> f64 {
    5.0
}

pub fn default_min_volume() -> u64 {
    5
}

pub fn default_min_open_interest() -> u64 {
    10
}

pub fn default_min_bid() -> f64 {
    0.01
}

pub fn default_vol_windows() -> Vec<usize> {
    vec![10, 20, 30, 60, 252]
}

pub fn default_trading_days_per_year() -> f64 {
    252.0
}

pub fn default_iv_spread_window() -> usize {
    20
}
