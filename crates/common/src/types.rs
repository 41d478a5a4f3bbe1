//! Common types used across the analytics workspace
//!
//! This module provides the option-chain domain types produced by the
//! ingestion boundary and consumed by every calculator.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Option right (call or put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionRight {
    /// Call option
    Call,
    /// Put option
    Put,
}

impl OptionRight {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionRight::Call => "CALL",
            OptionRight::Put => "PUT",
        }
    }

    /// Parse a raw right cell (case-insensitive, accepts `C`/`P` shorthands)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CALL" | "C" => Some(OptionRight::Call),
            "PUT" | "P" => Some(OptionRight::Put),
            _ => None,
        }
    }

    pub fn is_put(&self) -> bool {
        matches!(self, OptionRight::Put)
    }
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OptionRight {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::invalid_input(format!("unknown option right: {}", s)))
    }
}

/// Parse a calendar date from `YYYYMMDD`, `YYYY-MM-DD`, or an ISO
/// timestamp whose first ten characters are a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d")
            .map_err(|e| Error::invalid_date(format!("{}: {}", s, e)));
    }
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map_err(|e| Error::invalid_date(format!("{}: {}", s, e)))
}

/// Identity of one listed contract, used as the join key between the
/// Greeks, open-interest and price tables.
///
/// Joins match on `(strike, right)` within a single expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractKey {
    pub expiration: NaiveDate,
    pub strike: OrderedFloat<f64>,
    pub right: OptionRight,
}

/// One option contract observation after normalization
///
/// Optional fields are undefined when the source table lacks the column or
/// the cell could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRow {
    /// Strike in full price units (never milli-strike)
    pub strike: f64,
    pub right: OptionRight,
    pub expiration: NaiveDate,
    pub observation_date: NaiveDate,
    pub days_to_expiration: u32,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    /// Implied volatility in percentage units (20.0 = 20%)
    pub implied_vol_pct: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    /// Option end-of-day close (price tables only)
    pub close: Option<f64>,
    pub volume: Option<u64>,
    pub open_interest: Option<u64>,
}

impl ContractRow {
    /// Create a row with every optional field undefined. DTE is derived from
    /// the two dates and floors at zero.
    pub fn new(
        strike: f64,
        right: OptionRight,
        expiration: NaiveDate,
        observation_date: NaiveDate,
    ) -> Self {
        let dte = (expiration - observation_date).num_days().max(0) as u32;
        Self {
            strike,
            right,
            expiration,
            observation_date,
            days_to_expiration: dte,
            delta: None,
            gamma: None,
            implied_vol_pct: None,
            bid: None,
            ask: None,
            close: None,
            volume: None,
            open_interest: None,
        }
    }

    pub fn with_greeks(mut self, delta: f64, gamma: f64) -> Self {
        self.delta = Some(delta);
        self.gamma = Some(gamma);
        self
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn with_iv(mut self, implied_vol_pct: f64) -> Self {
        self.implied_vol_pct = Some(implied_vol_pct);
        self
    }

    pub fn with_quote(mut self, bid: f64, ask: f64) -> Self {
        self.bid = Some(bid);
        self.ask = Some(ask);
        self
    }

    pub fn with_close(mut self, close: f64) -> Self {
        self.close = Some(close);
        self
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_open_interest(mut self, open_interest: u64) -> Self {
        self.open_interest = Some(open_interest);
        self
    }

    pub fn key(&self) -> ContractKey {
        ContractKey {
            expiration: self.expiration,
            strike: OrderedFloat(self.strike),
            right: self.right,
        }
    }

    pub fn is_call(&self) -> bool {
        self.right == OptionRight::Call
    }

    pub fn is_put(&self) -> bool {
        self.right == OptionRight::Put
    }

    pub fn abs_delta(&self) -> Option<f64> {
        self.delta.map(f64::abs)
    }
}

/// End-of-day quote for the underlying instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingQuote {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<u64>,
}

impl UnderlyingQuote {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// Everything the engine needs for one (symbol, date)
///
/// `greeks`, `open_interest` and `prices` hold rows for every active
/// expiration. `history` is the underlying's daily series up to and
/// including `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub symbol: String,
    pub date: NaiveDate,
    pub spot: UnderlyingQuote,
    pub greeks: Vec<ContractRow>,
    pub open_interest: Vec<ContractRow>,
    pub prices: Vec<ContractRow>,
    pub history: Vec<UnderlyingQuote>,
}

impl ChainSnapshot {
    /// A snapshot with a spot quote and empty tables
    pub fn new(spot: UnderlyingQuote) -> Self {
        Self {
            symbol: spot.symbol.clone(),
            date: spot.date,
            spot,
            greeks: Vec::new(),
            open_interest: Vec::new(),
            prices: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Distinct expirations across the three option tables
    pub fn expiration_count(&self) -> usize {
        let mut expirations: Vec<NaiveDate> = self
            .greeks
            .iter()
            .chain(&self.open_interest)
            .chain(&self.prices)
            .map(|r| r.expiration)
            .collect();
        expirations.sort_unstable();
        expirations.dedup();
        expirations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_right_parse() {
        assert_eq!(OptionRight::parse("call"), Some(OptionRight::Call));
        assert_eq!(OptionRight::parse(" P "), Some(OptionRight::Put));
        assert_eq!(OptionRight::parse("PUT"), Some(OptionRight::Put));
        assert_eq!(OptionRight::parse("straddle"), None);
        assert!("X".parse::<OptionRight>().is_err());
        assert_eq!(OptionRight::Put.to_string(), "PUT");
    }

    #[test]
    fn test_right_serializes_upper_case() {
        let json = serde_json::to_string(&OptionRight::Call).unwrap();
        assert_eq!(json, "\"CALL\"");
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("20250127").unwrap(), date(2025, 1, 27));
        assert_eq!(parse_date("2025-01-27").unwrap(), date(2025, 1, 27));
        assert_eq!(parse_date("2025-01-27T16:00:00").unwrap(), date(2025, 1, 27));
        assert!(parse_date("27/01/2025").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_parse_errors_carry_their_kind() {
        assert_matches!(parse_date("garbage"), Err(Error::InvalidDate(msg)) if msg.contains("garbage"));
        assert_matches!("X".parse::<OptionRight>(), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_contract_row_dte() {
        let row = ContractRow::new(430.0, OptionRight::Call, date(2025, 2, 3), date(2025, 1, 27));
        assert_eq!(row.days_to_expiration, 7);

        let expired = ContractRow::new(430.0, OptionRight::Call, date(2025, 1, 20), date(2025, 1, 27));
        assert_eq!(expired.days_to_expiration, 0);
    }

    #[test]
    fn test_contract_key_scopes_expiration() {
        let a = ContractRow::new(430.0, OptionRight::Put, date(2025, 2, 3), date(2025, 1, 27));
        let b = ContractRow::new(430.0, OptionRight::Put, date(2025, 2, 10), date(2025, 1, 27));
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.clone().with_volume(3).key());
    }
}
