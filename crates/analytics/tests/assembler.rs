//! End-to-end assembly of a synthetic two-expiration chain

use analytics::diagnostics::stage;
use analytics::{summarize_history, MetricsAssembler, Sentiment};
use chrono::{Duration, NaiveDate};
use common::{ChainSnapshot, ContractRow, OptionRight, UnderlyingQuote};
use config::AnalyticsConfig;

const SPOT: f64 = 600.0;

fn obs() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 27).unwrap()
}

fn expiry(dte: i64) -> NaiveDate {
    obs() + Duration::days(dte)
}

/// Puts at 570/585/600 and calls at 600/615/630 with deltas 0.10/0.25/0.50
fn greeks(dte: i64, put_ivs: [f64; 3], call_ivs: [f64; 3]) -> Vec<ContractRow> {
    let mut rows = Vec::new();
    for (i, (strike, delta)) in [(570.0, -0.10), (585.0, -0.25), (600.0, -0.50)].iter().enumerate() {
        rows.push(
            ContractRow::new(*strike, OptionRight::Put, expiry(dte), obs())
                .with_greeks(*delta, 0.01)
                .with_iv(put_ivs[i])
                .with_volume(10)
                .with_quote(0.5, 0.6),
        );
    }
    for (i, (strike, delta)) in [(600.0, 0.50), (615.0, 0.25), (630.0, 0.10)].iter().enumerate() {
        rows.push(
            ContractRow::new(*strike, OptionRight::Call, expiry(dte), obs())
                .with_greeks(*delta, 0.01)
                .with_iv(call_ivs[i])
                .with_volume(10)
                .with_quote(0.5, 0.6),
        );
    }
    rows
}

fn open_interest(dte: i64, puts: u64, calls: u64) -> Vec<ContractRow> {
    let mut rows = Vec::new();
    for strike in [570.0, 585.0, 600.0] {
        rows.push(ContractRow::new(strike, OptionRight::Put, expiry(dte), obs()).with_open_interest(puts));
    }
    for strike in [600.0, 615.0, 630.0] {
        rows.push(ContractRow::new(strike, OptionRight::Call, expiry(dte), obs()).with_open_interest(calls));
    }
    rows
}

fn history(days: i64) -> Vec<UnderlyingQuote> {
    let mut close = SPOT;
    let mut quotes = vec![UnderlyingQuote::new("SPY", obs(), close)];
    for i in 1..days {
        let step = if i % 2 == 0 { 0.01f64 } else { -0.01 };
        close *= (-step).exp();
        quotes.push(UnderlyingQuote::new("SPY", obs() - Duration::days(i), close));
    }
    quotes.reverse();
    quotes
}

fn snapshot() -> ChainSnapshot {
    let mut spot = UnderlyingQuote::new("SPY", obs(), SPOT);
    spot.volume = Some(50_000_000);
    let mut snap = ChainSnapshot::new(spot);

    snap.greeks = greeks(7, [26.0, 22.0, 19.0], [17.0, 16.0, 15.0]);
    snap.greeks.extend(greeks(30, [28.0, 24.0, 20.0], [19.0, 18.0, 17.0]));

    snap.open_interest = open_interest(7, 2000, 1000);
    snap.open_interest.extend(open_interest(30, 500, 500));

    snap.prices = vec![
        ContractRow::new(600.0, OptionRight::Put, expiry(7), obs())
            .with_quote(4.9, 5.1)
            .with_close(5.0)
            .with_volume(300),
        ContractRow::new(600.0, OptionRight::Call, expiry(7), obs())
            .with_quote(3.9, 4.1)
            .with_close(4.0)
            .with_volume(200),
        ContractRow::new(630.0, OptionRight::Call, expiry(7), obs())
            .with_quote(0.05, 0.25)
            .with_close(0.1)
            .with_volume(0),
    ];

    snap.history = history(40);
    snap
}

fn close_to(actual: Option<f64>, expected: f64) -> bool {
    actual.map_or(false, |a| (a - expected).abs() < 1e-9)
}

#[test]
fn test_full_assembly() {
    let out = MetricsAssembler::new(AnalyticsConfig::default()).assemble(&snapshot());
    let r = &out.record;

    assert_eq!(r.symbol, "SPY");
    assert_eq!(r.expiration_count, 2);
    assert_eq!(r.spot.spot_volume, Some(50_000_000));

    // exposure
    assert!((r.exposure.net_delta + 85_000.0).abs() < 1e-6);
    assert!((r.exposure.net_gamma_calls - 2_700_000.0).abs() < 1e-6);
    assert!((r.exposure.net_gamma_puts - 4_500_000.0).abs() < 1e-6);
    assert!((r.exposure.net_gamma + 1_800_000.0).abs() < 1e-6);
    assert_eq!(r.exposure.total_oi, 12_000);
    assert_eq!(r.exposure.call_oi, 4_500);
    assert_eq!(r.exposure.put_oi, 7_500);

    // global skew averages both expirations at each delta
    assert!(close_to(r.skew.iv_atm, 18.75));
    assert!(close_to(r.skew.rr25, 6.0));
    assert!(close_to(r.skew.bf25, 1.25));
    assert!(close_to(r.skew.iv_10d_put, 27.0));

    // term structure
    let ts = &r.term_structure;
    assert_eq!(ts.bucket(7).unwrap().actual_dte, Some(7));
    assert!(close_to(ts.rr25(7), 6.0));
    assert!(close_to(ts.iv_atm(7), 18.0));
    assert_eq!(ts.bucket(30).unwrap().actual_dte, Some(30));
    assert!(close_to(ts.iv_atm(30), 19.5));
    assert_eq!(ts.bucket(0).unwrap().actual_dte, None);
    assert_eq!(ts.bucket(60).unwrap().actual_dte, None);
    assert_eq!(ts.rr25_term_spread, None);
    assert_eq!(ts.iv_term_spread, None);

    // put/call
    assert!((r.put_call.pc_volume - 1.5).abs() < 1e-12);
    assert!((r.put_call.pc_oi - 1.0).abs() < 1e-12);
    assert!(close_to(r.put_call.pc_premium, 1.875));
    assert!(close_to(r.put_call.pc_delta, 1000.0 / 600.0));
    assert_eq!(r.put_call.sentiment, Sentiment::Neutral);

    // gex walls, ties resolved to the lowest strike
    assert_eq!(out.gex.len(), 5);
    assert_eq!(r.top_call_wall, Some(615.0));
    assert_eq!(r.top_put_wall, Some(570.0));
    let at_600 = out.gex.bucket(600.0).unwrap();
    assert!((at_600.signed_gamma_exposure + 600_000.0).abs() < 1e-6);
    assert_eq!(at_600.open_interest_sum, 4_000);

    // liquidity: the 200% spread row is discarded
    assert!((r.liquidity.avg_spread_pct - 4.5).abs() < 1e-9);
    assert!((r.liquidity.stress_index - 45.0).abs() < 1e-9);
    assert_eq!(r.liquidity.total_volume, 500);
    assert_eq!(r.liquidity.illiquid_contracts, 0);
    assert_eq!(out.diagnostics.dropped_count(stage::LIQUIDITY, "spread_artifact"), 1);
    assert_eq!(r.investable_contracts, 2);

    // realized vol over alternating 1% moves
    let hv_20 = 0.01 * (20.0f64 / 19.0).sqrt() * 252f64.sqrt() * 100.0;
    assert!(close_to(r.realized_vol.window(20), hv_20));
    assert_eq!(r.realized_vol.window(60), None);
    assert_eq!(r.realized_vol.window(252), None);
    assert!(close_to(r.iv_hv_spread, 18.75 - hv_20));
}

#[test]
fn test_record_json_is_flat() {
    let out = MetricsAssembler::new(AnalyticsConfig::default()).assemble(&snapshot());
    let json = serde_json::to_value(&out.record).unwrap();

    for key in [
        "spot_price",
        "expiration_count",
        "net_delta",
        "net_gamma_billions",
        "iv_atm",
        "rr25",
        "rr25_7dte",
        "iv_atm_30dte",
        "actual_dte_60",
        "rr25_term_spread",
        "pc_volume",
        "sentiment",
        "top_call_wall",
        "liquidity_stress_index",
        "investable_contracts",
        "hv_10d",
        "hv_252d",
        "iv_hv_spread",
    ] {
        assert!(json.get(key).is_some(), "missing key {}", key);
    }
    assert!(json["actual_dte_60"].is_null());
    assert_eq!(json["sentiment"], "NEUTRAL");

    let gex = serde_json::to_value(&out.gex).unwrap();
    assert_eq!(gex.as_array().map(|a| a.len()), Some(5));
    assert_eq!(gex[0]["strike"], 570.0);
    assert_eq!(gex[0]["is_put_wall"], true);
}

#[test]
fn test_partial_data_keeps_other_metrics() {
    let mut snap = snapshot();
    snap.open_interest.clear();
    let out = MetricsAssembler::new(AnalyticsConfig::default()).assemble(&snap);

    assert_eq!(out.record.exposure.net_gamma, 0.0);
    assert!(out.gex.is_empty());
    assert!(out.diagnostics.has_neutral(stage::NET_EXPOSURE, "empty_input"));
    // skew and term structure only need Greeks
    assert!(close_to(out.record.skew.rr25, 6.0));
    assert!(close_to(out.record.term_structure.rr25(7), 6.0));
}

#[test]
fn test_history_summary_over_assembled_records() {
    let assembler = MetricsAssembler::new(AnalyticsConfig::default());
    let records: Vec<_> = (0..3).map(|_| assembler.assemble(&snapshot()).record).collect();
    let summary = summarize_history(&records);

    assert_eq!(summary.records, 3);
    let seven = summary.rr25.iter().find(|s| s.target_dte == 7).unwrap();
    assert!(close_to(seven.mean, 6.0));
    assert!(close_to(seven.std, 0.0));
    assert_eq!(seven.completeness_pct, 100.0);
    let sixty = summary.rr25.iter().find(|s| s.target_dte == 60).unwrap();
    assert_eq!(sixty.completeness_pct, 0.0);
}
