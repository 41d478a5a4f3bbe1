//! Keyed joins across the Greeks, open-interest and price tables
//!
//! Rows match on [`ContractKey`], i.e. `(strike, right)` within one
//! expiration. Within a key the join is many-to-many. Joined rows take
//! every defined field from the left row and fill the gaps from the right.

use common::{ContractKey, ContractRow};
use std::collections::{HashMap, HashSet};

/// Index rows by contract key, preserving input order within each key
pub fn index_by_key(rows: &[ContractRow]) -> HashMap<ContractKey, Vec<&ContractRow>> {
    let mut index: HashMap<ContractKey, Vec<&ContractRow>> = HashMap::with_capacity(rows.len());
    for row in rows {
        index.entry(row.key()).or_default().push(row);
    }
    index
}

/// Left row with gaps filled from the right row
pub fn overlay(left: &ContractRow, right: &ContractRow) -> ContractRow {
    let mut out = left.clone();
    out.delta = left.delta.or(right.delta);
    out.gamma = left.gamma.or(right.gamma);
    out.implied_vol_pct = left.implied_vol_pct.or(right.implied_vol_pct);
    out.bid = left.bid.or(right.bid);
    out.ask = left.ask.or(right.ask);
    out.close = left.close.or(right.close);
    out.volume = left.volume.or(right.volume);
    out.open_interest = left.open_interest.or(right.open_interest);
    out
}

/// Outcome of a join, with the rows on each side that found no partner
#[derive(Debug, Clone, Default)]
pub struct Joined {
    pub rows: Vec<ContractRow>,
    pub unmatched_left: usize,
    pub unmatched_right: usize,
}

/// Inner join. Output follows left order, then right order within a key.
pub fn inner_join(left: &[ContractRow], right: &[ContractRow]) -> Joined {
    let index = index_by_key(right);
    let mut joined = Joined::default();

    for row in left {
        match index.get(&row.key()) {
            Some(partners) => {
                joined.rows.extend(partners.iter().map(|p| overlay(row, p)));
            }
            None => joined.unmatched_left += 1,
        }
    }

    let left_keys: HashSet<ContractKey> = left.iter().map(ContractRow::key).collect();
    let matched_right: usize = index
        .iter()
        .filter(|(key, _)| left_keys.contains(*key))
        .map(|(_, partners)| partners.len())
        .sum();
    joined.unmatched_right = right.len() - matched_right;
    joined
}

/// Left join. Left rows without a partner are kept as they are.
pub fn left_join(left: &[ContractRow], right: &[ContractRow]) -> Joined {
    let index = index_by_key(right);
    let mut joined = Joined::default();

    for row in left {
        match index.get(&row.key()) {
            Some(partners) => {
                joined.rows.extend(partners.iter().map(|p| overlay(row, p)));
            }
            None => {
                joined.unmatched_left += 1;
                joined.rows.push(row.clone());
            }
        }
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::OptionRight;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    fn obs() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 27).unwrap()
    }

    #[test]
    fn test_inner_join_matches_within_expiration() {
        let greeks = vec![
            ContractRow::new(100.0, OptionRight::Call, date(3), obs()).with_greeks(0.5, 0.02),
            ContractRow::new(100.0, OptionRight::Put, date(3), obs()).with_greeks(-0.5, 0.02),
            ContractRow::new(100.0, OptionRight::Call, date(10), obs()).with_greeks(0.55, 0.01),
        ];
        let oi = vec![
            ContractRow::new(100.0, OptionRight::Call, date(3), obs()).with_open_interest(10),
            ContractRow::new(105.0, OptionRight::Call, date(3), obs()).with_open_interest(7),
        ];

        let joined = inner_join(&greeks, &oi);
        assert_eq!(joined.rows.len(), 1);
        assert_eq!(joined.rows[0].delta, Some(0.5));
        assert_eq!(joined.rows[0].open_interest, Some(10));
        assert_eq!(joined.unmatched_left, 2);
        assert_eq!(joined.unmatched_right, 1);
    }

    #[test]
    fn test_inner_join_many_to_many() {
        let left = vec![
            ContractRow::new(100.0, OptionRight::Call, date(3), obs()).with_delta(0.5),
            ContractRow::new(100.0, OptionRight::Call, date(3), obs()).with_delta(0.6),
        ];
        let right = vec![
            ContractRow::new(100.0, OptionRight::Call, date(3), obs()).with_open_interest(1),
            ContractRow::new(100.0, OptionRight::Call, date(3), obs()).with_open_interest(2),
        ];
        assert_eq!(inner_join(&left, &right).rows.len(), 4);
    }

    #[test]
    fn test_left_join_keeps_unmatched() {
        let prices = vec![
            ContractRow::new(100.0, OptionRight::Put, date(3), obs()).with_close(1.2).with_delta(-0.4),
            ContractRow::new(95.0, OptionRight::Put, date(3), obs()).with_close(0.6),
        ];
        let greeks = vec![ContractRow::new(100.0, OptionRight::Put, date(3), obs()).with_delta(-0.45)];

        let joined = left_join(&prices, &greeks);
        assert_eq!(joined.rows.len(), 2);
        // left side wins where both are defined
        assert_eq!(joined.rows[0].delta, Some(-0.4));
        assert_eq!(joined.rows[1].delta, None);
        assert_eq!(joined.unmatched_left, 1);
    }
}
