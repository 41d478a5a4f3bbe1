//! Delta-target interpolation of implied volatility
//!
//! The smile is sampled as `(|delta|, iv_pct)` points for one option right.
//! Values are interpolated piecewise-linearly and never extrapolated.

use common::{ContractRow, OptionRight};

/// Piecewise-linear IV at `target` absolute delta
///
/// Returns `None` when fewer than two distinct deltas are observed or the
/// target lies outside `[min, max]` of the observed deltas. Points sharing
/// the same delta are averaged. Input order does not matter.
pub fn interpolate_iv_at_delta(points: &[(f64, f64)], target: f64) -> Option<f64> {
    if !target.is_finite() {
        return None;
    }

    let mut sorted: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (xs, ys) = dedup_mean(&sorted);
    if xs.len() < 2 {
        return None;
    }
    if target < xs[0] || target > xs[xs.len() - 1] {
        return None;
    }

    let idx = xs.partition_point(|x| *x <= target);
    // idx >= 1 since target >= xs[0]
    let lo = idx - 1;
    if xs[lo] == target || lo == xs.len() - 1 {
        return Some(ys[lo]);
    }

    let (x0, x1) = (xs[lo], xs[lo + 1]);
    let w = (target - x0) / (x1 - x0);
    Some(ys[lo] * (1.0 - w) + ys[lo + 1] * w)
}

fn dedup_mean(sorted: &[(f64, f64)]) -> (Vec<f64>, Vec<f64>) {
    let mut xs: Vec<f64> = Vec::with_capacity(sorted.len());
    let mut ys: Vec<f64> = Vec::with_capacity(sorted.len());
    let mut run = 0usize;

    for &(x, y) in sorted {
        match xs.last() {
            Some(&last) if last == x => {
                run += 1;
                if let Some(acc) = ys.last_mut() {
                    *acc += (y - *acc) / run as f64;
                }
            }
            _ => {
                xs.push(x);
                ys.push(y);
                run = 1;
            }
        }
    }
    (xs, ys)
}

/// Usable smile points for one right
///
/// A row qualifies when its implied volatility is positive and its delta is
/// defined. Rows that report zero volume are skipped; rows without a
/// volume figure are kept.
pub fn smile_points<'a, I>(rows: I, right: OptionRight) -> Vec<(f64, f64)>
where
    I: IntoIterator<Item = &'a ContractRow>,
{
    rows.into_iter()
        .filter(|r| r.right == right && r.volume != Some(0))
        .filter_map(|r| match (r.abs_delta(), r.implied_vol_pct) {
            (Some(d), Some(iv)) if iv > 0.0 => Some((d, iv)),
            _ => None,
        })
        .collect()
}
