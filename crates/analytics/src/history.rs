//! Summary statistics over a run of daily records
//!
//! Operates on already assembled [`MetricsRecord`]s; nothing is read from
//! storage here.

use crate::record::MetricsRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// `rr25` statistics for one term-structure bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rr25Summary {
    pub target_dte: u32,
    pub mean: Option<f64>,
    /// Sample standard deviation, undefined below two observations
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Share of records with a defined value, in percent
    pub completeness_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySummary {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub records: usize,
    pub rr25: Vec<Rr25Summary>,
}

pub fn summarize_history(records: &[MetricsRecord]) -> HistorySummary {
    if records.is_empty() {
        return HistorySummary::default();
    }

    let targets: BTreeSet<u32> = records
        .iter()
        .flat_map(|r| r.term_structure.buckets.iter().map(|b| b.target_dte))
        .collect();

    let rr25 = targets
        .into_iter()
        .map(|target| {
            let values: Vec<f64> = records
                .iter()
                .filter_map(|r| r.term_structure.rr25(target))
                .collect();
            summarize_values(target, &values, records.len())
        })
        .collect();

    HistorySummary {
        start: records.iter().map(|r| r.date).min(),
        end: records.iter().map(|r| r.date).max(),
        records: records.len(),
        rr25,
    }
}

fn summarize_values(target_dte: u32, values: &[f64], total: usize) -> Rr25Summary {
    let n = values.len() as f64;
    let mean = (!values.is_empty()).then(|| values.iter().sum::<f64>() / n);
    let std = mean.filter(|_| values.len() >= 2).map(|m| {
        let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    });

    Rr25Summary {
        target_dte,
        mean,
        std,
        min: values.iter().copied().reduce(f64::min),
        max: values.iter().copied().reduce(f64::max),
        completeness_pct: values.len() as f64 / total as f64 * 100.0,
    }
}
