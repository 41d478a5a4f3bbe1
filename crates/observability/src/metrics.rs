//! Prometheus metrics infrastructure
//!
//! The engine never fails on bad data; it drops rows or returns neutral
//! values instead. These counters keep those silent paths visible.

use metrics::{counter, histogram, Counter, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Initialize the Prometheus metrics exporter
///
/// Starts an HTTP listener on `0.0.0.0:<port>` serving `/metrics`.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Engine-level metrics
///
/// * `analytics_records_total` - metric records assembled
/// * `analytics_assembly_duration_seconds` - wall time per assembled record
/// * `analytics_rows_dropped_total{stage,reason}` - rows excluded by a calculator
/// * `analytics_neutral_results_total{stage,reason}` - metrics returned as zero/undefined
#[derive(Clone)]
pub struct EngineMetrics {
    records_total: Counter,
    assembly_duration: Histogram,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            records_total: counter!("analytics_records_total"),
            assembly_duration: histogram!("analytics_assembly_duration_seconds"),
        }
    }

    pub fn record_assembled(&self, duration: Duration) {
        self.records_total.increment(1);
        self.assembly_duration.record(duration.as_secs_f64());
    }

    pub fn rows_dropped(&self, stage: &'static str, reason: &'static str, count: u64) {
        counter!("analytics_rows_dropped_total", "stage" => stage, "reason" => reason)
            .increment(count);
    }

    pub fn neutral_result(&self, stage: &'static str, reason: &'static str) {
        counter!("analytics_neutral_results_total", "stage" => stage, "reason" => reason)
            .increment(1);
    }

    /// Start timing one assembly; the duration is recorded when the guard drops
    pub fn start_assembly(&self) -> AssemblyTimer<'_> {
        AssemblyTimer {
            metrics: self,
            start: Instant::now(),
        }
    }
}

impl std::fmt::Debug for EngineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineMetrics").finish_non_exhaustive()
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Records the assembly duration on drop
pub struct AssemblyTimer<'a> {
    metrics: &'a EngineMetrics,
    start: Instant,
}

impl Drop for AssemblyTimer<'_> {
    fn drop(&mut self) {
        self.metrics.record_assembled(self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder_are_noops() {
        let metrics = EngineMetrics::new();
        metrics.rows_dropped("net_exposure", "missing_greeks", 3);
        metrics.neutral_result("skew", "empty_input");
        {
            let _timer = metrics.start_assembly();
        }
    }
}
