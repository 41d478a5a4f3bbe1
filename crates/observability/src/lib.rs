//! Observability infrastructure for the options analytics engine
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics exporter
//! - Data-quality counters emitted by the engine
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("optx", LogFormat::Pretty)?;
//!
//! // Optional: expose counters at http://0.0.0.0:9090/metrics
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, EngineMetrics};
