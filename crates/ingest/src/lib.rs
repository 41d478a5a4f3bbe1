//! Ingestion boundary for the options analytics engine
//!
//! Raw end-of-day option tables arrive with heterogeneous column names and
//! unit conventions. This crate applies the versioned column mapping once,
//! converts the result into typed [`common::ContractRow`]s, and assembles
//! [`common::ChainSnapshot`]s for the engine.
//!
//! # Modules
//!
//! - [`table`] - Raw string tables and CSV loading
//! - [`normalize`] - Versioned column mapping and unit corrections
//! - [`rows`] - Typed conversion with per-table drop reports
//! - [`source`] - Snapshot sources (on-disk directory layout)

pub mod error;
pub mod normalize;
pub mod rows;
pub mod source;
pub mod table;

pub use error::IngestError;
pub use normalize::{normalize_columns, COLUMN_ALIASES_V1};
pub use rows::{into_contract_rows, into_quotes, TableReport};
pub use source::{DirectorySource, SnapshotReport, SnapshotSource};
pub use table::{load_table, load_table_from_path, RawTable, SchemaVersion};

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;
