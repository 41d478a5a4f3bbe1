//! Common types and utilities for the options analytics workspace
//!
//! This crate provides the option-chain domain types shared by the
//! ingestion boundary and the analytics engine.
//!
//! # Modules
//!
//! - [`error`] - Common error types
//! - [`types`] - Shared domain types (OptionRight, ContractRow, UnderlyingQuote, etc.)

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
