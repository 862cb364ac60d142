//! # vesta-sql
//!
//! Materialization of set-operation query results for Vesta.
//!
//! This crate implements the sink that compound query expressions
//! (`UNION`, `INTERSECT`, mixed `DISTINCT`/`ALL` branches, recursive CTEs)
//! write their rows into:
//!
//! - **Types**: SQL data types and runtime values
//! - **Encoding**: Binary record format shared with the storage layer
//! - **Materialization**: Deduplication strategy selection, result table
//!   provisioning, the per-row sink and its lifecycle

#![warn(missing_docs)]
#![warn(clippy::all)]

/// SQL data types
pub mod types;

/// Runtime values and rows
pub mod executor;

/// Record encoding
pub mod encoder;

/// Set-operation result materialization
pub mod materialize;
