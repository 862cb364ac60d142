//! Materialization of set-operation results.
//!
//! A compound query expression (`UNION`, `INTERSECT`, recursive CTEs) writes
//! the rows of every branch into one temporary table:
//!
//! ```text
//!   branch rows ──► SetOpSink::insert
//!                      │  project + encode
//!                      │  hash lookup (HashPseudoKey only)
//!                      ▼
//!                 TableHandler::write_row ──► TableFull? ──► promote to disk, retry once
//! ```
//!
//! The [`DeduplicationStrategy`] is chosen once, when the table is
//! provisioned, from the expression's [`QueryShape`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use vesta_sql::executor::{Row, Value};
//! use vesta_sql::materialize::{ColumnDescriptor, CreateOptions, InsertOutcome, QueryShape, SetOpSink};
//! use vesta_sql::types::DataType;
//! use vesta_storage::DefaultEngine;
//!
//! let mut sink = SetOpSink::new(Arc::new(DefaultEngine::default()));
//! sink.prepare(QueryShape::new());
//! sink.create_result_table(
//!     &[ColumnDescriptor::new("id", DataType::Int)],
//!     true,
//!     &CreateOptions::default(),
//!     "u",
//!     false,
//!     true,
//! )?;
//!
//! let row = Row::new(vec![Value::int(1)]);
//! assert_eq!(sink.insert(&row)?, InsertOutcome::Inserted);
//! assert_eq!(sink.insert(&row)?, InsertOutcome::DuplicateRejected);
//! assert_eq!(sink.row_count(), 1);
//! # Ok::<(), vesta_sql::materialize::SinkError>(())
//! ```

mod dedup;
mod error;
mod params;
mod provision;
mod sink;

pub use dedup::DeduplicationStrategy;
pub use error::{SinkError, SinkResult};
pub use params::{
    ColumnDescriptor, CreateOptions, FieldTypeCounts, MaterializationParameters, QueryShape,
};
pub use provision::{provision, MaterializedTable};
pub use sink::{InsertOutcome, SetOpSink};
