//! # vesta-storage
//!
//! Temporary table storage for Vesta.
//!
//! Materialized query results live in temporary tables. A table starts in
//! memory and is promoted to a file-backed representation once it outgrows
//! its configured capacity.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        TempTableEngine Trait            │
//! │       (create, promote)                 │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │         TableHandler Trait              │
//! │ (write_row, index_init, classify_error) │
//! └─────────────────────────────────────────┘
//!              │                   │
//!              ▼                   ▼
//! ┌─────────────────────┐  ┌─────────────────────┐
//! │     HeapTable       │  │     DiskTable       │
//! │   (in memory)       │  │  (temporary file)   │
//! └─────────────────────┘  └─────────────────────┘
//! ```
//!
//! The storage layer only sees encoded records. Uniqueness is enforced either
//! by a native unique key over the whole record or by a non-unique index on a
//! hidden hash column that callers probe with [`TableHandler::index_read_hash`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod disk;
mod engine;
mod error;
mod handler;
mod heap;
mod index;
mod record;
mod spec;

pub use disk::DiskTable;
pub use engine::{DefaultEngine, EngineStats, TempTableEngine};
pub use error::{ErrorClass, HandlerError, HandlerResult};
pub use handler::{ExtraFlag, TableHandler};
pub use heap::HeapTable;
pub use record::{append_hash_column, hash_payload, split_hash_column};
pub use spec::{KeyKind, Representation, TableSpec};
