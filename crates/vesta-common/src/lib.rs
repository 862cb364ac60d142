//! # vesta-common
//!
//! Common types, error codes, and configuration for Vesta.
//!
//! This crate provides the foundational pieces shared by the storage layer
//! and the SQL execution layer:
//!
//! - **Types**: Identifiers for temporary tables and the rows stored in them
//! - **Errors**: Stable numeric `ErrorCode`s used to categorize failures
//! - **Config**: `TempTableConfig`, sizing of in-memory and on-disk tables
//! - **Constants**: Workspace-wide defaults and record layout constants
//!
//! ## Example
//!
//! ```rust
//! use vesta_common::config::TempTableConfig;
//! use vesta_common::types::TableId;
//!
//! let config = TempTableConfig::default().with_max_heap_rows(1_000);
//! assert!(config.validate().is_ok());
//! assert_eq!(TableId::new(7).as_u64(), 7);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::TempTableConfig;
pub use constants::*;
pub use error::ErrorCode;
pub use types::{RowId, TableId};
