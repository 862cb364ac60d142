//! Configuration for Vesta.
//!
//! This module provides the configuration structures read by the storage
//! layer when it sizes temporary tables.

mod temp_table;

pub use temp_table::TempTableConfig;
