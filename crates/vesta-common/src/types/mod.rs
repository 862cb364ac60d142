//! Type definitions for Vesta.

mod ids;

pub use ids::{RowId, TableId};
