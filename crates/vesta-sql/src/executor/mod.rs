//! Runtime data flowing through query execution.
//!
//! - **Value**: Runtime values (integers, strings, etc.)
//! - **Row**: A single row of values

mod row;
mod value;

pub use row::*;
pub use value::*;
