//! Error codes shared across Vesta.
//!
//! Each crate owns its error enum; this module provides the stable numeric
//! codes those enums map onto.

mod codes;

pub use codes::ErrorCode;
