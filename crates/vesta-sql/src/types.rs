//! SQL data types.
//!
//! This module defines the column types a materialized result can hold.

use std::fmt;

use serde::{Deserialize, Serialize};
use vesta_common::VARIABLE_LENGTH_ESTIMATE;

/// SQL data types supported by Vesta.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean type.
    Boolean,
    /// 8-bit signed integer.
    TinyInt,
    /// 16-bit signed integer.
    SmallInt,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    BigInt,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// Fixed point decimal.
    Decimal {
        /// Total number of digits.
        precision: Option<u8>,
        /// Digits after decimal point.
        scale: Option<u8>,
    },
    /// Fixed-length string.
    Char(Option<u32>),
    /// Variable-length string.
    Varchar(Option<u32>),
    /// Unlimited text.
    Text,
    /// Binary data.
    Blob,
    /// Date (days since epoch).
    Date,
    /// Time (microseconds since midnight).
    Time,
    /// Timestamp (microseconds since epoch).
    Timestamp,
    /// Bit field of the given width (1 to 64).
    Bit(u8),
}

impl DataType {
    /// Returns true if values of this type are large objects.
    pub fn is_blob(&self) -> bool {
        matches!(self, DataType::Text | DataType::Blob)
    }

    /// Returns true if this type is a bit field.
    pub fn is_bit(&self) -> bool {
        matches!(self, DataType::Bit(_))
    }

    /// Estimated width of one encoded value, type tag included.
    ///
    /// Exact for fixed-width types; strings without a declared length and
    /// large objects use a fixed estimate.
    pub fn encoded_width(&self) -> usize {
        match self {
            DataType::Boolean | DataType::TinyInt => 2,
            DataType::SmallInt => 3,
            DataType::Int | DataType::Float | DataType::Date => 5,
            DataType::BigInt
            | DataType::Double
            | DataType::Time
            | DataType::Timestamp
            | DataType::Bit(_) => 9,
            DataType::Decimal { .. } => 18,
            DataType::Char(Some(len)) | DataType::Varchar(Some(len)) => 5 + *len as usize,
            DataType::Char(None) | DataType::Varchar(None) | DataType::Text | DataType::Blob => {
                5 + VARIABLE_LENGTH_ESTIMATE
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::TinyInt => write!(f, "TINYINT"),
            DataType::SmallInt => write!(f, "SMALLINT"),
            DataType::Int => write!(f, "INT"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => write!(f, "DECIMAL({}, {})", p, s),
                (Some(p), None) => write!(f, "DECIMAL({})", p),
                _ => write!(f, "DECIMAL"),
            },
            DataType::Char(len) => match len {
                Some(l) => write!(f, "CHAR({})", l),
                None => write!(f, "CHAR"),
            },
            DataType::Varchar(len) => match len {
                Some(l) => write!(f, "VARCHAR({})", l),
                None => write!(f, "VARCHAR"),
            },
            DataType::Text => write!(f, "TEXT"),
            DataType::Blob => write!(f, "BLOB"),
            DataType::Date => write!(f, "DATE"),
            DataType::Time => write!(f, "TIME"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
            DataType::Bit(width) => write!(f, "BIT({})", width),
        }
    }
}
