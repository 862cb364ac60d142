//! Record encoding and decoding.
//!
//! This module converts between executor rows and the byte records stored in
//! temporary tables.
//!
//! # Encoding Format
//!
//! - Number of columns (4 bytes, big-endian)
//! - For each column: type tag (1 byte), then the payload
//!   - fixed-width values: little-endian bytes
//!   - strings and binary data: length (4 bytes, little-endian) + data
//!
//! Values are expected to already carry their column's type, so two equal
//! rows always encode to the same bytes. A native unique key compares these
//! bytes directly.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::executor::{Row, Value};

/// Errors raised while decoding a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The record ended before a value was complete.
    #[error("record truncated while reading {0}")]
    Truncated(&'static str),

    /// An unknown type tag was found.
    #[error("unknown type tag: {0}")]
    UnknownTag(u8),

    /// A string column holds invalid UTF-8.
    #[error("invalid utf-8 in string column")]
    InvalidUtf8,

    /// The record has bytes left after the last column.
    #[error("{0} trailing bytes after last column")]
    TrailingBytes(usize),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Type tags for binary encoding.
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
enum TypeTag {
    Null = 0,
    Boolean = 1,
    TinyInt = 2,
    SmallInt = 3,
    Int = 4,
    BigInt = 5,
    Float = 6,
    Double = 7,
    Decimal = 8,
    String = 9,
    Bytes = 10,
    Date = 11,
    Time = 12,
    Timestamp = 13,
    Bit = 14,
}

impl TypeTag {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(TypeTag::Null),
            1 => Some(TypeTag::Boolean),
            2 => Some(TypeTag::TinyInt),
            3 => Some(TypeTag::SmallInt),
            4 => Some(TypeTag::Int),
            5 => Some(TypeTag::BigInt),
            6 => Some(TypeTag::Float),
            7 => Some(TypeTag::Double),
            8 => Some(TypeTag::Decimal),
            9 => Some(TypeTag::String),
            10 => Some(TypeTag::Bytes),
            11 => Some(TypeTag::Date),
            12 => Some(TypeTag::Time),
            13 => Some(TypeTag::Timestamp),
            14 => Some(TypeTag::Bit),
            _ => None,
        }
    }
}

/// Encodes rows into table records.
#[derive(Debug, Default)]
pub struct RecordEncoder {
    buf: BytesMut,
}

impl RecordEncoder {
    /// Creates a new encoder.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
        }
    }

    /// Encodes a row.
    ///
    /// `-0.0` is written as `0.0` and every NaN payload as the canonical NaN,
    /// so values that compare equal also encode to equal record bytes.
    pub fn encode(&mut self, row: &Row) -> Bytes {
        self.buf.reserve(4 + row.num_columns() * 9);
        self.buf.put_u32(row.num_columns() as u32);
        for value in row.iter() {
            self.encode_value(value);
        }
        self.buf.split().freeze()
    }

    fn encode_value(&mut self, value: &Value) {
        let buf = &mut self.buf;
        match value {
            Value::Null => buf.put_u8(TypeTag::Null as u8),
            Value::Boolean(b) => {
                buf.put_u8(TypeTag::Boolean as u8);
                buf.put_u8(u8::from(*b));
            }
            Value::TinyInt(i) => {
                buf.put_u8(TypeTag::TinyInt as u8);
                buf.put_i8(*i);
            }
            Value::SmallInt(i) => {
                buf.put_u8(TypeTag::SmallInt as u8);
                buf.put_i16_le(*i);
            }
            Value::Int(i) => {
                buf.put_u8(TypeTag::Int as u8);
                buf.put_i32_le(*i);
            }
            Value::BigInt(i) => {
                buf.put_u8(TypeTag::BigInt as u8);
                buf.put_i64_le(*i);
            }
            Value::Float(f) => {
                buf.put_u8(TypeTag::Float as u8);
                buf.put_f32_le(canonical_f32(*f));
            }
            Value::Double(f) => {
                buf.put_u8(TypeTag::Double as u8);
                buf.put_f64_le(canonical_f64(*f));
            }
            Value::Decimal { value, scale } => {
                buf.put_u8(TypeTag::Decimal as u8);
                buf.put_i128_le(*value);
                buf.put_u8(*scale);
            }
            Value::String(s) => {
                buf.put_u8(TypeTag::String as u8);
                buf.put_u32_le(s.len() as u32);
                buf.put_slice(s.as_bytes());
            }
            Value::Bytes(b) => {
                buf.put_u8(TypeTag::Bytes as u8);
                buf.put_u32_le(b.len() as u32);
                buf.put_slice(b);
            }
            Value::Date(d) => {
                buf.put_u8(TypeTag::Date as u8);
                buf.put_i32_le(*d);
            }
            Value::Time(t) => {
                buf.put_u8(TypeTag::Time as u8);
                buf.put_i64_le(*t);
            }
            Value::Timestamp(ts) => {
                buf.put_u8(TypeTag::Timestamp as u8);
                buf.put_i64_le(*ts);
            }
            Value::Bit(b) => {
                buf.put_u8(TypeTag::Bit as u8);
                buf.put_u64_le(*b);
            }
        }
    }
}

/// Decodes table records back into rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordDecoder;

impl RecordDecoder {
    /// Decodes a complete record.
    ///
    /// # Errors
    ///
    /// Fails if the record is truncated, carries an unknown tag or has
    /// trailing bytes.
    pub fn decode(&self, record: &[u8]) -> CodecResult<Row> {
        let mut bytes = record;
        need(bytes, 4, "column count")?;
        let num_cols = bytes.get_u32() as usize;

        let mut values = Vec::with_capacity(num_cols.min(1024));
        for _ in 0..num_cols {
            values.push(decode_value(&mut bytes)?);
        }

        if !bytes.is_empty() {
            return Err(CodecError::TrailingBytes(bytes.len()));
        }
        Ok(Row::new(values))
    }
}

fn need(bytes: &[u8], len: usize, what: &'static str) -> CodecResult<()> {
    if bytes.len() < len {
        Err(CodecError::Truncated(what))
    } else {
        Ok(())
    }
}

fn decode_value(bytes: &mut &[u8]) -> CodecResult<Value> {
    need(bytes, 1, "type tag")?;
    let raw = bytes.get_u8();
    let tag = TypeTag::from_u8(raw).ok_or(CodecError::UnknownTag(raw))?;

    let value = match tag {
        TypeTag::Null => Value::Null,
        TypeTag::Boolean => {
            need(bytes, 1, "boolean")?;
            Value::Boolean(bytes.get_u8() != 0)
        }
        TypeTag::TinyInt => {
            need(bytes, 1, "tinyint")?;
            Value::TinyInt(bytes.get_i8())
        }
        TypeTag::SmallInt => {
            need(bytes, 2, "smallint")?;
            Value::SmallInt(bytes.get_i16_le())
        }
        TypeTag::Int => {
            need(bytes, 4, "int")?;
            Value::Int(bytes.get_i32_le())
        }
        TypeTag::BigInt => {
            need(bytes, 8, "bigint")?;
            Value::BigInt(bytes.get_i64_le())
        }
        TypeTag::Float => {
            need(bytes, 4, "float")?;
            Value::Float(bytes.get_f32_le())
        }
        TypeTag::Double => {
            need(bytes, 8, "double")?;
            Value::Double(bytes.get_f64_le())
        }
        TypeTag::Decimal => {
            need(bytes, 17, "decimal")?;
            let value = bytes.get_i128_le();
            let scale = bytes.get_u8();
            Value::Decimal { value, scale }
        }
        TypeTag::String => {
            let data = read_var(bytes, "string")?;
            let s = String::from_utf8(data).map_err(|_| CodecError::InvalidUtf8)?;
            Value::String(s)
        }
        TypeTag::Bytes => Value::Bytes(read_var(bytes, "bytes")?),
        TypeTag::Date => {
            need(bytes, 4, "date")?;
            Value::Date(bytes.get_i32_le())
        }
        TypeTag::Time => {
            need(bytes, 8, "time")?;
            Value::Time(bytes.get_i64_le())
        }
        TypeTag::Timestamp => {
            need(bytes, 8, "timestamp")?;
            Value::Timestamp(bytes.get_i64_le())
        }
        TypeTag::Bit => {
            need(bytes, 8, "bit")?;
            Value::Bit(bytes.get_u64_le())
        }
    };
    Ok(value)
}

fn read_var(bytes: &mut &[u8], what: &'static str) -> CodecResult<Vec<u8>> {
    need(bytes, 4, what)?;
    let len = bytes.get_u32_le() as usize;
    need(bytes, len, what)?;
    let data = bytes[..len].to_vec();
    bytes.advance(len);
    Ok(data)
}

fn canonical_f32(f: f32) -> f32 {
    if f.is_nan() {
        f32::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}

fn canonical_f64(f: f64) -> f64 {
    if f.is_nan() {
        f64::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}
