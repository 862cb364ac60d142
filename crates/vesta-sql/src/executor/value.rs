//! Runtime values for query execution.
//!
//! This module defines the `Value` type which represents runtime SQL values
//! during query execution, and the checked casts used when a value is stored
//! into a column of a different type.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::DataType;

/// A runtime value during query execution.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 8-bit signed integer.
    TinyInt(i8),
    /// 16-bit signed integer.
    SmallInt(i16),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    BigInt(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Decimal value (stored as scaled integer).
    Decimal {
        /// Unscaled value.
        value: i128,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// String value.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Date (days since epoch).
    Date(i32),
    /// Time (microseconds since midnight).
    Time(i64),
    /// Timestamp (microseconds since epoch).
    Timestamp(i64),
    /// Bit field value.
    Bit(u64),
}

impl Value {
    /// Creates a NULL value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Creates a boolean value.
    pub fn boolean(v: bool) -> Self {
        Value::Boolean(v)
    }

    /// Creates an integer value.
    pub fn int(v: i32) -> Self {
        Value::Int(v)
    }

    /// Creates a bigint value.
    pub fn bigint(v: i64) -> Self {
        Value::BigInt(v)
    }

    /// Creates a double value.
    pub fn double(v: f64) -> Self {
        Value::Double(v)
    }

    /// Creates a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Value::String(v.into())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::TinyInt(i) => *i != 0,
            Value::SmallInt(i) => *i != 0,
            Value::Int(i) => *i != 0,
            Value::BigInt(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Double(f) => *f != 0.0,
            Value::Decimal { value, .. } => *value != 0,
            Value::String(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::Bit(b) => *b != 0,
            Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => true,
        }
    }

    /// Converts this value to a boolean.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Null => None,
            Value::Boolean(b) => Some(*b),
            _ => Some(self.is_truthy()),
        }
    }

    /// Converts this value to an i64.
    ///
    /// Floating point and decimal values are rounded to the nearest integer;
    /// values outside the i64 range yield `None`.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Null | Value::Bytes(_) => None,
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::TinyInt(i) => Some(i64::from(*i)),
            Value::SmallInt(i) => Some(i64::from(*i)),
            Value::Int(i) => Some(i64::from(*i)),
            Value::BigInt(i) => Some(*i),
            Value::Float(f) => f64_to_i64(f64::from(*f)),
            Value::Double(f) => f64_to_i64(*f),
            Value::Decimal { value, scale } => match 10i128.checked_pow(u32::from(*scale)) {
                Some(divisor) => i64::try_from(round_div(*value, divisor)).ok(),
                // |value| < 10^39 always rounds to zero past the i128 range
                None => Some(0),
            },
            Value::String(s) => s.trim().parse().ok(),
            Value::Date(d) => Some(i64::from(*d)),
            Value::Time(t) | Value::Timestamp(t) => Some(*t),
            Value::Bit(b) => i64::try_from(*b).ok(),
        }
    }

    /// Converts this value to an f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::TinyInt(i) => Some(f64::from(*i)),
            Value::SmallInt(i) => Some(f64::from(*i)),
            Value::Int(i) => Some(f64::from(*i)),
            Value::BigInt(i) => Some(*i as f64),
            Value::Float(f) => Some(f64::from(*f)),
            Value::Double(f) => Some(*f),
            Value::Decimal { value, scale } => {
                let divisor = 10f64.powi(i32::from(*scale));
                Some(*value as f64 / divisor)
            }
            Value::String(s) => s.trim().parse().ok(),
            Value::Bit(b) => Some(*b as f64),
            Value::Date(_) | Value::Time(_) | Value::Timestamp(_) | Value::Bytes(_) => None,
        }
    }

    /// Converts this value to a string.
    pub fn to_string_value(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Casts this value to the specified type.
    ///
    /// Casts are checked: a value that does not fit the target type is an
    /// error rather than being truncated.
    pub fn cast(&self, target: &DataType) -> Result<Value, String> {
        if self.is_null() {
            return Ok(Value::Null);
        }

        match target {
            DataType::Boolean => match self {
                Value::String(s) => parse_bool(s)
                    .map(Value::Boolean)
                    .ok_or_else(|| format!("Cannot cast '{}' to boolean", s)),
                _ => self
                    .to_bool()
                    .map(Value::Boolean)
                    .ok_or_else(|| "Cannot cast to boolean".to_string()),
            },
            DataType::TinyInt => self.cast_integer("tinyint", |v| i8::try_from(v).ok().map(Value::TinyInt)),
            DataType::SmallInt => {
                self.cast_integer("smallint", |v| i16::try_from(v).ok().map(Value::SmallInt))
            }
            DataType::Int => self.cast_integer("int", |v| i32::try_from(v).ok().map(Value::Int)),
            DataType::BigInt => self.cast_integer("bigint", |v| Some(Value::BigInt(v))),
            DataType::Float => {
                let v = self
                    .to_f64()
                    .ok_or_else(|| "Cannot cast to float".to_string())?;
                if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                    return Err(format!("Value {} out of range for float", v));
                }
                Ok(Value::Float(v as f32))
            }
            DataType::Double => self
                .to_f64()
                .map(Value::Double)
                .ok_or_else(|| "Cannot cast to double".to_string()),
            DataType::Decimal { precision, scale } => {
                self.cast_decimal(*precision, scale.unwrap_or(0))
            }
            DataType::Char(len) | DataType::Varchar(len) => {
                let s = self
                    .to_string_value()
                    .ok_or_else(|| "Cannot cast to string".to_string())?;
                match len {
                    Some(max) if s.chars().count() > *max as usize => {
                        Err(format!("Data too long for {}", target))
                    }
                    _ => Ok(Value::String(s)),
                }
            }
            DataType::Text => self
                .to_string_value()
                .map(Value::String)
                .ok_or_else(|| "Cannot cast to string".to_string()),
            DataType::Blob => match self {
                Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
                Value::String(s) => Ok(Value::Bytes(s.clone().into_bytes())),
                _ => Err(format!("Cannot cast {} to blob", self)),
            },
            DataType::Date => match self {
                Value::Date(d) => Ok(Value::Date(*d)),
                _ => self.cast_integer("date", |v| i32::try_from(v).ok().map(Value::Date)),
            },
            DataType::Time => match self {
                Value::Time(t) => Ok(Value::Time(*t)),
                _ => self.cast_integer("time", |v| Some(Value::Time(v))),
            },
            DataType::Timestamp => match self {
                Value::Timestamp(t) => Ok(Value::Timestamp(*t)),
                _ => self.cast_integer("timestamp", |v| Some(Value::Timestamp(v))),
            },
            DataType::Bit(width) => {
                let bits = match self {
                    Value::Bit(b) => Some(*b),
                    other => other.to_i64().and_then(|v| u64::try_from(v).ok()),
                };
                match bits {
                    Some(b) if *width >= 64 || b >> width == 0 => Ok(Value::Bit(b)),
                    Some(_) => Err(format!("Value out of range for {}", target)),
                    None => Err(format!("Cannot cast {} to {}", self, target)),
                }
            }
        }
    }

    fn cast_integer(
        &self,
        name: &str,
        narrow: impl FnOnce(i64) -> Option<Value>,
    ) -> Result<Value, String> {
        let wide = self
            .to_i64()
            .ok_or_else(|| format!("Cannot cast {} to {}", self, name))?;
        narrow(wide).ok_or_else(|| format!("Value {} out of range for {}", wide, name))
    }

    fn cast_decimal(&self, precision: Option<u8>, scale: u8) -> Result<Value, String> {
        if scale > MAX_DECIMAL_SCALE {
            return Err(format!(
                "Scale {} exceeds the maximum decimal scale of {}",
                scale, MAX_DECIMAL_SCALE
            ));
        }
        let factor = 10i128.pow(u32::from(scale));
        let value = match self {
            Value::Decimal { value, scale: from } => {
                if *from <= scale {
                    10i128
                        .checked_pow(u32::from(scale - from))
                        .and_then(|m| value.checked_mul(m))
                } else {
                    // shifting right by more than 38 digits always leaves zero
                    Some(
                        10i128
                            .checked_pow(u32::from(from - scale))
                            .map_or(0, |d| round_div(*value, d)),
                    )
                }
            }
            Value::Float(_) | Value::Double(_) | Value::String(_) => self
                .to_f64()
                .filter(|f| f.is_finite())
                .map(|f| (f * factor as f64).round() as i128),
            other => other
                .to_i64()
                .and_then(|v| i128::from(v).checked_mul(factor)),
        }
        .ok_or_else(|| format!("Cannot cast {} to decimal", self))?;

        if let Some(p) = precision {
            if p < 39 && value.unsigned_abs() >= 10u128.pow(u32::from(p)) {
                return Err(format!("Value {} out of range for DECIMAL({})", self, p));
            }
        }
        Ok(Value::Decimal { value, scale })
    }
}

/// Largest scale whose power of ten fits in the i128 decimal representation.
pub const MAX_DECIMAL_SCALE: u8 = 38;

/// Parses the textual boolean literals accepted by a cast.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn f64_to_i64(f: f64) -> Option<i64> {
    let rounded = f.round();
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

/// Integer division rounding half away from zero.
fn round_div(value: i128, divisor: i128) -> i128 {
    let quotient = value / divisor;
    let remainder = value % divisor;
    if remainder.abs() * 2 >= divisor {
        quotient + value.signum()
    } else {
        quotient
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::TinyInt(a), Value::TinyInt(b)) => a == b,
            (Value::SmallInt(a), Value::SmallInt(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Bit(a), Value::Bit(b)) => a == b,
            // Cross-type numeric comparisons
            (a, b) => {
                if let (Some(a_f), Some(b_f)) = (a.to_f64(), b.to_f64()) {
                    (a_f - b_f).abs() < f64::EPSILON
                } else {
                    false
                }
            }
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // NULL comparisons: NULL is considered less than any non-NULL value
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,

            // Same-type comparisons
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::TinyInt(a), Value::TinyInt(b)) => a.cmp(b),
            (Value::SmallInt(a), Value::SmallInt(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::BigInt(a), Value::BigInt(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Bit(a), Value::Bit(b)) => a.cmp(b),

            // Cross-type numeric comparisons via f64
            (a, b) => {
                if let (Some(a_f), Some(b_f)) = (a.to_f64(), b.to_f64()) {
                    a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
                } else {
                    // Fall back to string comparison for incompatible types
                    let a_s = a.to_string_value().unwrap_or_default();
                    let b_s = b.to_string_value().unwrap_or_default();
                    a_s.cmp(&b_s)
                }
            }
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::TinyInt(i) => i.hash(state),
            Value::SmallInt(i) => i.hash(state),
            Value::Int(i) => i.hash(state),
            Value::BigInt(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Double(f) => f.to_bits().hash(state),
            Value::Decimal { value, scale } => {
                value.hash(state);
                scale.hash(state);
            }
            Value::String(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Time(t) | Value::Timestamp(t) => t.hash(state),
            Value::Bit(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::TinyInt(i) => write!(f, "{}", i),
            Value::SmallInt(i) => write!(f, "{}", i),
            Value::Int(i) => write!(f, "{}", i),
            Value::BigInt(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Decimal { value, scale } => {
                if *scale == 0 {
                    write!(f, "{}", value)
                } else if let Some(divisor) = 10i128.checked_pow(u32::from(*scale)) {
                    let int_part = *value / divisor;
                    let frac_part = (*value % divisor).abs();
                    let sign = if *value < 0 && int_part == 0 { "-" } else { "" };
                    write!(
                        f,
                        "{}{}.{:0>width$}",
                        sign,
                        int_part,
                        frac_part,
                        width = *scale as usize
                    )
                } else {
                    let sign = if *value < 0 { "-" } else { "" };
                    write!(
                        f,
                        "{}0.{:0>width$}",
                        sign,
                        value.unsigned_abs(),
                        width = *scale as usize
                    )
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => {
                write!(f, "0x")?;
                b.iter().try_for_each(|byte| write!(f, "{:02x}", byte))
            }
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::Timestamp(t) => write!(f, "{}", t),
            Value::Bit(b) => write!(f, "b'{:b}'", b),
        }
    }
}
