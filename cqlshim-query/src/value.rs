//! Backend-agnostic CQL values.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::net::IpAddr;
use uuid::Uuid;

use crate::error::ConversionError;

/// A bound parameter or a column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// A bound slot left unset; the server keeps the column's current value.
    Unset,
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
    /// Decimal number.
    Decimal(Decimal),
    /// UTF-8 text.
    Text(String),
    /// Binary blob.
    Blob(Vec<u8>),
    /// UUID.
    Uuid(Uuid),
    /// Time-based UUID.
    TimeUuid(Uuid),
    /// Timestamp with millisecond precision.
    Timestamp(DateTime<Utc>),
    /// Inet address.
    Inet(IpAddr),
    /// List of values.
    List(Vec<Value>),
    /// Set of values.
    Set(Vec<Value>),
    /// Map of key-value pairs.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Name of the CQL type carried by this value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Unset => "unset",
            Self::Boolean(_) => "boolean",
            Self::TinyInt(_) => "tinyint",
            Self::SmallInt(_) => "smallint",
            Self::Int(_) => "int",
            Self::BigInt(_) => "bigint",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Uuid(_) => "uuid",
            Self::TimeUuid(_) => "timeuuid",
            Self::Timestamp(_) => "timestamp",
            Self::Inet(_) => "inet",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }

    /// Check if value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to convert to i32.
    pub fn as_i32(&self) -> Result<i32, ConversionError> {
        match self {
            Self::TinyInt(v) => Ok(i32::from(*v)),
            Self::SmallInt(v) => Ok(i32::from(*v)),
            Self::Int(v) => Ok(*v),
            _ => Err(self.mismatch("int")),
        }
    }

    /// Try to convert to i64.
    pub fn as_i64(&self) -> Result<i64, ConversionError> {
        match self {
            Self::TinyInt(v) => Ok(i64::from(*v)),
            Self::SmallInt(v) => Ok(i64::from(*v)),
            Self::Int(v) => Ok(i64::from(*v)),
            Self::BigInt(v) => Ok(*v),
            _ => Err(self.mismatch("bigint")),
        }
    }

    /// Try to convert to f64.
    pub fn as_f64(&self) -> Result<f64, ConversionError> {
        match self {
            Self::Float(v) => Ok(f64::from(*v)),
            Self::Double(v) => Ok(*v),
            Self::Int(v) => Ok(f64::from(*v)),
            _ => Err(self.mismatch("double")),
        }
    }

    /// Try to convert to bool.
    pub fn as_bool(&self) -> Result<bool, ConversionError> {
        match self {
            Self::Boolean(v) => Ok(*v),
            _ => Err(self.mismatch("boolean")),
        }
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> ConversionError {
        ConversionError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null | Value::Unset => JsonValue::Null,
            Value::Boolean(v) => JsonValue::Bool(v),
            Value::TinyInt(v) => JsonValue::Number(v.into()),
            Value::SmallInt(v) => JsonValue::Number(v.into()),
            Value::Int(v) => JsonValue::Number(v.into()),
            Value::BigInt(v) => JsonValue::Number(v.into()),
            Value::Float(v) => serde_json::Number::from_f64(f64::from(v))
                .map_or(JsonValue::Null, JsonValue::Number),
            Value::Double(v) => {
                serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
            }
            Value::Decimal(v) => JsonValue::String(v.to_string()),
            Value::Text(v) => JsonValue::String(v),
            Value::Blob(v) => JsonValue::Array(v.into_iter().map(Into::into).collect()),
            Value::Uuid(v) | Value::TimeUuid(v) => JsonValue::String(v.to_string()),
            Value::Timestamp(v) => JsonValue::String(v.to_rfc3339()),
            Value::Inet(v) => JsonValue::String(v.to_string()),
            Value::List(v) | Value::Set(v) => {
                JsonValue::Array(v.into_iter().map(Into::into).collect())
            }
            Value::Map(v) => {
                let obj: serde_json::Map<String, JsonValue> = v
                    .into_iter()
                    .filter_map(|(k, val)| {
                        let key = match k {
                            Value::Text(s) => Some(s),
                            Value::Uuid(u) | Value::TimeUuid(u) => Some(u.to_string()),
                            Value::Int(i) => Some(i.to_string()),
                            Value::BigInt(i) => Some(i.to_string()),
                            Value::Double(d) => Some(d.to_string()),
                            _ => None,
                        };
                        key.map(|k| (k, val.into()))
                    })
                    .collect();
                JsonValue::Object(obj)
            }
        }
    }
}
