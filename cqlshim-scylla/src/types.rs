//! Conversions between [`Value`] and the driver's CQL values.

use chrono::DateTime;
use cqlshim_query::{Params, Value};
use rust_decimal::Decimal;
use scylla::frame::response::result::CqlValue;
use scylla::frame::value::{CqlDecimal, CqlTimestamp, CqlTimeuuid, MaybeUnset};

use crate::error::{ScyllaError, ScyllaResult};

/// One bound slot as sent to the server.
pub type BoundValue = MaybeUnset<Option<CqlValue>>;

/// Trait for values that can be sent as CQL.
pub trait ToCqlValue {
    /// Convert to a CQL value. `None` is a CQL null.
    fn to_cql(&self) -> ScyllaResult<Option<CqlValue>>;
}

impl ToCqlValue for Value {
    fn to_cql(&self) -> ScyllaResult<Option<CqlValue>> {
        let cql = match self {
            Value::Null => return Ok(None),
            Value::Unset => {
                return Err(ScyllaError::Serialization(
                    "unset is only valid as a top-level bound value".into(),
                ));
            }
            Value::Boolean(v) => CqlValue::Boolean(*v),
            Value::TinyInt(v) => CqlValue::TinyInt(*v),
            Value::SmallInt(v) => CqlValue::SmallInt(*v),
            Value::Int(v) => CqlValue::Int(*v),
            Value::BigInt(v) => CqlValue::BigInt(*v),
            Value::Float(v) => CqlValue::Float(*v),
            Value::Double(v) => CqlValue::Double(*v),
            Value::Decimal(v) => CqlValue::Decimal(
                CqlDecimal::from_signed_be_bytes_and_exponent(
                    v.mantissa().to_be_bytes().to_vec(),
                    v.scale() as i32,
                ),
            ),
            Value::Text(v) => CqlValue::Text(v.clone()),
            Value::Blob(v) => CqlValue::Blob(v.clone()),
            Value::Uuid(v) => CqlValue::Uuid(*v),
            Value::TimeUuid(v) => CqlValue::Timeuuid(CqlTimeuuid::from(*v)),
            Value::Timestamp(v) => CqlValue::Timestamp(CqlTimestamp(v.timestamp_millis())),
            Value::Inet(v) => CqlValue::Inet(*v),
            Value::List(v) => CqlValue::List(collection(v)?),
            Value::Set(v) => CqlValue::Set(collection(v)?),
            Value::Map(v) => CqlValue::Map(
                v.iter()
                    .map(|(k, val)| Ok((element(k)?, element(val)?)))
                    .collect::<ScyllaResult<_>>()?,
            ),
        };
        Ok(Some(cql))
    }
}

/// Collection elements cannot be null.
fn element(value: &Value) -> ScyllaResult<CqlValue> {
    value.to_cql()?.ok_or_else(|| {
        ScyllaError::Serialization("collections cannot contain null elements".into())
    })
}

fn collection(values: &[Value]) -> ScyllaResult<Vec<CqlValue>> {
    values.iter().map(element).collect()
}

/// Convert a parameter set to the slots sent with a prepared statement.
pub fn bind_values(params: &Params) -> ScyllaResult<Vec<BoundValue>> {
    params
        .values()
        .iter()
        .map(|value| match value {
            Value::Unset => Ok(MaybeUnset::Unset),
            other => other.to_cql().map(MaybeUnset::Set),
        })
        .collect()
}

/// Convert a column value read from the server.
pub fn from_cql(value: Option<CqlValue>) -> ScyllaResult<Value> {
    let Some(value) = value else {
        return Ok(Value::Null);
    };

    Ok(match value {
        CqlValue::Empty => Value::Null,
        CqlValue::Boolean(v) => Value::Boolean(v),
        CqlValue::TinyInt(v) => Value::TinyInt(v),
        CqlValue::SmallInt(v) => Value::SmallInt(v),
        CqlValue::Int(v) => Value::Int(v),
        CqlValue::BigInt(v) => Value::BigInt(v),
        CqlValue::Counter(v) => Value::BigInt(v.0),
        CqlValue::Float(v) => Value::Float(v),
        CqlValue::Double(v) => Value::Double(v),
        CqlValue::Decimal(v) => Value::Decimal(decimal(&v)?),
        CqlValue::Text(v) | CqlValue::Ascii(v) => Value::Text(v),
        CqlValue::Blob(v) => Value::Blob(v),
        CqlValue::Uuid(v) => Value::Uuid(v),
        CqlValue::Timeuuid(v) => Value::TimeUuid(v.into()),
        CqlValue::Timestamp(CqlTimestamp(millis)) => Value::Timestamp(
            DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                ScyllaError::Deserialization(format!("timestamp out of range: {millis}"))
            })?,
        ),
        CqlValue::Inet(v) => Value::Inet(v),
        CqlValue::List(v) => Value::List(elements(v)?),
        CqlValue::Set(v) => Value::Set(elements(v)?),
        CqlValue::Map(v) => Value::Map(
            v.into_iter()
                .map(|(k, val)| Ok((from_cql(Some(k))?, from_cql(Some(val))?)))
                .collect::<ScyllaResult<_>>()?,
        ),
        other => {
            return Err(ScyllaError::Deserialization(format!(
                "unsupported column type: {other:?}"
            )));
        }
    })
}

fn elements(values: Vec<CqlValue>) -> ScyllaResult<Vec<Value>> {
    values.into_iter().map(|v| from_cql(Some(v))).collect()
}

fn decimal(value: &CqlDecimal) -> ScyllaResult<Decimal> {
    let (bytes, scale) = value.as_signed_be_bytes_slice_and_exponent();
    let out_of_range = || ScyllaError::Deserialization("decimal out of range".into());

    if bytes.len() > 16 {
        return Err(out_of_range());
    }

    // Sign-extend the big-endian two's complement mantissa to 128 bits.
    let fill = if bytes.first().is_some_and(|b| b & 0x80 != 0) { 0xff } else { 0x00 };
    let mut wide = [fill; 16];
    wide[16 - bytes.len()..].copy_from_slice(bytes);
    let mantissa = i128::from_be_bytes(wide);

    // A negative scale multiplies the mantissa: 1E+3 is (1, -3).
    let (mantissa, scale) = match u32::try_from(scale) {
        Ok(scale) => (mantissa, scale),
        Err(_) => {
            let factor = 10i128
                .checked_pow(scale.unsigned_abs())
                .ok_or_else(out_of_range)?;
            (mantissa.checked_mul(factor).ok_or_else(out_of_range)?, 0)
        }
    };
    Decimal::try_from_i128_with_scale(mantissa, scale).map_err(|_| out_of_range())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use uuid::Uuid;

    #[test]
    fn test_value_to_cql() {
        assert!(matches!(Value::Int(42).to_cql().unwrap(), Some(CqlValue::Int(42))));
        assert!(matches!(
            Value::from("hello").to_cql().unwrap(),
            Some(CqlValue::Text(s)) if s == "hello"
        ));
        assert!(Value::Null.to_cql().unwrap().is_none());
        assert!(Value::Unset.to_cql().is_err());
    }

    #[test]
    fn test_collections_reject_null_elements() {
        let list = Value::List(vec![Value::Int(1), Value::Null]);
        assert!(list.to_cql().is_err());

        let list = Value::List(vec![Value::Int(1), Value::Int(3), Value::Int(12345)]);
        assert!(matches!(list.to_cql().unwrap(), Some(CqlValue::List(v)) if v.len() == 3));
    }

    #[test]
    fn test_bind_values_keep_unset_slots() {
        let mut params = Params::unset(3);
        params.set(0, 7);
        params.set(1, Value::List(vec![Value::Int(1)]));

        let bound = bind_values(&params).unwrap();
        assert_eq!(bound.len(), 3);
        assert!(matches!(bound[0], MaybeUnset::Set(Some(CqlValue::Int(7)))));
        assert!(matches!(bound[2], MaybeUnset::Unset));
    }

    #[test]
    fn test_bind_values_null_is_not_unset() {
        let params = Params::from(vec![Value::Null]);
        let bound = bind_values(&params).unwrap();
        assert!(matches!(bound[0], MaybeUnset::Set(None)));
    }

    #[test]
    fn test_from_cql() {
        assert_eq!(from_cql(None).unwrap(), Value::Null);
        assert_eq!(from_cql(Some(CqlValue::Ascii("a".into()))).unwrap(), Value::Text("a".into()));

        let id = Uuid::from_u128(0x1dc3_4a2e_0f36_11ef_8000_0000_0000_0001);
        assert_eq!(
            from_cql(Some(CqlValue::Timeuuid(CqlTimeuuid::from(id)))).unwrap(),
            Value::TimeUuid(id)
        );

        let map = CqlValue::Map(vec![(CqlValue::Int(1), CqlValue::Text("one".into()))]);
        assert_eq!(
            from_cql(Some(map)).unwrap(),
            Value::Map(vec![(Value::Int(1), Value::Text("one".into()))])
        );
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let cql = Value::Timestamp(ts).to_cql().unwrap();
        assert_eq!(from_cql(cql).unwrap(), Value::Timestamp(ts));
    }

    #[test]
    fn test_decimal_round_trip() {
        for literal in ["12.345", "-0.5", "0", "-98765432109876.54321"] {
            let value = Value::Decimal(Decimal::from_str(literal).unwrap());
            let cql = value.to_cql().unwrap();
            assert_eq!(from_cql(cql).unwrap(), value, "{literal}");
        }
    }

    #[test]
    fn test_decimal_negative_exponent() {
        let cql = CqlValue::Decimal(CqlDecimal::from_signed_be_bytes_and_exponent(vec![0x01], -3));
        assert_eq!(
            from_cql(Some(cql)).unwrap(),
            Value::Decimal(Decimal::from(1000))
        );

        let cql = CqlValue::Decimal(CqlDecimal::from_signed_be_bytes_and_exponent(vec![0xfe], -2));
        assert_eq!(
            from_cql(Some(cql)).unwrap(),
            Value::Decimal(Decimal::from(-200))
        );

        let cql = CqlValue::Decimal(CqlDecimal::from_signed_be_bytes_and_exponent(vec![0x01], -40));
        assert!(from_cql(Some(cql)).is_err());
    }
}
