//! Column type adapters.
//!
//! An adapter describes one CQL column type to callers that need column
//! metadata (precision, quoting, case sensitivity) and converts between
//! [`Value`] and the host type.

use uuid::Uuid;

use crate::error::ConversionError;
use crate::value::Value;

/// Metadata and conversions for one CQL column type.
pub trait ColumnAdapter {
    /// The host type values of this column map to.
    type Native;

    /// CQL type name.
    fn cql_type(&self) -> &'static str;

    /// Whether comparisons on this type are case sensitive.
    fn is_case_sensitive(&self) -> bool;

    /// Display precision of a value (`None` means the column maximum).
    fn precision(&self, value: Option<&Self::Native>) -> usize;

    /// Digits after the decimal point; `None` for non-numeric types.
    fn scale(&self, _value: Option<&Self::Native>) -> Option<u32> {
        None
    }

    /// Whether values carry a sign.
    fn is_signed(&self) -> bool {
        false
    }

    /// Whether a literal of this type needs quoting in CQL text.
    fn needs_quotes(&self) -> bool;

    /// Render a native value.
    fn to_display(&self, value: &Self::Native) -> String;

    /// Convert a column value to the host type; null maps to `None`.
    fn compose(&self, value: &Value) -> Result<Option<Self::Native>, ConversionError>;

    /// Convert a host value into a column value.
    fn decompose(&self, value: Self::Native) -> Value;
}

/// `text` / `varchar` / `ascii` columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Adapter;

impl ColumnAdapter for Utf8Adapter {
    type Native = String;

    fn cql_type(&self) -> &'static str {
        "text"
    }

    fn is_case_sensitive(&self) -> bool {
        true
    }

    fn precision(&self, value: Option<&String>) -> usize {
        value.map_or(usize::MAX, |s| s.chars().count())
    }

    fn needs_quotes(&self) -> bool {
        true
    }

    fn to_display(&self, value: &String) -> String {
        value.clone()
    }

    /// Text passes through and other scalars are rendered; blobs and
    /// collections are rejected.
    fn compose(&self, value: &Value) -> Result<Option<String>, ConversionError> {
        let text = match value {
            Value::Null | Value::Unset => return Ok(None),
            Value::Text(s) => s.clone(),
            Value::Boolean(v) => v.to_string(),
            Value::TinyInt(v) => v.to_string(),
            Value::SmallInt(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Decimal(v) => v.to_string(),
            Value::Uuid(u) | Value::TimeUuid(u) => u.to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339(),
            Value::Inet(addr) => addr.to_string(),
            other => return Err(other.mismatch("text")),
        };
        Ok(Some(text))
    }

    fn decompose(&self, value: String) -> Value {
        Value::Text(value)
    }
}

const UUID_TEXT_LEN: usize = 36;

/// `uuid` columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidAdapter;

/// `timeuuid` columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeUuidAdapter;

fn compose_uuid(value: &Value, expected: &'static str) -> Result<Option<Uuid>, ConversionError> {
    match value {
        Value::Null | Value::Unset => Ok(None),
        Value::Uuid(u) | Value::TimeUuid(u) => Ok(Some(*u)),
        Value::Text(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| ConversionError::Parse {
                expected,
                input: s.clone(),
            }),
        other => Err(other.mismatch(expected)),
    }
}

macro_rules! uuid_adapter {
    ($adapter:ty, $name:literal, $variant:ident) => {
        impl ColumnAdapter for $adapter {
            type Native = Uuid;

            fn cql_type(&self) -> &'static str {
                $name
            }

            fn is_case_sensitive(&self) -> bool {
                false
            }

            fn precision(&self, value: Option<&Uuid>) -> usize {
                value.map_or(UUID_TEXT_LEN, |u| u.hyphenated().to_string().len())
            }

            fn needs_quotes(&self) -> bool {
                false
            }

            fn to_display(&self, value: &Uuid) -> String {
                value.hyphenated().to_string()
            }

            fn compose(&self, value: &Value) -> Result<Option<Uuid>, ConversionError> {
                compose_uuid(value, $name)
            }

            fn decompose(&self, value: Uuid) -> Value {
                Value::$variant(value)
            }
        }
    };
}

uuid_adapter!(UuidAdapter, "uuid", Uuid);
uuid_adapter!(TimeUuidAdapter, "timeuuid", TimeUuid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_metadata() {
        let a = Utf8Adapter;
        assert_eq!(a.cql_type(), "text");
        assert!(a.is_case_sensitive());
        assert!(a.needs_quotes());
        assert!(!a.is_signed());
        assert_eq!(a.scale(None), None);
        assert_eq!(a.precision(Some(&"héllo".to_string())), 5);
        assert_eq!(a.precision(None), usize::MAX);
    }

    #[test]
    fn test_utf8_compose() {
        let a = Utf8Adapter;
        assert_eq!(a.compose(&Value::Text("red".into())).unwrap(), Some("red".into()));
        assert_eq!(a.compose(&Value::Null).unwrap(), None);
        assert_eq!(a.decompose("blue".into()), Value::Text("blue".into()));
    }

    #[test]
    fn test_utf8_compose_renders_scalars() {
        let a = Utf8Adapter;
        assert_eq!(a.compose(&Value::Int(12345)).unwrap(), Some("12345".into()));
        assert_eq!(a.compose(&Value::BigInt(-3)).unwrap(), Some("-3".into()));
        assert_eq!(a.compose(&Value::Boolean(true)).unwrap(), Some("true".into()));
        assert_eq!(a.compose(&Value::Double(1.5)).unwrap(), Some("1.5".into()));
        assert_eq!(
            a.compose(&Value::Inet("127.0.0.1".parse().unwrap())).unwrap(),
            Some("127.0.0.1".into())
        );
        assert!(a.compose(&Value::Blob(vec![1])).is_err());
        assert!(a.compose(&Value::List(vec![Value::Int(1)])).is_err());
    }

    #[test]
    fn test_uuid_adapters() {
        let id = Uuid::new_v4();
        let a = UuidAdapter;
        assert!(!a.is_case_sensitive());
        assert!(!a.needs_quotes());
        assert_eq!(a.precision(None), 36);
        assert_eq!(a.precision(Some(&id)), 36);
        assert_eq!(a.compose(&Value::Uuid(id)).unwrap(), Some(id));
        assert_eq!(a.compose(&Value::Text(id.to_string())).unwrap(), Some(id));
        assert_eq!(a.to_display(&id), id.to_string());
        assert_eq!(TimeUuidAdapter.decompose(id), Value::TimeUuid(id));

        let err = TimeUuidAdapter.compose(&Value::Text("nope".into())).unwrap_err();
        assert!(matches!(err, ConversionError::Parse { expected: "timeuuid", .. }));
    }
}
